//! Compact world fingerprints for determinism checks and CI artifacts.

use anyhow::Result;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use stormvale_world::{TileKind, WorldGrid};

/// Fingerprint of a generated world: per-kind tile counts plus CRCs over the
/// terrain heightfield and the tile layer.
///
/// Two worlds with equal digests are byte-equal in everything the sandbox
/// simulates against; CRC collisions are negligible at this scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDigest {
    /// Grid width in tiles.
    pub width: usize,
    /// Grid depth in tiles.
    pub depth: usize,
    /// World seed.
    pub seed: i64,
    /// Grass tile count.
    pub grass: usize,
    /// Road tile count.
    pub roads: usize,
    /// Foundation tile count.
    pub foundations: usize,
    /// Water tile count.
    pub water: usize,
    /// Registered trees.
    pub trees: usize,
    /// Registered buildings.
    pub buildings: usize,
    /// CRC32 of every vertex height, row-major, little-endian f32 bits.
    pub terrain_crc: u32,
    /// CRC32 of every tile's kind and occupancy, row-major.
    pub tiles_crc: u32,
}

impl WorldDigest {
    /// Capture a digest of the grid's current state.
    pub fn capture(grid: &WorldGrid) -> Self {
        let (width, depth) = (grid.width(), grid.depth());

        let mut terrain = Hasher::new();
        for vz in 0..=depth as i32 {
            for vx in 0..=width as i32 {
                terrain.update(&grid.vertex_height(vx, vz).to_bits().to_le_bytes());
            }
        }

        let mut tiles = Hasher::new();
        let (mut grass, mut roads, mut foundations, mut water) = (0, 0, 0, 0);
        for z in 0..depth as i32 {
            for x in 0..width as i32 {
                let Some(tile) = grid.tile(x, z) else {
                    continue;
                };
                match tile.kind {
                    TileKind::Grass => grass += 1,
                    TileKind::Road => roads += 1,
                    TileKind::Foundation => foundations += 1,
                    TileKind::Water => water += 1,
                }
                tiles.update(&[
                    tile.kind as u8,
                    tile.occupant.is_some() as u8,
                    tile.tree.is_some() as u8,
                ]);
            }
        }

        Self {
            width,
            depth,
            seed: grid.seed(),
            grass,
            roads,
            foundations,
            water,
            trees: grid.trees().len(),
            buildings: grid.buildings().len(),
            terrain_crc: terrain.finalize(),
            tiles_crc: tiles.finalize(),
        }
    }
}

/// Summary of a headless run, exported as pretty JSON for CI artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier.
    pub name: String,
    /// Timestamp when the report was written (ISO 8601).
    pub timestamp: String,
    /// Frames simulated.
    pub frames: u64,
    /// Tiles destroyed by tornadoes over the run.
    pub destroyed_tiles: usize,
    /// World state at the end of the run.
    pub digest: WorldDigest,
}

impl RunReport {
    /// Build a report stamped with the current UTC time.
    pub fn new(name: impl Into<String>, frames: u64, destroyed_tiles: usize, digest: WorldDigest) -> Self {
        Self {
            name: name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            frames,
            destroyed_tiles,
            digest,
        }
    }
}

/// Writes run reports to JSON files, creating parent directories as needed.
pub struct ReportSink {
    path: PathBuf,
}

impl ReportSink {
    /// Create a sink pointed at the supplied path.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Persist the report as pretty JSON.
    pub fn write(&self, report: &RunReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn equal_seeds_produce_equal_digests() {
        let a = WorldDigest::capture(&WorldGrid::new(24, 24, 7));
        let b = WorldDigest::capture(&WorldGrid::new(24, 24, 7));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = WorldDigest::capture(&WorldGrid::new(24, 24, 7));
        let b = WorldDigest::capture(&WorldGrid::new(24, 24, 8));
        assert_ne!(a, b, "terrain should vary with the seed");
    }

    #[test]
    fn counts_cover_the_whole_grid() {
        let digest = WorldDigest::capture(&WorldGrid::new(24, 24, 7));
        assert_eq!(
            digest.grass + digest.roads + digest.foundations + digest.water,
            24 * 24
        );
        assert!(digest.water > 0, "stream should flood some tiles");
        assert!(digest.trees > 0, "world should grow trees");
    }

    #[test]
    fn report_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "report-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let digest = WorldDigest::capture(&WorldGrid::new(16, 16, 1));
        let report = RunReport::new("sink_test", 120, 0, digest);
        let sink = ReportSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("terrain_crc"));
        fs::remove_file(&path).ok();
    }
}
