//! Save-file persistence with zstd compression.
//!
//! A save file holds one [`WorldSnapshot`]: a fixed header (magic, format
//! version, CRC32 of the compressed payload, payload length) followed by a
//! zstd-compressed bincode body. The CRC is validated before decompression so
//! truncated or corrupted files fail loudly instead of deserializing garbage.

use crate::snapshot::WorldSnapshot;
use anyhow::{Context, Result};
use crc32fast::Hasher;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic number for save-file identification ("SVSN" = stormvale snapshot).
const SAVE_MAGIC: u32 = 0x5356_534E;

/// Current save format version.
const SAVE_VERSION: u16 = 1;

/// Save file header structure.
#[derive(Debug, Clone)]
struct SaveHeader {
    magic: u32,
    version: u16,
    crc32: u32,
    payload_len: u32,
}

impl SaveHeader {
    fn new(crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: SAVE_VERSION,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(14);
        bytes.extend_from_slice(&self.magic.to_le_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.crc32.to_le_bytes());
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 14 {
            anyhow::bail!("Save header too short");
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != SAVE_MAGIC {
            anyhow::bail!(
                "Invalid save magic: expected 0x{:08X}, got 0x{:08X}",
                SAVE_MAGIC,
                magic
            );
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SAVE_VERSION {
            anyhow::bail!("Unsupported save version {}", version);
        }

        let crc32 = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            version,
            crc32,
            payload_len,
        })
    }
}

/// Reads and writes world save files.
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    /// Create a store pointed at a save file, creating parent directories.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create save directory")?;
            }
        }
        Ok(Self { path })
    }

    /// Whether a save file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write a snapshot to disk.
    pub fn save(&self, snapshot: &WorldSnapshot) -> Result<()> {
        let serialized = bincode::serialize(snapshot).context("Failed to serialize snapshot")?;

        // zstd level 3 for balanced speed/compression.
        let compressed =
            zstd::encode_all(&serialized[..], 3).context("Failed to compress snapshot")?;

        let mut hasher = Hasher::new();
        hasher.update(&compressed);
        let crc32 = hasher.finalize();

        let header = SaveHeader::new(crc32, compressed.len() as u32);

        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create save file {}", self.path.display()))?;
        file.write_all(&header.to_bytes())
            .context("Failed to write header")?;
        file.write_all(&compressed)
            .context("Failed to write payload")?;

        Ok(())
    }

    /// Load a snapshot from disk, validating magic, version and CRC.
    pub fn load(&self) -> Result<WorldSnapshot> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open save file {}", self.path.display()))?;

        let mut header_bytes = [0u8; 14];
        file.read_exact(&mut header_bytes)
            .context("Failed to read save header")?;
        let header = SaveHeader::from_bytes(&header_bytes)?;

        let mut compressed = vec![0u8; header.payload_len as usize];
        file.read_exact(&mut compressed)
            .context("Failed to read save payload")?;

        let mut hasher = Hasher::new();
        hasher.update(&compressed);
        let computed_crc = hasher.finalize();

        if computed_crc != header.crc32 {
            anyhow::bail!(
                "CRC32 mismatch: expected {:08X}, got {:08X}",
                header.crc32,
                computed_crc
            );
        }

        let decompressed =
            zstd::decode_all(&compressed[..]).context("Failed to decompress snapshot")?;

        bincode::deserialize(&decompressed).context("Failed to deserialize snapshot")
    }

    /// Write a pretty-JSON export of a snapshot next to the binary save,
    /// for inspection and debugging.
    pub fn export_json<P: AsRef<Path>>(path: P, snapshot: &WorldSnapshot) -> Result<()> {
        let json =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot JSON")?;
        fs::write(path.as_ref(), json).with_context(|| {
            format!("Failed to write JSON export {}", path.as_ref().display())
        })
    }
}
