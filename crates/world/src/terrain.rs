//! Deterministic terrain synthesis: layered value noise, hills, stream carving.
//!
//! The field is a vertex lattice one larger than the tile grid in each
//! dimension, generated once from the world seed and immutable afterwards.
//! Stream geometry is kept alongside the heights because the tree and water
//! passes both query distance to the centerline.

use stormvale_core::{hash_seed, SeededRng};
use tracing::{debug, instrument};

/// World-space size of one tile edge.
pub const TILE_SIZE: f32 = 1.0;

/// Lower clamp applied to every vertex height.
pub const MIN_HEIGHT: f32 = -0.62;
/// Upper clamp applied to every vertex height.
pub const MAX_HEIGHT: f32 = 1.2;
/// Elevation of the stream water surface.
pub const WATER_LEVEL: f32 = -0.18;

/// Octave frequencies for the layered value noise.
const OCTAVE_FREQS: [f64; 3] = [0.21, 0.53, 1.19];
/// Octave weights (sum to 1.0).
const OCTAVE_WEIGHTS: [f64; 3] = [0.62, 0.28, 0.10];
/// Seed salts that decorrelate the second and third octaves.
const OCTAVE_SALTS: [i64; 3] = [0, 0x51AB_3F27, 0x2E86_D199];

/// Salt for the terrain parameter stream (hills, stream waves).
const TERRAIN_SALT: i64 = 0x5445_5252; // "TERR"

/// Depression depth applied at the stream centerline.
const STREAM_CARVE_DEPTH: f64 = 0.56;
/// Stream influence extends this many half-widths from the centerline.
const STREAM_INFLUENCE_FACTOR: f64 = 3.4;

/// 2D value noise: smoothstep-eased bilinear interpolation between values
/// hashed at integer lattice points.
#[derive(Debug, Clone, Copy)]
struct ValueNoise {
    seed: i64,
}

impl ValueNoise {
    fn new(seed: i64) -> Self {
        Self { seed }
    }

    /// Hashed lattice value in `[0, 1)`.
    fn lattice(&self, ix: i64, iz: i64) -> f64 {
        hash_seed(&[self.seed, ix, iz]) as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Sample the noise at a continuous coordinate. Returns `[0, 1)`.
    fn sample(&self, x: f64, z: f64) -> f64 {
        let x0 = x.floor();
        let z0 = z.floor();
        let fx = x - x0;
        let fz = z - z0;
        let (ix, iz) = (x0 as i64, z0 as i64);

        let v00 = self.lattice(ix, iz);
        let v10 = self.lattice(ix + 1, iz);
        let v01 = self.lattice(ix, iz + 1);
        let v11 = self.lattice(ix + 1, iz + 1);

        let tx = smoothstep(fx);
        let tz = smoothstep(fz);
        let top = v00 + (v10 - v00) * tx;
        let bottom = v01 + (v11 - v01) * tx;
        top + (bottom - top) * tz
    }
}

/// Smoothstep easing `t²(3 - 2t)`.
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Meandering stream centerline: a base z plus two sinusoids of x.
#[derive(Debug, Clone)]
pub struct StreamPath {
    base_z: f64,
    major_amp: f64,
    major_freq: f64,
    major_phase: f64,
    minor_amp: f64,
    half_width: f64,
}

impl StreamPath {
    fn generate(depth: usize, rng: &mut SeededRng) -> Self {
        Self {
            base_z: depth as f64 * rng.range(0.38, 0.62),
            major_amp: rng.range(1.6, 3.2),
            major_freq: rng.range(0.05, 0.11),
            major_phase: rng.range(0.0, std::f64::consts::TAU),
            minor_amp: rng.range(0.45, 1.05),
            half_width: rng.range(1.1, 1.6),
        }
    }

    /// Centerline z coordinate at grid-space x.
    pub fn center_z(&self, x: f64) -> f64 {
        let major = self.major_amp * (x * self.major_freq + self.major_phase).sin();
        // Minor wave rides at 2.8x the major frequency with a 0.68x phase shift.
        let minor = self.minor_amp * (x * self.major_freq * 2.8 + self.major_phase * 0.68).sin();
        self.base_z + major + minor
    }

    /// Distance from a grid-space point to the centerline.
    pub fn distance(&self, x: f64, z: f64) -> f64 {
        (z - self.center_z(x)).abs()
    }

    /// Half-width of the stream channel in tiles.
    pub fn half_width(&self) -> f64 {
        self.half_width
    }
}

/// One radial hill feature.
#[derive(Debug, Clone, Copy)]
struct Hill {
    x: f64,
    z: f64,
    radius: f64,
    height: f64,
}

/// Immutable vertex height field plus the stream geometry that shaped it.
#[derive(Debug, Clone)]
pub struct TerrainField {
    width: usize,
    depth: usize,
    heights: Vec<f32>,
    stream: StreamPath,
}

impl TerrainField {
    /// Generate the field for a `width x depth` tile grid.
    ///
    /// The vertex lattice is `(width + 1) x (depth + 1)` so every tile has
    /// four corner samples.
    #[instrument(skip_all, fields(seed, width, depth))]
    pub fn generate(seed: i64, width: usize, depth: usize) -> Self {
        let mut rng = SeededRng::from_parts(&[seed, TERRAIN_SALT]);
        let stream = StreamPath::generate(depth, &mut rng);
        let hills = Self::place_hills(width, depth, &stream, &mut rng);

        let octaves: Vec<ValueNoise> = OCTAVE_SALTS
            .iter()
            .map(|&salt| ValueNoise::new(seed ^ salt))
            .collect();

        let mut heights = Vec::with_capacity((width + 1) * (depth + 1));
        for vz in 0..=depth {
            for vx in 0..=width {
                let mut n = 0.0;
                for (octave, (&freq, &weight)) in octaves
                    .iter()
                    .zip(OCTAVE_FREQS.iter().zip(OCTAVE_WEIGHTS.iter()))
                {
                    n += octave.sample(vx as f64 * freq, vz as f64 * freq) * weight;
                }
                // Map the weighted [0,1) sum into a band the clamp can bite on.
                let mut h = n * 0.9 - 0.25;

                for hill in &hills {
                    let d = ((vx as f64 - hill.x).powi(2) + (vz as f64 - hill.z).powi(2)).sqrt();
                    if d < hill.radius {
                        let falloff = 1.0 - d / hill.radius;
                        h += hill.height * falloff * falloff;
                    }
                }

                let influence = stream.half_width * STREAM_INFLUENCE_FACTOR;
                let d = stream.distance(vx as f64, vz as f64);
                if d < influence {
                    let falloff = 1.0 - d / influence;
                    h -= STREAM_CARVE_DEPTH * falloff * falloff;
                }

                heights.push((h as f32).clamp(MIN_HEIGHT, MAX_HEIGHT));
            }
        }

        debug!(hills = hills.len(), "terrain field generated");
        Self {
            width,
            depth,
            heights,
            stream,
        }
    }

    /// Place 3-5 hills by rejection sampling away from the stream corridor.
    fn place_hills(
        width: usize,
        depth: usize,
        stream: &StreamPath,
        rng: &mut SeededRng,
    ) -> Vec<Hill> {
        let count = rng.int(3, 5);
        let exclusion = depth as f64 * 0.12;
        let mut hills = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut placed = None;
            for _ in 0..8 {
                let x = rng.range(0.0, width as f64);
                let z = rng.range(0.0, depth as f64);
                if stream.distance(x, z) >= exclusion {
                    placed = Some((x, z));
                    break;
                }
            }
            let Some((x, z)) = placed else {
                continue;
            };
            hills.push(Hill {
                x,
                z,
                radius: rng.range(4.5, 9.8),
                height: rng.range(0.22, 0.55),
            });
        }
        hills
    }

    /// Tile grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Tile grid depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Vertex height at lattice coordinates, clamped to the lattice extent.
    pub fn vertex(&self, vx: i32, vz: i32) -> f32 {
        let vx = vx.clamp(0, self.width as i32) as usize;
        let vz = vz.clamp(0, self.depth as i32) as usize;
        self.heights[vz * (self.width + 1) + vx]
    }

    /// Tile height: the mean of the tile's four corner vertices.
    pub fn tile_height(&self, x: i32, z: i32) -> f32 {
        let sum = self.vertex(x, z)
            + self.vertex(x + 1, z)
            + self.vertex(x, z + 1)
            + self.vertex(x + 1, z + 1);
        sum * 0.25
    }

    /// Stream geometry used by the water and tree passes.
    pub fn stream(&self) -> &StreamPath {
        &self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_noise_is_deterministic() {
        let a = ValueNoise::new(1234);
        let b = ValueNoise::new(1234);
        for i in 0..50 {
            let (x, z) = (i as f64 * 0.37, i as f64 * 0.91);
            assert_eq!(a.sample(x, z).to_bits(), b.sample(x, z).to_bits());
        }
    }

    #[test]
    fn value_noise_interpolates_lattice_values() {
        let noise = ValueNoise::new(77);
        // At integer coordinates the sample equals the lattice hash.
        let v = noise.sample(3.0, 5.0);
        assert!((v - noise.lattice(3, 5)).abs() < 1e-12);
    }

    #[test]
    fn value_noise_stays_in_unit_range() {
        let noise = ValueNoise::new(9);
        for i in 0..200 {
            let v = noise.sample(i as f64 * 0.13, i as f64 * 0.29);
            assert!((0.0..=1.0).contains(&v), "noise {} out of range", v);
        }
    }

    #[test]
    fn terrain_generation_is_deterministic() {
        let a = TerrainField::generate(42, 32, 32);
        let b = TerrainField::generate(42, 32, 32);
        assert_eq!(a.heights, b.heights);
    }

    #[test]
    fn different_seeds_produce_different_terrain() {
        let a = TerrainField::generate(1, 32, 32);
        let b = TerrainField::generate(2, 32, 32);
        assert_ne!(a.heights, b.heights);
    }

    #[test]
    fn vertex_heights_respect_clamp_band() {
        let field = TerrainField::generate(42, 32, 32);
        for &h in &field.heights {
            assert!((MIN_HEIGHT..=MAX_HEIGHT).contains(&h), "height {}", h);
        }
    }

    #[test]
    fn vertex_lookup_clamps_out_of_range() {
        let field = TerrainField::generate(7, 16, 16);
        assert_eq!(field.vertex(-5, -5), field.vertex(0, 0));
        assert_eq!(field.vertex(100, 100), field.vertex(16, 16));
    }

    #[test]
    fn stream_carves_a_depression() {
        let field = TerrainField::generate(42, 32, 32);
        let stream = field.stream();
        // Average height on the centerline should sit below the grid average.
        let mut on_stream = 0.0f64;
        let mut samples = 0;
        for vx in 0..=32 {
            let cz = stream.center_z(vx as f64).round() as i32;
            if (0..=32).contains(&cz) {
                on_stream += field.vertex(vx, cz) as f64;
                samples += 1;
            }
        }
        let overall: f64 =
            field.heights.iter().map(|&h| h as f64).sum::<f64>() / field.heights.len() as f64;
        assert!(samples > 0);
        assert!(
            on_stream / (samples as f64) < overall,
            "stream centerline should be carved below average terrain"
        );
    }

    #[test]
    fn stream_centerline_meanders() {
        let field = TerrainField::generate(11, 48, 48);
        let stream = field.stream();
        let zs: Vec<f64> = (0..48).map(|x| stream.center_z(x as f64)).collect();
        let min = zs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = zs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(
            max - min > 0.5,
            "centerline should meander (span {})",
            max - min
        );
    }

    #[test]
    fn tile_height_is_corner_average() {
        let field = TerrainField::generate(5, 8, 8);
        let expected = (field.vertex(2, 3)
            + field.vertex(3, 3)
            + field.vertex(2, 4)
            + field.vertex(3, 4))
            * 0.25;
        assert_eq!(field.tile_height(2, 3), expected);
    }
}
