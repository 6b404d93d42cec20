//! Terrain generation and streaming parameters.

use serde::Deserialize;

use crate::terrain::HeightCurve;

/// Largest accepted `precision`.
///
/// A chunk's index buffer is `precision^2 * 6` `u32`s (96 MiB at this value),
/// which stays inside wgpu's default 256 MiB buffer limit.
pub const MAX_PRECISION: u32 = 2048;

/// Largest accepted `range` (a 513 x 513 chunk window)
pub const MAX_RANGE: u32 = 256;

/// Terrain generation and chunk streaming parameters
///
/// Distances come in two spaces: *noise units*, in which the height field is
/// sampled, and *world units* (meters), in which chunks are drawn and the
/// camera moves.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Grid cells per chunk edge (vertices per edge = precision + 1)
    pub precision: u32,

    /// Half-width of a chunk footprint in noise units
    pub chunk_half_size: f32,

    /// World scale factor applied on top of `chunk_scale`
    pub world_scale: f32,

    /// Chunk scale; half-width of a chunk in meters is `chunk_scale * world_scale`
    pub chunk_scale: f32,

    /// Height in meters of a normalized height of 1.0
    pub max_height: f32,

    /// Period of the first octave in noise units (halves every octave)
    pub base_period: f32,

    /// Amplitude of the first octave (halves every octave)
    pub base_amplitude: f32,

    /// Number of noise octaves, one permutation table each
    pub octaves: u32,

    /// Half-width of the resident window in chunks; (2 * range + 1)^2 chunks
    pub range: u32,

    /// Finite difference step for normal estimation (noise units)
    pub normal_offset: f32,

    /// Minimum distance of normalized heights from zero (keeps land off the water plane)
    pub shore_bias: f32,

    /// Remap curve applied to the summed octaves
    pub curve: HeightCurve,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            precision: 32,
            chunk_half_size: 48.0,
            world_scale: 2.5,
            chunk_scale: 16.0, // 40m half-width chunks
            max_height: 96.0,
            base_period: 720.0,
            base_amplitude: 1.0,
            octaves: 8,
            range: 6, // 13x13 window
            normal_offset: 0.1,
            shore_bias: 0.002,
            curve: HeightCurve::default(),
        }
    }
}

impl TerrainParams {
    /// Half-width of a chunk in meters
    pub fn chunk_half_extent_m(&self) -> f32 {
        self.chunk_scale * self.world_scale
    }

    /// Meters per noise unit
    pub fn world_per_noise(&self) -> f32 {
        self.chunk_half_extent_m() / self.chunk_half_size
    }

    /// Vertices along one chunk edge
    pub fn verts_per_edge(&self) -> u32 {
        self.precision + 1
    }

    /// Vertices per chunk mesh
    pub fn vertex_count(&self) -> usize {
        let edge = self.verts_per_edge() as usize;
        edge * edge
    }

    /// Indices per chunk mesh (two triangles per grid cell)
    pub fn index_count(&self) -> usize {
        let precision = self.precision as usize;
        precision * precision * 6
    }

    /// Chunks along one side of the resident window
    pub fn window_side(&self) -> u32 {
        2 * self.range + 1
    }

    /// Number of chunk slots in the resident window
    pub fn chunk_count(&self) -> usize {
        let side = self.window_side() as usize;
        side * side
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_PRECISION).contains(&self.precision) {
            return Err(format!(
                "terrain.precision must be in 1..={}, got {}",
                MAX_PRECISION, self.precision
            ));
        }
        if self.range > MAX_RANGE {
            return Err(format!(
                "terrain.range must be at most {}, got {}",
                MAX_RANGE, self.range
            ));
        }
        if self.octaves == 0 {
            return Err("terrain.octaves must be > 0".to_string());
        }
        let positive = [
            ("chunk_half_size", self.chunk_half_size),
            ("world_scale", self.world_scale),
            ("chunk_scale", self.chunk_scale),
            ("max_height", self.max_height),
            ("base_period", self.base_period),
            ("base_amplitude", self.base_amplitude),
            ("normal_offset", self.normal_offset),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("terrain.{} must be > 0, got {}", name, value));
            }
        }
        if !(self.shore_bias >= 0.0 && self.shore_bias < 1.0) {
            return Err(format!(
                "terrain.shore_bias must be in [0, 1), got {}",
                self.shore_bias
            ));
        }
        self.curve.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert_eq!(TerrainParams::default().validate(), Ok(()));
    }

    #[test]
    fn test_derived_sizes() {
        let params = TerrainParams {
            precision: 4,
            range: 1,
            ..Default::default()
        };
        assert_eq!(params.vertex_count(), 25);
        assert_eq!(params.index_count(), 96);
        assert_eq!(params.chunk_count(), 9);
        assert_eq!(params.chunk_half_extent_m(), 40.0);
    }

    #[test]
    fn test_rejects_huge_precision() {
        let params = TerrainParams {
            precision: 30_000,
            ..Default::default()
        };
        assert!(params.validate().unwrap_err().contains("precision"));

        let params = TerrainParams {
            precision: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        // The largest accepted grid still indexes within u32
        let params = TerrainParams {
            precision: MAX_PRECISION,
            ..Default::default()
        };
        assert_eq!(params.validate(), Ok(()));
        assert!(params.vertex_count() <= u32::MAX as usize);
        assert!(params.index_count() * 4 <= 256 << 20);
    }

    #[test]
    fn test_rejects_huge_range() {
        let params = TerrainParams {
            range: MAX_RANGE + 1,
            ..Default::default()
        };
        assert!(params.validate().unwrap_err().contains("range"));
    }

    #[test]
    fn test_rejects_zero_octaves() {
        let params = TerrainParams {
            octaves: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_scale() {
        let params = TerrainParams {
            world_scale: -1.0,
            ..Default::default()
        };
        assert!(params.validate().unwrap_err().contains("world_scale"));
    }
}
