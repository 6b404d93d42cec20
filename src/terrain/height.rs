//! Layered height field: octave sum, remap curve and terrain vertices.

use glam::Vec3;
use serde::Deserialize;

use crate::noise::{self, MinStdRand, Permutation};
use crate::params::TerrainParams;

/// One permutation table per octave, derived from a single seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSeed {
    seed: u32,
    permutations: Vec<Permutation>,
}

impl WorldSeed {
    /// Derive `octaves` tables from `seed`, each seeded by the next LCG output
    pub fn new(seed: u32, octaves: u32) -> Self {
        let mut rng = MinStdRand::new(seed);
        let permutations = (0..octaves)
            .map(|_| noise::create_permutation(rng.next_u32()))
            .collect();
        Self { seed, permutations }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn octaves(&self) -> usize {
        self.permutations.len()
    }

    /// Tables in octave order (base period first)
    pub fn permutations(&self) -> &[Permutation] {
        &self.permutations
    }
}

/// Piecewise linear remap of the normalized octave sum
///
/// Breakpoints are `[input, output]` pairs with strictly increasing inputs.
/// Inputs below the first or above the last breakpoint clamp to its output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeightCurve {
    points: Vec<[f32; 2]>,
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self {
            points: vec![
                [-1.0, -0.3],
                [0.0, 0.0],
                [0.1, 0.02], // lowlands flatten out near the water line
                [0.25, 0.15],
                [0.4, 0.55], // cliffs
                [1.0, 1.0],
            ],
        }
    }
}

impl HeightCurve {
    pub fn new(points: Vec<[f32; 2]>) -> Result<Self, String> {
        let curve = Self { points };
        curve.validate()?;
        Ok(curve)
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.points.len() < 2 {
            return Err(format!(
                "height curve needs at least 2 points, got {}",
                self.points.len()
            ));
        }
        if self.points.iter().flatten().any(|v| !v.is_finite()) {
            return Err("height curve points must be finite".to_string());
        }
        for pair in self.points.windows(2) {
            if pair[1][0] <= pair[0][0] {
                return Err(format!(
                    "height curve inputs must increase: {} then {}",
                    pair[0][0], pair[1][0]
                ));
            }
        }
        Ok(())
    }

    /// Remap `h` through the curve; NaN maps to the first output
    pub fn apply(&self, h: f32) -> f32 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if h.is_nan() || h <= first[0] {
            return first[1];
        }
        if h >= last[0] {
            return last[1];
        }

        // First segment whose upper breakpoint is above h
        let upper = self.points.partition_point(|p| p[0] <= h);
        let [x0, y0] = self.points[upper - 1];
        let [x1, y1] = self.points[upper];
        remap(h, x0, x1, y0, y1)
    }
}

/// Linear map of `x` from `[lower_x, upper_x]` onto `[a, b]`
pub fn remap(x: f32, lower_x: f32, upper_x: f32, a: f32, b: f32) -> f32 {
    (x - lower_x) / (upper_x - lower_x) * (b - a) + a
}

/// Shaped, normalized terrain height at noise-space `(x, z)`
pub fn height(x: f32, z: f32, seed: &WorldSeed, params: &TerrainParams) -> f32 {
    let mut sum = 0.0;
    let mut total_amplitude = 0.0;
    let mut period = params.base_period;
    let mut amplitude = params.base_amplitude;

    for table in seed.permutations() {
        sum += noise::noise(x / period, z / period, table) * amplitude;
        total_amplitude += amplitude;
        period /= 2.0;
        amplitude /= 2.0;
    }

    params.curve.apply(sum / total_amplitude)
}

/// [`height`] pushed at least `shore_bias` away from zero
pub fn terrain_height(x: f32, z: f32, seed: &WorldSeed, params: &TerrainParams) -> f32 {
    let h = height(x, z, seed, params);
    if h.abs() >= params.shore_bias {
        h
    } else if h < 0.0 {
        -params.shore_bias
    } else {
        params.shore_bias
    }
}

/// Terrain point at noise-space `(x, z)` with the height scaled to `max_height`
pub fn terrain_vertex(x: f32, z: f32, seed: &WorldSeed, params: &TerrainParams) -> Vec3 {
    Vec3::new(x, terrain_height(x, z, seed, params) * params.max_height, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_seed_octaves() {
        let seed = WorldSeed::new(42, 5);
        assert_eq!(seed.octaves(), 5);
        assert_eq!(seed.seed(), 42);
        // Octave tables are derived independently
        assert_ne!(seed.permutations()[0], seed.permutations()[1]);
    }

    #[test]
    fn test_world_seed_reproducible() {
        assert_eq!(WorldSeed::new(9, 8), WorldSeed::new(9, 8));
        assert_ne!(WorldSeed::new(9, 8), WorldSeed::new(10, 8));
    }

    #[test]
    fn test_curve_hits_breakpoints() {
        let curve = HeightCurve::default();
        for &[input, output] in curve.points() {
            assert!((curve.apply(input) - output).abs() < 1e-6);
        }
    }

    #[test]
    fn test_curve_clamps() {
        let curve = HeightCurve::default();
        assert_eq!(curve.apply(-5.0), -0.3);
        assert_eq!(curve.apply(5.0), 1.0);
        assert_eq!(curve.apply(f32::NAN), -0.3);
    }

    #[test]
    fn test_curve_midpoint() {
        let curve = HeightCurve::new(vec![[0.0, 0.0], [1.0, 10.0]]).unwrap();
        assert!((curve.apply(0.25) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_curve_monotone_default() {
        let curve = HeightCurve::default();
        let mut prev = curve.apply(-1.0);
        for i in 1..=200 {
            let h = -1.0 + i as f32 * 0.01;
            let v = curve.apply(h);
            assert!(v >= prev, "curve decreases at {}", h);
            prev = v;
        }
    }

    #[test]
    fn test_curve_flat_near_water_steep_at_cliffs() {
        let curve = HeightCurve::default();
        let lowland_slope = (curve.apply(0.1) - curve.apply(0.0)) / 0.1;
        let cliff_slope = (curve.apply(0.4) - curve.apply(0.25)) / 0.15;
        assert!(lowland_slope < 1.0);
        assert!(cliff_slope > 1.0);
    }

    #[test]
    fn test_curve_validation() {
        assert!(HeightCurve::new(vec![[0.0, 0.0]]).is_err());
        assert!(HeightCurve::new(vec![[0.0, 0.0], [0.0, 1.0]]).is_err());
        assert!(HeightCurve::new(vec![[0.0, 0.0], [f32::NAN, 1.0]]).is_err());
    }

    #[test]
    fn test_height_within_curve_range() {
        let params = TerrainParams::default();
        let seed = WorldSeed::new(1, params.octaves);
        for i in 0..500 {
            let x = i as f32 * 37.3 - 9000.0;
            let z = i as f32 * -11.9 + 400.0;
            let h = height(x, z, &seed, &params);
            assert!((-0.3..=1.0).contains(&h), "height {} out of range", h);
        }
    }

    #[test]
    fn test_height_far_from_origin() {
        let params = TerrainParams::default();
        let seed = WorldSeed::new(42, params.octaves);
        for (x, z) in [(2.0e10, 0.0), (0.0, -2.0e10), (3.0e38, 3.0e38)] {
            let h = height(x, z, &seed, &params);
            assert!((-0.3..=1.0).contains(&h), "height {} at ({}, {})", h, x, z);
        }
    }

    #[test]
    fn test_terrain_height_never_zero() {
        let params = TerrainParams::default();
        let seed = WorldSeed::new(5, params.octaves);
        // The origin is a lattice point of every octave, so the raw sum is zero
        assert_eq!(height(0.0, 0.0, &seed, &params), 0.0);
        assert_eq!(terrain_height(0.0, 0.0, &seed, &params), params.shore_bias);
    }

    #[test]
    fn test_terrain_vertex_scales_height() {
        let params = TerrainParams::default();
        let seed = WorldSeed::new(5, params.octaves);
        let v = terrain_vertex(123.0, -45.0, &seed, &params);
        assert_eq!(v.x, 123.0);
        assert_eq!(v.z, -45.0);
        assert_eq!(v.y, terrain_height(123.0, -45.0, &seed, &params) * params.max_height);
    }
}
