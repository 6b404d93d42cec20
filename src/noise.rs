//! Seeded permutation tables and 2D gradient noise.
//!
//! Everything here is a pure function of the seed and the sample coordinates,
//! so the same seed always reproduces the same terrain.

use std::f32::consts::TAU;

/// Number of entries in a permutation table
pub const PERMUTATION_SIZE: usize = 256;

/// Lattice hash multiplier along the first axis
const HASH_X: i32 = 713;

/// Lattice hash multiplier along the second axis
const HASH_Y: i32 = 631;

/// Random bijection of `0..=255`, used to hash lattice points
#[derive(Clone, PartialEq, Eq)]
pub struct Permutation([u8; PERMUTATION_SIZE]);

impl Permutation {
    /// Raw table entries
    pub fn as_slice(&self) -> &[u8; PERMUTATION_SIZE] {
        &self.0
    }

    /// Look up a table entry
    pub fn get(&self, index: usize) -> u8 {
        self.0[index]
    }
}

impl std::fmt::Debug for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Permutation({:?}..)", &self.0[..8])
    }
}

/// MINSTD linear congruential generator (multiplier 48271, modulus 2^31 - 1)
#[derive(Debug, Clone)]
pub struct MinStdRand {
    state: u64,
}

impl MinStdRand {
    const MULTIPLIER: u64 = 48_271;
    const MODULUS: u64 = 2_147_483_647;

    /// Seed the generator. A state of zero would stick at zero, so it becomes 1.
    pub fn new(seed: u32) -> Self {
        let state = seed as u64 % Self::MODULUS;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// Advance and return the next value in `1..2^31 - 1`
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Self::MULTIPLIER % Self::MODULUS;
        self.state as u32
    }
}

/// Shuffle `0..=255` with a generator seeded from `seed`.
///
/// Each step picks a random index among the values not yet emitted and moves
/// the last remaining value into the hole it leaves.
pub fn create_permutation(seed: u32) -> Permutation {
    let mut values: [u8; PERMUTATION_SIZE] = std::array::from_fn(|i| i as u8);
    let mut table = [0u8; PERMUTATION_SIZE];
    let mut rng = MinStdRand::new(seed);

    for (count, slot) in (1..=PERMUTATION_SIZE).rev().zip(table.iter_mut()) {
        let pick = rng.next_u32() as usize % count;
        *slot = values[pick];
        values[pick] = values[count - 1];
    }

    Permutation(table)
}

/// Pseudo-random gradient angle in `[0, 2π)` for an integer lattice point
pub fn random_gradient_angle(grid_x: i32, grid_y: i32, table: &Permutation) -> f32 {
    let hash = grid_x
        .wrapping_mul(HASH_X)
        .wrapping_add(grid_y.wrapping_mul(HASH_Y));
    let index = hash.rem_euclid(PERMUTATION_SIZE as i32) as usize;
    table.get(index) as f32 / PERMUTATION_SIZE as f32 * TAU
}

/// Cubic (smoothstep) interpolation between `a` and `b`, `t` in `[0, 1]`
pub fn interpolate(a: f32, b: f32, t: f32) -> f32 {
    (b - a) * (3.0 - t * 2.0) * t * t + a
}

fn dot_gradient(grid_x: i32, grid_y: i32, dx: f32, dy: f32, table: &Permutation) -> f32 {
    let angle = random_gradient_angle(grid_x, grid_y, table);
    angle.cos() * dx + angle.sin() * dy
}

/// 2D gradient noise at `(x, y)`.
///
/// Output is roughly in `[-1, 1]` and is zero on every lattice point. Lattice
/// indices wrap at the `i32` range, so any finite input is defined.
pub fn noise(x: f32, y: f32, table: &Permutation) -> f32 {
    let (x0, y0) = (x.floor(), y.floor());
    let (x1, y1) = (x0 + 1.0, y0 + 1.0);

    let left = x0 as i32;
    let lower = y0 as i32;
    let right = left.wrapping_add(1);
    let upper = lower.wrapping_add(1);

    let lower_left = dot_gradient(left, lower, x - x0, y - y0, table);
    let lower_right = dot_gradient(right, lower, x - x1, y - y0, table);
    let upper_left = dot_gradient(left, upper, x - x0, y - y1, table);
    let upper_right = dot_gradient(right, upper, x - x1, y - y1, table);

    let tx = x - x0;
    let ty = y - y0;
    let lerped_lower = interpolate(lower_left, lower_right, tx);
    let lerped_upper = interpolate(upper_left, upper_right, tx);
    interpolate(lerped_lower, lerped_upper, ty)
}
