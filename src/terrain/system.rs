//! High-level terrain system: seed, parameters and chunk table in one place.

use glam::Vec3;

use super::height::{terrain_height, WorldSeed};
use super::table::{chunk_at, ChunkTable, ChunkUploader, UpdateOutcome};
use crate::params::TerrainParams;

/// Streaming terrain around a moving camera
pub struct TerrainSystem<B> {
    table: ChunkTable<B>,
    seed: WorldSeed,
    params: TerrainParams,
}

impl<B> TerrainSystem<B> {
    /// Derive the world seed and build the window around `start_pos`
    pub fn new<U>(seed: u32, params: TerrainParams, start_pos: Vec3, uploader: &mut U) -> Self
    where
        U: ChunkUploader<Buffers = B>,
    {
        let seed = WorldSeed::new(seed, params.octaves);
        let center = chunk_at(start_pos.x, start_pos.z, &params);
        let mut table = ChunkTable::build(&params, &seed, center, uploader);
        table.set_center(center.x, center.z);
        Self {
            table,
            seed,
            params,
        }
    }

    /// Stream chunks for this frame's camera position
    ///
    /// # Arguments
    /// * `camera_pos` - Camera position in world space (only x/z are used)
    /// * `uploader` - Receiver of any chunk rebuilt this frame
    pub fn update<U>(&mut self, camera_pos: Vec3, uploader: &mut U) -> UpdateOutcome
    where
        U: ChunkUploader<Buffers = B>,
    {
        self.table
            .update(camera_pos.x, camera_pos.z, &self.seed, uploader)
    }

    /// Terrain surface height in meters at world `(x, z)`
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let to_noise = 1.0 / self.params.world_per_noise();
        terrain_height(x * to_noise, z * to_noise, &self.seed, &self.params) * self.params.max_height
    }

    /// Resident chunks and their buffers
    pub fn table(&self) -> &ChunkTable<B> {
        &self.table
    }

    pub fn seed(&self) -> &WorldSeed {
        &self.seed
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }
}
