//! Chunk table: the fixed window of resident chunks around the viewpoint.
//!
//! The table owns one slot per chunk of a `(2 * range + 1)^2` window. When the
//! camera crosses into another chunk, the slots that fell out of range are
//! queued for reuse, and each later `update` rebuilds exactly one of them. This
//! keeps the per-frame cost at one chunk build no matter how far the window
//! moved.

use std::collections::VecDeque;

use log::{debug, info};

use super::height::WorldSeed;
use super::mesh::{build_chunk_mesh, ChunkMesh};
use crate::params::TerrainParams;

/// Position of a chunk in the chunk grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// max(|dx|, |dz|), with differences taken modulo 2^32 like the grid itself
    pub fn chebyshev_distance(self, other: ChunkCoord) -> u32 {
        let dx = self.x.wrapping_sub(other.x).unsigned_abs();
        let dz = self.z.wrapping_sub(other.z).unsigned_abs();
        dx.max(dz)
    }

    /// Whether `self` lies in the window of half-width `range` around `center`
    pub fn within(self, center: ChunkCoord, range: u32) -> bool {
        self.chebyshev_distance(center) <= range
    }

    /// Coordinates of the window around `self`, row-major (x outer, z inner)
    ///
    /// Coordinates wrap at the `i32` range, so the window always has
    /// `(2 * range + 1)^2` entries.
    pub fn window(self, range: u32) -> impl Iterator<Item = ChunkCoord> {
        let r = range as i32;
        (-r..=r).flat_map(move |dx| {
            (-r..=r).map(move |dz| ChunkCoord::new(self.x.wrapping_add(dx), self.z.wrapping_add(dz)))
        })
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Chunk containing world-space `(x, z)`
pub fn chunk_at(x: f32, z: f32, params: &TerrainParams) -> ChunkCoord {
    let half = params.chunk_half_extent_m();
    ChunkCoord::new(
        ((x + half) / (2.0 * half)).floor() as i32,
        ((z + half) / (2.0 * half)).floor() as i32,
    )
}

/// Graphics-side receiver of chunk meshes
///
/// Both calls must return only once the data is usable for drawing.
pub trait ChunkUploader {
    /// Per-slot buffer handles
    type Buffers;

    /// Allocate and fill the buffers of a slot while the table is built
    fn create(&mut self, slot: usize, coord: ChunkCoord, mesh: &ChunkMesh) -> Self::Buffers;

    /// Replace the contents of an existing slot
    fn upload(&mut self, slot: usize, buffers: &mut Self::Buffers, coord: ChunkCoord, mesh: &ChunkMesh);
}

/// One resident chunk
#[derive(Debug)]
pub struct ChunkSlot<B> {
    pub coord: ChunkCoord,
    pub buffers: B,
}

/// Queued regeneration: rebuild `slot` as chunk `coord`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChunk {
    pub slot: usize,
    pub coord: ChunkCoord,
}

/// What a call to [`ChunkTable::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Camera still in the center chunk and nothing queued
    Idle,
    /// Camera entered a new chunk; `queued` slots were scheduled for rebuild
    Shifted { center: ChunkCoord, queued: usize },
    /// One queued chunk was built and uploaded
    Regenerated { slot: usize, coord: ChunkCoord },
}

/// Fixed window of resident chunks with incremental regeneration
pub struct ChunkTable<B> {
    slots: Vec<ChunkSlot<B>>,
    pending: VecDeque<PendingChunk>,
    center: ChunkCoord,
    range: u32,
    params: TerrainParams,
}

impl<B> ChunkTable<B> {
    /// Build every chunk of the window around `center`, row-major
    pub fn build<U>(params: &TerrainParams, seed: &WorldSeed, center: ChunkCoord, uploader: &mut U) -> Self
    where
        U: ChunkUploader<Buffers = B>,
    {
        let range = params.range;
        let slots: Vec<ChunkSlot<B>> = center
            .window(range)
            .enumerate()
            .map(|(slot, coord)| {
                let mesh = build_chunk_mesh(seed, coord, params);
                ChunkSlot {
                    coord,
                    buffers: uploader.create(slot, coord, &mesh),
                }
            })
            .collect();

        info!(
            "Built {} chunks around {} (range {}, seed {})",
            slots.len(),
            center,
            range,
            seed.seed()
        );

        Self {
            slots,
            pending: VecDeque::new(),
            center,
            range,
            params: params.clone(),
        }
    }

    /// Force the center chunk without touching any slot
    pub fn set_center(&mut self, x: i32, z: i32) {
        self.center = ChunkCoord::new(x, z);
    }

    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    /// Number of slots, always `(2 * range + 1)^2`
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Chunk held by `slot`. Panics if `slot >= count()`.
    pub fn position(&self, slot: usize) -> ChunkCoord {
        self.slots[slot].coord
    }

    /// Slot record. Panics if `slot >= count()`.
    pub fn slot(&self, slot: usize) -> &ChunkSlot<B> {
        &self.slots[slot]
    }

    pub fn slots(&self) -> impl Iterator<Item = &ChunkSlot<B>> {
        self.slots.iter()
    }

    /// Queued regenerations, next first
    pub fn pending(&self) -> impl Iterator<Item = &PendingChunk> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// No regeneration queued: resident chunks are exactly the window
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance streaming by one step for a camera at world `(camera_x, camera_z)`
    ///
    /// Builds at most one chunk per call. A window shift is only detected once
    /// the previous shift's work queue has drained.
    pub fn update<U>(&mut self, camera_x: f32, camera_z: f32, seed: &WorldSeed, uploader: &mut U) -> UpdateOutcome
    where
        U: ChunkUploader<Buffers = B>,
    {
        if let Some(PendingChunk { slot, coord }) = self.pending.pop_front() {
            let mesh = build_chunk_mesh(seed, coord, &self.params);
            let record = &mut self.slots[slot];
            uploader.upload(slot, &mut record.buffers, coord, &mesh);
            debug!("Regenerated slot {} as chunk {} ({} left)", slot, coord, self.pending.len());
            record.coord = coord;
            return UpdateOutcome::Regenerated { slot, coord };
        }

        let new_center = chunk_at(camera_x, camera_z, &self.params);
        if new_center == self.center {
            return UpdateOutcome::Idle;
        }

        let (old_center, range) = (self.center, self.range);
        let targets = new_center
            .window(range)
            .filter(|coord| !coord.within(old_center, range));
        let free_slots: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.coord.within(new_center, range))
            .map(|(slot, _)| slot)
            .collect();

        self.pending.extend(
            free_slots
                .iter()
                .zip(targets)
                .map(|(&slot, coord)| PendingChunk { slot, coord }),
        );
        assert_eq!(
            self.pending.len(),
            free_slots.len(),
            "chunk window lost its shape around {}",
            old_center
        );

        self.center = new_center;
        info!(
            "Camera moved from chunk {} to {}: {} chunks queued",
            old_center,
            new_center,
            free_slots.len()
        );

        UpdateOutcome::Shifted {
            center: new_center,
            queued: free_slots.len(),
        }
    }
}

/// In-memory uploader whose buffers are the meshes themselves
#[derive(Debug, Default)]
pub struct MeshStore {
    created: usize,
    uploaded: usize,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots filled while building the table
    pub fn created(&self) -> usize {
        self.created
    }

    /// Regenerations since the table was built
    pub fn uploaded(&self) -> usize {
        self.uploaded
    }
}

impl ChunkUploader for MeshStore {
    type Buffers = ChunkMesh;

    fn create(&mut self, _slot: usize, _coord: ChunkCoord, mesh: &ChunkMesh) -> ChunkMesh {
        self.created += 1;
        mesh.clone()
    }

    fn upload(&mut self, _slot: usize, buffers: &mut ChunkMesh, _coord: ChunkCoord, mesh: &ChunkMesh) {
        self.uploaded += 1;
        buffers.clone_from(mesh);
    }
}
