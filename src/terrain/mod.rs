//! Infinite terrain: height field, chunk meshes and chunk streaming.

mod height;
mod mesh;
mod system;
mod table;

// Re-export public types
pub use height::{height, remap, terrain_height, terrain_vertex, HeightCurve, WorldSeed};
pub use mesh::{
    build_chunk_mesh, decode_normal, encode_normal, estimate_normal, grid_indices,
    sample_position, ChunkMesh, TerrainVertex,
};
pub use system::TerrainSystem;
pub use table::{
    chunk_at, ChunkCoord, ChunkSlot, ChunkTable, ChunkUploader, MeshStore, PendingChunk,
    UpdateOutcome,
};
