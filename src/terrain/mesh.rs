//! Chunk mesh builder: samples the height field over one chunk and packs a
//! compressed vertex buffer plus a triangle index list.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::height::{terrain_height, terrain_vertex, WorldSeed};
use super::table::ChunkCoord;
use crate::params::TerrainParams;

/// Compressed terrain vertex (12 bytes)
///
/// x/z are implicit in the vertex index; the normal is stored as two angles.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// Height divided by `max_height`
    pub height: f32,
    /// Normal direction around +y, `atan2(n.z, n.x)`
    pub azimuth: f32,
    /// Normal angle above the horizontal plane, `asin(n.y)`
    pub elevation: f32,
}

/// Vertex and index data for one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Compress a unit normal to `(azimuth, elevation)`
pub fn encode_normal(n: Vec3) -> (f32, f32) {
    (n.z.atan2(n.x), n.y.clamp(-1.0, 1.0).asin())
}

/// Expand `(azimuth, elevation)` back into a unit normal
pub fn decode_normal(azimuth: f32, elevation: f32) -> Vec3 {
    let horizontal = elevation.cos();
    Vec3::new(
        horizontal * azimuth.cos(),
        elevation.sin(),
        horizontal * azimuth.sin(),
    )
}

/// Triangle indices for a `precision` x `precision` cell grid
///
/// Counter-clockwise when seen from +y: rows run along +z, columns along +x.
pub fn grid_indices(precision: u32) -> Vec<u32> {
    let verts_per_edge = precision + 1;
    let mut indices = Vec::with_capacity(precision as usize * precision as usize * 6);

    for row in 0..precision {
        for col in 0..precision {
            let top_left = row * verts_per_edge + col;
            let top_right = top_left + 1;
            let bottom_left = top_left + verts_per_edge;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    indices
}

/// Noise-space position of grid sample `(col, row)` in chunk `coord`
pub fn sample_position(coord: ChunkCoord, col: u32, row: u32, params: &TerrainParams) -> (f32, f32) {
    let size = params.chunk_half_size;
    let step = 2.0 * size / params.precision as f32;
    let x = 2.0 * size * coord.x as f32 - size + col as f32 * step;
    let z = 2.0 * size * coord.z as f32 - size + row as f32 * step;
    (x, z)
}

/// Surface normal at noise-space `(x, z)` by finite differences, in world units
pub fn estimate_normal(x: f32, z: f32, seed: &WorldSeed, params: &TerrainParams) -> Vec3 {
    let offset = params.normal_offset;
    let horizontal = offset * params.world_per_noise();

    let center = terrain_vertex(x, z, seed, params).y;
    let along_x = terrain_vertex(x + offset, z, seed, params).y;
    let along_z = terrain_vertex(x, z + offset, seed, params).y;

    let dx = Vec3::new(horizontal, along_x - center, 0.0);
    let dz = Vec3::new(0.0, along_z - center, horizontal);
    dz.cross(dx).normalize()
}

/// Build the mesh for chunk `coord`
///
/// Pure function of its inputs: the same seed, coordinate and parameters give
/// byte-identical buffers.
pub fn build_chunk_mesh(seed: &WorldSeed, coord: ChunkCoord, params: &TerrainParams) -> ChunkMesh {
    let verts_per_edge = params.verts_per_edge();
    let mut vertices = Vec::with_capacity(params.vertex_count());

    for row in 0..verts_per_edge {
        for col in 0..verts_per_edge {
            let (x, z) = sample_position(coord, col, row, params);
            let normal = estimate_normal(x, z, seed, params);
            let (azimuth, elevation) = encode_normal(normal);

            vertices.push(TerrainVertex {
                height: terrain_height(x, z, seed, params),
                azimuth,
                elevation,
            });
        }
    }

    ChunkMesh {
        vertices,
        indices: grid_indices(params.precision),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> TerrainParams {
        TerrainParams {
            precision: 8,
            octaves: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_vertex_is_packed() {
        assert_eq!(std::mem::size_of::<TerrainVertex>(), 12);
    }

    #[test]
    fn test_mesh_sizes() {
        let params = small_params();
        let seed = WorldSeed::new(42, params.octaves);
        let mesh = build_chunk_mesh(&seed, ChunkCoord::new(3, -2), &params);

        // Check vertex count: (precision + 1)^2
        assert_eq!(mesh.vertices.len(), 81);

        // Check index count: precision^2 * 2 triangles * 3 indices
        assert_eq!(mesh.indices.len(), params.index_count());
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_index_list_same_for_every_chunk() {
        let params = small_params();
        let seed = WorldSeed::new(42, params.octaves);
        let shared = grid_indices(params.precision);
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-7, 12), ChunkCoord::new(500, -3)] {
            assert_eq!(build_chunk_mesh(&seed, coord, &params).indices, shared);
        }
    }

    #[test]
    fn test_triangles_face_up() {
        let precision = 5;
        let indices = grid_indices(precision);
        let flat = |i: u32| {
            let col = (i % (precision + 1)) as f32;
            let row = (i / (precision + 1)) as f32;
            Vec3::new(col, 0.0, row)
        };
        for tri in indices.chunks(3) {
            let (a, b, c) = (flat(tri[0]), flat(tri[1]), flat(tri[2]));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0, "triangle {:?} faces down", tri);
        }
    }

    #[test]
    fn test_normal_round_trip() {
        for n in [
            Vec3::Y,
            Vec3::new(0.3, 0.9, -0.2).normalize(),
            Vec3::new(-0.7, 0.2, 0.5).normalize(),
        ] {
            let (azimuth, elevation) = encode_normal(n);
            let back = decode_normal(azimuth, elevation);
            assert!((back - n).length() < 1e-5, "{:?} decoded as {:?}", n, back);
        }
    }

    #[test]
    fn test_normals_point_up() {
        let params = small_params();
        let seed = WorldSeed::new(7, params.octaves);
        let mesh = build_chunk_mesh(&seed, ChunkCoord::new(0, 1), &params);
        for v in &mesh.vertices {
            assert!(v.elevation > 0.0, "normal below horizon: {:?}", v);
            assert!(decode_normal(v.azimuth, v.elevation).is_normalized());
        }
    }

    #[test]
    fn test_flat_ground_normal() {
        let params = TerrainParams {
            curve: crate::terrain::HeightCurve::new(vec![[-1.0, 0.5], [1.0, 0.5]]).unwrap(),
            ..small_params()
        };
        let seed = WorldSeed::new(1, params.octaves);
        let n = estimate_normal(10.0, 20.0, &seed, &params);
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_neighbor_chunks_share_edges() {
        let params = small_params();
        let seed = WorldSeed::new(11, params.octaves);
        let left = build_chunk_mesh(&seed, ChunkCoord::new(0, 0), &params);
        let right = build_chunk_mesh(&seed, ChunkCoord::new(1, 0), &params);
        let edge = params.verts_per_edge() as usize;
        for row in 0..edge {
            let a = left.vertices[row * edge + edge - 1];
            let b = right.vertices[row * edge];
            assert!((a.height - b.height).abs() < 1e-4, "seam at row {}", row);
        }
    }

    #[test]
    fn test_sample_positions_span_chunk() {
        let params = small_params();
        let (x0, z0) = sample_position(ChunkCoord::new(1, -1), 0, 0, &params);
        let (x1, z1) = sample_position(ChunkCoord::new(1, -1), 8, 8, &params);
        assert_eq!((x0, z0), (48.0, -144.0));
        assert_eq!((x1, z1), (144.0, -48.0));
    }
}
