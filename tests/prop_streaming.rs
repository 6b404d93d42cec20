use std::collections::HashSet;

use infworld::params::TerrainParams;
use infworld::terrain::{
    build_chunk_mesh, chunk_at, ChunkCoord, ChunkMesh, ChunkTable, MeshStore, UpdateOutcome, WorldSeed,
};
use proptest::prelude::*;

fn small_params(range: u32) -> TerrainParams {
    TerrainParams {
        precision: 2,
        octaves: 2,
        range,
        ..Default::default()
    }
}

fn resident<B>(table: &ChunkTable<B>) -> HashSet<ChunkCoord> {
    table.slots().map(|s| s.coord).collect()
}

fn drain(table: &mut ChunkTable<ChunkMesh>, x: f32, z: f32, seed: &WorldSeed, store: &mut MeshStore) {
    while !table.is_settled() {
        table.update(x, z, seed, store);
    }
}

proptest! {
    // After any walk, once the queue drains the slots hold exactly the window
    #[test]
    fn window_invariant_after_random_walk(
        range in 0u32..3,
        steps in prop::collection::vec((-300.0f32..300.0, -300.0f32..300.0), 1..12),
    ) {
        let params = small_params(range);
        let seed = WorldSeed::new(7, params.octaves);
        let mut store = MeshStore::new();
        let mut table = ChunkTable::build(&params, &seed, ChunkCoord::default(), &mut store);

        let (mut x, mut z) = (0.0f32, 0.0f32);
        for (dx, dz) in steps {
            x += dx;
            z += dz;
            table.update(x, z, &seed, &mut store);
            prop_assert!(table.count() == params.chunk_count());
            drain(&mut table, x, z, &seed, &mut store);

            let expected: HashSet<_> = table.center().window(range).collect();
            prop_assert_eq!(resident(&table), expected);
            prop_assert_eq!(table.slots().count(), params.chunk_count());
        }

        // A final check settles onto the camera's chunk
        table.update(x, z, &seed, &mut store);
        drain(&mut table, x, z, &seed, &mut store);
        prop_assert_eq!(table.center(), chunk_at(x, z, &params));
    }

    // A shift needing K chunks costs exactly K regenerating updates
    #[test]
    fn regeneration_is_rate_limited(
        cx in -6i32..6,
        cz in -6i32..6,
    ) {
        let params = small_params(2);
        let seed = WorldSeed::new(11, params.octaves);
        let mut store = MeshStore::new();
        let mut table = ChunkTable::build(&params, &seed, ChunkCoord::default(), &mut store);

        let size = 2.0 * params.chunk_half_extent_m();
        let (x, z) = (cx as f32 * size, cz as f32 * size);

        let queued = match table.update(x, z, &seed, &mut store) {
            UpdateOutcome::Idle => {
                prop_assert_eq!((cx, cz), (0, 0));
                return Ok(());
            }
            UpdateOutcome::Shifted { queued, .. } => queued,
            other => return Err(TestCaseError::fail(format!("unexpected {:?}", other))),
        };

        let side = params.window_side() as i32;
        let overlap = (side - cx.abs()).max(0) * (side - cz.abs()).max(0);
        prop_assert_eq!(queued as i32, side * side - overlap);

        for _ in 0..queued {
            let before = store.uploaded();
            let outcome = table.update(x, z, &seed, &mut store);
            prop_assert!(
                matches!(outcome, UpdateOutcome::Regenerated { .. }),
                "unexpected outcome {:?}",
                outcome
            );
            prop_assert_eq!(store.uploaded(), before + 1);
        }
        prop_assert_eq!(table.update(x, z, &seed, &mut store), UpdateOutcome::Idle);
    }

    // Rebuilding a chunk gives byte-identical buffers
    #[test]
    fn chunk_mesh_idempotent(
        cx in -1000i32..1000,
        cz in -1000i32..1000,
        seed in any::<u32>(),
    ) {
        let params = TerrainParams { precision: 6, ..Default::default() };
        let world = WorldSeed::new(seed, params.octaves);
        let a = build_chunk_mesh(&world, ChunkCoord::new(cx, cz), &params);
        let b = build_chunk_mesh(&world, ChunkCoord::new(cx, cz), &params);
        prop_assert_eq!(a.vertex_bytes(), b.vertex_bytes());
        prop_assert_eq!(a.index_bytes(), b.index_bytes());
    }
}
