#![cfg(feature = "heavy")]

use lattice_prune::{intersect_dense_pruned, Arc, DenseFsaVec, FsaVec, FINAL_LABEL};
use rand::{rngs::StdRng, Rng, SeedableRng};

const NEG: f32 = f32::NEG_INFINITY;

#[test]
fn heavy_wide_graph_long_sequence() {
    // 5000 looping states under max_active pressure for 2000 frames.
    let n = 5000u32;
    let mut rng = StdRng::seed_from_u64(31);
    let mut states: Vec<Vec<Arc>> = Vec::with_capacity(n as usize + 2);
    states.push(
        (1..=n)
            .map(|i| Arc {
                src_state: 0,
                dest_state: i,
                label: 0,
                score: rng.gen_range(-400..0) as f32 / 100.0,
            })
            .collect(),
    );
    for i in 1..=n {
        states.push(vec![
            Arc {
                src_state: i,
                dest_state: i,
                label: 0,
                score: rng.gen_range(-100..0) as f32 / 100.0,
            },
            Arc {
                src_state: i,
                dest_state: n + 1,
                label: FINAL_LABEL,
                score: 0.0,
            },
        ]);
    }
    states.push(vec![]);
    let graph = FsaVec::from_fsas(vec![states]);

    let t = 2000usize;
    let mut rows = Vec::with_capacity((t + 1) * 2);
    for _ in 0..t {
        rows.extend_from_slice(&[NEG, 0.0]);
    }
    rows.extend_from_slice(&[0.0, NEG]);
    let emissions = DenseFsaVec::new(&[t + 1], 2, rows);

    let (ofsa, map_a, _) = intersect_dense_pruned(&graph, &emissions, 12.0, 6.0, 8, 64);
    assert!(ofsa.num_arcs() > 0, "a complete path always exists");
    assert_eq!(map_a.len(), ofsa.num_arcs());
    // The final arc survives and the lattice spans all frames.
    let state_rs = ofsa.state_row_splits();
    assert!(state_rs[1] - state_rs[0] >= t + 1);
}
