#![cfg(feature = "parallel")]

use lattice_prune::{
    intersect_dense_pruned_with, Arc, Context, DenseFsaVec, FsaVec, FINAL_LABEL,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const NEG: f32 = f32::NEG_INFINITY;

/// A random left-to-right-ish graph with loops: states 0..n, final n.
fn random_graph(rng: &mut StdRng, n: u32, vocab: i32) -> FsaVec {
    let mut states: Vec<Vec<Arc>> = vec![Vec::new(); n as usize + 1];
    for src in 0..n {
        let fanout = rng.gen_range(1..4);
        for _ in 0..fanout {
            let dest = rng.gen_range(0..n);
            states[src as usize].push(Arc {
                src_state: src,
                dest_state: dest,
                label: rng.gen_range(0..vocab),
                score: rng.gen_range(-200..200) as f32 / 100.0,
            });
        }
        if rng.gen_bool(0.4) || src == n - 1 {
            states[src as usize].push(Arc {
                src_state: src,
                dest_state: n,
                label: FINAL_LABEL,
                score: 0.0,
            });
        }
    }
    FsaVec::from_fsas(vec![states])
}

fn random_emissions(rng: &mut StdRng, frames: &[usize], cols: usize) -> DenseFsaVec {
    let mut rows = Vec::new();
    for &f in frames {
        for _ in 0..f - 1 {
            rows.push(NEG);
            for _ in 1..cols {
                rows.push(rng.gen_range(-300..300) as f32 / 100.0);
            }
        }
        rows.push(0.0);
        rows.extend(std::iter::repeat(NEG).take(cols - 1));
    }
    DenseFsaVec::new(frames, cols, rows)
}

#[test]
fn parallel_lattice_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
        let n_states = rng.gen_range(2..8);
        let graph = random_graph(&mut rng, n_states, 3);
        let frames = [rng.gen_range(4..9), rng.gen_range(2..5)];
        let emissions = random_emissions(&mut rng, &frames, 4);

        let serial = intersect_dense_pruned_with(
            Context::Sequential,
            &graph,
            &emissions,
            6.0,
            6.0,
            1,
            64,
        );
        let parallel = intersect_dense_pruned_with(
            Context::Parallel,
            &graph,
            &emissions,
            6.0,
            6.0,
            1,
            64,
        );

        assert_eq!(serial.0.arcs(), parallel.0.arcs());
        assert_eq!(serial.0.state_row_splits(), parallel.0.state_row_splits());
        assert_eq!(serial.0.arc_row_splits(), parallel.0.arc_row_splits());
        assert_eq!(serial.1, parallel.1);
        assert_eq!(serial.2, parallel.2);
    }
}
