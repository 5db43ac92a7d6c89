//! Example: decode a toy bigram acceptor against synthetic emissions.
//!
//! Run with:
//! `cargo run --example decode`

use lattice_prune::{intersect_dense_pruned, Arc, DenseFsaVec, FsaVec, FINAL_LABEL};

fn main() {
    // A 3-state acceptor over the symbols {0, 1}:
    // state 0 emits 0s, state 1 emits 1s, either may finish.
    let graph = FsaVec::from_fsas(vec![vec![
        vec![
            Arc { src_state: 0, dest_state: 0, label: 0, score: -0.1 },
            Arc { src_state: 0, dest_state: 1, label: 1, score: -0.7 },
            Arc { src_state: 0, dest_state: 2, label: FINAL_LABEL, score: 0.0 },
        ],
        vec![
            Arc { src_state: 1, dest_state: 1, label: 1, score: -0.1 },
            Arc { src_state: 1, dest_state: 0, label: 0, score: -0.7 },
            Arc { src_state: 1, dest_state: 2, label: FINAL_LABEL, score: 0.0 },
        ],
        vec![],
    ]]);

    // Six frames that clearly favour 0 0 1 1 1 0, then the final row.
    let neg = f32::NEG_INFINITY;
    let prefer = |sym: usize| -> [f32; 3] {
        let mut row = [neg, -2.0, -2.0];
        row[sym + 1] = -0.1;
        row
    };
    let mut rows = Vec::new();
    for &sym in &[0usize, 0, 1, 1, 1, 0] {
        rows.extend_from_slice(&prefer(sym));
    }
    rows.extend_from_slice(&[0.0, neg, neg]);
    let emissions = DenseFsaVec::new(&[7], 3, rows);

    let (lattices, arc_map_a, _) = intersect_dense_pruned(&graph, &emissions, 5.0, 3.0, 1, 16);

    println!("lattice arcs (one fsa):");
    for (i, arc) in lattices.arcs().iter().enumerate() {
        println!(
            "  {:2} -> {:2}  label {:2}  score {:6.2}  (graph arc {})",
            arc.src_state, arc.dest_state, arc.label, arc.score, arc_map_a[i]
        );
    }
}
