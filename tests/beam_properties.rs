use lattice_prune::{
    from_ordered, intersect_dense_pruned, to_ordered, Arc, DenseFsaVec, FsaVec, FINAL_LABEL,
};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

const NEG: f32 = f32::NEG_INFINITY;

/// Codec law over a million random bit patterns: round-trip is exact and
/// unsigned order matches float order for every non-NaN pair.
#[test]
fn ordered_codec_bijective_and_monotone() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut checked = 0u32;
    while checked < 1_000_000 {
        let x = f32::from_bits(rng.gen::<u32>());
        let y = f32::from_bits(rng.gen::<u32>());
        if x.is_nan() || y.is_nan() {
            continue;
        }
        checked += 1;
        assert_eq!(from_ordered(to_ordered(x)).to_bits(), x.to_bits());
        if x < y {
            assert!(to_ordered(x) < to_ordered(y), "{x} vs {y}");
        }
        if x == y && x.to_bits() == y.to_bits() {
            assert_eq!(to_ordered(x), to_ordered(y));
        }
    }
}

/// Unpruned max-plus intersection of one graph with one emission matrix:
/// best score of a path that consumes every row and ends in the final
/// state.
fn full_intersection_best(a: &FsaVec, g: usize, rows: &[f32], cols: usize) -> f32 {
    let state_rs = a.state_row_splits();
    let arc_rs = a.arc_row_splits();
    let n = a.num_states_of(g);
    if n == 0 {
        return NEG;
    }
    let base = state_rs[g];
    let num_rows = rows.len() / cols;
    let mut dp = vec![NEG; n];
    dp[0] = 0.0;
    for t in 0..num_rows {
        let mut next = vec![NEG; n];
        for (s, &ds) in dp.iter().enumerate() {
            if ds == NEG {
                continue;
            }
            for arc in &a.arcs()[arc_rs[base + s]..arc_rs[base + s + 1]] {
                let e = rows[t * cols + (arc.label + 1) as usize];
                let cand = ds + e + arc.score;
                let d = arc.dest_state as usize;
                if cand > next[d] {
                    next[d] = cand;
                }
            }
        }
        dp = next;
    }
    dp[n - 1]
}

/// Best start-to-final score inside one lattice of the output batch.
/// Lattice arcs only run forward in state order, so a single pass works.
fn lattice_best(ofsa: &FsaVec, f: usize) -> f32 {
    let state_rs = ofsa.state_row_splits();
    let arc_rs = ofsa.arc_row_splits();
    let n = state_rs[f + 1] - state_rs[f];
    if n == 0 {
        return NEG;
    }
    let mut dp = vec![NEG; n];
    dp[0] = 0.0;
    for s in 0..n {
        if dp[s] == NEG {
            continue;
        }
        for arc in &ofsa.arcs()[arc_rs[state_rs[f] + s]..arc_rs[state_rs[f] + s + 1]] {
            assert!(
                (arc.dest_state as usize) > s,
                "lattice arcs must run forward"
            );
            let cand = dp[s] + arc.score;
            let d = arc.dest_state as usize;
            if cand > dp[d] {
                dp[d] = cand;
            }
        }
    }
    dp[n - 1]
}

#[derive(Clone, Debug)]
struct Fixture {
    graph: FsaVec,
    emissions: DenseFsaVec,
}

/// A small random decoding problem: one graph over up to 5 states with
/// symbol arcs (labels 0..2) and at least one final arc, shared by two
/// sequences of non-increasing length over 3 emission columns.
fn fixture_strategy() -> impl Strategy<Value = Fixture> {
    let arcs = prop::collection::vec((0u32..4, 0u32..4, 0i32..2, -200i32..200), 1..10);
    let finals = prop::collection::vec((0u32..4, -100i32..100), 1..4);
    let scores = prop::collection::vec(-200i32..200, 24);
    (arcs, finals, 1usize..5, 0usize..3, scores).prop_map(
        |(arcs, finals, t_short, extra, scores)| {
            let n_mid = 4u32;
            let final_state = n_mid; // states 0..4 regular, 4 is final
            let mut states: Vec<Vec<Arc>> = vec![Vec::new(); final_state as usize + 1];
            for (src, dest, label, score) in arcs {
                let src = src % final_state;
                states[src as usize].push(Arc {
                    src_state: src,
                    dest_state: dest % final_state,
                    label,
                    score: score as f32 / 100.0,
                });
            }
            for (src, score) in finals {
                let src = src % final_state;
                states[src as usize].push(Arc {
                    src_state: src,
                    dest_state: final_state,
                    label: FINAL_LABEL,
                    score: score as f32 / 100.0,
                });
            }
            let graph = FsaVec::from_fsas(vec![states]);

            let cols = 3;
            let t_long = t_short + extra;
            let mut rows = Vec::new();
            let mut next = scores.into_iter().cycle();
            for &t_real in &[t_long, t_short] {
                for _ in 0..t_real {
                    rows.push(NEG);
                    rows.push(next.next().unwrap() as f32 / 100.0);
                    rows.push(next.next().unwrap() as f32 / 100.0);
                }
                rows.push(0.0);
                rows.push(NEG);
                rows.push(NEG);
            }
            let emissions = DenseFsaVec::new(&[t_long + 1, t_short + 1], cols, rows);
            Fixture { graph, emissions }
        },
    )
}

/// Structural no-phantom check: every lattice state except the start has
/// an incoming arc and every state except the final has an outgoing arc.
fn assert_no_phantom_states(ofsa: &FsaVec) {
    let state_rs = ofsa.state_row_splits();
    let arc_rs = ofsa.arc_row_splits();
    for f in 0..ofsa.dim0() {
        let n = state_rs[f + 1] - state_rs[f];
        if n == 0 {
            continue;
        }
        let mut indeg = vec![0usize; n];
        let mut outdeg = vec![0usize; n];
        for s in 0..n {
            for arc in &ofsa.arcs()[arc_rs[state_rs[f] + s]..arc_rs[state_rs[f] + s + 1]] {
                outdeg[s] += 1;
                indeg[arc.dest_state as usize] += 1;
            }
        }
        for s in 0..n {
            if s != 0 {
                assert!(indeg[s] > 0, "state {s} of fsa {f} has no incoming arc");
            }
            if s != n - 1 {
                assert!(outdeg[s] > 0, "state {s} of fsa {f} has no outgoing arc");
            }
        }
    }
}

proptest! {
    /// Beam safety: with a search beam wide enough to rule out forward
    /// pruning, the best complete path of every pruned lattice scores
    /// exactly the unpruned intersection optimum, and pruning leaves no
    /// phantom states behind.
    #[test]
    fn pruned_best_path_matches_full_intersection(fx in fixture_strategy()) {
        for output_beam in [2.0f32, 1e4] {
            let (ofsa, _, _) =
                intersect_dense_pruned(&fx.graph, &fx.emissions, 1e4, output_beam, 0, usize::MAX - 1);
            prop_assert_eq!(ofsa.dim0(), 2);
            for seq in 0..2 {
                let row0 = fx.emissions.row(seq, 0);
                let rows = &fx.emissions.scores()
                    [row0 * 3..(row0 + fx.emissions.frames(seq)) * 3];
                let baseline = full_intersection_best(&fx.graph, 0, rows, 3);
                let pruned = lattice_best(&ofsa, seq);
                if baseline == NEG {
                    prop_assert_eq!(pruned, NEG, "dead sequence must yield an empty lattice");
                } else {
                    prop_assert!((baseline - pruned).abs() < 1e-3,
                        "seq {}: baseline {} vs pruned {}", seq, baseline, pruned);
                }
            }
            assert_no_phantom_states(&ofsa);
        }
    }

    /// Arc maps: every output arc points back at a graph arc with the
    /// same label, and its score is that graph arc's score plus the
    /// emission entry its map_b index addresses.
    #[test]
    fn arc_maps_are_consistent(fx in fixture_strategy()) {
        let (ofsa, map_a, map_b) =
            intersect_dense_pruned(&fx.graph, &fx.emissions, 1e4, 1e4, 0, usize::MAX - 1);
        prop_assert_eq!(map_a.len(), ofsa.num_arcs());
        prop_assert_eq!(map_b.len(), ofsa.num_arcs());
        for (i, arc) in ofsa.arcs().iter().enumerate() {
            let graph_arc = fx.graph.arcs()[map_a[i]];
            prop_assert_eq!(arc.label, graph_arc.label);
            let rebuilt = graph_arc.score + fx.emissions.scores()[map_b[i]];
            prop_assert_eq!(arc.score, rebuilt);
        }
    }
}
