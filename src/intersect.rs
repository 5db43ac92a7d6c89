//! Beam-pruned intersection of decoding graphs with dense emissions.
//!
//! This module implements the two-phase algorithm:
//! 1. A forward sweep over frames that expands the arcs of each active
//!    state, applies a per-sequence dynamic-beam cutoff, and merges
//!    surviving arcs into the next frame's deduplicated state set.
//! 2. A backward sweep that scores every state's best continuation and
//!    keeps exactly the states and arcs lying within `output_beam` of the
//!    best complete path.
//!
//! The surviving arcs are then flattened into one lattice per sequence,
//! with index maps back into the decoding graphs and the emission matrix.
//!
//! All per-element work runs as [`Context`] kernels; the single point of
//! contention, merging forward scores of arcs racing into one state, uses
//! the ordered-integer atomic max from [`crate::ordered`].

use crate::context::Context;
use crate::fsa::{Arc, DenseFsaVec, FsaVec};
use crate::ordered::{from_ordered, to_ordered, AtomicOrderedMax};
use crate::ragged::{
    exclusive_sum, max_per_sublist, stack_axis1, subsample_shape4, Ragged, RaggedShape, Renumbering,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Where an arc points, across the stages of its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DestState {
    /// Destination as an idx01 into the decoding-graph states, as produced
    /// by arc expansion.
    Candidate(usize),
    /// Destination as an idx1 within the next frame's per-sequence state
    /// list; forward propagation rewrites kept arcs to this form.
    Resolved(usize),
    /// The arc fell below the cutoff.
    Pruned,
}

/// One active decoding-graph state on one frame.
#[derive(Clone, Copy, Debug)]
struct StateInfo {
    /// idx01 into the decoding-graph states.
    a_fsas_state: usize,
    /// Best score of any path reaching this state, in the ordered-integer
    /// encoding so concurrent arrivals can merge with an atomic max.
    forward_loglike: u32,
    /// Best score from this state to the final state; set by the backward
    /// sweep, `-inf` until then and for pruned states.
    backward_loglike: f32,
}

/// One expanded arc out of an active state.
#[derive(Clone, Copy, Debug)]
struct ArcInfo {
    /// idx012 into the decoding-graph arcs.
    a_fsas_arc: usize,
    /// Emission score for the arc's label plus the graph arc score.
    arc_loglike: f32,
    /// Source state's forward score plus `arc_loglike`.
    end_loglike: f32,
    dest: DestState,
}

/// The active states of one frame and, once the frame has been
/// propagated, their expanded arcs.
struct FrameInfo {
    /// Axes `[fsa][state]`.
    states: Ragged<StateInfo>,
    /// Axes `[fsa][state][arc]`; shares its top two axes with `states`.
    arcs: Option<Ragged<ArcInfo>>,
}

impl FrameInfo {
    fn arcs(&self) -> &Ragged<ArcInfo> {
        self.arcs
            .as_ref()
            .expect("frame arcs are attached during the forward sweep")
    }
}

/// One application of the dynamic-beam feedback rule.
///
/// Drives the active-state count toward `[min_active, max_active]` while
/// letting the beam relax back toward `search_beam` when unconstrained.
/// An empty active set also relaxes: widening the beam cannot revive a
/// dead sequence.
fn update_dynamic_beam(
    beam: f32,
    active: usize,
    search_beam: f32,
    min_active: usize,
    max_active: usize,
) -> f32 {
    let mut beam = beam;
    if active <= max_active {
        if active >= min_active || active == 0 {
            0.8 * beam + 0.2 * search_beam
        } else {
            if beam < search_beam {
                beam = search_beam;
            }
            beam * 1.25
        }
    } else {
        if beam > search_beam {
            beam = search_beam;
        }
        beam * 0.9
    }
}

/// Pruned intersection of a batch of decoding graphs with a batch of
/// dense emission matrices.
///
/// Typical usage goes through [`intersect_dense_pruned`]; the type is
/// public so callers can inspect per-frame activity and the dynamic beams
/// between [`intersect`](Self::intersect) and
/// [`format_output`](Self::format_output).
pub struct DensePrunedIntersect<'a> {
    ctx: Context,
    a_fsas: &'a FsaVec,
    b_fsas: &'a DenseFsaVec,
    /// True when one graph is shared by every sequence.
    shared_graph: bool,
    num_seqs: usize,
    /// Max frame count over sequences, final rows included.
    t_max: usize,
    /// Frame count per sequence.
    seq_frames: Vec<usize>,
    search_beam: f32,
    output_beam: f32,
    min_active: usize,
    max_active: usize,
    dynamic_beams: Vec<f32>,
    frames: Vec<FrameInfo>,
    oshape_unpruned: Option<RaggedShape>,
    keep_states: Option<Renumbering>,
    keep_arcs: Option<Renumbering>,
}

impl<'a> DensePrunedIntersect<'a> {
    /// Validate the inputs and set up an intersection with the default
    /// execution context.
    ///
    /// # Panics
    /// Panics on any violated precondition: mismatched batch sizes,
    /// non-positive beams, `min_active >= max_active`, sequences not in
    /// non-increasing frame-count order, or a graph label outside the
    /// emission columns.
    pub fn new(
        a_fsas: &'a FsaVec,
        b_fsas: &'a DenseFsaVec,
        search_beam: f32,
        output_beam: f32,
        min_active: usize,
        max_active: usize,
    ) -> Self {
        Self::with_context(
            Context::default(),
            a_fsas,
            b_fsas,
            search_beam,
            output_beam,
            min_active,
            max_active,
        )
    }

    /// As [`new`](Self::new), with an explicit execution context.
    pub fn with_context(
        ctx: Context,
        a_fsas: &'a FsaVec,
        b_fsas: &'a DenseFsaVec,
        search_beam: f32,
        output_beam: f32,
        min_active: usize,
        max_active: usize,
    ) -> Self {
        let num_seqs = b_fsas.dim0();
        assert!(num_seqs >= 1, "need at least one sequence");
        assert!(
            a_fsas.dim0() == 1 || a_fsas.dim0() == num_seqs,
            "graph batch must have one graph, or one per sequence"
        );
        assert!(search_beam > 0.0, "search_beam must be positive");
        assert!(output_beam > 0.0, "output_beam must be positive");
        assert!(min_active < max_active, "min_active must be < max_active");
        let seq_frames: Vec<usize> = (0..num_seqs).map(|s| b_fsas.frames(s)).collect();
        assert!(
            seq_frames.windows(2).all(|w| w[0] >= w[1]),
            "sequences must be sorted by non-increasing frame count"
        );
        if let Some(max_label) = a_fsas.max_label() {
            assert!(
                ((max_label + 1) as usize) < b_fsas.cols(),
                "graph label {max_label} out of range for {} emission columns",
                b_fsas.cols()
            );
        }
        let t_max = seq_frames[0];
        DensePrunedIntersect {
            ctx,
            a_fsas,
            b_fsas,
            shared_graph: a_fsas.dim0() == 1,
            num_seqs,
            t_max,
            seq_frames,
            search_beam,
            output_beam,
            min_active,
            max_active,
            dynamic_beams: vec![search_beam; num_seqs],
            frames: Vec::new(),
            oshape_unpruned: None,
            keep_states: None,
            keep_arcs: None,
        }
    }

    #[inline]
    fn graph_of(&self, seq: usize) -> usize {
        if self.shared_graph {
            0
        } else {
            seq
        }
    }

    /// The dynamic beam of each sequence after the last processed frame.
    pub fn dynamic_beams(&self) -> &[f32] {
        &self.dynamic_beams
    }

    /// Frames currently held (after [`intersect`](Self::intersect):
    /// `t_max + 1`).
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Active-state count per sequence on frame `t`.
    pub fn active_states(&self, t: usize) -> Vec<usize> {
        let rs = self.frames[t].states.shape.row_splits(1);
        rs.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Frame 0: one state per sequence, the start state of its graph,
    /// with forward score 0. Graphs without states contribute nothing.
    fn initial_frame(&self) -> FrameInfo {
        let mut counts = Vec::with_capacity(self.num_seqs);
        let mut values = Vec::with_capacity(self.num_seqs);
        let state_rs = self.a_fsas.state_row_splits();
        for seq in 0..self.num_seqs {
            let g = self.graph_of(seq);
            if self.a_fsas.num_states_of(g) == 0 {
                counts.push(0);
            } else {
                counts.push(1);
                values.push(StateInfo {
                    a_fsas_state: state_rs[g],
                    forward_loglike: to_ordered(0.0),
                    backward_loglike: f32::NEG_INFINITY,
                });
            }
        }
        FrameInfo {
            states: Ragged::new(
                RaggedShape::from_row_splits(exclusive_sum(&counts)),
                values,
            ),
            arcs: None,
        }
    }

    /// Expand the out-arcs of every active state on frame `t`.
    ///
    /// The result's top two axes are exactly `frame.states.shape`; each
    /// arc carries its graph arc index, its emission-plus-graph score, its
    /// end score, and its destination as a graph-state candidate.
    fn get_arcs(&self, t: usize, frame: &FrameInfo) -> Ragged<ArcInfo> {
        let states = &frame.states;
        let a_arc_rs = self.a_fsas.arc_row_splits();
        let graph_arcs = self.a_fsas.arcs();
        let b = self.b_fsas;

        let counts: Vec<usize> = self.ctx.tabulate(states.len(), |s| {
            let g_state = states.values[s].a_fsas_state;
            a_arc_rs[g_state + 1] - a_arc_rs[g_state]
        });
        let arc_splits = exclusive_sum(&counts);
        let shape = states
            .shape
            .compose(&RaggedShape::from_row_splits(arc_splits.clone()));

        let state_of_arc = shape.row_ids(2);
        let seq_of_state = states.shape.row_ids(1);
        let values = self.ctx.tabulate(shape.tot_size(2), |i| {
            let s = state_of_arc[i];
            let info = states.values[s];
            let a_arc_idx = a_arc_rs[info.a_fsas_state] + (i - arc_splits[s]);
            let arc = graph_arcs[a_arc_idx];
            let seq = seq_of_state[s];
            debug_assert!(
                t < b.frames(seq),
                "active non-final states past a sequence's last frame"
            );
            let emission = b.score(b.row(seq, t), (arc.label + 1) as usize);
            let arc_loglike = emission + arc.score;
            let end_loglike = from_ordered(info.forward_loglike) + arc_loglike;
            let dest = (info.a_fsas_state as i64 + arc.dest_state as i64 - arc.src_state as i64)
                as usize;
            ArcInfo {
                a_fsas_arc: a_arc_idx,
                arc_loglike,
                end_loglike,
                dest: DestState::Candidate(dest),
            }
        });
        Ragged::new(shape, values)
    }

    /// Per-sequence pruning cutoffs for one frame's expanded arcs, with
    /// the dynamic-beam update applied as a side effect.
    fn pruning_cutoffs(&mut self, arcs: &Ragged<ArcInfo>) -> Vec<f32> {
        // Flatten [fsa][state][arc] to [fsa][arc] and take per-sequence
        // maxima; empty sequences get -inf and therefore keep nothing.
        let flat = arcs.shape.remove_axis(1);
        let end_scores: Vec<f32> = self
            .ctx
            .tabulate(arcs.len(), |i| arcs.values[i].end_loglike);
        let best = max_per_sublist(
            self.ctx,
            flat.row_splits(1),
            &end_scores,
            f32::NEG_INFINITY,
        );

        let state_rs = arcs.shape.row_splits(1);
        let beams = &self.dynamic_beams;
        let (search_beam, min_active, max_active) =
            (self.search_beam, self.min_active, self.max_active);
        let updated: Vec<(f32, f32)> = self.ctx.tabulate(self.num_seqs, |seq| {
            let active = state_rs[seq + 1] - state_rs[seq];
            let beam = update_dynamic_beam(beams[seq], active, search_beam, min_active, max_active);
            (beam, best[seq] - beam)
        });
        let mut cutoffs = Vec::with_capacity(self.num_seqs);
        for (seq, (beam, cutoff)) in updated.into_iter().enumerate() {
            self.dynamic_beams[seq] = beam;
            cutoffs.push(cutoff);
        }
        cutoffs
    }

    /// One forward step: expand frame `t`'s arcs, prune against the
    /// cutoff, dedup surviving destinations into the next frame's state
    /// set, and resolve kept arcs to their destination slot.
    fn propagate_forward(&mut self, t: usize) -> FrameInfo {
        let mut arcs = {
            let frame = self.frames.last().expect("forward sweep starts at frame 0");
            self.get_arcs(t, frame)
        };
        let cutoffs = self.pruning_cutoffs(&arcs);

        let ctx = self.ctx;
        let num_seqs = self.num_seqs;
        let a_state_rs = self.a_fsas.state_row_splits();
        let shared = self.shared_graph;
        let seq_frames = &self.seq_frames;

        let state_rs = arcs.shape.row_splits(1).to_vec();
        let arc_rs = arcs.shape.row_splits(2).to_vec();
        let state_of_arc = arcs.shape.row_ids(2).to_vec();
        let seq_of_state = arcs.shape.row_ids(1).to_vec();
        let n_arcs = arcs.len();
        let values = &arcs.values;

        // An arc survives if its end score clears the sequence cutoff and
        // is not dead (-inf), and final-state arcs only on the sequence's
        // last frame: later frames have no emission row to pair them with.
        let keep: Vec<bool> = ctx.tabulate(n_arcs, |i| {
            let info = &values[i];
            let seq = seq_of_state[state_of_arc[i]];
            if !(info.end_loglike >= cutoffs[seq]) || info.end_loglike == f32::NEG_INFINITY {
                return false;
            }
            let DestState::Candidate(dest) = info.dest else {
                unreachable!("expansion produces candidate destinations")
            };
            let g = if shared { 0 } else { seq };
            let final_state = a_state_rs[g + 1] - 1;
            dest != final_state || t + 1 == seq_frames[seq]
        });

        // Unique destination set per sequence, ordered by graph state.
        let per_seq_dests: Vec<Vec<usize>> = ctx.tabulate(num_seqs, |seq| {
            let lo = arc_rs[state_rs[seq]];
            let hi = arc_rs[state_rs[seq + 1]];
            let mut dests: Vec<usize> = (lo..hi)
                .filter(|&i| keep[i])
                .map(|i| match values[i].dest {
                    DestState::Candidate(d) => d,
                    _ => unreachable!(),
                })
                .collect();
            dests.sort_unstable();
            dests.dedup();
            dests
        });
        let next_counts: Vec<usize> = per_seq_dests.iter().map(|d| d.len()).collect();
        let next_rs = exclusive_sum(&next_counts);
        let total_next = *next_rs.last().unwrap();

        // Each kept arc finds its destination's slot in the dedup table.
        let dest_slot: Vec<usize> = ctx.tabulate(n_arcs, |i| {
            if !keep[i] {
                return usize::MAX;
            }
            let seq = seq_of_state[state_of_arc[i]];
            let DestState::Candidate(d) = values[i].dest else {
                unreachable!()
            };
            per_seq_dests[seq]
                .binary_search(&d)
                .expect("kept arc destination missing from dedup table")
        });

        // Merge forward scores: arcs racing into one state take the max.
        let scores: Vec<AtomicOrderedMax> = (0..total_next)
            .map(|_| AtomicOrderedMax::new(f32::NEG_INFINITY))
            .collect();
        ctx.for_each(n_arcs, |i| {
            if keep[i] {
                let seq = seq_of_state[state_of_arc[i]];
                scores[next_rs[seq] + dest_slot[i]].fetch_max(values[i].end_loglike);
            }
        });

        let rewritten: Vec<ArcInfo> = ctx.tabulate(n_arcs, |i| {
            let mut info = values[i];
            info.dest = match dest_slot[i] {
                usize::MAX => DestState::Pruned,
                slot => DestState::Resolved(slot),
            };
            info
        });
        arcs.values = rewritten;

        let next_shape = RaggedShape::from_row_splits(next_rs.clone());
        let next_values = {
            let seq_of_next = next_shape.row_ids(1);
            ctx.tabulate(total_next, |j| {
                let seq = seq_of_next[j];
                StateInfo {
                    a_fsas_state: per_seq_dests[seq][j - next_rs[seq]],
                    forward_loglike: scores[j].load_ordered(),
                    backward_loglike: f32::NEG_INFINITY,
                }
            })
        };

        self.frames
            .last_mut()
            .expect("forward sweep starts at frame 0")
            .arcs = Some(arcs);
        FrameInfo {
            states: Ragged::new(next_shape, next_values),
            arcs: None,
        }
    }

    /// One backward step over frame `t`: score each arc's best
    /// continuation through the next frame, fix each state's backward
    /// score, and record the keep-masks at their positions under the
    /// stacked unpruned shape.
    fn propagate_backward(
        &mut self,
        t: usize,
        oshape: &RaggedShape,
        keep_states: &[AtomicBool],
        keep_arcs: &[AtomicBool],
    ) {
        let ctx = self.ctx;
        let output_beam = self.output_beam;
        let width = self.t_max + 1;
        let shared = self.shared_graph;
        let a_state_rs = self.a_fsas.state_row_splits();
        let urs2 = oshape.row_splits(2);
        let urs3 = oshape.row_splits(3);

        let (head, tail) = self.frames.split_at_mut(t + 1);
        let next = tail.first();
        let cur = &head[t];
        let states = &cur.states;
        let arcs = cur.arcs();
        let state_rs = states.shape.row_splits(1);
        let seq_of_state = states.shape.row_ids(1);
        let arc_rs = arcs.shape.row_splits(2);
        let state_of_arc = arcs.shape.row_ids(2);

        // Position of a frame state under the stacked [fsa][t][state][arc]
        // shape.
        let state_pos = |s01: usize| {
            let seq = seq_of_state[s01];
            urs2[seq * width + t] + (s01 - state_rs[seq])
        };

        let arc_backward: Vec<f32> = ctx.tabulate(arcs.len(), |i| {
            let info = &arcs.values[i];
            match info.dest {
                DestState::Resolved(slot) => {
                    let next_states =
                        &next.expect("resolved destination implies a next frame").states;
                    let seq = seq_of_state[state_of_arc[i]];
                    let dest01 = next_states.shape.row_splits(1)[seq] + slot;
                    info.arc_loglike + next_states.values[dest01].backward_loglike
                }
                DestState::Pruned => f32::NEG_INFINITY,
                DestState::Candidate(_) => {
                    unreachable!("forward sweep resolves every destination")
                }
            }
        });

        ctx.for_each(arcs.len(), |i| {
            let s01 = state_of_arc[i];
            let forward = from_ordered(states.values[s01].forward_loglike);
            if arc_backward[i] + forward >= -output_beam {
                let pos = urs3[state_pos(s01)] + (i - arc_rs[s01]);
                keep_arcs[pos].store(true, Ordering::Relaxed);
            }
        });

        let new_backward: Vec<f32> = ctx.tabulate(states.len(), |s| {
            let info = &states.values[s];
            let seq = seq_of_state[s];
            let g = if shared { 0 } else { seq };
            let forward = from_ordered(info.forward_loglike);
            let backward = if info.a_fsas_state == a_state_rs[g + 1] - 1 {
                // The final state anchors the ratio to the best complete
                // path.
                -forward
            } else {
                let mut best = f32::NEG_INFINITY;
                for &b in &arc_backward[arc_rs[s]..arc_rs[s + 1]] {
                    if b > best {
                        best = b;
                    }
                }
                best
            };
            if backward + forward >= -output_beam {
                keep_states[state_pos(s)].store(true, Ordering::Relaxed);
                backward
            } else {
                // Pruned states must not let near-boundary neighbours leak
                // back in through later arcs.
                f32::NEG_INFINITY
            }
        });
        for (info, b) in head[t].states.values.iter_mut().zip(new_backward) {
            info.backward_loglike = b;
        }
    }

    /// Run the forward sweep over all frames, stack the per-frame arc
    /// shapes, and run the backward sweep to decide what survives.
    ///
    /// # Panics
    /// Panics if called more than once.
    pub fn intersect(&mut self) {
        assert!(self.frames.is_empty(), "intersect may only run once");

        {
            #[cfg(feature = "tracing")]
            let span = tracing::info_span!("forward_sweep", t_max = self.t_max);
            #[cfg(feature = "tracing")]
            let _enter = span.enter();
            let frame0 = self.initial_frame();
            self.frames.push(frame0);
            // The iteration at t == t_max only closes out frame t_max's
            // (empty) arc shape; its output frame has no states.
            for t in 0..=self.t_max {
                let next = self.propagate_forward(t);
                self.frames.push(next);
            }
            let spare = self.frames.pop().expect("frames are non-empty");
            debug_assert!(spare.states.is_empty(), "frame past the end must be empty");
        }

        let oshape = {
            #[cfg(feature = "tracing")]
            let span = tracing::info_span!("stack_frames", frames = self.frames.len());
            #[cfg(feature = "tracing")]
            let _enter = span.enter();
            let shapes: Vec<&RaggedShape> =
                self.frames.iter().map(|f| &f.arcs().shape).collect();
            stack_axis1(&shapes)
        };

        let keep_states: Vec<AtomicBool> = (0..oshape.tot_size(2))
            .map(|_| AtomicBool::new(false))
            .collect();
        let keep_arcs: Vec<AtomicBool> = (0..oshape.tot_size(3))
            .map(|_| AtomicBool::new(false))
            .collect();
        {
            #[cfg(feature = "tracing")]
            let span = tracing::info_span!("backward_sweep");
            #[cfg(feature = "tracing")]
            let _enter = span.enter();
            for t in (0..=self.t_max).rev() {
                self.propagate_backward(t, &oshape, &keep_states, &keep_arcs);
            }
        }

        let load = |mask: Vec<AtomicBool>| {
            Renumbering::from_keep(mask.iter().map(|b| b.load(Ordering::Relaxed)).collect())
        };
        self.keep_states = Some(load(keep_states));
        self.keep_arcs = Some(load(keep_arcs));
        self.oshape_unpruned = Some(oshape);
    }

    /// Materialise the pruned lattices.
    ///
    /// Returns the lattice batch plus, per output arc, the index of its
    /// graph arc and the flat index of its emission score. States of each
    /// lattice are numbered contiguously in `(frame, state)` order, so
    /// the last state is the final state.
    pub fn format_output(&self) -> (FsaVec, Vec<usize>, Vec<usize>) {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("format_output");
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let oshape = self
            .oshape_unpruned
            .as_ref()
            .expect("intersect must run before format_output");
        let states_ren = self.keep_states.as_ref().expect("intersect must run first");
        let arcs_ren = self.keep_arcs.as_ref().expect("intersect must run first");
        let pruned = subsample_shape4(oshape, states_ren, arcs_ren);

        let width = self.t_max + 1;
        let urs2 = oshape.row_splits(2);
        let urs3 = oshape.row_splits(3);
        let row01_of_state = oshape.row_ids(2);
        let state_of_arc = oshape.row_ids(3);
        let prs2 = pruned.row_splits(2);
        let graph_arcs = self.a_fsas.arcs();
        let cols = self.b_fsas.cols();

        let triples: Vec<(Arc, usize, usize)> =
            self.ctx.tabulate(pruned.tot_size(3), |p| {
                let old_arc = arcs_ren.new2old()[p];
                let old_state = state_of_arc[old_arc];
                let row01 = row01_of_state[old_state];
                let (seq, t) = (row01 / width, row01 % width);
                let frame = &self.frames[t];

                // Back from the stacked coordinate to the frame-local arc.
                let local_state = old_state - urs2[row01];
                let local_arc = old_arc - urs3[old_state];
                let fstate01 = frame.states.shape.row_splits(1)[seq] + local_state;
                let farc = frame.arcs().shape.row_splits(2)[fstate01] + local_arc;
                let info = frame.arcs().values[farc];

                let fsa_state_off = prs2[seq * width];
                let src = states_ren.to_new(old_state) - fsa_state_off;
                let DestState::Resolved(slot) = info.dest else {
                    unreachable!("kept arcs have resolved destinations")
                };
                let dest_old = urs2[seq * width + t + 1] + slot;
                let dest = states_ren.to_new(dest_old) - fsa_state_off;

                let graph_arc = graph_arcs[info.a_fsas_arc];
                let arc = Arc {
                    src_state: src as u32,
                    dest_state: dest as u32,
                    label: graph_arc.label,
                    score: info.arc_loglike,
                };
                let map_b = self.b_fsas.row(seq, t) * cols + (graph_arc.label + 1) as usize;
                (arc, info.a_fsas_arc, map_b)
            });

        let mut out_arcs = Vec::with_capacity(triples.len());
        let mut arc_map_a = Vec::with_capacity(triples.len());
        let mut arc_map_b = Vec::with_capacity(triples.len());
        for (arc, a, b) in triples {
            out_arcs.push(arc);
            arc_map_a.push(a);
            arc_map_b.push(b);
        }
        let ofsa = FsaVec::new(pruned.remove_axis(1), out_arcs);
        (ofsa, arc_map_a, arc_map_b)
    }
}

/// Intersect decoding graphs with dense emissions, keeping every arc on a
/// path within `output_beam` of the best complete path.
///
/// `a_fsas` holds one graph per sequence, or a single graph shared by
/// all; `b_fsas` holds the emission matrices, sorted by non-increasing
/// frame count. `search_beam` seeds the per-sequence dynamic beam used
/// during the forward sweep; `min_active`/`max_active` are the soft
/// bounds the beam controller steers the active-state count toward.
///
/// Returns the lattice batch and, per output arc, its graph-arc index and
/// the flat index of its emission score.
///
/// # Panics
/// Panics on violated preconditions; see [`DensePrunedIntersect::new`].
pub fn intersect_dense_pruned(
    a_fsas: &FsaVec,
    b_fsas: &DenseFsaVec,
    search_beam: f32,
    output_beam: f32,
    min_active: usize,
    max_active: usize,
) -> (FsaVec, Vec<usize>, Vec<usize>) {
    intersect_dense_pruned_with(
        Context::default(),
        a_fsas,
        b_fsas,
        search_beam,
        output_beam,
        min_active,
        max_active,
    )
}

/// As [`intersect_dense_pruned`], with an explicit execution context.
pub fn intersect_dense_pruned_with(
    ctx: Context,
    a_fsas: &FsaVec,
    b_fsas: &DenseFsaVec,
    search_beam: f32,
    output_beam: f32,
    min_active: usize,
    max_active: usize,
) -> (FsaVec, Vec<usize>, Vec<usize>) {
    let mut ix = DensePrunedIntersect::with_context(
        ctx,
        a_fsas,
        b_fsas,
        search_beam,
        output_beam,
        min_active,
        max_active,
    );
    ix.intersect();
    ix.format_output()
}
