//! Weighted automata batches and dense emission batches.
//!
//! [`FsaVec`] holds a batch of decoding graphs as a 3-axis ragged tensor
//! `[fsa][state][arc]`; [`DenseFsaVec`] holds a batch of per-frame,
//! per-symbol log-likelihood rows. Both are immutable once built and are
//! only borrowed by the intersection.

use crate::ragged::{exclusive_sum, RaggedShape};

/// Label carried by arcs entering a final state.
pub const FINAL_LABEL: i32 = -1;

/// One weighted, labeled transition of a decoding graph.
///
/// `src_state` and `dest_state` are idx1's within the arc's own FSA.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    pub src_state: u32,
    pub dest_state: u32,
    pub label: i32,
    pub score: f32,
}

/// A batch of FSAs stored as `[fsa][state][arc]` with arcs grouped by
/// source state.
///
/// Invariants, checked at construction:
/// - every arc's `src_state` equals the state it is stored under;
/// - every `dest_state` is a state of the same FSA;
/// - an arc carries label `-1` exactly when it enters the final state;
/// - the last state of each FSA is its final state and has no outgoing
///   arcs (FSAs with zero states are allowed and accept nothing).
#[derive(Clone, Debug)]
pub struct FsaVec {
    shape: RaggedShape,
    arcs: Vec<Arc>,
}

impl FsaVec {
    pub fn new(shape: RaggedShape, arcs: Vec<Arc>) -> Self {
        assert_eq!(shape.num_axes(), 3, "FsaVec needs a [fsa][state][arc] shape");
        assert_eq!(arcs.len(), shape.tot_size(2), "arc count must match shape");
        let v = FsaVec { shape, arcs };
        v.validate();
        v
    }

    /// Build from per-fsa, per-state arc lists.
    pub fn from_fsas(fsas: Vec<Vec<Vec<Arc>>>) -> Self {
        let state_counts: Vec<usize> = fsas.iter().map(|f| f.len()).collect();
        let arc_counts: Vec<usize> = fsas
            .iter()
            .flat_map(|f| f.iter().map(|s| s.len()))
            .collect();
        let shape = RaggedShape::from_layers(vec![
            exclusive_sum(&state_counts),
            exclusive_sum(&arc_counts),
        ]);
        let arcs = fsas.into_iter().flatten().flatten().collect();
        FsaVec::new(shape, arcs)
    }

    fn validate(&self) {
        let state_rs = self.shape.row_splits(1);
        let arc_rs = self.shape.row_splits(2);
        for f in 0..self.dim0() {
            let num_states = state_rs[f + 1] - state_rs[f];
            for s01 in state_rs[f]..state_rs[f + 1] {
                let local = (s01 - state_rs[f]) as u32;
                for arc in &self.arcs[arc_rs[s01]..arc_rs[s01 + 1]] {
                    assert_eq!(
                        arc.src_state, local,
                        "arc src_state must match the state it is stored under"
                    );
                    assert!(
                        (arc.dest_state as usize) < num_states,
                        "arc dest_state {} out of range for fsa {f} with {num_states} states",
                        arc.dest_state
                    );
                    assert!(arc.label >= FINAL_LABEL, "arc labels must be >= -1");
                    assert_eq!(
                        arc.label == FINAL_LABEL,
                        arc.dest_state as usize == num_states - 1,
                        "label -1 goes exactly on arcs entering the final state"
                    );
                }
            }
            if num_states > 0 {
                let last = state_rs[f + 1] - 1;
                assert_eq!(
                    arc_rs[last + 1] - arc_rs[last],
                    0,
                    "the final state of fsa {f} must have no outgoing arcs"
                );
            }
        }
    }

    pub fn dim0(&self) -> usize {
        self.shape.dim0()
    }

    pub fn num_states(&self) -> usize {
        self.shape.tot_size(1)
    }

    pub fn num_arcs(&self) -> usize {
        self.shape.tot_size(2)
    }

    pub fn num_states_of(&self, f: usize) -> usize {
        let rs = self.shape.row_splits(1);
        rs[f + 1] - rs[f]
    }

    pub fn shape(&self) -> &RaggedShape {
        &self.shape
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// `state idx01 -> first arc idx012` (row_splits of axis 2).
    pub fn arc_row_splits(&self) -> &[usize] {
        self.shape.row_splits(2)
    }

    /// `fsa -> first state idx01` (row_splits of axis 1).
    pub fn state_row_splits(&self) -> &[usize] {
        self.shape.row_splits(1)
    }

    /// Largest label in the batch, or `None` for an arc-free batch.
    pub fn max_label(&self) -> Option<i32> {
        self.arcs.iter().map(|a| a.label).max()
    }
}

/// A batch of dense emission matrices: a `[seq][frame]` shape over a
/// row-major score matrix with one row per frame and `cols` columns.
///
/// Column 0 scores the final-arc symbol (label `-1`); column `k >= 1`
/// scores label `k - 1`. Each sequence's last frame is expected to be a
/// final row (only column 0 finite); providing it is the caller's
/// obligation.
#[derive(Clone, Debug)]
pub struct DenseFsaVec {
    shape: RaggedShape,
    scores: Vec<f32>,
    cols: usize,
}

impl DenseFsaVec {
    pub fn new(frames_per_seq: &[usize], cols: usize, scores: Vec<f32>) -> Self {
        assert!(cols >= 1, "emission matrices need at least the final column");
        assert!(
            frames_per_seq.iter().all(|&n| n >= 1),
            "every sequence needs at least its final frame"
        );
        let shape = RaggedShape::from_row_splits(exclusive_sum(frames_per_seq));
        assert_eq!(
            scores.len(),
            shape.tot_size(1) * cols,
            "scores must be a row-major [total_frames, cols] matrix"
        );
        DenseFsaVec {
            shape,
            scores,
            cols,
        }
    }

    pub fn dim0(&self) -> usize {
        self.shape.dim0()
    }

    pub fn num_rows(&self) -> usize {
        self.shape.tot_size(1)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Frame count of one sequence, including its final row.
    pub fn frames(&self, seq: usize) -> usize {
        let rs = self.shape.row_splits(1);
        rs[seq + 1] - rs[seq]
    }

    /// Flat row index of `(seq, t)` in the score matrix.
    #[inline]
    pub fn row(&self, seq: usize, t: usize) -> usize {
        debug_assert!(t < self.frames(seq), "frame {t} out of range for seq {seq}");
        self.shape.row_splits(1)[seq] + t
    }

    #[inline]
    pub fn score(&self, row: usize, col: usize) -> f32 {
        self.scores[row * self.cols + col]
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn shape(&self) -> &RaggedShape {
        &self.shape
    }
}
