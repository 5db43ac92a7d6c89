//! Pruned dense-graph intersection for speech decoding.
//!
//! This crate composes a batch of decoding graphs (weighted, labeled
//! automata) with a batch of dense per-frame emission matrices and keeps,
//! for each sequence, exactly the arcs lying on a path whose
//! forward-plus-backward score is within a beam of the best complete
//! path.
//!
//! ## Core idea
//! 1. Sweep forward over frames, expanding the arcs of every active
//!    state and pruning against a per-sequence cutoff; a feedback rule
//!    adjusts the beam to keep the active-state count between
//!    `min_active` and `max_active`.
//! 2. Sweep backward, scoring each state's best continuation, and keep
//!    what lies within `output_beam` of the best complete path.
//! 3. Flatten the surviving arcs into one lattice per sequence with
//!    index maps back into the graph and the emission matrix.
//!
//! Every per-element step runs as a [`Context`] kernel: serial, or
//! data-parallel via rayon with the `parallel` feature. The only point
//! of contention, arcs racing to update one destination state's forward
//! score, is resolved by an atomic max over the ordered-integer float
//! encoding in [`ordered`].
//!
//! ## Quick start
//! ```
//! use lattice_prune::{intersect_dense_pruned, Arc, DenseFsaVec, FsaVec};
//!
//! // An acceptor of the symbol 0: a self-loop plus a final arc.
//! let graphs = FsaVec::from_fsas(vec![vec![
//!     vec![
//!         Arc { src_state: 0, dest_state: 0, label: 0, score: 0.0 },
//!         Arc { src_state: 0, dest_state: 1, label: -1, score: 0.0 },
//!     ],
//!     vec![],
//! ]]);
//! // Two frames scoring symbol 0, then the final row.
//! let neg = f32::NEG_INFINITY;
//! let emissions = DenseFsaVec::new(
//!     &[3],
//!     2,
//!     vec![neg, 0.0, neg, 0.0, 0.0, neg],
//! );
//! let (lattices, arc_map_a, arc_map_b) =
//!     intersect_dense_pruned(&graphs, &emissions, 8.0, 8.0, 1, 1000);
//! assert_eq!(lattices.num_arcs(), 3);
//! assert_eq!(arc_map_a, vec![0, 0, 1]);
//! assert_eq!(arc_map_b, vec![1, 3, 4]);
//! ```
//!
//! Sequences must arrive sorted by non-increasing frame count, and each
//! sequence's last frame must be a final row (only column 0 finite);
//! violated preconditions abort with a message naming the invariant.

pub mod context;
pub mod fsa;
pub mod intersect;
pub mod ordered;
pub mod ragged;

pub use crate::context::Context;
pub use crate::fsa::{Arc, DenseFsaVec, FsaVec, FINAL_LABEL};
pub use crate::intersect::{
    intersect_dense_pruned, intersect_dense_pruned_with, DensePrunedIntersect,
};
pub use crate::ordered::{from_ordered, to_ordered};
