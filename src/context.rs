//! Execution contexts and the indexed-kernel primitives.
//!
//! Every per-element operation in the intersection is phrased as a kernel
//! over a flat index space `0..n` with no ordering between invocations.
//! [`Context`] decides how such a kernel actually runs: serially, or
//! data-parallel via rayon when the `parallel` feature is enabled.
//!
//! Kernels come in two flavours:
//! - [`Context::tabulate`] maps each index to a value and collects the
//!   results; each invocation owns its output slot, so no synchronisation
//!   is needed.
//! - [`Context::for_each`] runs a side-effecting kernel. Callers must only
//!   write to disjoint locations or through atomics.
//!
//! Kernel completion is the only synchronisation point: once a call
//! returns, all effects are visible to the caller.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where kernels execute.
///
/// `Parallel` falls back to serial execution when the crate is built
/// without the `parallel` feature, so a context value can be threaded
/// through unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    /// Run kernels on the calling thread, in index order.
    Sequential,
    /// Run kernels on the rayon thread pool (feature `parallel`).
    Parallel,
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(feature = "parallel") {
            Context::Parallel
        } else {
            Context::Sequential
        }
    }
}

impl Context {
    /// Apply `f` to every index in `0..n` and collect the results.
    pub fn tabulate<T, F>(self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        if self == Context::Parallel {
            return (0..n).into_par_iter().map(f).collect();
        }
        (0..n).map(f).collect()
    }

    /// Run a side-effecting kernel over `0..n`.
    ///
    /// Invocations may run in any order and concurrently; `f` must confine
    /// its writes to disjoint locations or atomics.
    pub fn for_each<F>(self, n: usize, f: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        if self == Context::Parallel {
            (0..n).into_par_iter().for_each(f);
            return;
        }
        (0..n).for_each(f);
    }
}
