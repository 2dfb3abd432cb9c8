//! Contains the [`SearchListener`] trait for observing the progress of a search.

use super::{Search, SearchStatus};
use crate::problem::Evaluation;
use crate::solution::Solution;

/// Observes the lifecycle and the progress of a [`Search`]. All callbacks have empty
/// default implementations, so listeners only implement what they care about.
///
/// Callbacks fire on the thread that executes the observed search. For the replicas of
/// a [parallel tempering search][super::parallel_tempering::ParallelTempering] and the
/// sub-searches of a [basic parallel search][super::basic_parallel::BasicParallelSearch]
/// this is a worker thread; listeners attached to such searches must be prepared for
/// concurrent invocations from different workers.
///
/// Callbacks may call [`Search::stop`] on the passed search (this is how the
/// coordinator of a parallel tempering search limits the steps of its replicas), but
/// must not reconfigure it.
#[allow(unused_variables)]
pub trait SearchListener<S: Solution>: Send + Sync {
    /// Fired when a run of the search has started, before the first step.
    fn search_started(&self, search: &dyn Search<S>) {}

    /// Fired when a run of the search has stopped, after the last step.
    fn search_stopped(&self, search: &dyn Search<S>) {}

    /// Fired whenever the search has found a new best solution. The evaluations passed
    /// to consecutive invocations are strictly improving.
    fn new_best_solution(&self, search: &dyn Search<S>, solution: &S, evaluation: &Evaluation) {}

    /// Fired after every completed step; `num_steps` is the number of steps completed
    /// in the current run.
    fn step_completed(&self, search: &dyn Search<S>, num_steps: u64) {}

    /// Fired when the lifecycle status of the search has changed.
    fn status_changed(&self, search: &dyn Search<S>, new_status: SearchStatus) {}
}
