//! This module contains the search algorithms and the machinery they share.
//! * Every algorithm implements the [`Search`] trait: it is started with
//!   [`start`][Search::start] (blocking), stopped asynchronously with
//!   [`stop`][Search::stop] or by [stop criteria][stop_criteria], reports progress to
//!   [listeners][listener] and tracks the best valid solution seen across all of its
//!   runs.
//! * Searches that explore a [`Neighborhood`][crate::neighborhood::Neighborhood]
//!   additionally implement [`NeighborhoodSearch`][neighborhood_search::NeighborhoodSearch]:
//!   they hold a current solution with cached evaluation and validation and accept or
//!   reject moves.
//!
//! The following algorithms are included:
//! - [random search][random_search] and [exhaustive search][exhaustive]
//! - [random descent][random_descent] and [steepest descent][steepest_descent]
//! - [Metropolis search][metropolis] (fixed temperature)
//! - [parallel tempering][parallel_tempering] (concurrent Metropolis replicas with
//!   periodic solution swaps)
//! - [tabu search][tabu_search]
//! - [variable neighborhood descent and reduced variable neighborhood
//!   search][variable_neighborhood]
//! - [piped local search][piped] and [basic parallel search][basic_parallel]

pub mod basic_parallel;
pub mod common;
pub mod exhaustive;
pub mod listener;
pub mod metropolis;
pub mod move_cache;
pub mod neighborhood_search;
pub mod parallel_tempering;
pub mod piped;
pub mod random_descent;
pub mod random_search;
pub mod steepest_descent;
pub mod stop_criteria;
pub mod tabu_search;
pub mod variable_neighborhood;

pub use common::SearchCommon;
pub use listener::SearchListener;
pub use neighborhood_search::NeighborhoodSearch;

use std::fmt;
use std::time::Duration;

use crate::error::SearchError;
use crate::problem::Evaluation;
use crate::solution::Solution;

/// The lifecycle status of a [`Search`].
///
/// A search starts out idle. [`Search::start`] moves it through initializing to
/// running; it terminates when [`Search::stop`] is called, a stop criterion fires or
/// the algorithm decides to stop itself, and returns to idle once the in-flight step
/// has completed. A disposed search has released its resources and cannot be started
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The search is not running and may be (re)configured and started.
    Idle,
    /// The search is preparing a run (e.g. generating an initial solution).
    Initializing,
    /// The search is executing steps.
    Running,
    /// Termination has been requested; the in-flight step completes naturally.
    Terminating,
    /// The search has been disposed and cannot be started again. Terminal.
    Disposed,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStatus::Idle => "idle",
            SearchStatus::Initializing => "initializing",
            SearchStatus::Running => "running",
            SearchStatus::Terminating => "terminating",
            SearchStatus::Disposed => "disposed",
        };
        write!(f, "{}", name)
    }
}

/// The common interface of all search algorithms.
///
/// Implementors provide [`common`][Search::common] (access to the shared search state),
/// [`init`][Search::init] and [`step`][Search::step]; everything else is driven by the
/// provided methods. All configuration setters of the concrete algorithms require the
/// search to be idle and fail with [`SearchError::NotIdle`] otherwise.
///
/// Listener callbacks fire on the thread that executes the search; see
/// [`SearchListener`] for details.
pub trait Search<S: Solution>: Send + Sync {
    /// The shared state of this search: status, best solution, counters, listeners and
    /// stop criteria.
    fn common(&self) -> &SearchCommon<S>;

    /// `self` as a trait object; implemented as `{ self }` by every concrete search.
    fn as_dyn(&self) -> &dyn Search<S>;

    /// Prepares a run, e.g. by creating the initial current solution. Invoked by
    /// [`start`][Search::start] after the search has left the idle status.
    fn init(&self) -> Result<(), SearchError> {
        Ok(())
    }

    /// Executes a single step of this search. Invoked repeatedly by
    /// [`start`][Search::start]; an algorithm that cannot continue (e.g. because its
    /// neighborhood is exhausted) requests termination through the shared state.
    fn step(&self) -> Result<(), SearchError>;

    /// Runs the search until it terminates. Blocking; returns once the search is back
    /// to idle. May be called again afterwards: the best solution is kept across runs,
    /// while per-run counters restart.
    fn start(&self) -> Result<(), SearchError> {
        run_search(self.as_dyn())
    }

    /// Requests termination. Safe to call from any thread and from listener callbacks;
    /// the in-flight step completes naturally. A no-op if the search is not active.
    fn stop(&self) {
        self.common().request_stop();
    }

    /// Disposes the search, releasing its resources. Fails while the search is active;
    /// a disposed search cannot be started again.
    fn dispose(&self) -> Result<(), SearchError> {
        self.common().dispose(self.as_dyn())
    }

    /// The name of this search, used in log output and error messages.
    fn name(&self) -> &str {
        self.common().name()
    }

    /// The current lifecycle status.
    fn status(&self) -> SearchStatus {
        self.common().status()
    }

    /// A deep copy of the best valid solution found since construction, if any valid
    /// solution has been observed.
    fn best_solution(&self) -> Option<S> {
        self.common().best_solution()
    }

    /// The evaluation of the best solution, if any.
    fn best_evaluation(&self) -> Option<Evaluation> {
        self.common().best_evaluation()
    }

    /// The number of completed steps of the current (or last) run.
    fn num_steps(&self) -> u64 {
        self.common().num_steps()
    }

    /// The runtime of the current (or last) run.
    fn runtime(&self) -> Duration {
        self.common().runtime()
    }

    /// A JSON summary of the search state (using [`serde_json`]).
    fn report(&self) -> serde_json::Value {
        let best = self.best_evaluation().map(|evaluation| evaluation.to_json());
        serde_json::json!({
            "name": self.name(),
            "status": self.status().to_string(),
            "steps": self.num_steps(),
            "runtime_seconds": self.runtime().as_secs_f64(),
            "best": best,
        })
    }
}

/// Drives a full run of the given search: initialization, the step loop, and cleanup.
/// This is the shared implementation behind [`Search::start`].
pub fn run_search<S: Solution>(search: &dyn Search<S>) -> Result<(), SearchError> {
    let common = search.common();
    common.enter_run(search)?;
    let outcome = (|| -> Result<(), SearchError> {
        search.init()?;
        common.set_running(search);
        while !common.stop_requested() {
            search.step()?;
            common.step_completed(search);
        }
        Ok(())
    })();
    common.finish_run(search, &outcome);
    outcome
}
