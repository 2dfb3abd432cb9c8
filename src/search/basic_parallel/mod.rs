//! This module contains the [`BasicParallelSearch`], which runs several heterogeneous
//! sub-searches concurrently on the same problem instance.
//! * The outer search performs a single step: it submits every sub-search to an owned
//!   worker pool, waits for all of them to finish and then terminates. The best
//!   solution over all sub-searches is tracked while they run.
//! * Sub-searches must terminate on their own (through their algorithm or their stop
//!   criteria). [`stop`][Search::stop] on the outer search propagates to every
//!   sub-search.
//! * Every sub-search must solve the same problem instance as the outer search;
//!   sub-searches are added and removed only while the outer search is idle.
//!
//! Sub-search listener callbacks fire on the worker threads; the relayed best-solution
//! updates at the outer search are serialized by a mutex, so its listeners observe a
//! monotone sequence of improvements.

use std::sync::{Arc, Mutex, Weak};

use super::listener::SearchListener;
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::problem::{Evaluation, Problem};
use crate::solution::Solution;

/// Runs independent sub-searches concurrently and keeps the best solution any of them
/// finds. The sub-searches do not interact in any other way; for coordinated replicas
/// see [parallel tempering][crate::search::parallel_tempering].
pub struct BasicParallelSearch<S: Solution> {
    common: SearchCommon<S>,
    searches: Mutex<Vec<Arc<dyn Search<S>>>>,
    pool: Mutex<Option<rayon::ThreadPool>>,
    /// Serializes the best updates relayed from concurrently running sub-searches.
    relay: Mutex<()>,
    self_ref: Mutex<Weak<BasicParallelSearch<S>>>,
}

impl<S: Solution> BasicParallelSearch<S> {
    /// Creates a new, initially empty [`BasicParallelSearch`] for the given problem.
    /// Add at least one sub-search before starting it.
    pub fn new(problem: Arc<dyn Problem<S>>) -> Arc<BasicParallelSearch<S>> {
        let search = Arc::new(BasicParallelSearch {
            common: SearchCommon::new("basic parallel search", problem),
            searches: Mutex::new(Vec::new()),
            pool: Mutex::new(None),
            relay: Mutex::new(()),
            self_ref: Mutex::new(Weak::new()),
        });
        *search.self_ref.lock().unwrap() = Arc::downgrade(&search);
        search
    }

    /// Adds a sub-search. Requires an idle outer search and a sub-search solving the
    /// same problem instance.
    pub fn add_search(&self, sub: Arc<dyn Search<S>>) -> Result<(), SearchError> {
        self.common.assert_idle()?;
        if !Arc::ptr_eq(sub.common().problem(), self.common.problem()) {
            return Err(SearchError::Configuration(format!(
                "sub-search `{}` solves a different problem instance",
                sub.name()
            )));
        }
        sub.common().add_listener(Box::new(SubObserver {
            outer: self.self_ref.lock().unwrap().clone(),
        }))?;
        self.searches.lock().unwrap().push(sub);
        Ok(())
    }

    /// Removes all sub-searches. Requires an idle outer search.
    pub fn clear_searches(&self) -> Result<(), SearchError> {
        self.common.assert_idle()?;
        self.searches.lock().unwrap().clear();
        Ok(())
    }

    /// The number of sub-searches.
    pub fn num_searches(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    /// Adopts an improvement reported by a sub-search, serialized across the workers.
    /// The sub-search has already validated the solution.
    fn sub_improvement(&self, solution: &S, evaluation: &Evaluation) {
        let _serialized = self.relay.lock().unwrap();
        self.common
            .update_best_trusted(self.as_dyn(), solution, evaluation);
    }
}

impl<S: Solution> Search<S> for BasicParallelSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        &self.common
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn init(&self) -> Result<(), SearchError> {
        let num_searches = self.searches.lock().unwrap().len();
        if num_searches == 0 {
            return Err(SearchError::Configuration(
                "a basic parallel search requires at least one sub-search".to_string(),
            ));
        }
        // (re)build the worker pool when the number of workers no longer matches
        let mut pool = self.pool.lock().unwrap();
        let rebuild = match pool.as_ref() {
            Some(existing) => existing.current_num_threads() != num_searches,
            None => true,
        };
        if rebuild {
            *pool = Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_searches)
                    .thread_name(|index| format!("basic-parallel-worker-{}", index))
                    .build()
                    .map_err(|error| {
                        SearchError::Execution(format!(
                            "failed to build the worker pool: {}",
                            error
                        ))
                    })?,
            );
        }
        Ok(())
    }

    fn step(&self) -> Result<(), SearchError> {
        let searches = self.searches.lock().unwrap().clone();
        let failures: Mutex<Vec<String>> = Mutex::new(Vec::new());
        {
            let pool_guard = self.pool.lock().unwrap();
            let pool = pool_guard.as_ref().ok_or_else(|| {
                SearchError::Execution("the worker pool has been disposed".to_string())
            })?;
            pool.scope(|scope| {
                for sub in &searches {
                    let sub = sub.clone();
                    let failures = &failures;
                    scope.spawn(move |_| {
                        if let Err(error) = sub.start() {
                            failures.lock().unwrap().push(format!(
                                "sub-search `{}` failed: {}",
                                sub.name(),
                                error
                            ));
                        }
                    });
                }
            });
        }
        let failures = failures.into_inner().unwrap();
        if !failures.is_empty() {
            return Err(SearchError::Execution(failures.join("; ")));
        }
        // all sub-searches have finished: the single step is done
        self.common.request_stop();
        Ok(())
    }

    fn stop(&self) {
        self.common.request_stop();
        for sub in self.searches.lock().unwrap().iter() {
            sub.stop();
        }
    }

    fn dispose(&self) -> Result<(), SearchError> {
        self.common.dispose(self.as_dyn())?;
        for sub in self.searches.lock().unwrap().iter() {
            sub.dispose()?;
        }
        *self.pool.lock().unwrap() = None;
        Ok(())
    }
}

/// Relays the improvements of a sub-search to the outer search.
struct SubObserver<S: Solution> {
    outer: Weak<BasicParallelSearch<S>>,
}

impl<S: Solution> SearchListener<S> for SubObserver<S> {
    fn new_best_solution(&self, _search: &dyn Search<S>, solution: &S, evaluation: &Evaluation) {
        if let Some(outer) = self.outer.upgrade() {
            outer.sub_improvement(solution, evaluation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::neighborhood_search::NeighborhoodSearch;
    use crate::search::steepest_descent::SteepestDescent;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleFlipNeighborhood, SingleSwapNeighborhood};

    #[test]
    fn runs_heterogeneous_sub_searches_and_merges_their_bests() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let swap_search = Arc::new(SteepestDescent::new(
            problem.clone(),
            Arc::new(SingleSwapNeighborhood::new(1..=5)),
            None,
        ));
        swap_search
            .set_current_solution(IdSubset::new([1, 2]))
            .unwrap();
        let flip_search = Arc::new(SteepestDescent::new(
            problem.clone(),
            Arc::new(SingleFlipNeighborhood::new(1..=5)),
            None,
        ));
        flip_search
            .set_current_solution(IdSubset::new([1, 2]))
            .unwrap();

        let parallel = BasicParallelSearch::new(problem);
        parallel.add_search(swap_search).unwrap();
        parallel.add_search(flip_search.clone()).unwrap();
        parallel.start().unwrap();

        // the flip descent reaches the full selection; the outer search adopts it
        assert_eq!(flip_search.best_evaluation().unwrap().value(), 15.0);
        assert_eq!(parallel.best_evaluation().unwrap().value(), 15.0);
        assert_eq!(
            parallel.best_solution(),
            Some(IdSubset::new([1, 2, 3, 4, 5]))
        );
    }

    #[test]
    fn starting_without_sub_searches_fails() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let parallel = BasicParallelSearch::new(problem);
        assert!(parallel.start().is_err());
        // the failed run leaves the search idle, so configuration works again
        assert_eq!(parallel.status(), crate::search::SearchStatus::Idle);
    }

    #[test]
    fn foreign_problem_instances_are_rejected() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let other_problem = subset_sum_problem(1..=5, vec![]);
        let foreign = Arc::new(SteepestDescent::new(
            other_problem,
            Arc::new(SingleSwapNeighborhood::new(1..=5)),
            None,
        ));
        let parallel = BasicParallelSearch::new(problem);
        assert!(parallel.add_search(foreign).is_err());
        assert_eq!(parallel.num_searches(), 0);
    }
}
