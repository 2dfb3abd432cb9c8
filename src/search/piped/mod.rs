//! This module contains the [`PipedLocalSearch`], which runs an ordered pipeline of
//! local searches on the same problem instance.
//! * The outer search performs a single step: it seeds the first inner search with a
//!   deep copy of the outer current solution (random if unset), runs it to completion,
//!   adopts its best solution as the new outer current, feeds that into the next inner
//!   search, and so on.
//! * Every inner search must terminate on its own (through its algorithm or its stop
//!   criteria), otherwise the pipeline never advances.
//! * [`stop`][Search::stop] propagates to every inner search; an inner search that has
//!   just started while the outer search is already terminating is stopped
//!   immediately.
//! * After its single run the outer search disposes itself and cannot be restarted.

use std::sync::{Arc, Weak};

use super::listener::SearchListener;
use super::neighborhood_search::{CurrentState, NeighborhoodCommon, NeighborhoodSearch};
use super::{run_search, Search, SearchCommon, SearchStatus};
use crate::error::SearchError;
use crate::problem::{Problem, Validation};
use crate::solution::Solution;

/// A pipeline of local searches: each stage starts from the best solution of the
/// previous one. Useful for coarse-to-fine schedules, e.g. a cheap descent followed by
/// a tabu search.
pub struct PipedLocalSearch<S: Solution> {
    common: NeighborhoodCommon<S>,
    searches: Vec<Arc<dyn NeighborhoodSearch<S>>>,
}

impl<S: Solution> PipedLocalSearch<S> {
    /// Creates a new [`PipedLocalSearch`] over the given non-empty pipeline. All inner
    /// searches must solve the same problem instance as the outer search. A
    /// `random_seed` only influences the generated initial solution.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        searches: Vec<Arc<dyn NeighborhoodSearch<S>>>,
        random_seed: Option<u64>,
    ) -> Result<Arc<PipedLocalSearch<S>>, SearchError> {
        if searches.is_empty() {
            return Err(SearchError::Configuration(
                "a piped local search requires at least one inner search".to_string(),
            ));
        }
        for inner in &searches {
            if !Arc::ptr_eq(inner.common().problem(), &problem) {
                return Err(SearchError::Configuration(format!(
                    "inner search `{}` solves a different problem instance",
                    inner.name()
                )));
            }
        }
        let outer = Arc::new(PipedLocalSearch {
            common: NeighborhoodCommon::new("piped local search", problem, random_seed),
            searches,
        });
        for inner in &outer.searches {
            inner.common().add_listener(Box::new(InnerGuard {
                outer: Arc::downgrade(&outer),
            }))?;
        }
        Ok(outer)
    }

    /// The number of inner searches.
    pub fn num_searches(&self) -> usize {
        self.searches.len()
    }
}

impl<S: Solution> Search<S> for PipedLocalSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        self.common.common()
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn init(&self) -> Result<(), SearchError> {
        self.common.init_run(self.as_dyn())
    }

    fn step(&self) -> Result<(), SearchError> {
        for inner in &self.searches {
            if self.common.common().stop_requested() {
                break;
            }
            let current = self.common.current_solution().ok_or_else(|| {
                SearchError::Execution("piped local search has no current solution".to_string())
            })?;
            inner.set_current_solution(current).map_err(|error| {
                SearchError::Execution(format!(
                    "could not seed inner search `{}`: {}",
                    inner.name(),
                    error
                ))
            })?;
            inner.start().map_err(|error| {
                SearchError::Execution(format!(
                    "inner search `{}` failed: {}",
                    inner.name(),
                    error
                ))
            })?;

            // adopt the stage result as the new outer current solution
            if let (Some(solution), Some(evaluation)) =
                (inner.best_solution(), inner.best_evaluation())
            {
                let changed = self
                    .common
                    .current_solution()
                    .map_or(true, |current| current != solution);
                if changed {
                    {
                        let mut state = self.common.state();
                        state.run = Some(CurrentState {
                            current: solution.clone(),
                            evaluation: evaluation.clone(),
                            validation: Validation::Simple(true),
                        });
                    }
                    self.common
                        .common()
                        .update_best_trusted(self.as_dyn(), &solution, &evaluation);
                }
            }
        }
        self.common.common().request_stop();
        Ok(())
    }

    /// Runs the pipeline once and disposes the outer search afterwards; a piped local
    /// search cannot be restarted.
    fn start(&self) -> Result<(), SearchError> {
        let outcome = run_search(self.as_dyn());
        let _ = self.dispose();
        outcome
    }

    fn stop(&self) {
        self.common.common().request_stop();
        for inner in &self.searches {
            inner.stop();
        }
    }

    fn dispose(&self) -> Result<(), SearchError> {
        self.common.common().dispose(self.as_dyn())?;
        for inner in &self.searches {
            inner.dispose()?;
        }
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for PipedLocalSearch<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}

/// Stops an inner search right after it started if the outer search is already
/// terminating, closing the race between stop propagation and stage startup.
struct InnerGuard<S: Solution> {
    outer: Weak<PipedLocalSearch<S>>,
}

impl<S: Solution> SearchListener<S> for InnerGuard<S> {
    fn search_started(&self, search: &dyn Search<S>) {
        if let Some(outer) = self.outer.upgrade() {
            if outer.status() == SearchStatus::Terminating {
                search.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::steepest_descent::SteepestDescent;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleFlipNeighborhood, SingleSwapNeighborhood};

    #[test]
    fn runs_the_stages_in_order_and_disposes_itself() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let swap_stage = Arc::new(SteepestDescent::new(
            problem.clone(),
            Arc::new(SingleSwapNeighborhood::new(1..=5)),
            None,
        ));
        let flip_stage = Arc::new(SteepestDescent::new(
            problem.clone(),
            Arc::new(SingleFlipNeighborhood::new(1..=5)),
            None,
        ));
        let piped = PipedLocalSearch::new(
            problem,
            vec![swap_stage.clone(), flip_stage.clone()],
            None,
        )
        .unwrap();
        piped.set_current_solution(IdSubset::new([1, 2])).unwrap();
        piped.start().unwrap();

        // stage 1 (swaps) reaches {4, 5}, stage 2 (flips) grows to the full set
        assert_eq!(swap_stage.best_solution(), Some(IdSubset::new([4, 5])));
        assert_eq!(piped.best_solution(), Some(IdSubset::new([1, 2, 3, 4, 5])));
        assert_eq!(piped.best_evaluation().unwrap().value(), 15.0);

        // the pipeline disposed itself (and its stages) after the run
        assert_eq!(piped.status(), SearchStatus::Disposed);
        assert_eq!(swap_stage.status(), SearchStatus::Disposed);
        assert!(piped.start().is_err());
    }

    #[test]
    fn rejects_an_empty_pipeline_and_foreign_problems() {
        let problem = subset_sum_problem(1..=5, vec![]);
        assert!(PipedLocalSearch::new(problem.clone(), vec![], None).is_err());

        let other_problem = subset_sum_problem(1..=5, vec![]);
        let foreign = Arc::new(SteepestDescent::new(
            other_problem,
            Arc::new(SingleSwapNeighborhood::new(1..=5)),
            None,
        ));
        assert!(PipedLocalSearch::new(problem, vec![foreign], None).is_err());
    }
}
