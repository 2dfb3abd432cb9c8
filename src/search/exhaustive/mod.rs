//! This module contains the [`ExhaustiveSearch`], which walks through all candidate
//! solutions produced by a [`SolutionIterator`].
//! * Each step pulls the next candidate, validates it and offers it to best-solution
//!   tracking; the search terminates naturally when the iterator is exhausted.
//! * Feasible only for small instances, but guaranteed to find the best solution the
//!   iterator emits; the [`SubsetIterator`][crate::subset::iterator::SubsetIterator]
//!   enumerates all subsets of a ground set within a size range.

use std::sync::{Arc, Mutex};

use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::problem::Problem;
use crate::solution::Solution;

/// Produces the candidate solutions for an [`ExhaustiveSearch`]. Implemented for
/// every [`Iterator`] over solutions, e.g. the
/// [`SubsetIterator`][crate::subset::iterator::SubsetIterator].
pub trait SolutionIterator<S>: Send {
    /// The next candidate solution, or `None` when the space is exhausted.
    fn next_solution(&mut self) -> Option<S>;
}

impl<S, I: Iterator<Item = S> + Send> SolutionIterator<S> for I {
    fn next_solution(&mut self) -> Option<S> {
        self.next()
    }
}

/// A search that evaluates every solution of a given iterator once.
pub struct ExhaustiveSearch<S: Solution> {
    common: SearchCommon<S>,
    iterator: Mutex<Box<dyn SolutionIterator<S>>>,
}

impl<S: Solution> ExhaustiveSearch<S> {
    /// Creates a new [`ExhaustiveSearch`] over the candidates of the given iterator.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        iterator: Box<dyn SolutionIterator<S>>,
    ) -> ExhaustiveSearch<S> {
        ExhaustiveSearch {
            common: SearchCommon::new("exhaustive search", problem),
            iterator: Mutex::new(iterator),
        }
    }
}

impl<S: Solution> Search<S> for ExhaustiveSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        &self.common
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn step(&self) -> Result<(), SearchError> {
        let candidate = self.iterator.lock().unwrap().next_solution();
        match candidate {
            Some(solution) => {
                let problem = self.common.problem();
                if problem.validate(&solution).passed() {
                    let evaluation = problem.evaluate(&solution);
                    self.common.update_best(self.as_dyn(), &solution, &evaluation);
                }
            }
            None => {
                log::debug!("search `{}`: all candidates evaluated, stopping", self.name());
                self.common.request_stop();
            }
        }
        Ok(())
    }
}
