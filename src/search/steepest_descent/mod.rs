//! This module contains the [`SteepestDescent`] search.
//! * Each step enumerates all moves of the neighborhood and applies the best strictly
//!   improving valid move.
//! * The search stops itself as soon as no such move exists: the current solution is a
//!   local optimum with respect to the neighborhood.

use std::sync::{Arc, Mutex};

use super::neighborhood_search::{NeighborhoodCommon, NeighborhoodSearch};
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::Problem;
use crate::solution::Solution;

/// A descent that always applies the best improving move of the full neighborhood.
pub struct SteepestDescent<S: Solution> {
    common: NeighborhoodCommon<S>,
    neighborhood: Mutex<Arc<dyn Neighborhood<S>>>,
}

impl<S: Solution> SteepestDescent<S> {
    /// Creates a new [`SteepestDescent`] with the given problem and neighborhood. The
    /// `random_seed` only influences the generated initial solution.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        random_seed: Option<u64>,
    ) -> SteepestDescent<S> {
        SteepestDescent {
            common: NeighborhoodCommon::new("steepest descent", problem, random_seed),
            neighborhood: Mutex::new(neighborhood),
        }
    }

    /// Replaces the neighborhood. Requires an idle search.
    pub fn set_neighborhood(
        &self,
        neighborhood: Arc<dyn Neighborhood<S>>,
    ) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        *self.neighborhood.lock().unwrap() = neighborhood;
        Ok(())
    }
}

impl<S: Solution> Search<S> for SteepestDescent<S> {
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
        let neighborhood = self.neighborhood.lock().unwrap().clone();
        let mut state = self.common.state();
        let (run, cache, _) = state.parts()?;
        let moves = neighborhood.all_moves(&run.current);
        match self.common.best_move(run, &moves, true) {
            Some((index, evaluation, validation, _)) => {
                self.common.accept_move(
                    self.as_dyn(),
                    run,
                    cache,
                    moves[index].as_ref(),
                    evaluation,
                    validation,
                );
            }
            None => {
                log::debug!("search `{}`: local optimum reached, stopping", self.name());
                self.common.common().request_stop();
            }
        }
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for SteepestDescent<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleSwapNeighborhood};

    #[test]
    fn converges_to_the_best_swap_reachable_subset() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=5));
        let search = SteepestDescent::new(problem, neighborhood, None);
        search.set_current_solution(IdSubset::new([1, 2])).unwrap();
        search.start().unwrap();

        assert_eq!(search.best_solution(), Some(IdSubset::new([4, 5])));
        assert_eq!(search.best_evaluation().unwrap().value(), 9.0);
        // the run ended because no improving swap was left
        assert_eq!(search.current_solution(), Some(IdSubset::new([4, 5])));
    }

    #[test]
    fn stops_immediately_on_an_empty_neighborhood() {
        let problem = subset_sum_problem(1..=3, vec![]);
        let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=3));
        let search = SteepestDescent::new(problem, neighborhood, None);
        // all ids selected: no swap exists
        search.set_current_solution(IdSubset::new([1, 2, 3])).unwrap();
        search.start().unwrap();
        assert_eq!(search.num_accepted(), 0);
        assert_eq!(search.best_evaluation().unwrap().value(), 6.0);
    }
}
