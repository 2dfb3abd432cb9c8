//! This module contains the [`RandomDescent`] search.
//! * Each step obtains one random move from the neighborhood and applies it exactly if
//!   it yields a valid, strictly better solution; otherwise the move is rejected and
//!   the current solution stays.
//! * The search stops itself only when the neighborhood cannot generate a move; since
//!   rejected moves do not end the run, combine it with [stop
//!   criteria][crate::search::stop_criteria] such as
//!   [`MaxStepsWithoutImprovement`][crate::search::stop_criteria::MaxStepsWithoutImprovement].

use std::sync::{Arc, Mutex};

use super::neighborhood_search::{NeighborhoodCommon, NeighborhoodSearch};
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::Problem;
use crate::solution::Solution;

/// A descent that samples one random neighbor per step and accepts improvements only.
pub struct RandomDescent<S: Solution> {
    common: NeighborhoodCommon<S>,
    neighborhood: Mutex<Arc<dyn Neighborhood<S>>>,
}

impl<S: Solution> RandomDescent<S> {
    /// Creates a new [`RandomDescent`] with the given problem and neighborhood. A
    /// `random_seed` makes the search reproducible.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        random_seed: Option<u64>,
    ) -> RandomDescent<S> {
        RandomDescent {
            common: NeighborhoodCommon::new("random descent", problem, random_seed),
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

impl<S: Solution> Search<S> for RandomDescent<S> {
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
        let (run, cache, rng) = state.parts()?;
        let mv = match neighborhood.random_move(&run.current, rng) {
            Some(mv) => mv,
            None => {
                log::debug!("search `{}`: neighborhood is empty, stopping", self.name());
                self.common.common().request_stop();
                return Ok(());
            }
        };
        if self.common.is_improvement(run, cache, mv.as_ref()) {
            let evaluation = self.common.evaluate_move(run, cache, mv.as_ref());
            let validation = self.common.validate_move(run, cache, mv.as_ref());
            self.common
                .accept_move(self.as_dyn(), run, cache, mv.as_ref(), evaluation, validation);
        } else {
            self.common.reject_move(cache);
        }
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for RandomDescent<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::stop_criteria::MaxStepsWithoutImprovement;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleSwapNeighborhood};
    use std::time::Duration;

    #[test]
    fn improves_until_no_swap_helps() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=5));
        let search = RandomDescent::new(problem, neighborhood, Some(3));
        search.set_current_solution(IdSubset::new([1, 2])).unwrap();
        search
            .common()
            .add_stop_criterion(Arc::new(MaxStepsWithoutImprovement::new(300)))
            .unwrap();
        search
            .common()
            .set_stop_criterion_check_period(Duration::from_millis(1))
            .unwrap();
        search.start().unwrap();

        // with two selected ids, {4, 5} is the unique local (and global) optimum
        assert_eq!(search.best_solution(), Some(IdSubset::new([4, 5])));
        assert_eq!(search.best_evaluation().unwrap().value(), 9.0);
    }

    #[test]
    fn every_considered_move_is_accepted_or_rejected() {
        let problem = subset_sum_problem(1..=6, vec![]);
        let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=6));
        let search = RandomDescent::new(problem, neighborhood, Some(11));
        search.set_current_solution(IdSubset::new([1, 2, 3])).unwrap();
        search
            .common()
            .add_stop_criterion(Arc::new(MaxStepsWithoutImprovement::new(100)))
            .unwrap();
        search
            .common()
            .set_stop_criterion_check_period(Duration::from_millis(1))
            .unwrap();
        search.start().unwrap();

        assert_eq!(
            search.num_accepted() + search.num_rejected(),
            search.num_steps()
        );
        assert!(search.num_accepted() >= 1);
    }
}
