//! This module contains the [`RandomSearch`], the simplest baseline search.
//! * Each step draws a fresh random solution from the problem's factory and offers it
//!   to best-solution tracking.
//! * No neighborhood is involved and there is no current solution evolving over time.
//! * The search never terminates on its own; add [stop
//!   criteria][crate::search::stop_criteria] or call [`stop`][Search::stop].

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::problem::Problem;
use crate::solution::Solution;

/// A search that samples independent random solutions and keeps the best valid one.
/// Useful as a baseline and for problems without a meaningful neighborhood structure.
pub struct RandomSearch<S: Solution> {
    common: SearchCommon<S>,
    rng: Mutex<StdRng>,
}

impl<S: Solution> RandomSearch<S> {
    /// Creates a new [`RandomSearch`] for the given problem. A `random_seed` makes the
    /// search reproducible.
    pub fn new(problem: Arc<dyn Problem<S>>, random_seed: Option<u64>) -> RandomSearch<S> {
        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomSearch {
            common: SearchCommon::new("random search", problem),
            rng: Mutex::new(rng),
        }
    }
}

impl<S: Solution> Search<S> for RandomSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        &self.common
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn step(&self) -> Result<(), SearchError> {
        let problem = self.common.problem().clone();
        let solution = {
            let mut rng = self.rng.lock().unwrap();
            problem.random_solution(&mut *rng)
        };
        if problem.validate(&solution).passed() {
            let evaluation = problem.evaluate(&solution);
            self.common.update_best(self.as_dyn(), &solution, &evaluation);
        }
        Ok(())
    }
}
