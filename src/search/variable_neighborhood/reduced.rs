//! Contains the [`ReducedVariableNeighborhoodSearch`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::check_neighborhoods;
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::Problem;
use crate::search::neighborhood_search::{NeighborhoodCommon, NeighborhoodSearch};
use crate::search::{Search, SearchCommon};
use crate::solution::Solution;

/// The stochastic counterpart of [variable neighborhood
/// descent][super::VariableNeighborhoodDescent], for neighborhoods too large to
/// enumerate.
/// * Each step samples one random move from the `k`-th neighborhood. An improvement is
///   applied and resets `k` to 0; a rejection advances `k`. A neighborhood that cannot
///   produce a move advances `k` as well, without counting as a considered move.
/// * `k` wraps around cyclically, so the search never terminates on its own; bound the
///   run with [stop criteria][crate::search::stop_criteria] or
///   [`stop`][Search::stop].
pub struct ReducedVariableNeighborhoodSearch<S: Solution> {
    common: NeighborhoodCommon<S>,
    neighborhoods: Mutex<Vec<Arc<dyn Neighborhood<S>>>>,
    index: AtomicUsize,
}

impl<S: Solution> ReducedVariableNeighborhoodSearch<S> {
    /// Creates a new [`ReducedVariableNeighborhoodSearch`] with the given problem and
    /// non-empty, ordered neighborhood list. A `random_seed` makes the search
    /// reproducible.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhoods: Vec<Arc<dyn Neighborhood<S>>>,
        random_seed: Option<u64>,
    ) -> Result<ReducedVariableNeighborhoodSearch<S>, SearchError> {
        check_neighborhoods(&neighborhoods)?;
        Ok(ReducedVariableNeighborhoodSearch {
            common: NeighborhoodCommon::new(
                "reduced variable neighborhood search",
                problem,
                random_seed,
            ),
            neighborhoods: Mutex::new(neighborhoods),
            index: AtomicUsize::new(0),
        })
    }

    /// Replaces the neighborhood list (non-empty). Requires an idle search.
    pub fn set_neighborhoods(
        &self,
        neighborhoods: Vec<Arc<dyn Neighborhood<S>>>,
    ) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        check_neighborhoods(&neighborhoods)?;
        *self.neighborhoods.lock().unwrap() = neighborhoods;
        Ok(())
    }

    fn advance_index(&self, current: usize, num_neighborhoods: usize) {
        let next = (current + 1) % num_neighborhoods;
        self.index.store(next, Ordering::SeqCst);
    }
}

impl<S: Solution> Search<S> for ReducedVariableNeighborhoodSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        self.common.common()
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn init(&self) -> Result<(), SearchError> {
        self.index.store(0, Ordering::SeqCst);
        self.common.init_run(self.as_dyn())
    }

    fn step(&self) -> Result<(), SearchError> {
        let (neighborhood, num_neighborhoods, k) = {
            let neighborhoods = self.neighborhoods.lock().unwrap();
            let k = self.index.load(Ordering::SeqCst) % neighborhoods.len();
            (neighborhoods[k].clone(), neighborhoods.len(), k)
        };
        let mut state = self.common.state();
        let (run, cache, rng) = state.parts()?;
        let mv = match neighborhood.random_move(&run.current, rng) {
            Some(mv) => mv,
            None => {
                // empty neighborhood: move on to the next one
                self.advance_index(k, num_neighborhoods);
                return Ok(());
            }
        };
        if self.common.is_improvement(run, cache, mv.as_ref()) {
            let evaluation = self.common.evaluate_move(run, cache, mv.as_ref());
            let validation = self.common.validate_move(run, cache, mv.as_ref());
            self.common
                .accept_move(self.as_dyn(), run, cache, mv.as_ref(), evaluation, validation);
            self.index.store(0, Ordering::SeqCst);
        } else {
            self.common.reject_move(cache);
            self.advance_index(k, num_neighborhoods);
        }
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for ReducedVariableNeighborhoodSearch<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}
