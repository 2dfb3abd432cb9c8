//! Contains the [`VariableNeighborhoodDescent`] search.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::check_neighborhoods;
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::Problem;
use crate::search::neighborhood_search::{NeighborhoodCommon, NeighborhoodSearch};
use crate::search::{Search, SearchCommon};
use crate::solution::Solution;

/// A descent over an ordered list of neighborhoods.
/// * Each step enumerates all moves of the `k`-th neighborhood and applies the best
///   strictly improving valid move; on success `k` falls back to 0, otherwise the next
///   neighborhood is tried.
/// * The search stops itself once `k` runs past the last neighborhood: the current
///   solution is then a local optimum with respect to every neighborhood in the list.
pub struct VariableNeighborhoodDescent<S: Solution> {
    common: NeighborhoodCommon<S>,
    neighborhoods: Mutex<Vec<Arc<dyn Neighborhood<S>>>>,
    index: AtomicUsize,
}

impl<S: Solution> VariableNeighborhoodDescent<S> {
    /// Creates a new [`VariableNeighborhoodDescent`] with the given problem and
    /// non-empty, ordered neighborhood list. The `random_seed` only influences the
    /// generated initial solution.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhoods: Vec<Arc<dyn Neighborhood<S>>>,
        random_seed: Option<u64>,
    ) -> Result<VariableNeighborhoodDescent<S>, SearchError> {
        check_neighborhoods(&neighborhoods)?;
        Ok(VariableNeighborhoodDescent {
            common: NeighborhoodCommon::new("variable neighborhood descent", problem, random_seed),
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
}

impl<S: Solution> Search<S> for VariableNeighborhoodDescent<S> {
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
            let k = self.index.load(Ordering::SeqCst);
            match neighborhoods.get(k) {
                Some(neighborhood) => (neighborhood.clone(), neighborhoods.len(), k),
                None => {
                    self.common.common().request_stop();
                    return Ok(());
                }
            }
        };
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
                self.index.store(0, Ordering::SeqCst);
            }
            None => {
                let next = k + 1;
                self.index.store(next, Ordering::SeqCst);
                if next >= num_neighborhoods {
                    log::debug!(
                        "search `{}`: locally optimal for all {} neighborhoods, stopping",
                        self.name(),
                        num_neighborhoods
                    );
                    self.common.common().request_stop();
                }
            }
        }
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for VariableNeighborhoodDescent<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleFlipNeighborhood, SingleSwapNeighborhood};

    #[test]
    fn an_empty_neighborhood_list_is_rejected() {
        let problem = subset_sum_problem(1..=5, vec![]);
        assert!(VariableNeighborhoodDescent::new(problem, vec![], None).is_err());
    }

    #[test]
    fn descends_through_all_neighborhoods() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let neighborhoods: Vec<Arc<dyn Neighborhood<IdSubset>>> = vec![
            Arc::new(SingleSwapNeighborhood::new(1..=5)),
            Arc::new(SingleFlipNeighborhood::new(1..=5)),
        ];
        let search = VariableNeighborhoodDescent::new(problem, neighborhoods, None).unwrap();
        search.set_current_solution(IdSubset::new([1, 2])).unwrap();
        search.start().unwrap();

        // swaps alone top out at {4, 5}; the flip neighborhood then grows the subset
        // until everything is selected
        assert_eq!(search.best_solution(), Some(IdSubset::new([1, 2, 3, 4, 5])));
        assert_eq!(search.best_evaluation().unwrap().value(), 15.0);
        // terminated on its own, in a state that no neighborhood can improve
        assert_eq!(search.current_solution(), search.best_solution());
    }
}
