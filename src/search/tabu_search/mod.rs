//! This module contains the [`TabuSearch`] and its [tabu memories][memory].
//! * Each step enumerates all moves of the neighborhood and applies the best valid
//!   move that is not tabu, even if it worsens the current solution; this lets the
//!   search climb out of local optima while the [`TabuMemory`] keeps it from cycling
//!   straight back.
//! * Aspiration override: a tabu move is admissible anyway if it yields an evaluation
//!   strictly better than the global best.
//! * After a move is applied, the newly visited solution (and the move) are registered
//!   in the memory.
//! * The search stops itself when no admissible move exists; combine it with [stop
//!   criteria][crate::search::stop_criteria] to bound the run.

pub mod memory;

pub use memory::FullSolutionTabuMemory;
pub use memory::IdBasedTabuMemory;
pub use memory::TabuMemory;

use std::sync::{Arc, Mutex};

use super::neighborhood_search::{NeighborhoodCommon, NeighborhoodSearch};
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::{Evaluation, Problem, Validation};
use crate::solution::Solution;

/// A tabu search over a single neighborhood, with a pluggable [`TabuMemory`].
pub struct TabuSearch<S: Solution> {
    common: NeighborhoodCommon<S>,
    neighborhood: Mutex<Arc<dyn Neighborhood<S>>>,
    memory: Mutex<Box<dyn TabuMemory<S>>>,
}

impl<S: Solution> TabuSearch<S> {
    /// Creates a new [`TabuSearch`] with the given problem, neighborhood and tabu
    /// memory. The `random_seed` only influences the generated initial solution.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        memory: Box<dyn TabuMemory<S>>,
        random_seed: Option<u64>,
    ) -> TabuSearch<S> {
        TabuSearch {
            common: NeighborhoodCommon::new("tabu search", problem, random_seed),
            neighborhood: Mutex::new(neighborhood),
            memory: Mutex::new(memory),
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

    /// Replaces the tabu memory. Requires an idle search.
    pub fn set_tabu_memory(&self, memory: Box<dyn TabuMemory<S>>) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        *self.memory.lock().unwrap() = memory;
        Ok(())
    }

    /// Empties the tabu memory. Requires an idle search.
    pub fn clear_tabu_memory(&self) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        self.memory.lock().unwrap().clear();
        Ok(())
    }
}

impl<S: Solution> Search<S> for TabuSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        self.common.common()
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn init(&self) -> Result<(), SearchError> {
        self.common.init_run(self.as_dyn())?;
        // the starting solution counts as visited
        let mut memory = self.memory.lock().unwrap();
        let mut state = self.common.state();
        let (run, _, _) = state.parts()?;
        memory.register(&run.current, None)
    }

    fn step(&self) -> Result<(), SearchError> {
        let neighborhood = self.neighborhood.lock().unwrap().clone();
        let mut memory = self.memory.lock().unwrap();
        let mut state = self.common.state();
        let (run, cache, _) = state.parts()?;
        let moves = neighborhood.all_moves(&run.current);

        // best admissible move: valid and either non-tabu or aspired
        let mut best: Option<(usize, Evaluation, Validation, f64)> = None;
        let problem = self.common.common().problem().clone();
        for (index, mv) in moves.iter().enumerate() {
            let validation = problem.validate_move(mv.as_ref(), &mut run.current, &run.validation);
            if !validation.passed() {
                continue;
            }
            let evaluation = problem.evaluate_move(mv.as_ref(), &mut run.current, &run.evaluation);
            if memory.is_tabu(mv.as_ref(), &mut run.current)?
                && !self.common.improves_best(evaluation.value())
            {
                continue;
            }
            let delta = self
                .common
                .compute_delta(evaluation.value(), run.evaluation.value());
            let better = match &best {
                Some((_, _, _, best_delta)) => delta > *best_delta,
                None => true,
            };
            if better {
                best = Some((index, evaluation, validation, delta));
            }
        }

        match best {
            Some((index, evaluation, validation, _)) => {
                self.common.accept_move(
                    self.as_dyn(),
                    run,
                    cache,
                    moves[index].as_ref(),
                    evaluation,
                    validation,
                );
                memory.register(&run.current, Some(moves[index].as_ref()))
            }
            None => {
                log::debug!(
                    "search `{}`: no admissible move left, stopping",
                    self.name()
                );
                self.common.common().request_stop();
                Ok(())
            }
        }
    }
}

impl<S: Solution> NeighborhoodSearch<S> for TabuSearch<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}
