//! Contains [`NeighborhoodCommon`] and the [`NeighborhoodSearch`] trait: the state and
//! helpers shared by all searches that explore a
//! [`Neighborhood`][crate::neighborhood::Neighborhood].
//! * A neighborhood search holds a current solution together with its cached
//!   evaluation and validation, and a pluggable [`MoveCache`] for the evaluations and
//!   validations of candidate moves.
//! * Accepting a move applies it to the current solution in place, promotes the cached
//!   post-move evaluation and validation to the current ones and offers the new
//!   current solution to best tracking; rejecting a move only advances the rejection
//!   counter. Both clear the move cache.
//! * The delta helpers normalize the improvement direction: a positive delta always
//!   means "better", for minimizing as well as maximizing problems.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::strictly_better;
use super::move_cache::{MoveCache, SingleMoveCache};
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::neighborhood::Move;
use crate::problem::{Evaluation, Problem, Validation};
use crate::solution::Solution;

/// The current solution of a neighborhood search, together with its evaluation and
/// validation (kept consistent with the solution at all times).
pub(crate) struct CurrentState<S: Solution> {
    pub(crate) current: S,
    pub(crate) evaluation: Evaluation,
    pub(crate) validation: Validation,
}

/// The inner, single-threaded state of a neighborhood search. Only the thread
/// executing the search touches it, except for the solution swaps of parallel
/// tempering, which happen while no replica is executing.
pub(crate) struct NeighborhoodState<S: Solution> {
    pub(crate) rng: StdRng,
    pub(crate) pending: Option<S>,
    pub(crate) run: Option<CurrentState<S>>,
    pub(crate) cache: Box<dyn MoveCache<S>>,
}

impl<S: Solution> NeighborhoodState<S> {
    /// Splits the state into the borrows a search step needs: the current state, the
    /// move cache and the random number generator. Fails if no run has been
    /// initialized yet.
    pub(crate) fn parts(
        &mut self,
    ) -> Result<(&mut CurrentState<S>, &mut dyn MoveCache<S>, &mut StdRng), SearchError> {
        match self.run.as_mut() {
            Some(run) => Ok((run, self.cache.as_mut(), &mut self.rng)),
            None => Err(SearchError::Execution(
                "search step executed without a current solution".to_string(),
            )),
        }
    }
}

/// The state shared by all neighborhood searches, wrapping a [`SearchCommon`]:
/// the current solution with cached evaluation/validation, the move cache and the
/// accept/reject bookkeeping.
pub struct NeighborhoodCommon<S: Solution> {
    common: SearchCommon<S>,
    state: Mutex<NeighborhoodState<S>>,
    num_accepted: AtomicU64,
    num_rejected: AtomicU64,
}

impl<S: Solution> NeighborhoodCommon<S> {
    /// Creates the shared neighborhood-search state. With a `random_seed` the search
    /// becomes reproducible; otherwise the generator is seeded from entropy.
    pub fn new(
        name: impl Into<String>,
        problem: Arc<dyn Problem<S>>,
        random_seed: Option<u64>,
    ) -> NeighborhoodCommon<S> {
        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        NeighborhoodCommon {
            common: SearchCommon::new(name, problem),
            state: Mutex::new(NeighborhoodState {
                rng,
                pending: None,
                run: None,
                cache: Box::new(SingleMoveCache::new()),
            }),
            num_accepted: AtomicU64::new(0),
            num_rejected: AtomicU64::new(0),
        }
    }

    /// The wrapped [`SearchCommon`].
    pub fn common(&self) -> &SearchCommon<S> {
        &self.common
    }

    /// The number of accepted moves, cumulative over all runs.
    pub fn num_accepted(&self) -> u64 {
        self.num_accepted.load(Ordering::SeqCst)
    }

    /// The number of rejected moves, cumulative over all runs.
    pub fn num_rejected(&self) -> u64 {
        self.num_rejected.load(Ordering::SeqCst)
    }

    /// A deep copy of the current solution, if one exists already.
    pub fn current_solution(&self) -> Option<S> {
        let state = self.state.lock().unwrap();
        state
            .run
            .as_ref()
            .map(|run| run.current.clone())
            .or_else(|| state.pending.clone())
    }

    /// The evaluation of the current solution, if a run has been initialized.
    pub fn current_evaluation(&self) -> Option<Evaluation> {
        let state = self.state.lock().unwrap();
        state.run.as_ref().map(|run| run.evaluation.clone())
    }

    /// The validation of the current solution, if a run has been initialized.
    pub fn current_validation(&self) -> Option<Validation> {
        let state = self.state.lock().unwrap();
        state.run.as_ref().map(|run| run.validation.clone())
    }

    /// Sets the solution from which the next run starts. Requires an idle search.
    pub fn set_current_solution(&self, solution: S) -> Result<(), SearchError> {
        self.common.assert_idle()?;
        self.state.lock().unwrap().pending = Some(solution);
        Ok(())
    }

    /// Replaces the move cache. Requires an idle search.
    pub fn set_move_cache(&self, cache: Box<dyn MoveCache<S>>) -> Result<(), SearchError> {
        self.common.assert_idle()?;
        self.state.lock().unwrap().cache = cache;
        Ok(())
    }

    /// The signed improvement of `new_value` over `old_value` under the problem's
    /// optimization direction: positive means better.
    pub fn compute_delta(&self, new_value: f64, old_value: f64) -> f64 {
        if self.common.is_minimizing() {
            old_value - new_value
        } else {
            new_value - old_value
        }
    }

    /// Locks the inner state for a search step.
    pub(crate) fn state(&self) -> MutexGuard<'_, NeighborhoodState<S>> {
        self.state.lock().unwrap()
    }

    /// Prepares the current solution for a run: a pending user-supplied solution wins,
    /// an existing current solution (from an earlier run) is kept, and otherwise a
    /// random solution is generated. The (re)evaluated current solution is offered to
    /// best tracking if it is valid.
    pub(crate) fn init_run(&self, search: &dyn Search<S>) -> Result<(), SearchError> {
        let mut state = self.state.lock().unwrap();
        if let Some(initial) = state.pending.take() {
            state.run = Some(self.evaluated(initial));
        } else if state.run.is_none() {
            let random = self.common.problem().random_solution(&mut state.rng);
            state.run = Some(self.evaluated(random));
        }
        state.cache.clear();
        let run = state.run.as_ref().ok_or_else(|| {
            SearchError::Execution("failed to initialize a current solution".to_string())
        })?;
        if run.validation.passed() {
            self.common.update_best(search, &run.current, &run.evaluation);
        }
        Ok(())
    }

    fn evaluated(&self, solution: S) -> CurrentState<S> {
        let evaluation = self.common.problem().evaluate(&solution);
        let validation = self.common.problem().validate(&solution);
        CurrentState {
            current: solution,
            evaluation,
            validation,
        }
    }

    /// Evaluates a candidate move incrementally, through the move cache.
    pub(crate) fn evaluate_move(
        &self,
        run: &mut CurrentState<S>,
        cache: &mut dyn MoveCache<S>,
        mv: &dyn Move<S>,
    ) -> Evaluation {
        if let Some(cached) = cache.evaluation(mv) {
            return cached;
        }
        let evaluation = self
            .common
            .problem()
            .evaluate_move(mv, &mut run.current, &run.evaluation);
        cache.store_evaluation(mv, evaluation.clone());
        evaluation
    }

    /// Validates a candidate move incrementally, through the move cache.
    pub(crate) fn validate_move(
        &self,
        run: &mut CurrentState<S>,
        cache: &mut dyn MoveCache<S>,
        mv: &dyn Move<S>,
    ) -> Validation {
        if let Some(cached) = cache.validation(mv) {
            return cached;
        }
        let validation = self
            .common
            .problem()
            .validate_move(mv, &mut run.current, &run.validation);
        cache.store_validation(mv, validation.clone());
        validation
    }

    /// Whether the given move yields a valid, strictly better solution.
    pub(crate) fn is_improvement(
        &self,
        run: &mut CurrentState<S>,
        cache: &mut dyn MoveCache<S>,
        mv: &dyn Move<S>,
    ) -> bool {
        if !self.validate_move(run, cache, mv).passed() {
            return false;
        }
        let evaluation = self.evaluate_move(run, cache, mv);
        self.compute_delta(evaluation.value(), run.evaluation.value()) > 0.0
    }

    /// Scans the given moves and returns the index of the best valid move together
    /// with its evaluation, validation and delta. With `strict_improvement`, only
    /// moves with a positive delta qualify; otherwise the best valid move is returned
    /// regardless of its delta. Each move is validated before it is evaluated; ties
    /// are broken in favor of the first-seen move. Returns `None` if no move
    /// qualifies.
    pub(crate) fn best_move(
        &self,
        run: &mut CurrentState<S>,
        moves: &[Box<dyn Move<S>>],
        strict_improvement: bool,
    ) -> Option<(usize, Evaluation, Validation, f64)> {
        let mut best: Option<(usize, Evaluation, Validation, f64)> = None;
        for (index, mv) in moves.iter().enumerate() {
            let validation = self
                .common
                .problem()
                .validate_move(mv.as_ref(), &mut run.current, &run.validation);
            if !validation.passed() {
                continue;
            }
            let evaluation = self
                .common
                .problem()
                .evaluate_move(mv.as_ref(), &mut run.current, &run.evaluation);
            let delta = self.compute_delta(evaluation.value(), run.evaluation.value());
            if strict_improvement && delta <= 0.0 {
                continue;
            }
            let better = match &best {
                Some((_, _, _, best_delta)) => delta > *best_delta,
                None => true,
            };
            if better {
                best = Some((index, evaluation, validation, delta));
            }
        }
        best
    }

    /// Accepts a move whose post-move evaluation and validation are already known:
    /// applies it to the current solution, promotes the evaluation and validation,
    /// clears the move cache, advances the acceptance counter and offers the new
    /// current solution to best tracking.
    pub(crate) fn accept_move(
        &self,
        search: &dyn Search<S>,
        run: &mut CurrentState<S>,
        cache: &mut dyn MoveCache<S>,
        mv: &dyn Move<S>,
        evaluation: Evaluation,
        validation: Validation,
    ) {
        mv.apply(&mut run.current);
        run.evaluation = evaluation;
        run.validation = validation;
        cache.clear();
        self.num_accepted.fetch_add(1, Ordering::SeqCst);
        if run.validation.passed() {
            self.common.update_best(search, &run.current, &run.evaluation);
        }
    }

    /// Rejects a move: advances the rejection counter and clears the move cache.
    pub(crate) fn reject_move(&self, cache: &mut dyn MoveCache<S>) {
        cache.clear();
        self.num_rejected.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `candidate` strictly improves on the best evaluation seen so far (true
    /// if there is none yet). Used for aspiration checks.
    pub(crate) fn improves_best(&self, candidate: f64) -> bool {
        match self.common.best_evaluation() {
            Some(best) => strictly_better(self.common.is_minimizing(), candidate, best.value()),
            None => true,
        }
    }
}

/// The common interface of all searches that explore a neighborhood: access to the
/// current solution and the accept/reject counters.
pub trait NeighborhoodSearch<S: Solution>: Search<S> {
    /// The shared neighborhood-search state of this search.
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S>;

    /// A deep copy of the current solution, if one exists already.
    fn current_solution(&self) -> Option<S> {
        self.neighborhood_common().current_solution()
    }

    /// The evaluation of the current solution, if a run has been initialized.
    fn current_evaluation(&self) -> Option<Evaluation> {
        self.neighborhood_common().current_evaluation()
    }

    /// The validation of the current solution, if a run has been initialized.
    fn current_validation(&self) -> Option<Validation> {
        self.neighborhood_common().current_validation()
    }

    /// Sets the solution from which the next run starts. Requires an idle search.
    fn set_current_solution(&self, solution: S) -> Result<(), SearchError> {
        self.neighborhood_common().set_current_solution(solution)
    }

    /// The number of accepted moves, cumulative over all runs.
    fn num_accepted(&self) -> u64 {
        self.neighborhood_common().num_accepted()
    }

    /// The number of rejected moves, cumulative over all runs.
    fn num_rejected(&self) -> u64 {
        self.neighborhood_common().num_rejected()
    }
}
