//! Contains the [`MoveCache`] trait and the default [`SingleMoveCache`].
//!
//! Within one search step, a move is typically validated, then evaluated, and finally
//! applied; the cache avoids recomputing evaluations and validations between these
//! phases. Caches are strictly per-search and never shared between threads.

use crate::neighborhood::Move;
use crate::problem::{Evaluation, Validation};
use crate::solution::Solution;

/// Caches the evaluations and validations of recently queried moves.
///
/// Entries are keyed by move identity (the address of the move object), which is
/// sufficient because moves live no longer than the search step that generated them
/// and the owning search [clears][MoveCache::clear] the cache whenever a move is
/// accepted or rejected.
pub trait MoveCache<S: Solution>: Send {
    /// The cached evaluation of the given move, if present.
    fn evaluation(&self, mv: &dyn Move<S>) -> Option<Evaluation>;

    /// The cached validation of the given move, if present.
    fn validation(&self, mv: &dyn Move<S>) -> Option<Validation>;

    /// Caches the evaluation of the given move.
    fn store_evaluation(&mut self, mv: &dyn Move<S>, evaluation: Evaluation);

    /// Caches the validation of the given move.
    fn store_validation(&mut self, mv: &dyn Move<S>, validation: Validation);

    /// Drops all cached entries.
    fn clear(&mut self);
}

fn key<S: Solution>(mv: &dyn Move<S>) -> usize {
    mv as *const dyn Move<S> as *const () as usize
}

/// The default [`MoveCache`] of a
/// [`NeighborhoodCommon`][super::neighborhood_search::NeighborhoodCommon]: remembers only the most
/// recently queried move's evaluation and validation, in O(1) space. This covers the
/// common validate–evaluate–apply sequence of a single move while staying cheap for
/// searches that consider many moves per step.
#[derive(Default)]
pub struct SingleMoveCache {
    evaluation: Option<(usize, Evaluation)>,
    validation: Option<(usize, Validation)>,
}

impl SingleMoveCache {
    /// Creates an empty cache.
    pub fn new() -> SingleMoveCache {
        SingleMoveCache::default()
    }
}

impl<S: Solution> MoveCache<S> for SingleMoveCache {
    fn evaluation(&self, mv: &dyn Move<S>) -> Option<Evaluation> {
        match &self.evaluation {
            Some((cached_key, evaluation)) if *cached_key == key(mv) => Some(evaluation.clone()),
            _ => None,
        }
    }

    fn validation(&self, mv: &dyn Move<S>) -> Option<Validation> {
        match &self.validation {
            Some((cached_key, validation)) if *cached_key == key(mv) => Some(validation.clone()),
            _ => None,
        }
    }

    fn store_evaluation(&mut self, mv: &dyn Move<S>, evaluation: Evaluation) {
        self.evaluation = Some((key(mv), evaluation));
    }

    fn store_validation(&mut self, mv: &dyn Move<S>, validation: Validation) {
        self.validation = Some((key(mv), validation));
    }

    fn clear(&mut self) {
        self.evaluation = None;
        self.validation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subset::{IdMove, IdSubset};

    #[test]
    fn remembers_only_the_most_recent_move() {
        let mut cache = SingleMoveCache::new();
        let first = IdMove::Add(1);
        let second = IdMove::Add(2);
        let first_ref: &dyn Move<IdSubset> = &first;
        let second_ref: &dyn Move<IdSubset> = &second;

        cache.store_evaluation(first_ref, Evaluation::Simple(1.0));
        assert_eq!(cache.evaluation(first_ref), Some(Evaluation::Simple(1.0)));
        assert_eq!(cache.evaluation(second_ref), None);

        cache.store_evaluation(second_ref, Evaluation::Simple(2.0));
        assert_eq!(cache.evaluation(first_ref), None);
        assert_eq!(cache.evaluation(second_ref), Some(Evaluation::Simple(2.0)));
    }

    #[test]
    fn evaluation_and_validation_are_cached_independently() {
        let mut cache = SingleMoveCache::new();
        let mv = IdMove::Remove(3);
        let mv_ref: &dyn Move<IdSubset> = &mv;

        cache.store_validation(mv_ref, Validation::Simple(true));
        assert_eq!(MoveCache::<IdSubset>::evaluation(&cache, mv_ref), None);
        assert_eq!(cache.validation(mv_ref), Some(Validation::Simple(true)));

        MoveCache::<IdSubset>::clear(&mut cache);
        assert_eq!(MoveCache::<IdSubset>::validation(&cache, mv_ref), None);
    }
}
