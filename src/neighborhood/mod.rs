//! This module provides the [`Move`] and [`Neighborhood`] traits, which together define
//! the local search neighborhood of a solution.
//! * A [`Move`] is a small reversible modification of a solution. It is applied to the
//!   current solution in place and can be undone again, restoring the solution exactly.
//! * A [`Neighborhood`] generates moves for a given solution, either one at random or
//!   all of them.
//!
//! Moves are short-lived: a search obtains them from its neighborhood, evaluates them
//! (usually [incrementally][crate::problem::Problem::evaluate_move]) and either applies
//! or discards them within a single search step.

use std::any::Any;

use rand::RngCore;

use crate::solution::Solution;

/// A reversible modification of a solution.
///
/// Moves carry only value-type payloads (indices, ids) and hold no reference to the
/// solution they were generated for, so they can be freely created and discarded.
///
/// The apply/undo pair must be an exact reverse: after `apply(s)` followed by
/// `undo(s)`, the solution `s` compares equal (and hashes equal) to its state before
/// `apply`.
pub trait Move<S: Solution>: Any + Send + Sync {
    /// Applies the move to the given solution, modifying it in place.
    fn apply(&self, solution: &mut S);

    /// Undoes a previous [`apply`][Move::apply] of this move, restoring the solution
    /// exactly.
    fn undo(&self, solution: &mut S);

    /// Returns `self` as [`Any`], so that components which interpret specific move
    /// kinds (e.g. the [id-based tabu memory][crate::search::tabu_search::IdBasedTabuMemory])
    /// can downcast it.
    fn as_any(&self) -> &dyn Any;

    /// The concrete type name of this move, used in error messages.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A local search neighborhood that generates [`Moves`][`Move`] for a given solution.
///
/// Neighborhoods are shared between searches (and between the replicas of a parallel
/// search), so they must be safe to call from multiple threads; any randomness is
/// provided by the caller through the `rng` argument.
pub trait Neighborhood<S: Solution>: Send + Sync {
    /// Returns a single random move for the given solution, or `None` exactly if no
    /// move can be generated in the current state (empty neighborhood).
    fn random_move(&self, solution: &S, rng: &mut dyn RngCore) -> Option<Box<dyn Move<S>>>;

    /// Returns all moves of this neighborhood for the given solution. The enumeration
    /// is finite; the order is unspecified unless a concrete neighborhood documents it.
    fn all_moves(&self, solution: &S) -> Vec<Box<dyn Move<S>>>;
}
