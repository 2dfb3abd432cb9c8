//! In this module, the [`Problem`] of an optimization run is defined.
//! * A [`Problem`] bundles the objective function and the constraints of a
//!   combinatorial optimization problem. It [evaluates][Problem::evaluate] solutions to
//!   an [`Evaluation`] and [validates][Problem::validate] them to a [`Validation`].
//! * Both come in a full and an incremental form: the incremental form receives a
//!   [`Move`], the current solution and the current evaluation/validation, and must be
//!   semantically equivalent to applying the move and recomputing from scratch. The
//!   default implementations do exactly that (apply, recompute, undo), so problems only
//!   override them when a cheaper delta computation exists.
//! * [`GenericProblem`] is a ready-made [`Problem`] that combines one [`Objective`]
//!   with any number of mandatory [`Constraints`][`Constraint`] and
//!   [`PenalizingConstraints`][`PenalizingConstraint`] over shared problem data.

pub mod evaluation;
pub mod validation;
mod constraints;
mod generic;
#[cfg(test)]
mod tests;

pub use constraints::Constraint;
pub use constraints::Objective;
pub use constraints::PenalizingConstraint;
pub use evaluation::Evaluation;
pub use generic::GenericProblem;
pub use validation::Validation;

use rand::RngCore;

use crate::neighborhood::Move;
use crate::solution::Solution;

/// Defines an optimization problem over the solution type `S`: the objective, the
/// constraints, the optimization direction and a factory for random solutions.
///
/// Problems are shared between searches and between the replicas of a parallel search,
/// so all methods must be safe to call concurrently. Note that the default incremental
/// implementations temporarily mutate the passed solution (apply, recompute, undo);
/// this is safe because every search owns its current solution exclusively. Problems
/// that maintain internal caches across calls must synchronize them internally.
pub trait Problem<S: Solution>: Send + Sync {
    /// Computes the [`Evaluation`] of the given solution from scratch.
    fn evaluate(&self, solution: &S) -> Evaluation;

    /// Validates the given solution against the mandatory constraints from scratch.
    fn validate(&self, solution: &S) -> Validation;

    /// Whether the objective value is to be minimized (`true`) or maximized (`false`).
    fn is_minimizing(&self) -> bool;

    /// Creates a random solution, used to seed searches without a user-supplied
    /// initial solution.
    fn random_solution(&self, rng: &mut dyn RngCore) -> S;

    /// Computes the evaluation that `solution` would have after applying `mv`, given
    /// the current evaluation. Must equal a full [`evaluate`][Problem::evaluate] of the
    /// modified solution. The default applies the move, evaluates from scratch and
    /// undoes the move again.
    fn evaluate_move(
        &self,
        mv: &dyn Move<S>,
        solution: &mut S,
        _current: &Evaluation,
    ) -> Evaluation {
        mv.apply(solution);
        let evaluation = self.evaluate(solution);
        mv.undo(solution);
        evaluation
    }

    /// Computes the validation that `solution` would have after applying `mv`, given
    /// the current validation. Must equal a full [`validate`][Problem::validate] of the
    /// modified solution. The default applies the move, validates from scratch and
    /// undoes the move again.
    fn validate_move(
        &self,
        mv: &dyn Move<S>,
        solution: &mut S,
        _current: &Validation,
    ) -> Validation {
        mv.apply(solution);
        let validation = self.validate(solution);
        mv.undo(solution);
        validation
    }

    /// An additional hard rejection checked independently of evaluation and validation.
    /// A rejected solution is never recorded as best solution. Defaults to accepting
    /// everything.
    fn reject_solution(&self, _solution: &S) -> bool {
        false
    }
}
