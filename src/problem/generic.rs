//! Contains [`GenericProblem`], a ready-made [`Problem`] assembled from an
//! [`Objective`], mandatory [`Constraints`][`Constraint`] and
//! [`PenalizingConstraints`][`PenalizingConstraint`].

use rand::RngCore;

use super::{
    Constraint, Evaluation, Objective, PenalizingConstraint, Problem, Validation,
};
use crate::solution::Solution;

/// Type for the random solution factory of a [`GenericProblem`].
pub type RandomSolutionFactory<S, D> = Box<dyn Fn(&mut dyn RngCore, &D) -> S + Send + Sync>;

/// A [`Problem`] that combines one [`Objective`] with a list of mandatory and a list of
/// penalizing constraints over shared problem data `D`.
/// * The evaluation is the objective value, worsened by the sum of all penalties
///   (added when minimizing, subtracted when maximizing). Without penalizing
///   constraints a [`Evaluation::Simple`] is produced.
/// * The validation is the [unanimous][Validation::unanimous] combination of the
///   mandatory constraint validations; penalizing constraints never invalidate a
///   solution.
pub struct GenericProblem<S, D> {
    data: D,
    objective: Box<dyn Objective<S, D>>,
    mandatory_constraints: Vec<Box<dyn Constraint<S, D>>>,
    penalizing_constraints: Vec<Box<dyn PenalizingConstraint<S, D>>>,
    random_solution_factory: RandomSolutionFactory<S, D>,
}

impl<S, D> GenericProblem<S, D> {
    /// Creates a new [`GenericProblem`] with the given problem data, objective and
    /// random solution factory, without any constraints.
    pub fn new(
        data: D,
        objective: Box<dyn Objective<S, D>>,
        random_solution_factory: RandomSolutionFactory<S, D>,
    ) -> GenericProblem<S, D> {
        GenericProblem {
            data,
            objective,
            mandatory_constraints: Vec::new(),
            penalizing_constraints: Vec::new(),
            random_solution_factory,
        }
    }

    /// Adds a mandatory constraint. Solutions violating it are invalid.
    pub fn add_mandatory_constraint(&mut self, constraint: Box<dyn Constraint<S, D>>) {
        self.mandatory_constraints.push(constraint);
    }

    /// Adds a penalizing constraint. Violations worsen the evaluation instead of
    /// invalidating the solution.
    pub fn add_penalizing_constraint(&mut self, constraint: Box<dyn PenalizingConstraint<S, D>>) {
        self.penalizing_constraints.push(constraint);
    }

    /// Returns the shared problem data.
    pub fn data(&self) -> &D {
        &self.data
    }
}

impl<S: Solution, D: Send + Sync> Problem<S> for GenericProblem<S, D> {
    fn evaluate(&self, solution: &S) -> Evaluation {
        let base = self.objective.evaluate(solution, &self.data);
        if self.penalizing_constraints.is_empty() {
            return Evaluation::Simple(base);
        }
        let penalty = self
            .penalizing_constraints
            .iter()
            .map(|constraint| constraint.penalty(solution, &self.data))
            .sum();
        Evaluation::penalized(base, penalty, self.is_minimizing())
    }

    fn validate(&self, solution: &S) -> Validation {
        if self.mandatory_constraints.is_empty() {
            return Validation::Simple(true);
        }
        Validation::unanimous(
            self.mandatory_constraints
                .iter()
                .map(|constraint| constraint.validate(solution, &self.data)),
        )
    }

    fn is_minimizing(&self) -> bool {
        self.objective.is_minimizing()
    }

    fn random_solution(&self, rng: &mut dyn RngCore) -> S {
        (self.random_solution_factory)(rng, &self.data)
    }
}
