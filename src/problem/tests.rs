use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::neighborhood::Move;
use crate::subset::{IdMove, IdSet, IdSubset};

/// Maximizes the sum of the selected ids.
struct SelectedIdSum;

impl Objective<IdSubset, Vec<u32>> for SelectedIdSum {
    fn evaluate(&self, solution: &IdSubset, _data: &Vec<u32>) -> f64 {
        solution.iter().map(|id| id as f64).sum()
    }

    fn is_minimizing(&self) -> bool {
        false
    }
}

/// Every selected id must be odd.
struct AllSelectedOdd;

impl Constraint<IdSubset, Vec<u32>> for AllSelectedOdd {
    fn validate(&self, solution: &IdSubset, _data: &Vec<u32>) -> Validation {
        Validation::Simple(solution.iter().all(|id| id % 2 == 1))
    }
}

/// Penalizes each selected id beyond the allowed size by 1.
struct OversizePenalty {
    max_size: usize,
}

impl PenalizingConstraint<IdSubset, Vec<u32>> for OversizePenalty {
    fn penalty(&self, solution: &IdSubset, _data: &Vec<u32>) -> f64 {
        solution.len().saturating_sub(self.max_size) as f64
    }
}

fn toy_problem() -> GenericProblem<IdSubset, Vec<u32>> {
    GenericProblem::new(
        (1..=5).collect(),
        Box::new(SelectedIdSum),
        Box::new(|rng, data: &Vec<u32>| {
            IdSubset::new(data.iter().copied().filter(|_| rng.gen::<bool>()))
        }),
    )
}

#[test]
fn default_move_evaluation_equals_full_recomputation() {
    // ARRANGE
    let mut problem = toy_problem();
    problem.add_mandatory_constraint(Box::new(AllSelectedOdd));
    let mut solution = IdSubset::empty();
    let mut evaluation = problem.evaluate(&solution);
    let mut validation = problem.validate(&solution);
    assert_eq!(evaluation.value(), 0.0);
    assert!(validation.passed());

    // ACT + ASSERT: add 3, add 5, add 2
    for (id, expected_value, expected_valid) in [(3, 3.0, true), (5, 8.0, true), (2, 10.0, false)]
    {
        let mv = IdMove::Add(id);
        let move_evaluation = problem.evaluate_move(&mv, &mut solution, &evaluation);
        let move_validation = problem.validate_move(&mv, &mut solution, &validation);
        assert_eq!(move_evaluation.value(), expected_value);
        assert_eq!(move_validation.passed(), expected_valid);

        mv.apply(&mut solution);
        assert_eq!(move_evaluation, problem.evaluate(&solution));
        assert_eq!(move_validation, problem.validate(&solution));
        evaluation = move_evaluation;
        validation = move_validation;
    }
}

#[test]
fn move_evaluation_leaves_the_solution_untouched() {
    let problem = toy_problem();
    let mut solution = IdSubset::new([1, 4]);
    let before = solution.clone();
    let evaluation = problem.evaluate(&solution);
    let mv = IdMove::Swap {
        add_id: 5,
        remove_id: 4,
    };
    let move_evaluation = problem.evaluate_move(&mv, &mut solution, &evaluation);
    assert_eq!(solution, before);
    assert_eq!(move_evaluation.value(), 6.0);
}

#[test]
fn penalizing_constraints_worsen_the_evaluation() {
    let mut problem = toy_problem();
    problem.add_penalizing_constraint(Box::new(OversizePenalty { max_size: 1 }));

    // maximizing: the penalty is subtracted
    let evaluation = problem.evaluate(&IdSubset::new([1, 2]));
    assert_eq!(evaluation.base_value(), 3.0);
    assert_eq!(evaluation.penalty(), 1.0);
    assert_eq!(evaluation.value(), 2.0);

    // a solution within the size bound is not penalized and the validation is
    // unaffected either way
    let evaluation = problem.evaluate(&IdSubset::new([4]));
    assert_eq!(evaluation.value(), 4.0);
    assert!(problem.validate(&IdSubset::new([1, 2])).passed());
}

#[test]
fn validation_combines_mandatory_constraints_unanimously() {
    let mut problem = toy_problem();
    problem.add_mandatory_constraint(Box::new(AllSelectedOdd));
    assert!(problem.validate(&IdSubset::new([1, 3])).passed());
    assert!(!problem.validate(&IdSubset::new([1, 2])).passed());
}

#[test]
fn random_solutions_come_from_the_factory() {
    let problem = toy_problem();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let solution = problem.random_solution(&mut rng);
        assert!(solution.selected_ids().iter().all(|id| (1..=5).contains(id)));
    }
}

#[test]
fn evaluation_reports_to_json() {
    let simple = Evaluation::Simple(3.5);
    assert_eq!(simple.to_json(), serde_json::json!({ "value": 3.5 }));

    let penalized = Evaluation::penalized(10.0, 2.0, true);
    assert_eq!(
        penalized.to_json(),
        serde_json::json!({ "value": 12.0, "base": 10.0, "penalty": 2.0 })
    );
}
