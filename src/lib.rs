#![warn(missing_docs)]
//! This library provides a metaheuristic local search framework for solving discrete
//! combinatorial optimization problems.
//!
//! # Overview
//! ### Searches
//! The following [searches][search] are included:
//! - [random search][search::random_search] and [exhaustive
//!   search][search::exhaustive] as baselines
//! - [random descent][search::random_descent] and [steepest
//!   descent][search::steepest_descent]
//! - [Metropolis search][search::metropolis] (fixed-temperature simulated annealing)
//! - [parallel tempering][search::parallel_tempering] (concurrent Metropolis replicas
//!   with periodic solution swaps)
//! - [tabu search][search::tabu_search] with pluggable tabu memories
//! - [variable neighborhood descent and reduced variable neighborhood
//!   search][search::variable_neighborhood]
//! - [piped local search][search::piped] and [basic parallel
//!   search][search::basic_parallel] for composing searches sequentially or
//!   concurrently
//!
//! ### Problems, moves and neighborhoods
//! A [`Problem`][problem::Problem] bundles the objective and the constraints of an
//! optimization problem: it [evaluates][problem::Problem::evaluate] solutions and
//! [validates][problem::Problem::validate] them, in a full and an incremental form.
//! [`GenericProblem`][problem::GenericProblem] assembles a problem from an
//! [`Objective`][problem::Objective], mandatory [`Constraints`][problem::Constraint]
//! (which invalidate violating solutions) and
//! [`PenalizingConstraints`][problem::PenalizingConstraint] (which worsen the
//! evaluation instead).
//!
//! Searches explore solutions through [`Moves`][neighborhood::Move]: small, exactly
//! reversible in-place modifications produced by a
//! [`Neighborhood`][neighborhood::Neighborhood]. Because moves are evaluated
//! [incrementally][problem::Problem::evaluate_move] against the current solution,
//! large neighborhoods stay affordable.
//!
//! ### Search lifecycle
//! Every search is started with [`start`][search::Search::start] (blocking) and
//! repeatedly executes algorithm-specific steps until it terminates: either by its own
//! logic (e.g. a descent in a local optimum), through
//! [`stop`][search::Search::stop], or when one of its [stop
//! criteria][search::stop_criteria] fires. The best valid solution ever seen is
//! tracked across runs, and [listeners][search::listener] observe progress, new best
//! solutions and status changes.
//!
//! # How to use this library (step-by-step example)
//! Suppose we want to select a subset of the ids `1..=5` with exactly two elements,
//! maximizing the sum of the selected ids. We reuse the built-in
//! [`IdSubset`][subset::IdSubset] solution type and
//! [`SingleSwapNeighborhood`][subset::SingleSwapNeighborhood], so only the objective
//! is problem-specific:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use stride_solve::problem::{GenericProblem, Objective};
//! use stride_solve::search::steepest_descent::SteepestDescent;
//! use stride_solve::search::{NeighborhoodSearch, Search};
//! use stride_solve::subset::{IdSubset, SingleSwapNeighborhood};
//!
//! struct SelectedIdSum;
//!
//! impl Objective<IdSubset, Vec<u32>> for SelectedIdSum {
//!     fn evaluate(&self, solution: &IdSubset, _data: &Vec<u32>) -> f64 {
//!         solution.iter().map(|id| id as f64).sum()
//!     }
//!     fn is_minimizing(&self) -> bool {
//!         false
//!     }
//! }
//!
//! // 1. assemble the problem: data, objective and a random-solution factory
//! let problem = Arc::new(GenericProblem::new(
//!     (1u32..=5).collect::<Vec<u32>>(),
//!     Box::new(SelectedIdSum),
//!     Box::new(|_rng, _data: &Vec<u32>| IdSubset::new([1, 2])),
//! ));
//!
//! // 2. pick a neighborhood: swap one selected id for an unselected one
//! let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=5));
//!
//! // 3. initialize and run a search
//! let search = SteepestDescent::new(problem, neighborhood, None);
//! search.set_current_solution(IdSubset::new([1, 2])).unwrap();
//! search.start().unwrap();
//!
//! // the descent swaps its way from {1, 2} to the optimum {4, 5}
//! assert_eq!(search.best_solution(), Some(IdSubset::new([4, 5])));
//! assert_eq!(search.best_evaluation().unwrap().value(), 9.0);
//! ```
//!
//! For problems with their own solution type, implement [`Clone`], [`Eq`] and
//! [`Hash`] for the solution (see [`Solution`][solution::Solution]), a
//! [`Move`][neighborhood::Move] with exact apply/undo semantics, and a
//! [`Neighborhood`][neighborhood::Neighborhood] producing those moves.

pub mod error;
pub mod neighborhood;
pub mod problem;
pub mod search;
pub mod solution;
pub mod subset;
pub mod util;
