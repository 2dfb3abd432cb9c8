//! This module contains the [`MetropolisSearch`], a fixed-temperature variant of
//! [simulated annealing](https://en.wikipedia.org/wiki/Simulated_annealing).
//! * Each step considers one random move. Valid improvements are always accepted; a
//!   valid deterioration with delta Δ < 0 is accepted with probability
//!   e<sup>Δ/(k·T)</sup>, where T is the temperature and k the temperature scale
//!   factor (1 by default). Invalid moves are rejected.
//! * A higher temperature accepts deteriorations more readily; as T approaches zero
//!   the search degenerates into a [random descent][crate::search::random_descent].
//! * The search stops itself only when the neighborhood cannot generate a move; use
//!   [stop criteria][crate::search::stop_criteria] to bound the run.
//! * The [parallel tempering search][crate::search::parallel_tempering] runs several
//!   Metropolis searches at different temperatures as its replicas.

use std::sync::{Arc, Mutex};

use rand::Rng;

use super::neighborhood_search::{NeighborhoodCommon, NeighborhoodSearch};
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::Problem;
use crate::solution::Solution;

/// Type for the temperature, which should be in the magnitude of the differences in
/// objective value between neighboring solutions.
pub type Temperature = f64;

/// Whether a valid deterioration is accepted: `e^(Δ/(k·T)) > u` for a uniform draw
/// `u ∈ [0, 1)`. `delta` is negative, `scaled_temperature` is `k·T > 0`.
fn accepts_deterioration(delta: f64, scaled_temperature: f64, uniform: f64) -> bool {
    (delta / scaled_temperature).exp() > uniform
}

/// A Metropolis search with fixed temperature `T > 0` and temperature scale factor
/// `k > 0`.
pub struct MetropolisSearch<S: Solution> {
    common: NeighborhoodCommon<S>,
    neighborhood: Mutex<Arc<dyn Neighborhood<S>>>,
    temperature: Mutex<Temperature>,
    scale_factor: Mutex<f64>,
}

impl<S: Solution> MetropolisSearch<S> {
    /// Creates a new [`MetropolisSearch`] with the given problem, neighborhood and
    /// temperature (strictly positive). The temperature scale factor starts at 1; a
    /// `random_seed` makes the search reproducible.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        temperature: Temperature,
        random_seed: Option<u64>,
    ) -> Result<MetropolisSearch<S>, SearchError> {
        MetropolisSearch::named(
            "metropolis search",
            problem,
            neighborhood,
            temperature,
            random_seed,
        )
    }

    /// Creates a [`MetropolisSearch`] with an explicit name (used for the replicas of
    /// a parallel tempering search).
    pub(crate) fn named(
        name: impl Into<String>,
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        temperature: Temperature,
        random_seed: Option<u64>,
    ) -> Result<MetropolisSearch<S>, SearchError> {
        check_positive(temperature, "temperature")?;
        Ok(MetropolisSearch {
            common: NeighborhoodCommon::new(name, problem, random_seed),
            neighborhood: Mutex::new(neighborhood),
            temperature: Mutex::new(temperature),
            scale_factor: Mutex::new(1.0),
        })
    }

    /// The temperature `T`.
    pub fn temperature(&self) -> Temperature {
        *self.temperature.lock().unwrap()
    }

    /// The temperature scale factor `k`.
    pub fn temperature_scale_factor(&self) -> f64 {
        *self.scale_factor.lock().unwrap()
    }

    /// Sets the temperature (strictly positive). Requires an idle search.
    pub fn set_temperature(&self, temperature: Temperature) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        check_positive(temperature, "temperature")?;
        *self.temperature.lock().unwrap() = temperature;
        Ok(())
    }

    /// Sets the temperature scale factor (strictly positive). Requires an idle search.
    pub fn set_temperature_scale_factor(&self, scale_factor: f64) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        check_positive(scale_factor, "temperature scale factor")?;
        *self.scale_factor.lock().unwrap() = scale_factor;
        Ok(())
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

    /// Sets the scale factor without the idle check, for the mid-run propagation of a
    /// parallel tempering coordinator. Callers must ensure the value is positive.
    pub(crate) fn set_temperature_scale_factor_unchecked(&self, scale_factor: f64) {
        *self.scale_factor.lock().unwrap() = scale_factor;
    }

    /// The evaluation value of the current solution, if a run has been initialized.
    pub(crate) fn current_value(&self) -> Option<f64> {
        self.common.current_evaluation().map(|evaluation| evaluation.value())
    }

    /// Exchanges the current solutions (including their cached evaluations and
    /// validations) of two Metropolis searches in place. Only the parallel tempering
    /// coordinator uses this, between the runs of its replicas.
    pub(crate) fn swap_current(first: &MetropolisSearch<S>, second: &MetropolisSearch<S>) {
        let mut first_state = first.common.state();
        let mut second_state = second.common.state();
        std::mem::swap(&mut first_state.run, &mut second_state.run);
        first_state.cache.clear();
        second_state.cache.clear();
    }
}

fn check_positive(value: f64, what: &str) -> Result<(), SearchError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SearchError::Configuration(format!(
            "{} must be strictly positive (got {})",
            what, value
        )))
    }
}

impl<S: Solution> Search<S> for MetropolisSearch<S> {
    fn common(&self) -> &SearchCommon<S> {
        self.common.common()
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn init(&self) -> Result<(), SearchError> {
        self.common.init_run(self.as_dyn())
    }

    fn step(&self) -> Result<(), SearchError> {
        let neighborhood = self.neighborhood.lock().unwrap().clone();
        let scaled_temperature = self.temperature() * self.temperature_scale_factor();
        let mut state = self.common.state();
        let (run, cache, rng) = state.parts()?;
        let mv = match neighborhood.random_move(&run.current, rng) {
            Some(mv) => mv,
            None => {
                log::debug!("search `{}`: neighborhood is empty, stopping", self.name());
                self.common.common().request_stop();
                return Ok(());
            }
        };
        if !self.common.validate_move(run, cache, mv.as_ref()).passed() {
            self.common.reject_move(cache);
            return Ok(());
        }
        let evaluation = self.common.evaluate_move(run, cache, mv.as_ref());
        let delta = self.common.compute_delta(evaluation.value(), run.evaluation.value());
        let accept =
            delta > 0.0 || accepts_deterioration(delta, scaled_temperature, rng.gen::<f64>());
        if accept {
            let validation = self.common.validate_move(run, cache, mv.as_ref());
            self.common
                .accept_move(self.as_dyn(), run, cache, mv.as_ref(), evaluation, validation);
        } else {
            self.common.reject_move(cache);
        }
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for MetropolisSearch<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::stop_criteria::MaxSteps;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleSwapNeighborhood};
    use std::time::Duration;

    #[test]
    fn deterioration_acceptance_follows_the_metropolis_rule() {
        // maximizing, current value 10, move value 9: delta = -1, k = 1, T = 1
        let delta = -1.0;
        assert!(!accepts_deterioration(delta, 1.0, 0.5)); // e^-1 ≈ 0.3679 < 0.5
        assert!(accepts_deterioration(delta, 1.0, 0.2)); // e^-1 ≈ 0.3679 > 0.2

        // a zero delta is always accepted, whatever the draw
        assert!(accepts_deterioration(0.0, 1.0, 0.999));
    }

    #[test]
    fn non_positive_temperatures_are_rejected() {
        let problem = subset_sum_problem(1..=5, vec![]);
        let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=5));
        assert!(
            MetropolisSearch::new(problem.clone(), neighborhood.clone(), 0.0, None).is_err()
        );
        assert!(
            MetropolisSearch::new(problem.clone(), neighborhood.clone(), -1.0, None).is_err()
        );

        let search = MetropolisSearch::new(problem, neighborhood, 1.0, None).unwrap();
        assert!(search.set_temperature(0.0).is_err());
        assert!(search.set_temperature_scale_factor(-2.0).is_err());
        assert!(search.set_temperature(2.5).is_ok());
        assert_eq!(search.temperature(), 2.5);
    }

    #[test]
    fn counts_every_considered_move() {
        let problem = subset_sum_problem(1..=6, vec![]);
        let neighborhood = Arc::new(SingleSwapNeighborhood::new(1..=6));
        let search = MetropolisSearch::new(problem, neighborhood, 2.0, Some(5)).unwrap();
        search.set_current_solution(IdSubset::new([1, 2])).unwrap();
        search
            .common()
            .add_stop_criterion(Arc::new(MaxSteps::new(500)))
            .unwrap();
        search
            .common()
            .set_stop_criterion_check_period(Duration::from_millis(1))
            .unwrap();
        search.start().unwrap();

        assert_eq!(
            search.num_accepted() + search.num_rejected(),
            search.num_steps()
        );
        // at temperature 2 the search moves around and quickly reaches the top
        // two-element subsets
        assert!(search.best_evaluation().unwrap().value() >= 10.0);
    }
}
