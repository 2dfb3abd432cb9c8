//! This module contains the [`ParallelTempering`] search, which coordinates several
//! [Metropolis][crate::search::metropolis] replicas running concurrently at different
//! temperatures, with periodic solution swaps between neighboring replicas.
//! * Replica `i` of `n` runs at temperature `T_i = T_min + i·(T_max−T_min)/(n−1)`;
//!   temperatures are strictly ascending. Cool replicas exploit, hot replicas explore.
//! * Each global step has three strictly sequential phases: first every replica runs a
//!   fixed number of Metropolis steps on its own worker (parallel phase), then the
//!   coordinator waits for all of them (join phase), and finally adjacent replica
//!   pairs may swap their current solutions (swap phase). The pairing base alternates
//!   between even and odd on every global step.
//! * A pair swaps unconditionally when the hotter replica holds the better solution
//!   (delta ≥ 0); a worse solution is swapped down with probability
//!   e<sup>(β<sub>cool</sub>−β<sub>hot</sub>)·Δ</sup>, where β = 1/(k·T).
//! * Whenever a replica finds a new best solution, the coordinator's current and best
//!   solutions are updated as well (serialized across replicas, revalidation skipped).
//! * The coordinator never terminates on its own; bound the run with [stop
//!   criteria][crate::search::stop_criteria] or [`stop`][Search::stop], which is
//!   propagated to the replicas.
//!
//! The problem, the neighborhood and all constraints are shared by the replicas and
//! must therefore tolerate concurrent calls; replica listener callbacks fire on the
//! worker threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use rand::Rng;

use super::listener::SearchListener;
use super::metropolis::{MetropolisSearch, Temperature};
use super::neighborhood_search::{CurrentState, NeighborhoodCommon, NeighborhoodSearch};
use super::{Search, SearchCommon};
use crate::error::SearchError;
use crate::neighborhood::Neighborhood;
use crate::problem::{Evaluation, Problem, Validation};
use crate::solution::Solution;

/// The default number of Metropolis steps every replica runs per global step.
pub const DEFAULT_REPLICA_STEPS: u64 = 500;

/// A parallel tempering search with `n ≥ 2` Metropolis replicas at strictly ascending
/// temperatures, run on an owned worker pool with one worker per replica.
pub struct ParallelTempering<S: Solution> {
    common: NeighborhoodCommon<S>,
    replicas: Vec<Arc<MetropolisSearch<S>>>,
    replica_steps: u64,
    pool: Mutex<Option<rayon::ThreadPool>>,
    swap_base: AtomicUsize,
    /// Serializes the best/current updates relayed from concurrently running replicas.
    relay: Mutex<()>,
}

impl<S: Solution> ParallelTempering<S> {
    /// Creates a new [`ParallelTempering`] search with `num_replicas` replicas at
    /// temperatures evenly spaced over `[min_temperature, max_temperature]`.
    /// * Requires `num_replicas ≥ 2` and `0 < min_temperature < max_temperature`.
    /// * Every replica runs [`DEFAULT_REPLICA_STEPS`] Metropolis steps per global
    ///   step; use [`with_options`][ParallelTempering::with_options] to change this.
    /// * A `random_seed` makes the coordinator and all replicas reproducible.
    pub fn new(
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        min_temperature: Temperature,
        max_temperature: Temperature,
        num_replicas: usize,
        random_seed: Option<u64>,
    ) -> Result<Arc<ParallelTempering<S>>, SearchError> {
        ParallelTempering::with_options(
            problem,
            neighborhood,
            min_temperature,
            max_temperature,
            num_replicas,
            random_seed,
            DEFAULT_REPLICA_STEPS,
        )
    }

    /// Creates a new [`ParallelTempering`] search with an explicit number of replica
    /// steps per global step (strictly positive).
    pub fn with_options(
        problem: Arc<dyn Problem<S>>,
        neighborhood: Arc<dyn Neighborhood<S>>,
        min_temperature: Temperature,
        max_temperature: Temperature,
        num_replicas: usize,
        random_seed: Option<u64>,
        replica_steps: u64,
    ) -> Result<Arc<ParallelTempering<S>>, SearchError> {
        if num_replicas < 2 {
            return Err(SearchError::Configuration(format!(
                "parallel tempering requires at least 2 replicas (got {})",
                num_replicas
            )));
        }
        if !(min_temperature > 0.0) {
            return Err(SearchError::Configuration(format!(
                "minimum temperature must be strictly positive (got {})",
                min_temperature
            )));
        }
        if !(min_temperature < max_temperature) {
            return Err(SearchError::Configuration(format!(
                "temperatures must satisfy min < max (got {} and {})",
                min_temperature, max_temperature
            )));
        }
        if replica_steps == 0 {
            return Err(SearchError::Configuration(
                "replica steps must be strictly positive".to_string(),
            ));
        }

        let temperature_step =
            (max_temperature - min_temperature) / (num_replicas as f64 - 1.0);
        let mut replicas = Vec::with_capacity(num_replicas);
        for index in 0..num_replicas {
            let temperature = min_temperature + index as f64 * temperature_step;
            let replica = MetropolisSearch::named(
                format!("replica {}", index),
                problem.clone(),
                neighborhood.clone(),
                temperature,
                random_seed.map(|seed| seed.wrapping_add(index as u64 + 1)),
            )?;
            replicas.push(Arc::new(replica));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_replicas)
            .thread_name(|index| format!("parallel-tempering-worker-{}", index))
            .build()
            .map_err(|error| {
                SearchError::Execution(format!("failed to build the worker pool: {}", error))
            })?;

        let coordinator = Arc::new(ParallelTempering {
            common: NeighborhoodCommon::new("parallel tempering", problem, random_seed),
            replicas,
            replica_steps,
            pool: Mutex::new(Some(pool)),
            swap_base: AtomicUsize::new(0),
            relay: Mutex::new(()),
        });
        for replica in &coordinator.replicas {
            replica.common().add_listener(Box::new(ReplicaObserver {
                coordinator: Arc::downgrade(&coordinator),
                replica_steps,
            }))?;
        }
        Ok(coordinator)
    }

    /// The number of replicas.
    pub fn num_replicas(&self) -> usize {
        self.replicas.len()
    }

    /// The strictly ascending replica temperatures.
    pub fn replica_temperatures(&self) -> Vec<Temperature> {
        self.replicas.iter().map(|replica| replica.temperature()).collect()
    }

    /// The number of Metropolis steps every replica runs per global step.
    pub fn replica_steps(&self) -> u64 {
        self.replica_steps
    }

    /// Replaces the neighborhood of every replica. Requires an idle search.
    pub fn set_neighborhood(
        &self,
        neighborhood: Arc<dyn Neighborhood<S>>,
    ) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        for replica in &self.replicas {
            replica.set_neighborhood(neighborhood.clone())?;
        }
        Ok(())
    }

    /// Sets the temperature scale factor `k` of every replica (strictly positive).
    ///
    /// Caution: this is permitted while the search runs, but the per-replica updates
    /// are not atomic — concurrently executing replicas may observe the old and the
    /// new factor within the same global step.
    pub fn set_temperature_scale_factor(&self, scale_factor: f64) -> Result<(), SearchError> {
        if !(scale_factor > 0.0) {
            return Err(SearchError::Configuration(format!(
                "temperature scale factor must be strictly positive (got {})",
                scale_factor
            )));
        }
        for replica in &self.replicas {
            replica.set_temperature_scale_factor_unchecked(scale_factor);
        }
        Ok(())
    }

    /// Updates the coordinator's current and best solutions with an improvement
    /// reported by a replica. The replica has already validated the solution, so
    /// revalidation is skipped; the relay mutex serializes reports from concurrently
    /// running replicas.
    fn replica_improvement(&self, solution: &S, evaluation: &Evaluation) {
        let _serialized = self.relay.lock().unwrap();
        {
            let mut state = self.common.state();
            state.run = Some(CurrentState {
                current: solution.clone(),
                evaluation: evaluation.clone(),
                validation: Validation::Simple(true),
            });
        }
        self.common
            .common()
            .update_best_trusted(self.as_dyn(), solution, evaluation);
    }

    /// Considers swapping the current solutions of the adjacent replicas `cooler` and
    /// `hotter` (with `T_cooler < T_hotter`).
    fn consider_swap(&self, cooler: usize, hotter: usize) -> Result<(), SearchError> {
        let cool = &self.replicas[cooler];
        let hot = &self.replicas[hotter];
        let (cool_value, hot_value) = match (cool.current_value(), hot.current_value()) {
            (Some(cool_value), Some(hot_value)) => (cool_value, hot_value),
            _ => return Ok(()),
        };
        let delta = self.common.compute_delta(hot_value, cool_value);
        let beta_cool = 1.0 / (cool.temperature_scale_factor() * cool.temperature());
        let beta_hot = 1.0 / (hot.temperature_scale_factor() * hot.temperature());
        let uniform = {
            let mut state = self.common.state();
            state.rng.gen::<f64>()
        };
        if swap_decision(delta, beta_cool, beta_hot, uniform)? {
            MetropolisSearch::swap_current(cool, hot);
            log::debug!(
                "search `{}`: swapped replicas {} and {} (delta: {})",
                self.name(),
                cooler,
                hotter,
                delta
            );
        }
        Ok(())
    }
}

/// Whether a replica pair swaps. `delta` is the (direction-normalized) improvement of
/// the hotter replica's value over the cooler one's: non-negative deltas swap
/// unconditionally, negative deltas swap with probability
/// e<sup>(β<sub>cool</sub>−β<sub>hot</sub>)·Δ</sup>. A probability above 1 is
/// impossible for correctly ordered temperatures and reported as an execution error.
fn swap_decision(
    delta: f64,
    beta_cool: f64,
    beta_hot: f64,
    uniform: f64,
) -> Result<bool, SearchError> {
    if delta >= 0.0 {
        return Ok(true);
    }
    let probability = ((beta_cool - beta_hot) * delta).exp();
    if probability > 1.0 {
        return Err(SearchError::Execution(
            "parallel tempering replicas are not correctly ordered by temperature".to_string(),
        ));
    }
    Ok(probability > uniform)
}

impl<S: Solution> Search<S> for ParallelTempering<S> {
    fn common(&self) -> &SearchCommon<S> {
        self.common.common()
    }

    fn as_dyn(&self) -> &dyn Search<S> {
        self
    }

    fn init(&self) -> Result<(), SearchError> {
        self.common.init_run(self.as_dyn())?;
        // replicas without a state of their own start from the coordinator's current
        let current = self.common.current_solution().ok_or_else(|| {
            SearchError::Execution("parallel tempering has no current solution".to_string())
        })?;
        for replica in &self.replicas {
            if replica.current_solution().is_none() {
                replica.set_current_solution(current.clone())?;
            }
        }
        Ok(())
    }

    fn step(&self) -> Result<(), SearchError> {
        // parallel phase: every replica runs its Metropolis steps on the worker pool
        let failures: Mutex<Vec<String>> = Mutex::new(Vec::new());
        {
            let pool_guard = self.pool.lock().unwrap();
            let pool = pool_guard.as_ref().ok_or_else(|| {
                SearchError::Execution("the worker pool has been disposed".to_string())
            })?;
            pool.scope(|scope| {
                for replica in &self.replicas {
                    let replica = replica.clone();
                    let failures = &failures;
                    scope.spawn(move |_| {
                        if let Err(error) = replica.start() {
                            failures.lock().unwrap().push(format!(
                                "replica `{}` failed: {}",
                                replica.name(),
                                error
                            ));
                        }
                    });
                }
            });
            // join phase: the scope returns once every replica has finished
        }
        let failures = failures.into_inner().unwrap();
        if !failures.is_empty() {
            return Err(SearchError::Execution(failures.join("; ")));
        }

        // swap phase, with the pairing base alternating every global step
        let base = self.swap_base.fetch_xor(1, Ordering::SeqCst);
        let mut index = base;
        while index + 1 < self.replicas.len() {
            self.consider_swap(index, index + 1)?;
            index += 2;
        }
        Ok(())
    }

    fn stop(&self) {
        self.common.common().request_stop();
        for replica in &self.replicas {
            replica.stop();
        }
    }

    fn dispose(&self) -> Result<(), SearchError> {
        self.common.common().dispose(self.as_dyn())?;
        for replica in &self.replicas {
            replica.dispose()?;
        }
        *self.pool.lock().unwrap() = None;
        Ok(())
    }
}

impl<S: Solution> NeighborhoodSearch<S> for ParallelTempering<S> {
    fn neighborhood_common(&self) -> &NeighborhoodCommon<S> {
        &self.common
    }

    /// Sets the current solution of the coordinator and (as deep copies) of every
    /// replica. Requires an idle search.
    fn set_current_solution(&self, solution: S) -> Result<(), SearchError> {
        self.common.common().assert_idle()?;
        for replica in &self.replicas {
            replica.set_current_solution(solution.clone())?;
        }
        self.common.set_current_solution(solution)
    }

    /// The accepted moves of all replicas combined.
    fn num_accepted(&self) -> u64 {
        self.replicas.iter().map(|replica| replica.num_accepted()).sum()
    }

    /// The rejected moves of all replicas combined.
    fn num_rejected(&self) -> u64 {
        self.replicas.iter().map(|replica| replica.num_rejected()).sum()
    }
}

/// The coordinator's ear on a replica: stops the replica once it has completed the
/// configured number of steps (checked after every single step, which is tighter than
/// a generic stop criterion), and relays new best solutions to the coordinator.
struct ReplicaObserver<S: Solution> {
    coordinator: Weak<ParallelTempering<S>>,
    replica_steps: u64,
}

impl<S: Solution> SearchListener<S> for ReplicaObserver<S> {
    fn step_completed(&self, search: &dyn Search<S>, num_steps: u64) {
        if num_steps >= self.replica_steps {
            search.stop();
        }
    }

    fn new_best_solution(&self, _search: &dyn Search<S>, solution: &S, evaluation: &Evaluation) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.replica_improvement(solution, evaluation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::stop_criteria::MaxSteps;
    use crate::search::tests::toy::subset_sum_problem;
    use crate::subset::{IdSubset, SingleSwapNeighborhood};
    use std::time::Duration;

    fn toy_setup() -> (Arc<dyn Problem<IdSubset>>, Arc<SingleSwapNeighborhood>) {
        (
            subset_sum_problem(1..=8, vec![]),
            Arc::new(SingleSwapNeighborhood::new(1..=8)),
        )
    }

    #[test]
    fn construction_validates_replicas_and_temperatures() {
        let (problem, neighborhood) = toy_setup();
        // a single replica is rejected, as are misordered or non-positive bounds
        assert!(ParallelTempering::new(
            problem.clone(),
            neighborhood.clone(),
            1.0,
            1.0,
            1,
            None
        )
        .is_err());
        assert!(ParallelTempering::new(
            problem.clone(),
            neighborhood.clone(),
            2.0,
            1.0,
            4,
            None
        )
        .is_err());
        assert!(ParallelTempering::new(
            problem.clone(),
            neighborhood.clone(),
            0.0,
            1.0,
            4,
            None
        )
        .is_err());
        assert!(ParallelTempering::with_options(
            problem.clone(),
            neighborhood.clone(),
            1.0,
            2.0,
            4,
            None,
            0
        )
        .is_err());

        let search =
            ParallelTempering::new(problem, neighborhood, 1.0, 2.5, 4, None).unwrap();
        assert_eq!(search.num_replicas(), 4);
        assert_eq!(search.replica_temperatures(), vec![1.0, 1.5, 2.0, 2.5]);
        assert_eq!(search.replica_steps(), DEFAULT_REPLICA_STEPS);
    }

    #[test]
    fn swap_decision_follows_the_tempering_rule() {
        // hotter replica holds the better solution: swap unconditionally
        assert!(swap_decision(2.0, 1.0, 0.5, 0.99).unwrap());
        assert!(swap_decision(0.0, 1.0, 0.5, 0.99).unwrap());

        // worse solution at the hotter replica: probabilistic swap with
        // p = e^((beta_cool - beta_hot) * delta)
        let probability = ((1.0f64 - 0.5) * -1.0).exp(); // ≈ 0.6065
        assert!(swap_decision(-1.0, 1.0, 0.5, probability - 0.01).unwrap());
        assert!(!swap_decision(-1.0, 1.0, 0.5, probability + 0.01).unwrap());

        // misordered temperatures make the probability exceed 1
        assert!(swap_decision(-1.0, 0.5, 1.0, 0.5).is_err());
    }

    #[test]
    fn swapping_exchanges_the_replica_solutions() {
        // maximizing; replica 0 at T=1 holds value 5, replica 1 at T=2 holds value 7
        let (problem, neighborhood) = toy_setup();
        let cool =
            MetropolisSearch::new(problem.clone(), neighborhood.clone(), 1.0, None).unwrap();
        let hot = MetropolisSearch::new(problem, neighborhood, 2.0, None).unwrap();
        cool.set_current_solution(IdSubset::new([5])).unwrap();
        hot.set_current_solution(IdSubset::new([7])).unwrap();
        cool.init().unwrap();
        hot.init().unwrap();
        assert_eq!(cool.current_value(), Some(5.0));
        assert_eq!(hot.current_value(), Some(7.0));

        MetropolisSearch::swap_current(&cool, &hot);
        assert_eq!(cool.current_value(), Some(7.0));
        assert_eq!(cool.current_solution(), Some(IdSubset::new([7])));
        assert_eq!(hot.current_value(), Some(5.0));
        assert_eq!(hot.current_solution(), Some(IdSubset::new([5])));
    }

    #[test]
    fn finds_good_solutions_and_keeps_replicas_consistent() {
        let (problem, neighborhood) = toy_setup();
        let search = ParallelTempering::with_options(
            problem.clone(),
            neighborhood,
            0.5,
            2.0,
            3,
            Some(23),
            100,
        )
        .unwrap();
        search.set_current_solution(IdSubset::new([1, 2])).unwrap();
        search
            .common()
            .add_stop_criterion(Arc::new(MaxSteps::new(3)))
            .unwrap();
        search
            .common()
            .set_stop_criterion_check_period(Duration::from_millis(1))
            .unwrap();
        search.start().unwrap();

        // hundreds of replica steps on the two-element subsets of {1..8}: the best
        // pairs are found reliably
        assert!(search.best_evaluation().unwrap().value() >= 13.0);
        assert!(search.num_accepted() + search.num_rejected() > 0);

        // replica temperatures stay strictly ascending and every replica's cached
        // evaluation matches a fresh evaluation of its current solution
        let temperatures = search.replica_temperatures();
        assert!(temperatures.windows(2).all(|pair| pair[0] < pair[1]));
        for replica in &search.replicas {
            let current = replica.current_solution().unwrap();
            let cached = replica.current_evaluation().unwrap();
            assert_eq!(problem.evaluate(&current).value(), cached.value());
        }

        search.dispose().unwrap();
        assert!(search.start().is_err());
    }
}
