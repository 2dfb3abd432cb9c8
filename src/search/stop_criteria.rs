//! This module contains the [`StopCriterion`] trait and the built-in stop criteria.
//! * A stop criterion is a pure predicate over the public observables of a search,
//!   captured in a [`SearchSnapshot`].
//! * Criteria are registered with
//!   [`SearchCommon::add_stop_criterion`][super::SearchCommon::add_stop_criterion] and
//!   polled by a background checker on a configurable period (50 ms by default) while
//!   the search is active. The first criterion to fire requests termination; the
//!   in-flight step completes naturally.

use std::time::Duration;

/// A snapshot of the public observables of a running search, against which
/// [`StopCriteria`][`StopCriterion`] are evaluated.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    /// The runtime of the current run.
    pub runtime: Duration,
    /// The number of completed steps of the current run.
    pub steps: u64,
    /// The number of steps completed since the last improvement of the best solution
    /// (since the start of the run if it has not improved yet).
    pub steps_without_improvement: u64,
    /// The time elapsed since the last improvement of the best solution (since the
    /// start of the run if it has not improved yet).
    pub time_without_improvement: Duration,
    /// The value of the best solution found so far, if any.
    pub best_value: Option<f64>,
    /// Whether the searched problem is minimizing.
    pub minimizing: bool,
}

/// A predicate deciding whether a search should stop, evaluated periodically against a
/// [`SearchSnapshot`].
pub trait StopCriterion: Send + Sync + 'static {
    /// Whether the search should stop now.
    fn should_stop(&self, snapshot: &SearchSnapshot) -> bool;
}

/// Stops the search after a maximum wall-clock runtime.
pub struct MaxRuntime {
    max_runtime: Duration,
}

impl MaxRuntime {
    /// Creates a criterion that fires once the run has lasted `max_runtime`.
    pub fn new(max_runtime: Duration) -> MaxRuntime {
        MaxRuntime { max_runtime }
    }
}

impl StopCriterion for MaxRuntime {
    fn should_stop(&self, snapshot: &SearchSnapshot) -> bool {
        snapshot.runtime >= self.max_runtime
    }
}

/// Stops the search after a maximum number of steps.
pub struct MaxSteps {
    max_steps: u64,
}

impl MaxSteps {
    /// Creates a criterion that fires once `max_steps` steps have completed.
    pub fn new(max_steps: u64) -> MaxSteps {
        MaxSteps { max_steps }
    }
}

impl StopCriterion for MaxSteps {
    fn should_stop(&self, snapshot: &SearchSnapshot) -> bool {
        snapshot.steps >= self.max_steps
    }
}

/// Stops the search after a maximum number of steps without improvement of the best
/// solution.
pub struct MaxStepsWithoutImprovement {
    max_steps: u64,
}

impl MaxStepsWithoutImprovement {
    /// Creates a criterion that fires once `max_steps` steps have completed without a
    /// new best solution.
    pub fn new(max_steps: u64) -> MaxStepsWithoutImprovement {
        MaxStepsWithoutImprovement { max_steps }
    }
}

impl StopCriterion for MaxStepsWithoutImprovement {
    fn should_stop(&self, snapshot: &SearchSnapshot) -> bool {
        snapshot.steps_without_improvement >= self.max_steps
    }
}

/// Stops the search after a maximum time without improvement of the best solution.
pub struct MaxTimeWithoutImprovement {
    max_time: Duration,
}

impl MaxTimeWithoutImprovement {
    /// Creates a criterion that fires once `max_time` has elapsed without a new best
    /// solution.
    pub fn new(max_time: Duration) -> MaxTimeWithoutImprovement {
        MaxTimeWithoutImprovement { max_time }
    }
}

impl StopCriterion for MaxTimeWithoutImprovement {
    fn should_stop(&self, snapshot: &SearchSnapshot) -> bool {
        snapshot.time_without_improvement >= self.max_time
    }
}

/// Stops the search once the best solution reaches a target value: at most the
/// threshold for minimizing problems, at least the threshold for maximizing problems.
pub struct EvaluationThreshold {
    threshold: f64,
}

impl EvaluationThreshold {
    /// Creates a criterion that fires once the best value reaches `threshold`.
    pub fn new(threshold: f64) -> EvaluationThreshold {
        EvaluationThreshold { threshold }
    }
}

impl StopCriterion for EvaluationThreshold {
    fn should_stop(&self, snapshot: &SearchSnapshot) -> bool {
        match snapshot.best_value {
            Some(value) if snapshot.minimizing => value <= self.threshold,
            Some(value) => value >= self.threshold,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SearchSnapshot {
        SearchSnapshot {
            runtime: Duration::from_millis(200),
            steps: 1000,
            steps_without_improvement: 100,
            time_without_improvement: Duration::from_millis(50),
            best_value: Some(8.0),
            minimizing: false,
        }
    }

    #[test]
    fn max_runtime_fires_at_the_limit() {
        assert!(MaxRuntime::new(Duration::from_millis(200)).should_stop(&snapshot()));
        assert!(!MaxRuntime::new(Duration::from_millis(201)).should_stop(&snapshot()));
    }

    #[test]
    fn max_steps_fires_at_the_limit() {
        assert!(MaxSteps::new(1000).should_stop(&snapshot()));
        assert!(!MaxSteps::new(1001).should_stop(&snapshot()));
    }

    #[test]
    fn improvement_criteria_use_the_improvement_clock() {
        assert!(MaxStepsWithoutImprovement::new(100).should_stop(&snapshot()));
        assert!(!MaxStepsWithoutImprovement::new(101).should_stop(&snapshot()));
        assert!(MaxTimeWithoutImprovement::new(Duration::from_millis(50)).should_stop(&snapshot()));
        assert!(
            !MaxTimeWithoutImprovement::new(Duration::from_millis(51)).should_stop(&snapshot())
        );
    }

    #[test]
    fn evaluation_threshold_respects_the_optimization_direction() {
        // maximizing: fires once the best value is at least the threshold
        assert!(EvaluationThreshold::new(8.0).should_stop(&snapshot()));
        assert!(!EvaluationThreshold::new(8.5).should_stop(&snapshot()));

        let mut minimizing = snapshot();
        minimizing.minimizing = true;
        assert!(EvaluationThreshold::new(8.0).should_stop(&minimizing));
        assert!(!EvaluationThreshold::new(7.5).should_stop(&minimizing));

        let mut no_best = snapshot();
        no_best.best_value = None;
        assert!(!EvaluationThreshold::new(0.0).should_stop(&no_best));
    }
}
