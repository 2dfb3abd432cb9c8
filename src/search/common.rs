//! Contains [`SearchCommon`], the state and machinery shared by every search: the
//! lifecycle status, best-solution tracking, per-run counters, listeners and the
//! periodic stop-criterion checker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::listener::SearchListener;
use super::stop_criteria::{SearchSnapshot, StopCriterion};
use super::{Search, SearchStatus};
use crate::error::SearchError;
use crate::problem::{Evaluation, Problem};
use crate::solution::Solution;

/// The default period on which stop criteria are checked.
pub const DEFAULT_STOP_CRITERION_CHECK_PERIOD: Duration = Duration::from_millis(50);

/// The best solution found so far, together with its evaluation. Readers always
/// observe the pair consistently.
struct BestPoint<S> {
    solution: S,
    evaluation: Evaluation,
}

/// When the best solution last improved, for the improvement-based stop criteria.
struct ImprovementClock {
    at_time: Option<Instant>,
    at_step: u64,
}

/// The part of the search state that the stop-criterion checker thread observes: the
/// status (with a condition variable to wake the checker early), the per-run counters
/// and the best solution.
struct SharedState<S> {
    status: Mutex<SearchStatus>,
    status_signal: Condvar,
    steps: AtomicU64,
    run_start: Mutex<Option<Instant>>,
    last_run_duration: Mutex<Option<Duration>>,
    improvement: Mutex<ImprovementClock>,
    best: Mutex<Option<BestPoint<S>>>,
}

impl<S: Solution> SharedState<S> {
    fn new() -> SharedState<S> {
        SharedState {
            status: Mutex::new(SearchStatus::Idle),
            status_signal: Condvar::new(),
            steps: AtomicU64::new(0),
            run_start: Mutex::new(None),
            last_run_duration: Mutex::new(None),
            improvement: Mutex::new(ImprovementClock {
                at_time: None,
                at_step: 0,
            }),
            best: Mutex::new(None),
        }
    }

    fn status(&self) -> SearchStatus {
        *self.status.lock().unwrap()
    }

    /// Requests termination. Only flips an active search to terminating; idle and
    /// disposed searches are unaffected. Returns whether the request took effect.
    fn request_stop(&self) -> bool {
        let mut status = self.status.lock().unwrap();
        match *status {
            SearchStatus::Initializing | SearchStatus::Running => {
                *status = SearchStatus::Terminating;
                self.status_signal.notify_all();
                true
            }
            _ => false,
        }
    }

    fn runtime(&self) -> Duration {
        match *self.run_start.lock().unwrap() {
            Some(start) => start.elapsed(),
            None => self.last_run_duration.lock().unwrap().unwrap_or(Duration::ZERO),
        }
    }

    fn snapshot(&self, minimizing: bool) -> SearchSnapshot {
        let steps = self.steps.load(Ordering::SeqCst);
        let (improvement_time, improvement_step) = {
            let clock = self.improvement.lock().unwrap();
            (clock.at_time, clock.at_step)
        };
        SearchSnapshot {
            runtime: self.runtime(),
            steps,
            steps_without_improvement: steps.saturating_sub(improvement_step),
            time_without_improvement: improvement_time
                .map(|at| at.elapsed())
                .unwrap_or(Duration::ZERO),
            best_value: self
                .best
                .lock()
                .unwrap()
                .as_ref()
                .map(|point| point.evaluation.value()),
            minimizing,
        }
    }
}

/// The state shared by every search: name, problem, lifecycle status, best-solution
/// tracking, per-run counters, listeners and stop criteria. Concrete searches embed a
/// [`SearchCommon`] and expose it through [`Search::common`].
pub struct SearchCommon<S: Solution> {
    name: String,
    problem: Arc<dyn Problem<S>>,
    minimizing: bool,
    shared: Arc<SharedState<S>>,
    listeners: Mutex<Vec<Box<dyn SearchListener<S>>>>,
    stop_criteria: Mutex<Vec<Arc<dyn StopCriterion>>>,
    check_period: Mutex<Duration>,
    checker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl<S: Solution> SearchCommon<S> {
    /// Creates the shared state for a search with the given name, solving the given
    /// problem.
    pub fn new(name: impl Into<String>, problem: Arc<dyn Problem<S>>) -> SearchCommon<S> {
        let minimizing = problem.is_minimizing();
        SearchCommon {
            name: name.into(),
            problem,
            minimizing,
            shared: Arc::new(SharedState::new()),
            listeners: Mutex::new(Vec::new()),
            stop_criteria: Mutex::new(Vec::new()),
            check_period: Mutex::new(DEFAULT_STOP_CRITERION_CHECK_PERIOD),
            checker: Mutex::new(None),
        }
    }

    /// The name of the search.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The problem this search solves.
    pub fn problem(&self) -> &Arc<dyn Problem<S>> {
        &self.problem
    }

    /// Whether the solved problem is minimizing.
    pub fn is_minimizing(&self) -> bool {
        self.minimizing
    }

    /// The current lifecycle status.
    pub fn status(&self) -> SearchStatus {
        self.shared.status()
    }

    /// The number of completed steps of the current (or last) run.
    pub fn num_steps(&self) -> u64 {
        self.shared.steps.load(Ordering::SeqCst)
    }

    /// The runtime of the current (or last) run.
    pub fn runtime(&self) -> Duration {
        self.shared.runtime()
    }

    /// A deep copy of the best valid solution seen since construction, if any.
    pub fn best_solution(&self) -> Option<S> {
        self.shared
            .best
            .lock()
            .unwrap()
            .as_ref()
            .map(|point| point.solution.clone())
    }

    /// The evaluation of the best solution, if any.
    pub fn best_evaluation(&self) -> Option<Evaluation> {
        self.shared
            .best
            .lock()
            .unwrap()
            .as_ref()
            .map(|point| point.evaluation.clone())
    }

    /// Registers a listener. Requires an idle search.
    pub fn add_listener(&self, listener: Box<dyn SearchListener<S>>) -> Result<(), SearchError> {
        self.assert_idle()?;
        self.listeners.lock().unwrap().push(listener);
        Ok(())
    }

    /// Registers a stop criterion. Requires an idle search.
    pub fn add_stop_criterion(&self, criterion: Arc<dyn StopCriterion>) -> Result<(), SearchError> {
        self.assert_idle()?;
        self.stop_criteria.lock().unwrap().push(criterion);
        Ok(())
    }

    /// Removes all stop criteria. Requires an idle search.
    pub fn clear_stop_criteria(&self) -> Result<(), SearchError> {
        self.assert_idle()?;
        self.stop_criteria.lock().unwrap().clear();
        Ok(())
    }

    /// Sets the period on which stop criteria are checked (default 50 ms). Requires an
    /// idle search and a positive period.
    pub fn set_stop_criterion_check_period(&self, period: Duration) -> Result<(), SearchError> {
        self.assert_idle()?;
        if period.is_zero() {
            return Err(SearchError::Configuration(
                "stop criterion check period must be positive".to_string(),
            ));
        }
        *self.check_period.lock().unwrap() = period;
        Ok(())
    }

    /// Fails with [`SearchError::NotIdle`] unless the search is idle.
    pub(crate) fn assert_idle(&self) -> Result<(), SearchError> {
        let status = self.status();
        if status == SearchStatus::Idle {
            Ok(())
        } else {
            Err(SearchError::NotIdle(status))
        }
    }

    /// Requests termination of the current run, if any.
    pub(crate) fn request_stop(&self) {
        if self.shared.request_stop() {
            log::debug!("search `{}`: termination requested", self.name);
        }
    }

    /// Whether termination has been requested.
    pub(crate) fn stop_requested(&self) -> bool {
        self.status() == SearchStatus::Terminating
    }

    /// Transitions the search from idle into a new run and spawns the stop-criterion
    /// checker. Fails if the search is active or disposed.
    pub(crate) fn enter_run(&self, search: &dyn Search<S>) -> Result<(), SearchError> {
        {
            let mut status = self.shared.status.lock().unwrap();
            match *status {
                SearchStatus::Idle => *status = SearchStatus::Initializing,
                SearchStatus::Disposed => {
                    return Err(SearchError::Execution(format!(
                        "search `{}` has been disposed and cannot be started",
                        self.name
                    )))
                }
                other => {
                    return Err(SearchError::Execution(format!(
                        "search `{}` is already active (status: {})",
                        self.name, other
                    )))
                }
            }
        }
        let now = Instant::now();
        self.shared.steps.store(0, Ordering::SeqCst);
        *self.shared.run_start.lock().unwrap() = Some(now);
        *self.shared.last_run_duration.lock().unwrap() = None;
        {
            let mut clock = self.shared.improvement.lock().unwrap();
            clock.at_time = Some(now);
            clock.at_step = 0;
        }
        log::info!("search `{}`: run started", self.name);
        self.fire(search, |listener, search| {
            listener.status_changed(search, SearchStatus::Initializing)
        });
        self.fire(search, |listener, search| listener.search_started(search));

        // the checker works on a snapshot of the criteria registered for this run
        let criteria: Vec<Arc<dyn StopCriterion>> = self.stop_criteria.lock().unwrap().clone();
        if !criteria.is_empty() {
            let handle = spawn_checker(
                self.name.clone(),
                self.shared.clone(),
                criteria,
                *self.check_period.lock().unwrap(),
                self.minimizing,
            );
            match handle {
                Ok(handle) => *self.checker.lock().unwrap() = Some(handle),
                Err(error) => {
                    // abort the run before it begins
                    *self.shared.status.lock().unwrap() = SearchStatus::Idle;
                    self.shared.status_signal.notify_all();
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Transitions the search from initializing to running (unless termination has
    /// already been requested).
    pub(crate) fn set_running(&self, search: &dyn Search<S>) {
        let transitioned = {
            let mut status = self.shared.status.lock().unwrap();
            if *status == SearchStatus::Initializing {
                *status = SearchStatus::Running;
                true
            } else {
                false
            }
        };
        if transitioned {
            self.fire(search, |listener, search| {
                listener.status_changed(search, SearchStatus::Running)
            });
        }
    }

    /// Advances the step counter and notifies listeners.
    pub(crate) fn step_completed(&self, search: &dyn Search<S>) {
        let steps = self.shared.steps.fetch_add(1, Ordering::SeqCst) + 1;
        self.fire(search, |listener, search| {
            listener.step_completed(search, steps)
        });
    }

    /// Finishes a run: returns to idle, joins the checker and notifies listeners.
    pub(crate) fn finish_run(&self, search: &dyn Search<S>, outcome: &Result<(), SearchError>) {
        let was_terminating;
        {
            let mut status = self.shared.status.lock().unwrap();
            was_terminating = *status == SearchStatus::Terminating;
            *status = SearchStatus::Idle;
            self.shared.status_signal.notify_all();
        }
        if let Some(handle) = self.checker.lock().unwrap().take() {
            let _ = handle.join();
        }
        let runtime = {
            let start = self.shared.run_start.lock().unwrap().take();
            start.map(|at| at.elapsed()).unwrap_or(Duration::ZERO)
        };
        *self.shared.last_run_duration.lock().unwrap() = Some(runtime);
        if was_terminating {
            self.fire(search, |listener, search| {
                listener.status_changed(search, SearchStatus::Terminating)
            });
        }
        self.fire(search, |listener, search| {
            listener.status_changed(search, SearchStatus::Idle)
        });
        self.fire(search, |listener, search| listener.search_stopped(search));
        match outcome {
            Ok(()) => log::info!(
                "search `{}`: run finished after {} steps in {:0.2}s (best value: {})",
                self.name,
                self.num_steps(),
                runtime.as_secs_f64(),
                self.best_evaluation()
                    .map(|evaluation| evaluation.value().to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            Err(error) => log::warn!(
                "search `{}`: run aborted after {} steps: {}",
                self.name,
                self.num_steps(),
                error
            ),
        }
    }

    /// Disposes the search. Fails while a run is active; disposing twice is a no-op.
    pub(crate) fn dispose(&self, search: &dyn Search<S>) -> Result<(), SearchError> {
        {
            let mut status = self.shared.status.lock().unwrap();
            match *status {
                SearchStatus::Disposed => return Ok(()),
                SearchStatus::Idle => *status = SearchStatus::Disposed,
                other => {
                    return Err(SearchError::Execution(format!(
                        "cannot dispose search `{}` while it is active (status: {})",
                        self.name, other
                    )))
                }
            }
        }
        self.fire(search, |listener, search| {
            listener.status_changed(search, SearchStatus::Disposed)
        });
        Ok(())
    }

    /// Offers a candidate to best-solution tracking: the candidate must have passed
    /// validation; it is skipped if the problem rejects it, and recorded (as a deep
    /// copy) exactly if it strictly improves on the best value. Returns whether the
    /// best solution was replaced.
    pub(crate) fn update_best(
        &self,
        search: &dyn Search<S>,
        solution: &S,
        evaluation: &Evaluation,
    ) -> bool {
        if self.problem.reject_solution(solution) {
            return false;
        }
        self.update_best_trusted(search, solution, evaluation)
    }

    /// Like [`update_best`][SearchCommon::update_best], but without consulting
    /// [`Problem::reject_solution`] — for candidates relayed from a sub-search that
    /// already validated them.
    pub(crate) fn update_best_trusted(
        &self,
        search: &dyn Search<S>,
        solution: &S,
        evaluation: &Evaluation,
    ) -> bool {
        {
            let mut best = self.shared.best.lock().unwrap();
            let improved = match best.as_ref() {
                None => true,
                Some(point) => {
                    strictly_better(self.minimizing, evaluation.value(), point.evaluation.value())
                }
            };
            if !improved {
                return false;
            }
            *best = Some(BestPoint {
                solution: solution.clone(),
                evaluation: evaluation.clone(),
            });
        }
        {
            let mut clock = self.shared.improvement.lock().unwrap();
            clock.at_time = Some(Instant::now());
            clock.at_step = self.shared.steps.load(Ordering::SeqCst);
        }
        log::debug!(
            "search `{}`: new best solution (value: {})",
            self.name,
            evaluation.value()
        );
        self.fire(search, |listener, search| {
            listener.new_best_solution(search, solution, evaluation)
        });
        true
    }

    fn fire(
        &self,
        search: &dyn Search<S>,
        callback: impl Fn(&dyn SearchListener<S>, &dyn Search<S>),
    ) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            callback(listener.as_ref(), search);
        }
    }
}

/// Compares two evaluation values under the given optimization direction.
pub(crate) fn strictly_better(minimizing: bool, new_value: f64, old_value: f64) -> bool {
    if minimizing {
        new_value < old_value
    } else {
        new_value > old_value
    }
}

/// Spawns the background thread that polls the stop criteria while the search is
/// active. The thread wakes early (via the status condition variable) when the run
/// ends.
fn spawn_checker<S: Solution>(
    name: String,
    shared: Arc<SharedState<S>>,
    criteria: Vec<Arc<dyn StopCriterion>>,
    period: Duration,
    minimizing: bool,
) -> Result<thread::JoinHandle<()>, SearchError> {
    let checker_name = name.clone();
    thread::Builder::new()
        .name(format!("{}-stop-criteria", name))
        .spawn(move || {
            let name = checker_name;
            let mut status = shared.status.lock().unwrap();
            loop {
                if !matches!(
                    *status,
                    SearchStatus::Initializing | SearchStatus::Running
                ) {
                    return;
                }
                let (guard, _) = shared.status_signal.wait_timeout(status, period).unwrap();
                status = guard;
                if !matches!(
                    *status,
                    SearchStatus::Initializing | SearchStatus::Running
                ) {
                    return;
                }
                drop(status);
                let snapshot = shared.snapshot(minimizing);
                if criteria.iter().any(|criterion| criterion.should_stop(&snapshot)) {
                    log::debug!("search `{}`: stop criterion fired", name);
                    shared.request_stop();
                    return;
                }
                status = shared.status.lock().unwrap();
            }
        })
        .map_err(|error| {
            SearchError::Execution(format!(
                "failed to spawn stop-criterion checker for search `{}`: {}",
                name, error
            ))
        })
}
