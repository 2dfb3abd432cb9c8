//! Contains the [`SearchError`] enum, the error type returned by every fallible
//! operation of this crate.

use thiserror::Error;

use crate::search::SearchStatus;

/// Errors that can occur while configuring or running a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// An invalid configuration value, such as a non-positive temperature, an empty
    /// neighborhood list or an out-of-range subset size bound.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A configuration change was attempted while the search was not idle.
    /// Setters for the neighborhood, the current solution, the temperature, the tabu
    /// memory, etc. are only permitted between runs.
    #[error("configuration changes require an idle search (current status: {0})")]
    NotIdle(SearchStatus),

    /// A component received a move of a kind it cannot interpret, e.g. an id-based
    /// tabu memory that is asked about a move which does not touch ids.
    #[error("move of type `{move_type}` cannot be interpreted by this component")]
    IncompatibleMove {
        /// The concrete type name of the offending move.
        move_type: &'static str,
    },

    /// A failure while executing a search, such as a failing replica of a parallel
    /// search or a violated invariant in a user-provided component.
    #[error("search execution failed: {0}")]
    Execution(String),
}
