//! Contains the [`Evaluation`] enum, which represents the objective value of a solution.

use std::fmt;

/// The objective value of a solution, as computed by
/// [`Problem::evaluate`][super::Problem::evaluate].
/// * [`Simple`][Evaluation::Simple] wraps a plain objective value.
/// * [`Penalized`][Evaluation::Penalized] additionally carries the aggregated penalties
///   of the violated [penalizing constraints][super::PenalizingConstraint]. The penalty
///   worsens the value: it is added for minimizing problems and subtracted for
///   maximizing problems.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// A plain objective value.
    Simple(f64),
    /// An objective value combined with aggregated constraint penalties.
    Penalized {
        /// The unpenalized objective value.
        base: f64,
        /// The aggregated penalty, always non-negative.
        penalty: f64,
        /// Whether the evaluated problem is minimizing (determines the sign with which
        /// the penalty enters the value).
        minimizing: bool,
    },
}

impl Evaluation {
    /// Creates a penalized evaluation from the unpenalized value and the aggregated
    /// penalty of a problem with the given optimization direction.
    pub fn penalized(base: f64, penalty: f64, minimizing: bool) -> Evaluation {
        Evaluation::Penalized {
            base,
            penalty,
            minimizing,
        }
    }

    /// Returns the (penalized) objective value of the solution.
    pub fn value(&self) -> f64 {
        match *self {
            Evaluation::Simple(value) => value,
            Evaluation::Penalized {
                base,
                penalty,
                minimizing,
            } => {
                if minimizing {
                    base + penalty
                } else {
                    base - penalty
                }
            }
        }
    }

    /// Returns the objective value without penalties.
    pub fn base_value(&self) -> f64 {
        match *self {
            Evaluation::Simple(value) => value,
            Evaluation::Penalized { base, .. } => base,
        }
    }

    /// Returns the aggregated penalty (zero for [`Evaluation::Simple`]).
    pub fn penalty(&self) -> f64 {
        match *self {
            Evaluation::Simple(_) => 0.0,
            Evaluation::Penalized { penalty, .. } => penalty,
        }
    }

    /// Converts the evaluation to a JSON object (using [`serde_json`]).
    pub fn to_json(&self) -> serde_json::Value {
        match *self {
            Evaluation::Simple(value) => serde_json::json!({ "value": value }),
            Evaluation::Penalized { base, penalty, .. } => serde_json::json!({
                "value": self.value(),
                "base": base,
                "penalty": penalty,
            }),
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Simple(value) => write!(f, "{:0.2}", value),
            Evaluation::Penalized { base, penalty, .. } => {
                write!(f, "{:0.2} (base: {:0.2}, penalty: {:0.2})", self.value(), base, penalty)
            }
        }
    }
}
