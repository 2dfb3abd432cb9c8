//! Contains the [`Validation`] enum, which represents the constraint check of a solution.

/// The result of [validating][super::Problem::validate] a solution against the mandatory
/// constraints of a problem.
/// * [`Simple`][Validation::Simple] wraps a plain pass/fail flag.
/// * [`Unanimous`][Validation::Unanimous] combines the validations of several
///   constraints; it passes only if every child passed. Use
///   [`Validation::unanimous`] to build it with short-circuiting.
/// * [`Penalized`][Validation::Penalized] is the validation of a [penalizing
///   constraint][super::PenalizingConstraint]: it passes exactly if the penalty is zero.
/// * [`SubsetSize`][Validation::SubsetSize] validates the size of a subset solution
///   against a size range and keeps the current size around, so that a subsequent
///   incremental revalidation only needs the size delta of a move. The size check is
///   tracked separately from the wrapped constraint validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// A plain pass/fail validation.
    Simple(bool),
    /// Passed only if every child validation passed.
    Unanimous(Vec<Validation>),
    /// The validation of a penalizing constraint; passed exactly if the penalty is zero.
    Penalized {
        /// The non-negative penalty assigned to the solution.
        penalty: f64,
    },
    /// A size-range validation for subset solutions.
    SubsetSize {
        /// The current number of selected ids.
        size: usize,
        /// The minimum allowed number of selected ids.
        min_size: usize,
        /// The maximum allowed number of selected ids.
        max_size: usize,
        /// Validation of the remaining constraints, if any.
        constraints: Option<Box<Validation>>,
    },
}

impl Validation {
    /// Combines the given child validations into a [`Validation::Unanimous`].
    /// Stops consuming the iterator at the first failed child, so that the validations
    /// of the remaining constraints are never computed.
    pub fn unanimous(children: impl IntoIterator<Item = Validation>) -> Validation {
        let mut collected = Vec::new();
        for child in children {
            let failed = !child.passed();
            collected.push(child);
            if failed {
                break;
            }
        }
        Validation::Unanimous(collected)
    }

    /// Returns whether the solution satisfies all checked constraints.
    pub fn passed(&self) -> bool {
        match self {
            Validation::Simple(passed) => *passed,
            Validation::Unanimous(children) => children.iter().all(Validation::passed),
            Validation::Penalized { penalty } => *penalty == 0.0,
            Validation::SubsetSize {
                size,
                min_size,
                max_size,
                constraints,
            } => {
                *min_size <= *size
                    && *size <= *max_size
                    && constraints.as_ref().map_or(true, |c| c.passed())
            }
        }
    }

    /// Returns the penalty of a [`Validation::Penalized`], zero for all other variants.
    pub fn penalty(&self) -> f64 {
        match self {
            Validation::Penalized { penalty } => *penalty,
            _ => 0.0,
        }
    }

    /// For a [`Validation::SubsetSize`]: whether the size alone is within bounds,
    /// regardless of the wrapped constraint validation. For every other variant this
    /// equals [`passed`][Validation::passed].
    pub fn size_within_bounds(&self) -> bool {
        match self {
            Validation::SubsetSize {
                size,
                min_size,
                max_size,
                ..
            } => *min_size <= *size && *size <= *max_size,
            other => other.passed(),
        }
    }
}
