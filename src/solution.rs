//! Contains the [`Solution`] trait bound that every solution type must satisfy.

use std::hash::Hash;

/// The capability set required of a solution type.
/// * [`Clone`] produces the deep copies used for best-solution tracking and for seeding
///   sub-searches; since cloning is statically typed, a copy is always of the exact
///   same type as the original.
/// * [`Eq`] and [`Hash`] must agree and depend only on the semantic content of the
///   solution, never on identity: two solutions that select the same elements compare
///   equal and hash equally. This is what full-solution tabu memories rely on.
/// * [`Send`] allows solutions to migrate to the worker threads of the parallel
///   searches.
///
/// The trait is implemented automatically for every type with these capabilities.
pub trait Solution: Clone + Eq + Hash + Send + 'static {}

impl<S: Clone + Eq + Hash + Send + 'static> Solution for S {}
