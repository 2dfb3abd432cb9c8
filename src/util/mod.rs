//! This module contains small supporting data structures used by the search
//! implementations.

mod bounded_set;

pub use bounded_set::BoundedRecencySet;
