//! This module contains the subset machinery used by several core components: the
//! [`IdSet`] trait and the [`IdSubset`] solution type, the [`IdMove`] enum of
//! elementary subset modifications, [neighborhoods][neighborhood] over id moves and the
//! exhaustive [`SubsetIterator`][iterator::SubsetIterator].
//!
//! A subset solution selects ids out of a fixed ground set of identifiers. The
//! [id-based tabu memory][crate::search::tabu_search::IdBasedTabuMemory] interprets
//! [`IdMoves`][`IdMove`], and the [exhaustive search][crate::search::exhaustive]
//! can enumerate all subsets within a size range.

pub mod iterator;
pub mod neighborhood;

pub use iterator::SubsetIterator;
pub use neighborhood::SingleFlipNeighborhood;
pub use neighborhood::SingleSwapNeighborhood;

use std::any::Any;
use std::collections::BTreeSet;

use crate::neighborhood::Move;
use crate::solution::Solution;

/// A solution type that selects ids out of a ground set. Implementing this trait makes
/// the [`IdMove`] neighborhood moves (and with them the id-based tabu memory)
/// available for the solution type.
pub trait IdSet {
    /// Whether the given id is currently selected.
    fn contains_id(&self, id: u32) -> bool;

    /// Selects the given id. Returns whether the selection changed.
    fn add_id(&mut self, id: u32) -> bool;

    /// Deselects the given id. Returns whether the selection changed.
    fn remove_id(&mut self, id: u32) -> bool;

    /// Returns the currently selected ids.
    fn selected_ids(&self) -> Vec<u32>;
}

/// A subset solution: an ordered set of selected ids.
/// Equality and hashing depend only on the selected ids, as required by
/// [`Solution`][crate::solution::Solution].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IdSubset {
    selected: BTreeSet<u32>,
}

impl IdSubset {
    /// Creates an empty subset.
    pub fn empty() -> IdSubset {
        IdSubset::default()
    }

    /// Creates a subset selecting the given ids.
    pub fn new(ids: impl IntoIterator<Item = u32>) -> IdSubset {
        IdSubset {
            selected: ids.into_iter().collect(),
        }
    }

    /// The number of selected ids.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether no id is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Iterates over the selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.selected.iter().copied()
    }
}

impl IdSet for IdSubset {
    fn contains_id(&self, id: u32) -> bool {
        self.selected.contains(&id)
    }

    fn add_id(&mut self, id: u32) -> bool {
        self.selected.insert(id)
    }

    fn remove_id(&mut self, id: u32) -> bool {
        self.selected.remove(&id)
    }

    fn selected_ids(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }
}

/// An elementary modification of an [`IdSet`] solution: adding an id, removing an id,
/// or swapping one selected id for an unselected one.
///
/// Moves are generated for a concrete solution state: an added id must be unselected
/// and a removed id selected when the move is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMove {
    /// Selects the given id.
    Add(u32),
    /// Deselects the given id.
    Remove(u32),
    /// Deselects `remove_id` and selects `add_id` in one move, keeping the size.
    Swap {
        /// The id to select.
        add_id: u32,
        /// The id to deselect.
        remove_id: u32,
    },
}

impl IdMove {
    /// The id selected by this move, if any.
    pub fn added_id(&self) -> Option<u32> {
        match *self {
            IdMove::Add(id) => Some(id),
            IdMove::Remove(_) => None,
            IdMove::Swap { add_id, .. } => Some(add_id),
        }
    }

    /// The id deselected by this move, if any.
    pub fn deleted_id(&self) -> Option<u32> {
        match *self {
            IdMove::Add(_) => None,
            IdMove::Remove(id) => Some(id),
            IdMove::Swap { remove_id, .. } => Some(remove_id),
        }
    }

    /// All ids touched (selected or deselected) by this move.
    pub fn touched_ids(&self) -> impl Iterator<Item = u32> {
        self.added_id().into_iter().chain(self.deleted_id())
    }
}

impl<S: IdSet + Solution> Move<S> for IdMove {
    fn apply(&self, solution: &mut S) {
        match *self {
            IdMove::Add(id) => {
                solution.add_id(id);
            }
            IdMove::Remove(id) => {
                solution.remove_id(id);
            }
            IdMove::Swap { add_id, remove_id } => {
                solution.remove_id(remove_id);
                solution.add_id(add_id);
            }
        }
    }

    fn undo(&self, solution: &mut S) {
        match *self {
            IdMove::Add(id) => {
                solution.remove_id(id);
            }
            IdMove::Remove(id) => {
                solution.add_id(id);
            }
            IdMove::Swap { add_id, remove_id } => {
                solution.remove_id(add_id);
                solution.add_id(remove_id);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(subset: &IdSubset) -> u64 {
        let mut hasher = DefaultHasher::new();
        subset.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn apply_then_undo_restores_the_solution_exactly() {
        let original = IdSubset::new([1, 2, 3]);
        let moves = [
            IdMove::Add(7),
            IdMove::Remove(2),
            IdMove::Swap {
                add_id: 9,
                remove_id: 1,
            },
        ];
        for mv in moves {
            let mut solution = original.clone();
            mv.apply(&mut solution);
            assert_ne!(solution, original);
            mv.undo(&mut solution);
            assert_eq!(solution, original);
            assert_eq!(hash_of(&solution), hash_of(&original));
        }
    }

    #[test]
    fn copies_compare_equal_and_hash_equal() {
        let subset = IdSubset::new([4, 1, 4, 2]);
        let copy = subset.clone();
        let copy_of_copy = copy.clone();
        assert_eq!(subset, copy);
        assert_eq!(copy, copy_of_copy);
        assert_eq!(hash_of(&subset), hash_of(&copy_of_copy));
        assert_eq!(subset.len(), 3);
    }

    #[test]
    fn touched_ids_cover_added_and_deleted() {
        let swap = IdMove::Swap {
            add_id: 3,
            remove_id: 2,
        };
        assert_eq!(swap.added_id(), Some(3));
        assert_eq!(swap.deleted_id(), Some(2));
        let mut touched = swap.touched_ids().collect::<Vec<_>>();
        touched.sort_unstable();
        assert_eq!(touched, vec![2, 3]);
    }
}
