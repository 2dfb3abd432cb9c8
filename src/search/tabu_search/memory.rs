//! Contains the [`TabuMemory`] trait and the built-in memories:
//! [`FullSolutionTabuMemory`] and [`IdBasedTabuMemory`].

use crate::error::SearchError;
use crate::neighborhood::Move;
use crate::solution::Solution;
use crate::subset::IdMove;
use crate::util::BoundedRecencySet;

/// The short-term memory of a [tabu search][super::TabuSearch]: it declares moves
/// tabu based on the recently visited solutions, to keep the search from cycling.
///
/// A memory that receives a move kind it cannot interpret fails with
/// [`SearchError::IncompatibleMove`].
pub trait TabuMemory<S: Solution>: Send {
    /// Whether the given move is currently tabu for the given current solution. The
    /// solution is passed mutably so that the memory may temporarily apply the move to
    /// inspect the post-move solution; it must be restored exactly before returning.
    fn is_tabu(&self, mv: &dyn Move<S>, current: &mut S) -> Result<bool, SearchError>;

    /// Registers a newly visited solution and the move that produced it (`None` for
    /// the initial solution of a run).
    fn register(&mut self, visited: &S, mv: Option<&dyn Move<S>>) -> Result<(), SearchError>;

    /// Forgets everything.
    fn clear(&mut self);
}

/// A [`TabuMemory`] that remembers the last `size` visited solutions (by value
/// equality): a move is tabu exactly if it leads back to one of them.
///
/// To decide this, the memory applies the move, tests membership and undoes the move
/// again. This works for every solution and move type, at the cost of keeping full
/// solution copies.
pub struct FullSolutionTabuMemory<S: Solution> {
    visited: BoundedRecencySet<S>,
}

impl<S: Solution> FullSolutionTabuMemory<S> {
    /// Creates a memory remembering the last `size` visited solutions (at least 1).
    pub fn new(size: usize) -> Result<FullSolutionTabuMemory<S>, SearchError> {
        if size == 0 {
            return Err(SearchError::Configuration(
                "tabu memory size must be at least 1".to_string(),
            ));
        }
        Ok(FullSolutionTabuMemory {
            visited: BoundedRecencySet::new(size),
        })
    }
}

impl<S: Solution> TabuMemory<S> for FullSolutionTabuMemory<S> {
    fn is_tabu(&self, mv: &dyn Move<S>, current: &mut S) -> Result<bool, SearchError> {
        mv.apply(current);
        let tabu = self.visited.contains(current);
        mv.undo(current);
        Ok(tabu)
    }

    fn register(&mut self, visited: &S, _mv: Option<&dyn Move<S>>) -> Result<(), SearchError> {
        self.visited.insert(visited.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.visited.clear();
    }
}

/// A [`TabuMemory`] for subset solutions that remembers the last `size` ids touched
/// (selected or deselected) by the registered [`IdMoves`][`IdMove`]: a move is tabu
/// exactly if it touches a remembered id.
///
/// Much cheaper than a [`FullSolutionTabuMemory`], at the price of being coarser: it
/// forbids every move on a recently touched id, not only the ones revisiting an old
/// solution. Moves other than [`IdMove`] are incompatible with this memory.
pub struct IdBasedTabuMemory {
    touched: BoundedRecencySet<u32>,
}

impl IdBasedTabuMemory {
    /// Creates a memory remembering the last `size` touched ids (at least 1).
    pub fn new(size: usize) -> Result<IdBasedTabuMemory, SearchError> {
        if size == 0 {
            return Err(SearchError::Configuration(
                "tabu memory size must be at least 1".to_string(),
            ));
        }
        Ok(IdBasedTabuMemory {
            touched: BoundedRecencySet::new(size),
        })
    }

    fn id_move<'a, S: Solution>(mv: &'a dyn Move<S>) -> Result<&'a IdMove, SearchError> {
        mv.as_any()
            .downcast_ref::<IdMove>()
            .ok_or(SearchError::IncompatibleMove {
                move_type: mv.name(),
            })
    }
}

impl<S: Solution> TabuMemory<S> for IdBasedTabuMemory {
    fn is_tabu(&self, mv: &dyn Move<S>, _current: &mut S) -> Result<bool, SearchError> {
        let id_move = Self::id_move(mv)?;
        Ok(id_move.touched_ids().any(|id| self.touched.contains(&id)))
    }

    fn register(&mut self, _visited: &S, mv: Option<&dyn Move<S>>) -> Result<(), SearchError> {
        if let Some(mv) = mv {
            let id_move = Self::id_move(mv)?;
            for id in id_move.touched_ids() {
                self.touched.insert(id);
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subset::IdSubset;
    use std::any::Any;

    #[test]
    fn full_solution_memory_forbids_revisiting_and_restores_the_solution() {
        let mut memory: FullSolutionTabuMemory<IdSubset> =
            FullSolutionTabuMemory::new(2).unwrap();
        let visited = IdSubset::new([1, 2]);
        memory.register(&visited, None).unwrap();

        // moving from {1, 3} back to {1, 2} is tabu, any other target is fine
        let mut current = IdSubset::new([1, 3]);
        let back = IdMove::Swap {
            add_id: 2,
            remove_id: 3,
        };
        let elsewhere = IdMove::Swap {
            add_id: 4,
            remove_id: 3,
        };
        assert!(memory.is_tabu(&back, &mut current).unwrap());
        assert!(!memory.is_tabu(&elsewhere, &mut current).unwrap());
        // the membership test must not disturb the current solution
        assert_eq!(current, IdSubset::new([1, 3]));
    }

    #[test]
    fn id_memory_tracks_recently_touched_ids() {
        // capacity 4, with moves touching {3, 2}, {4}, {0}, {1}, {3} in order
        let mut memory = IdBasedTabuMemory::new(4).unwrap();
        let solution = IdSubset::empty(); // irrelevant for this memory
        let moves = [
            IdMove::Swap {
                add_id: 3,
                remove_id: 2,
            },
            IdMove::Add(4),
            IdMove::Add(0),
            IdMove::Add(1),
            IdMove::Add(3),
        ];
        for mv in &moves {
            memory.register(&solution, Some(mv)).unwrap();
        }

        // the memory now holds {4, 0, 1, 3}
        let mut current = IdSubset::new([5, 2]);
        let touching_2 = IdMove::Swap {
            add_id: 9,
            remove_id: 2,
        };
        let touching_4 = IdMove::Swap {
            add_id: 4,
            remove_id: 9,
        };
        assert!(!memory.is_tabu(&touching_2, &mut current).unwrap());
        assert!(memory.is_tabu(&touching_4, &mut current).unwrap());
    }

    #[test]
    fn the_inverse_of_a_registered_move_is_tabu() {
        let mut memory = IdBasedTabuMemory::new(8).unwrap();
        let mut solution = IdSubset::new([1, 2]);
        let mv = IdMove::Swap {
            add_id: 3,
            remove_id: 2,
        };
        mv.apply(&mut solution);
        memory.register(&solution, Some(&mv)).unwrap();

        let inverse = IdMove::Swap {
            add_id: 2,
            remove_id: 3,
        };
        assert!(memory.is_tabu(&inverse, &mut solution).unwrap());
    }

    #[test]
    fn unknown_move_kinds_are_incompatible_with_the_id_memory() {
        struct OpaqueMove;
        impl Move<IdSubset> for OpaqueMove {
            fn apply(&self, _solution: &mut IdSubset) {}
            fn undo(&self, _solution: &mut IdSubset) {}
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let mut memory = IdBasedTabuMemory::new(4).unwrap();
        let mut solution = IdSubset::empty();
        let result = TabuMemory::<IdSubset>::is_tabu(&memory, &OpaqueMove, &mut solution);
        assert!(matches!(
            result,
            Err(SearchError::IncompatibleMove { .. })
        ));
        assert!(memory.register(&solution, Some(&OpaqueMove)).is_err());

        TabuMemory::<IdSubset>::clear(&mut memory);
    }
}
