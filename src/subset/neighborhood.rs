//! Contains neighborhoods over [`IdMoves`][`IdMove`] for any [`IdSet`] solution type:
//! [`SingleSwapNeighborhood`] and [`SingleFlipNeighborhood`].

use itertools::iproduct;
use rand::seq::SliceRandom;
use rand::RngCore;

use super::{IdMove, IdSet};
use crate::neighborhood::{Move, Neighborhood};
use crate::solution::Solution;

/// A neighborhood that swaps one selected id for one unselected id of a fixed ground
/// set, keeping the subset size constant.
/// * Empty exactly if all or none of the ground ids are selected.
pub struct SingleSwapNeighborhood {
    ground_ids: Vec<u32>,
}

impl SingleSwapNeighborhood {
    /// Creates a new [`SingleSwapNeighborhood`] over the given ground set of ids.
    pub fn new(ground_ids: impl IntoIterator<Item = u32>) -> SingleSwapNeighborhood {
        SingleSwapNeighborhood {
            ground_ids: ground_ids.into_iter().collect(),
        }
    }

    fn split<S: IdSet>(&self, solution: &S) -> (Vec<u32>, Vec<u32>) {
        self.ground_ids
            .iter()
            .copied()
            .partition(|id| solution.contains_id(*id))
    }
}

impl<S: IdSet + Solution> Neighborhood<S> for SingleSwapNeighborhood {
    fn random_move(&self, solution: &S, rng: &mut dyn RngCore) -> Option<Box<dyn Move<S>>> {
        let (selected, unselected) = self.split(solution);
        let remove_id = *selected.choose(rng)?;
        let add_id = *unselected.choose(rng)?;
        Some(Box::new(IdMove::Swap { add_id, remove_id }))
    }

    fn all_moves(&self, solution: &S) -> Vec<Box<dyn Move<S>>> {
        let (selected, unselected) = self.split(solution);
        iproduct!(selected, unselected)
            .map(|(remove_id, add_id)| {
                Box::new(IdMove::Swap { add_id, remove_id }) as Box<dyn Move<S>>
            })
            .collect()
    }
}

/// A neighborhood that flips the selection of a single id of a fixed ground set:
/// selected ids can be removed, unselected ids can be added.
/// * Empty exactly if the ground set is empty.
pub struct SingleFlipNeighborhood {
    ground_ids: Vec<u32>,
}

impl SingleFlipNeighborhood {
    /// Creates a new [`SingleFlipNeighborhood`] over the given ground set of ids.
    pub fn new(ground_ids: impl IntoIterator<Item = u32>) -> SingleFlipNeighborhood {
        SingleFlipNeighborhood {
            ground_ids: ground_ids.into_iter().collect(),
        }
    }

    fn flip<S: IdSet>(solution: &S, id: u32) -> IdMove {
        if solution.contains_id(id) {
            IdMove::Remove(id)
        } else {
            IdMove::Add(id)
        }
    }
}

impl<S: IdSet + Solution> Neighborhood<S> for SingleFlipNeighborhood {
    fn random_move(&self, solution: &S, rng: &mut dyn RngCore) -> Option<Box<dyn Move<S>>> {
        let id = *self.ground_ids.choose(rng)?;
        Some(Box::new(Self::flip(solution, id)))
    }

    fn all_moves(&self, solution: &S) -> Vec<Box<dyn Move<S>>> {
        self.ground_ids
            .iter()
            .map(|id| Box::new(Self::flip(solution, *id)) as Box<dyn Move<S>>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subset::IdSubset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn swap_neighborhood_enumerates_all_pairs() {
        let neighborhood = SingleSwapNeighborhood::new(1..=5);
        let solution = IdSubset::new([1, 2]);
        let moves = neighborhood.all_moves(&solution);
        // 2 selected ids times 3 unselected ids
        assert_eq!(moves.len(), 6);
    }

    #[test]
    fn swap_neighborhood_is_empty_for_full_or_empty_selection() {
        let neighborhood = SingleSwapNeighborhood::new(1..=3);
        let mut rng = StdRng::seed_from_u64(42);
        let empty = IdSubset::empty();
        let full = IdSubset::new([1, 2, 3]);
        assert!(Neighborhood::<IdSubset>::random_move(&neighborhood, &empty, &mut rng).is_none());
        assert!(Neighborhood::<IdSubset>::random_move(&neighborhood, &full, &mut rng).is_none());
        assert!(neighborhood.all_moves(&empty).is_empty());
        assert!(neighborhood.all_moves(&full).is_empty());
    }

    #[test]
    fn flip_neighborhood_adds_unselected_and_removes_selected() {
        let neighborhood = SingleFlipNeighborhood::new([1, 2, 3]);
        let solution = IdSubset::new([2]);
        let moves = neighborhood.all_moves(&solution);
        assert_eq!(moves.len(), 3);
        let mut applied = Vec::new();
        for mv in &moves {
            let mut copy = solution.clone();
            mv.apply(&mut copy);
            applied.push(copy.selected_ids());
        }
        assert!(applied.contains(&vec![1, 2]));
        assert!(applied.contains(&Vec::<u32>::new()));
        assert!(applied.contains(&vec![2, 3]));
    }
}
