//! Contains the [`SubsetIterator`], which enumerates all subsets of a ground set with
//! sizes in a given range.
//!
//! Subsets are emitted by ascending size. Within one size, the enumeration follows the
//! revolving-door order (Knuth, TAOCP 7.2.1.3, Algorithm R): successive subsets of the
//! same size differ by exactly one id swapped in and one id swapped out. Every subset
//! in the size range is emitted exactly once.

use std::collections::BTreeSet;

use super::IdSubset;
use crate::error::SearchError;

/// Revolving-door successor state for the size-`t` combinations of `{0, .., n-1}`.
/// `c[1..=t]` holds the combination in ascending order, `c[t+1]` is a sentinel.
struct RevolvingDoor {
    t: usize,
    c: Vec<usize>,
    started: bool,
    done: bool,
}

impl RevolvingDoor {
    fn new(n: usize, t: usize) -> RevolvingDoor {
        let mut c = Vec::with_capacity(t + 2);
        c.push(0); // c[0] is unused
        c.extend(0..t); // c[j] = j - 1
        c.push(n); // sentinel c[t + 1]
        RevolvingDoor {
            t,
            c,
            started: false,
            done: t > n,
        }
    }

    /// Returns the next combination as ascending indices, or `None` when exhausted.
    fn next_combination(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            // the empty combination is emitted exactly once
            if self.t == 0 {
                self.done = true;
            }
            return Some(&self.c[1..=self.t]);
        }
        if self.advance() {
            Some(&self.c[1..=self.t])
        } else {
            self.done = true;
            None
        }
    }

    /// One revolving-door successor step (Algorithm R, steps R3 to R5).
    fn advance(&mut self) -> bool {
        let t = self.t;
        let c = &mut self.c;
        if t % 2 == 1 {
            // R3, t odd: try to increase c[1]
            if c[1] + 1 < c[2] {
                c[1] += 1;
                return true;
            }
            let mut j = 2;
            loop {
                if j > t {
                    return false;
                }
                // R4: try to decrease c[j]
                if c[j] >= j {
                    c[j] = c[j - 1];
                    c[j - 1] = j - 2;
                    return true;
                }
                j += 1;
                if j > t {
                    return false;
                }
                // R5: try to increase c[j]
                if c[j] + 1 < c[j + 1] {
                    c[j - 1] = c[j];
                    c[j] += 1;
                    return true;
                }
                j += 1;
            }
        } else {
            // R3, t even: try to decrease c[1]
            if c[1] > 0 {
                c[1] -= 1;
                return true;
            }
            let mut j = 2;
            loop {
                if j > t {
                    return false;
                }
                // R5: try to increase c[j]
                if c[j] + 1 < c[j + 1] {
                    c[j - 1] = c[j];
                    c[j] += 1;
                    return true;
                }
                j += 1;
                if j > t {
                    return false;
                }
                // R4: try to decrease c[j]
                if c[j] >= j {
                    c[j] = c[j - 1];
                    c[j - 1] = j - 2;
                    return true;
                }
                j += 1;
            }
        }
    }
}

/// Enumerates all subsets of a ground set of ids with sizes in `[min_size, max_size]`,
/// smallest size first, each subset exactly once. Within one size, successive subsets
/// differ by a single swap (revolving-door order); this is an enumeration-order
/// property that minimal-change consumers may rely on, not a correctness property.
///
/// Typically plugged into an
/// [`ExhaustiveSearch`][crate::search::exhaustive::ExhaustiveSearch].
pub struct SubsetIterator {
    ids: Vec<u32>,
    size: usize,
    max_size: usize,
    door: Option<RevolvingDoor>,
}

impl SubsetIterator {
    /// Creates a new [`SubsetIterator`] over the given ground set. Duplicate ids are
    /// collapsed. Fails if `min_size > max_size` or `max_size` exceeds the number of
    /// distinct ids.
    pub fn new(
        ground_ids: impl IntoIterator<Item = u32>,
        min_size: usize,
        max_size: usize,
    ) -> Result<SubsetIterator, SearchError> {
        let ids: Vec<u32> = ground_ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if min_size > max_size {
            return Err(SearchError::Configuration(format!(
                "subset size range is empty: min {} exceeds max {}",
                min_size, max_size
            )));
        }
        if max_size > ids.len() {
            return Err(SearchError::Configuration(format!(
                "subset size bound {} exceeds the {} ids of the ground set",
                max_size,
                ids.len()
            )));
        }
        Ok(SubsetIterator {
            ids,
            size: min_size,
            max_size,
            door: None,
        })
    }
}

impl Iterator for SubsetIterator {
    type Item = IdSubset;

    fn next(&mut self) -> Option<IdSubset> {
        loop {
            if self.size > self.max_size {
                return None;
            }
            let n = self.ids.len();
            let size = self.size;
            let door = self.door.get_or_insert_with(|| RevolvingDoor::new(n, size));
            if let Some(indices) = door.next_combination() {
                let ids = &self.ids;
                return Some(IdSubset::new(indices.iter().map(|&i| ids[i])));
            }
            self.size += 1;
            self.door = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn binomial(n: u64, k: u64) -> u64 {
        if k > n {
            return 0;
        }
        let mut result = 1;
        for i in 0..k {
            result = result * (n - i) / (i + 1);
        }
        result
    }

    #[test]
    fn enumerates_each_subset_in_range_exactly_once() {
        let subsets: Vec<IdSubset> = SubsetIterator::new(1..=5, 1, 3).unwrap().collect();
        assert_eq!(subsets.len(), 5 + 10 + 10);
        let distinct: HashSet<IdSubset> = subsets.iter().cloned().collect();
        assert_eq!(distinct.len(), subsets.len());
        assert!(subsets.iter().all(|s| (1..=3).contains(&s.len())));
    }

    #[test]
    fn sizes_are_enumerated_in_ascending_order() {
        let sizes: Vec<usize> = SubsetIterator::new(0..7, 2, 5)
            .unwrap()
            .map(|s| s.len())
            .collect();
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        assert_eq!(sizes, sorted);
        for k in 2..=5u64 {
            let count = sizes.iter().filter(|&&len| len == k as usize).count() as u64;
            assert_eq!(count, binomial(7, k));
        }
    }

    #[test]
    fn consecutive_subsets_of_one_size_differ_by_a_single_swap() {
        let subsets: Vec<IdSubset> = SubsetIterator::new(0..8, 4, 4).unwrap().collect();
        assert_eq!(subsets.len(), binomial(8, 4) as usize);
        for window in subsets.windows(2) {
            let first: HashSet<u32> = window[0].iter().collect();
            let second: HashSet<u32> = window[1].iter().collect();
            assert_eq!(first.symmetric_difference(&second).count(), 2);
        }
    }

    #[test]
    fn boundary_sizes_are_supported() {
        let empty_only: Vec<IdSubset> = SubsetIterator::new([1, 2, 3], 0, 0).unwrap().collect();
        assert_eq!(empty_only, vec![IdSubset::empty()]);

        let singletons: Vec<Vec<u32>> = SubsetIterator::new([4, 2, 9], 1, 1)
            .unwrap()
            .map(|s| s.iter().collect())
            .collect();
        assert_eq!(singletons, vec![vec![2], vec![4], vec![9]]);

        let full: Vec<IdSubset> = SubsetIterator::new([1, 2], 2, 2).unwrap().collect();
        assert_eq!(full, vec![IdSubset::new([1, 2])]);
    }

    #[test]
    fn invalid_size_bounds_are_rejected() {
        assert!(SubsetIterator::new(1..=5, 3, 2).is_err());
        assert!(SubsetIterator::new(1..=5, 0, 6).is_err());
    }
}
