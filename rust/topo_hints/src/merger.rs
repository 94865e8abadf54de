// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

//! # Hint merging
//!
//! Every resource contributes its hint list as one dimension of the search.
//! The merger walks the Cartesian product of those lists, picking one hint
//! per resource, and for each combination computes:
//!
//! - the merged affinity, the AND of every chosen mask, and
//! - the merged preference, the AND of every chosen `preferred` flag.
//!
//! Combinations without a node in common are infeasible and skipped. Among
//! the rest the best one is, in order:
//!
//! 1. jointly preferred over not preferred,
//! 2. fewer NUMA nodes over more,
//! 3. lower mask value over higher.
//!
//! A resource without hints does not constrain placement and stands for a
//! single preferred hint spanning every node. If nothing is feasible, the
//! merged hint is the empty mask, not preferred.

use crate::HintSet;
use crate::NumaMask;
use crate::Result;
use crate::TopologyError;
use crate::TopologyHint;
use log::trace;
use std::cmp::Ordering;

/// Mixed-radix counter over hint index vectors, last dimension fastest.
///
/// With no dimension at all it yields a single empty vector.
#[derive(Debug, Clone)]
pub struct Combinations {
    radices: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(radices: Vec<usize>) -> Self {
        let current = if radices.contains(&0) {
            None
        } else {
            Some(vec![0; radices.len()])
        };
        Self { radices, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;

        let mut next = current.clone();
        for (idx, radix) in next.iter_mut().zip(self.radices.iter()).rev() {
            *idx += 1;
            if *idx < *radix {
                self.current = Some(next);
                break;
            }
            *idx = 0;
        }

        Some(current)
    }
}

/// Rank two merged hints, `Ordering::Less` meaning `a` is the better one.
pub fn cmp_merged(a: &TopologyHint, b: &TopologyHint) -> Ordering {
    b.preferred
        .cmp(&a.preferred)
        .then_with(|| a.affinity.cmp_narrowness(&b.affinity))
}

#[derive(Debug, Clone)]
pub struct HintMerger {
    nr_nodes: usize,
    resources: Vec<String>,
    dims: Vec<Vec<TopologyHint>>,
}

impl HintMerger {
    /// Prepare the search over `hint_set`. Every hint must hold exactly
    /// `nr_nodes` nodes.
    pub fn new(hint_set: &HintSet, nr_nodes: usize) -> Result<Self> {
        let mut resources = vec![];
        let mut dims = vec![];

        for (resource, hints) in hint_set.iter() {
            if let Some(bad) = hints.iter().find(|h| h.affinity.capacity() != nr_nodes) {
                return Err(TopologyError::CapacityMismatch {
                    left: nr_nodes,
                    right: bad.affinity.capacity(),
                });
            }

            let dim = if hints.is_empty() {
                vec![TopologyHint::any(nr_nodes)]
            } else {
                hints.to_vec()
            };
            resources.push(resource.to_string());
            dims.push(dim);
        }

        Ok(Self {
            nr_nodes,
            resources,
            dims,
        })
    }

    /// Number of hint combinations the search visits.
    pub fn nr_combinations(&self) -> usize {
        self.dims.iter().map(Vec::len).product()
    }

    /// Iterate over the index vectors of every combination, one index per
    /// resource in resource name order.
    pub fn combinations(&self) -> Combinations {
        Combinations::new(self.dims.iter().map(Vec::len).collect())
    }

    /// Merge the hints picked by `indices` into one.
    pub fn merge_combination(&self, indices: &[usize]) -> Result<TopologyHint> {
        let mut affinity = NumaMask::new_full(self.nr_nodes);
        let mut preferred = true;

        for (dim, &idx) in self.dims.iter().zip(indices.iter()) {
            let hint = dim.get(idx).ok_or(TopologyError::OutOfRange {
                index: idx,
                capacity: dim.len(),
            })?;
            affinity = affinity.and(&hint.affinity)?;
            preferred &= hint.preferred;
        }

        Ok(TopologyHint::new(affinity, preferred))
    }

    /// Run the search and return the best merged hint.
    pub fn merge(&self) -> Result<TopologyHint> {
        let mut best: Option<TopologyHint> = None;

        for indices in self.combinations() {
            let merged = self.merge_combination(&indices)?;
            if merged.affinity.is_empty() {
                trace!("{} infeasible", self.describe(&indices));
                continue;
            }
            trace!("{} -> {}", self.describe(&indices), merged);

            best = match best {
                Some(cur) if cmp_merged(&cur, &merged).is_le() => Some(cur),
                _ => Some(merged),
            };
        }

        Ok(best.unwrap_or_else(|| TopologyHint::infeasible(self.nr_nodes)))
    }

    fn describe(&self, indices: &[usize]) -> String {
        let picks: Vec<String> = self
            .resources
            .iter()
            .zip(self.dims.iter())
            .zip(indices.iter())
            .map(|((res, dim), &idx)| format!("{}={}", res, dim[idx]))
            .collect();
        picks.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(bits: &str, preferred: bool) -> TopologyHint {
        TopologyHint::from_bit_str(bits, preferred, 2).unwrap()
    }

    fn merge(resources: &[(&str, Vec<TopologyHint>)]) -> TopologyHint {
        let mut set = HintSet::new();
        for (name, hints) in resources {
            set.add_hints(name, hints.clone()).unwrap();
        }
        HintMerger::new(&set, 2).unwrap().merge().unwrap()
    }

    #[test]
    fn test_combinations() {
        let all: Vec<Vec<usize>> = Combinations::new(vec![2, 3]).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn test_combinations_edge_cases() {
        let none: Vec<Vec<usize>> = Combinations::new(vec![]).collect();
        assert_eq!(none, vec![Vec::<usize>::new()]);

        assert_eq!(Combinations::new(vec![3, 0]).count(), 0);
        assert_eq!(Combinations::new(vec![1, 1, 1]).count(), 1);
    }

    #[test]
    fn test_combinations_restart() {
        let combos = Combinations::new(vec![2, 2]);
        let first: Vec<Vec<usize>> = combos.clone().collect();
        let second: Vec<Vec<usize>> = combos.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_cmp_merged() {
        assert_eq!(cmp_merged(&hint("11", true), &hint("01", false)), Ordering::Less);
        assert_eq!(cmp_merged(&hint("01", true), &hint("11", true)), Ordering::Less);
        assert_eq!(cmp_merged(&hint("01", true), &hint("10", true)), Ordering::Less);
        assert_eq!(cmp_merged(&hint("10", true), &hint("10", true)), Ordering::Equal);
    }

    #[test]
    fn test_single_resource_picks_narrowest_preferred() {
        let best = merge(&[(
            "cpu",
            vec![hint("01", true), hint("10", true), hint("11", false)],
        )]);
        assert_eq!(best, hint("01", true));
    }

    #[test]
    fn test_common_node() {
        let best = merge(&[
            ("cpu", vec![hint("01", true), hint("10", true)]),
            ("gpu", vec![hint("10", true)]),
        ]);
        assert_eq!(best, hint("10", true));
    }

    #[test]
    fn test_disjoint_is_infeasible() {
        let best = merge(&[("cpu", vec![hint("01", true)]), ("gpu", vec![hint("10", true)])]);
        assert_eq!(best, hint("00", false));
    }

    #[test]
    fn test_falls_back_to_wider_non_preferred() {
        let best = merge(&[
            ("cpu", vec![hint("01", true), hint("11", false)]),
            ("gpu", vec![hint("10", true), hint("11", false)]),
        ]);
        // cpu=01 & gpu=10 is empty, every other combination includes a
        // non preferred hint; 01 and 10 are narrower than 11.
        assert_eq!(best, hint("01", false));
    }

    #[test]
    fn test_empty_resources() {
        assert_eq!(merge(&[]), hint("11", true));
        assert_eq!(merge(&[("cpu", vec![])]), hint("11", true));
        assert_eq!(
            merge(&[("cpu", vec![]), ("gpu", vec![hint("10", false)])]),
            hint("10", false)
        );
    }

    #[test]
    fn test_capacity_mismatch() {
        let mut set = HintSet::new();
        set.add_hints(
            "cpu",
            vec![TopologyHint::from_bit_str("01", true, 4).unwrap()],
        )
        .unwrap();
        assert!(matches!(
            HintMerger::new(&set, 2),
            Err(TopologyError::CapacityMismatch { left: 2, right: 4 })
        ));
    }

    #[test]
    fn test_nr_combinations() {
        let mut set = HintSet::new();
        set.add_hints("cpu", vec![hint("01", true), hint("10", true), hint("11", false)])
            .unwrap();
        set.add_hints("gpu", vec![hint("01", true), hint("11", false)])
            .unwrap();
        set.add_hints("nic", vec![]).unwrap();
        let merger = HintMerger::new(&set, 2).unwrap();
        assert_eq!(merger.nr_combinations(), 6);
        assert_eq!(merger.combinations().count(), 6);
    }
}
