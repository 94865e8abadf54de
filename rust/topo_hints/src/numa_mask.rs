// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

//! # NUMA masks
//!
//! A NumaMask is a BitVec of u64's sized to the number of NUMA nodes of the
//! machine, along with helpers for building, combining and comparing them.
//! The capacity is fixed at construction and every node index must stay
//! below it.
//!
//! Masks are usually built from the bit strings resource providers report
//! their hints in. The rightmost character is NUMA node 0:
//!
//!```
//!     use topo_hints::NumaMask;
//!     let mask = NumaMask::from_bit_str("10", 2).unwrap();
//!     assert!(mask.test_node(1));
//!     assert!(!mask.test_node(0));
//!     assert_eq!(mask.to_string(), "10");
//!```
//!
//! A string shorter than the capacity only covers the lowest nodes, so "1"
//! on a 4 node machine renders back as "0001".
//!
//! Combining masks of different capacities is always an error:
//!
//!```
//!     use topo_hints::NumaMask;
//!     let a = NumaMask::new_full(2);
//!     let b = NumaMask::new_full(4);
//!     assert!(a.and(&b).is_err());
//!```

use crate::Result;
use crate::TopologyError;
use crate::MAX_NUMA_NODES;
use bitvec::prelude::*;
use sscanf::sscanf;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Eq, Clone, Hash, PartialEq)]
pub struct NumaMask {
    mask: BitVec<u64, Lsb0>,
}

impl NumaMask {
    fn check_node(&self, node: usize) -> Result<()> {
        if node >= self.capacity() {
            return Err(TopologyError::OutOfRange {
                index: node,
                capacity: self.capacity(),
            });
        }

        Ok(())
    }

    fn check_capacity(&self, other: &NumaMask) -> Result<()> {
        if self.capacity() != other.capacity() {
            return Err(TopologyError::CapacityMismatch {
                left: self.capacity(),
                right: other.capacity(),
            });
        }

        Ok(())
    }

    /// Build a new NumaMask with room for `nr_nodes` nodes and no bit set.
    pub fn new_empty(nr_nodes: usize) -> NumaMask {
        NumaMask {
            mask: bitvec![u64, Lsb0; 0; nr_nodes],
        }
    }

    /// Build a new NumaMask with all `nr_nodes` nodes set.
    pub fn new_full(nr_nodes: usize) -> NumaMask {
        NumaMask {
            mask: bitvec![u64, Lsb0; 1; nr_nodes],
        }
    }

    /// Build a NumaMask of capacity `nr_nodes` with the given nodes set.
    pub fn from_nodes(nodes: &[usize], nr_nodes: usize) -> Result<NumaMask> {
        let mut mask = NumaMask::new_empty(nr_nodes);
        for &node in nodes {
            mask.set_node(node)?;
        }

        Ok(mask)
    }

    /// Build a NumaMask of capacity `nr_nodes` from a bit string.
    ///
    /// Character `p` of a string of length `L` stands for node `L - 1 - p`.
    /// Leading zeros past the capacity are accepted, a set bit past it is
    /// not.
    pub fn from_bit_str(bits: &str, nr_nodes: usize) -> Result<NumaMask> {
        if bits.is_empty() || !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(TopologyError::InvalidMask(bits.to_string()));
        }

        let mut mask = NumaMask::new_empty(nr_nodes);
        let width = bits.len();
        for (pos, bit) in bits.bytes().enumerate() {
            if bit == b'1' {
                mask.set_node(width - 1 - pos)?;
            }
        }

        Ok(mask)
    }

    /// The number of nodes this mask can hold.
    pub fn capacity(&self) -> usize {
        self.mask.len()
    }

    /// Set a node in the NumaMask. Returns an error if the node exceeds the
    /// capacity of the mask.
    pub fn set_node(&mut self, node: usize) -> Result<()> {
        self.check_node(node)?;
        self.mask.set(node, true);
        Ok(())
    }

    /// Test whether the specified node is set. Nodes beyond the capacity are
    /// never set.
    pub fn test_node(&self, node: usize) -> bool {
        match self.mask.get(node) {
            Some(bit) => *bit,
            None => false,
        }
    }

    /// Count the number of nodes set in the NumaMask.
    pub fn weight(&self) -> usize {
        self.mask.count_ones()
    }

    /// Return true if the NumaMask has no node set, false otherwise.
    pub fn is_empty(&self) -> bool {
        self.mask.not_any()
    }

    /// Return true if every node of the NumaMask is set, false otherwise.
    pub fn is_full(&self) -> bool {
        self.mask.all()
    }

    /// Create a NumaMask that is the AND of the current NumaMask and another
    /// of the same capacity.
    pub fn and(&self, other: &NumaMask) -> Result<NumaMask> {
        self.check_capacity(other)?;
        let mut new = self.clone();
        new.mask &= &other.mask;
        Ok(new)
    }

    /// Create a NumaMask that is the OR of the current NumaMask and another
    /// of the same capacity.
    pub fn or(&self, other: &NumaMask) -> Result<NumaMask> {
        self.check_capacity(other)?;
        let mut new = self.clone();
        new.mask |= &other.mask;
        Ok(new)
    }

    /// Iterate over the indices of the nodes set, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask.iter_ones()
    }

    /// Canonical ordering of masks: fewer nodes first, then the lower
    /// integer value (node `i` weighs `2^i`) first.
    pub fn cmp_narrowness(&self, other: &NumaMask) -> Ordering {
        self.weight().cmp(&other.weight()).then_with(|| {
            let top = self.capacity().max(other.capacity());
            (0..top)
                .rev()
                .map(|node| self.test_node(node).cmp(&other.test_node(node)))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        })
    }

    /// True if `self` sorts strictly before `other` in the canonical
    /// ordering of `cmp_narrowness`.
    pub fn is_narrower_than(&self, other: &NumaMask) -> bool {
        self.cmp_narrowness(other) == Ordering::Less
    }

    /// Render the mask as a bit string of `width` characters, node 0 last.
    /// Nodes at or above `width` are not represented.
    pub fn to_bit_string(&self, width: usize) -> String {
        (0..width)
            .rev()
            .map(|node| if self.test_node(node) { '1' } else { '0' })
            .collect()
    }
}

/// Parse a node list such as "0-3,5" into the node IDs it names. Lists naming
/// more than `MAX_NUMA_NODES` nodes are rejected before they are expanded.
pub fn read_nodelist(nodelist: &str) -> Result<Vec<usize>> {
    let mut node_ids = vec![];
    for group in nodelist.split(',') {
        let (min, max) = match sscanf!(group.trim(), "{usize}-{usize}") {
            Ok((x, y)) => (x, y),
            Err(_) => match sscanf!(group.trim(), "{usize}") {
                Ok(x) => (x, x),
                Err(_) => {
                    return Err(TopologyError::InvalidNodeList(format!(
                        "failed to parse {:?}",
                        group.trim()
                    )));
                }
            },
        };
        if min > max {
            return Err(TopologyError::InvalidNodeList(format!(
                "descending range {}-{}",
                min, max
            )));
        }
        let requested = node_ids
            .len()
            .saturating_add(max - min)
            .saturating_add(1);
        if requested > MAX_NUMA_NODES {
            return Err(TopologyError::TooManyNumaNodes {
                requested,
                max: MAX_NUMA_NODES,
            });
        }
        node_ids.extend(min..=max);
    }

    Ok(node_ids)
}

impl fmt::Display for NumaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string(self.capacity()))
    }
}
