// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

use crate::NumaMask;
use crate::Result;
use std::fmt;

/// One NUMA alignment a resource can be satisfied with.
///
/// `preferred` marks a minimal alignment for the resource provider rather
/// than one that is merely possible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopologyHint {
    pub affinity: NumaMask,
    pub preferred: bool,
}

impl TopologyHint {
    pub fn new(affinity: NumaMask, preferred: bool) -> Self {
        Self {
            affinity,
            preferred,
        }
    }

    /// The hint of a resource that does not care about NUMA placement.
    pub fn any(nr_nodes: usize) -> Self {
        Self::new(NumaMask::new_full(nr_nodes), true)
    }

    /// The merged hint when no combination has a node in common.
    pub fn infeasible(nr_nodes: usize) -> Self {
        Self::new(NumaMask::new_empty(nr_nodes), false)
    }

    pub fn from_bit_str(bits: &str, preferred: bool, nr_nodes: usize) -> Result<Self> {
        Ok(Self::new(NumaMask::from_bit_str(bits, nr_nodes)?, preferred))
    }
}

impl fmt::Display for TopologyHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {}}}", self.affinity, self.preferred)
    }
}

/// Format a hint list as "[{01 true} {10 false}]".
pub fn fmt_hints(hints: &[TopologyHint]) -> String {
    let items: Vec<String> = hints.iter().map(|hint| hint.to_string()).collect();
    format!("[{}]", items.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let hint = TopologyHint::from_bit_str("01", true, 2).unwrap();
        assert_eq!(hint.to_string(), "{01 true}");
        assert_eq!(TopologyHint::infeasible(2).to_string(), "{00 false}");
        assert_eq!(TopologyHint::any(3).to_string(), "{111 true}");
    }

    #[test]
    fn test_fmt_hints() {
        let hints = vec![
            TopologyHint::from_bit_str("01", true, 2).unwrap(),
            TopologyHint::from_bit_str("10", true, 2).unwrap(),
            TopologyHint::from_bit_str("11", false, 2).unwrap(),
        ];
        assert_eq!(fmt_hints(&hints), "[{01 true} {10 true} {11 false}]");
        assert_eq!(fmt_hints(&[]), "[]");
    }
}
