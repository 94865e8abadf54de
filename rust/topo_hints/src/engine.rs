// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

use crate::encoding::parse_hints;
use crate::fmt_hints;
use crate::policy::check_nr_nodes;
use crate::HintFormat;
use crate::HintSet;
use crate::MergeResult;
use crate::Policy;
use crate::Result;
use crate::TopologyError;
use crate::TopologyHint;
use log::debug;
use std::fmt;

/// Everything one evaluation is configured with.
#[derive(Debug, Clone, Default)]
pub struct EngineParams {
    pub policy_name: String,
    /// NUMA node IDs of the machine, which must be `0..N` in any order.
    pub numa_nodes: Vec<usize>,
    /// One raw hint string per resource entry.
    pub raw_hints: Vec<String>,
    pub hint_format: HintFormat,
}

/// A policy together with the hints it is asked to merge.
#[derive(Debug, Clone)]
pub struct Engine {
    policy: Policy,
    hints: HintSet,
}

/// Validate a NUMA node ID list and return the node count.
fn nr_nodes_from_ids(ids: &[usize]) -> Result<usize> {
    check_nr_nodes(ids.len())?;

    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    for (expected, &id) in sorted.iter().enumerate() {
        if id != expected {
            return Err(TopologyError::InvalidNodeList(format!(
                "node IDs must be 0-{} without repeats (got {:?})",
                ids.len() - 1,
                ids
            )));
        }
    }

    Ok(ids.len())
}

impl Engine {
    pub fn new(policy: Policy, hints: HintSet) -> Engine {
        Engine { policy, hints }
    }

    pub fn from_params(params: &EngineParams) -> Result<Engine> {
        let nr_nodes = nr_nodes_from_ids(&params.numa_nodes)?;
        let policy = Policy::new(&params.policy_name, nr_nodes)?;
        let hints = parse_hints(&params.raw_hints, params.hint_format, nr_nodes)?;
        debug!(
            "decoded {} resources from {} raw hints",
            hints.len(),
            params.raw_hints.len()
        );

        Ok(Engine::new(policy, hints))
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn hint_set(&self) -> &HintSet {
        &self.hints
    }

    /// Decoded hints of `resource`, empty if it is unknown.
    pub fn hints(&self, resource: &str) -> Vec<TopologyHint> {
        self.hints.hints(resource).to_vec()
    }

    pub fn run(&self) -> Result<MergeResult> {
        self.policy.merge(&self.hints)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RESOURCE: &str = "resource";

        let width = self
            .hints
            .resources()
            .map(str::len)
            .chain(std::iter::once(RESOURCE.len()))
            .max()
            .unwrap_or(RESOURCE.len());

        writeln!(f, "using policy {:?}", self.policy_name())?;
        write!(f, "{:<width$}  hints", RESOURCE, width = width)?;
        for resource in self.hints.resources() {
            write!(
                f,
                "\n{:<width$}  {}",
                resource,
                fmt_hints(self.hints.hints(resource)),
                width = width
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(policy: &str, nodes: &[usize], raw: &[&str]) -> EngineParams {
        EngineParams {
            policy_name: policy.to_string(),
            numa_nodes: nodes.to_vec(),
            raw_hints: raw.iter().map(|s| s.to_string()).collect(),
            hint_format: HintFormat::Compact,
        }
    }

    #[test]
    fn test_from_params() {
        let engine = Engine::from_params(&params(
            "single-numa-node",
            &[0, 1],
            &["cpu:[{01 true} {10 true} {11 false}]"],
        ))
        .unwrap();
        assert_eq!(engine.policy_name(), "single-numa-node");
        assert_eq!(engine.hints("cpu").len(), 3);
        assert!(engine.hints("gpu").is_empty());

        let result = engine.run().unwrap();
        assert!(result.admit);
        assert_eq!(result.hint.to_string(), "{01 true}");
    }

    #[test]
    fn test_node_list_validation() {
        let nine: Vec<usize> = (0..9).collect();
        assert!(matches!(
            Engine::from_params(&params("none", &nine, &[])),
            Err(TopologyError::TooManyNumaNodes {
                requested: 9,
                max: 8
            })
        ));
        assert!(matches!(
            Engine::from_params(&params("none", &[], &[])),
            Err(TopologyError::NoNumaNodes)
        ));
        assert!(matches!(
            Engine::from_params(&params("none", &[0, 2], &[])),
            Err(TopologyError::InvalidNodeList(_))
        ));
        assert!(matches!(
            Engine::from_params(&params("none", &[0, 0], &[])),
            Err(TopologyError::InvalidNodeList(_))
        ));
        assert!(Engine::from_params(&params("none", &[1, 0], &[])).is_ok());
    }

    #[test]
    fn test_too_many_nodes_checked_before_hints() {
        let nine: Vec<usize> = (0..9).collect();
        assert!(matches!(
            Engine::from_params(&params("none", &nine, &["garbage"])),
            Err(TopologyError::TooManyNumaNodes { .. })
        ));
    }

    #[test]
    fn test_report() {
        let engine = Engine::from_params(&params(
            "restricted",
            &[0, 1],
            &["nvidia.com/gpu:[{01 true} {11 false}]", "cpu:[{01 true}]"],
        ))
        .unwrap();
        let expected = concat!(
            "using policy \"restricted\"\n",
            "resource        hints\n",
            "nvidia.com/gpu  [{01 true} {11 false}]\n",
            "cpu             [{01 true}]",
        );
        assert_eq!(engine.to_string(), expected);
    }

    #[test]
    fn test_report_without_hints() {
        let engine = Engine::new(Policy::new("none", 2).unwrap(), HintSet::new());
        assert_eq!(engine.to_string(), "using policy \"none\"\nresource  hints");
    }
}
