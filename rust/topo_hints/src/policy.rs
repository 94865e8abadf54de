// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

use crate::HintMerger;
use crate::HintSet;
use crate::Result;
use crate::TopologyError;
use crate::TopologyHint;
use crate::MAX_NUMA_NODES;
use log::debug;
use std::fmt;

pub const POLICY_NONE: &str = "none";
pub const POLICY_BEST_EFFORT: &str = "best-effort";
pub const POLICY_RESTRICTED: &str = "restricted";
pub const POLICY_SINGLE_NUMA_NODE: &str = "single-numa-node";

/// Outcome of one evaluation. `hint` is filled in even when the workload is
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub hint: TopologyHint,
    pub admit: bool,
}

impl fmt::Display for MergeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "admit={} hint={}", self.admit, self.hint)
    }
}

/// Validate the number of NUMA nodes masks will be sized to.
pub fn check_nr_nodes(nr_nodes: usize) -> Result<()> {
    if nr_nodes == 0 {
        return Err(TopologyError::NoNumaNodes);
    }
    if nr_nodes > MAX_NUMA_NODES {
        return Err(TopologyError::TooManyNumaNodes {
            requested: nr_nodes,
            max: MAX_NUMA_NODES,
        });
    }

    Ok(())
}

/// Topology Manager admission policy for a machine of `nr_nodes` NUMA nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Enforce nothing.
    None { nr_nodes: usize },
    /// Report the best alignment, never reject.
    BestEffort { nr_nodes: usize },
    /// Reject unless the best alignment is preferred by every resource.
    Restricted { nr_nodes: usize },
    /// Reject unless the best alignment is a single, preferred NUMA node.
    SingleNumaNode { nr_nodes: usize },
}

impl Policy {
    pub fn new(name: &str, nr_nodes: usize) -> Result<Policy> {
        check_nr_nodes(nr_nodes)?;

        let policy = match name {
            POLICY_NONE => Policy::None { nr_nodes },
            POLICY_BEST_EFFORT => Policy::BestEffort { nr_nodes },
            POLICY_RESTRICTED => Policy::Restricted { nr_nodes },
            POLICY_SINGLE_NUMA_NODE => Policy::SingleNumaNode { nr_nodes },
            _ => return Err(TopologyError::UnknownPolicy(name.to_string())),
        };
        debug!("policy {:?} on {} NUMA nodes", name, nr_nodes);

        Ok(policy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::None { .. } => POLICY_NONE,
            Policy::BestEffort { .. } => POLICY_BEST_EFFORT,
            Policy::Restricted { .. } => POLICY_RESTRICTED,
            Policy::SingleNumaNode { .. } => POLICY_SINGLE_NUMA_NODE,
        }
    }

    pub fn nr_nodes(&self) -> usize {
        match *self {
            Policy::None { nr_nodes }
            | Policy::BestEffort { nr_nodes }
            | Policy::Restricted { nr_nodes }
            | Policy::SingleNumaNode { nr_nodes } => nr_nodes,
        }
    }

    /// Merge the hints of every resource and decide admission.
    pub fn merge(&self, hint_set: &HintSet) -> Result<MergeResult> {
        let result = match *self {
            Policy::None { nr_nodes } => MergeResult {
                hint: TopologyHint::any(nr_nodes),
                admit: true,
            },
            Policy::BestEffort { nr_nodes } => {
                let hint = HintMerger::new(hint_set, nr_nodes)?.merge()?;
                MergeResult { hint, admit: true }
            }
            Policy::Restricted { nr_nodes } => {
                let hint = HintMerger::new(hint_set, nr_nodes)?.merge()?;
                let admit = hint.preferred;
                MergeResult { hint, admit }
            }
            Policy::SingleNumaNode { nr_nodes } => {
                let hint = HintMerger::new(hint_set, nr_nodes)?.merge()?;
                let admit = hint.preferred && hint.affinity.weight() == 1;
                MergeResult { hint, admit }
            }
        };
        debug!("{}: {}", self.name(), result);

        Ok(result)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
