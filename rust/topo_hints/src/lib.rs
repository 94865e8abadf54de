// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

//! # NUMA topology hint merging
//!
//! A workload asking for several resources (CPUs, devices, SR-IOV VFs, ...) on
//! a multi-NUMA-node machine gets one list of candidate NUMA affinities from
//! every resource provider. Each candidate ("hint") is a mask of NUMA nodes
//! plus a flag telling whether the provider considers that mask a preferred,
//! minimal alignment.
//!
//! This crate reconciles those independent lists into a single merged hint
//! and renders an admission decision under one of the Topology Manager
//! policies:
//!
//! - `none`: no alignment is enforced, everything is admitted.
//! - `best-effort`: report the best alignment found, never reject.
//! - `restricted`: admit only if the best alignment is jointly preferred.
//! - `single-numa-node`: admit only a jointly preferred single-node alignment.
//!
//! ```
//! use topo_hints::{Engine, EngineParams, HintFormat};
//!
//! let params = EngineParams {
//!     policy_name: "restricted".to_string(),
//!     numa_nodes: vec![0, 1],
//!     raw_hints: vec![
//!         "cpu:[{01 true} {10 true}]".to_string(),
//!         "gpu:[{10 true}]".to_string(),
//!     ],
//!     hint_format: HintFormat::Compact,
//! };
//! let engine = Engine::from_params(&params).unwrap();
//! let result = engine.run().unwrap();
//! assert!(result.admit);
//! assert_eq!(result.hint.to_string(), "{10 true}");
//! ```
//!
//! Every evaluation is a pure function of its inputs: nothing is cached or
//! shared between calls.

mod error;
pub use error::Result;
pub use error::TopologyError;

mod numa_mask;
pub use numa_mask::read_nodelist;
pub use numa_mask::NumaMask;

mod hint;
pub use hint::fmt_hints;
pub use hint::TopologyHint;

mod hint_set;
pub use hint_set::HintSet;

pub mod encoding;
pub use encoding::HintFormat;

pub mod merger;
pub use merger::HintMerger;

mod policy;
pub use policy::check_nr_nodes;
pub use policy::MergeResult;
pub use policy::Policy;
pub use policy::POLICY_BEST_EFFORT;
pub use policy::POLICY_NONE;
pub use policy::POLICY_RESTRICTED;
pub use policy::POLICY_SINGLE_NUMA_NODE;

mod engine;
pub use engine::Engine;
pub use engine::EngineParams;

/// Maximum number of NUMA nodes the Topology Manager supports.
pub const MAX_NUMA_NODES: usize = 8;
