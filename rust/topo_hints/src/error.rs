// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("up to {max} NUMA nodes are supported (got {requested})")]
    TooManyNumaNodes { requested: usize, max: usize },

    #[error("at least one NUMA node is required")]
    NoNumaNodes,

    #[error("unknown policy: {0:?}")]
    UnknownPolicy(String),

    #[error("NUMA node {index} is out of range for a mask of {capacity} nodes")]
    OutOfRange { index: usize, capacity: usize },

    #[error("cannot combine NUMA masks of {left} and {right} nodes")]
    CapacityMismatch { left: usize, right: usize },

    #[error("invalid NUMA mask {0:?}, expected a string of '0' and '1'")]
    InvalidMask(String),

    #[error("invalid NUMA node list: {0}")]
    InvalidNodeList(String),

    #[error("malformed hint: {0}")]
    MalformedHint(String),

    #[error("failed to decode JSON hint")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
