// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

use crate::Result;
use crate::TopologyError;
use crate::TopologyHint;
use std::collections::BTreeMap;

/// Hints of every resource of one request, keyed by resource name.
///
/// Iteration through `iter()` is in resource name order, which is what the
/// merger walks. `resources()` keeps the order resources were first added
/// in, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintSet {
    hints: BTreeMap<String, Vec<TopologyHint>>,
    order: Vec<String>,
}

impl HintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hints` to the hint list of `resource`, creating the resource
    /// if needed. An empty `hints` still registers the resource, as
    /// unconstrained.
    pub fn add_hints<I>(&mut self, resource: &str, hints: I) -> Result<()>
    where
        I: IntoIterator<Item = TopologyHint>,
    {
        if resource.is_empty() {
            return Err(TopologyError::MalformedHint(
                "empty resource name".to_string(),
            ));
        }

        match self.hints.get_mut(resource) {
            Some(list) => list.extend(hints),
            None => {
                self.order.push(resource.to_string());
                self.hints
                    .insert(resource.to_string(), hints.into_iter().collect());
            }
        }

        Ok(())
    }

    /// Hints of `resource`, empty if the resource is unknown.
    pub fn hints(&self, resource: &str) -> &[TopologyHint] {
        self.hints.get(resource).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resource names in insertion order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Resources and their hints in resource name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TopologyHint])> {
        self.hints
            .iter()
            .map(|(name, hints)| (name.as_str(), hints.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}
