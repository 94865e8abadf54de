// Copyright (c) Meta Platforms, Inc. and affiliates.

// This software may be used and distributed according to the terms of the
// GNU General Public License version 2.

//! # Hint encodings
//!
//! Resource hints come in as one raw string per resource, in one of two
//! equivalent encodings.
//!
//! JSON, `R` being the resource, `H` its hints, `M` a mask and `P` the
//! preferred flag:
//!
//!```text
//!     {"R":"cpu","H":[{"M":"01","P":true},{"M":"10","P":true},{"M":"11","P":false}]}
//!```
//!
//! Compact, the way hint lists print:
//!
//!```text
//!     cpu:[{01 true} {10 true} {11 false}]
//!```
//!
//! Both decode into the same HintSet. Entries naming a resource more than once
//! append to its hint list.

use crate::HintSet;
use crate::Result;
use crate::TopologyError;
use crate::TopologyHint;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HintFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Deserialize)]
struct RawResourceHints {
    #[serde(rename = "R")]
    resource: String,
    #[serde(rename = "H", default)]
    hints: Vec<RawHint>,
}

#[derive(Debug, Deserialize)]
struct RawHint {
    #[serde(rename = "M")]
    mask: String,
    #[serde(rename = "P", default)]
    preferred: bool,
}

impl RawHint {
    fn decode(&self, nr_nodes: usize) -> Result<TopologyHint> {
        TopologyHint::from_bit_str(&self.mask, self.preferred, nr_nodes)
    }
}

/// Decode raw hints in the given format into a HintSet whose masks hold
/// `nr_nodes` nodes.
pub fn parse_hints<S: AsRef<str>>(
    raw_hints: &[S],
    format: HintFormat,
    nr_nodes: usize,
) -> Result<HintSet> {
    match format {
        HintFormat::Json => parse_json_hints(raw_hints, nr_nodes),
        HintFormat::Compact => parse_compact_hints(raw_hints, nr_nodes),
    }
}

pub fn parse_json_hints<S: AsRef<str>>(raw_hints: &[S], nr_nodes: usize) -> Result<HintSet> {
    let mut set = HintSet::new();
    for raw in raw_hints {
        let rh: RawResourceHints = serde_json::from_str(raw.as_ref())?;
        let hints = rh
            .hints
            .iter()
            .map(|hint| hint.decode(nr_nodes))
            .collect::<Result<Vec<_>>>()?;
        set.add_hints(&rh.resource, hints)?;
    }

    Ok(set)
}

pub fn parse_compact_hints<S: AsRef<str>>(raw_hints: &[S], nr_nodes: usize) -> Result<HintSet> {
    let mut set = HintSet::new();
    for raw in raw_hints {
        let (resource, hints) = parse_compact_resource(raw.as_ref(), nr_nodes)?;
        set.add_hints(resource, hints)?;
    }

    Ok(set)
}

fn parse_compact_resource(raw: &str, nr_nodes: usize) -> Result<(&str, Vec<TopologyHint>)> {
    let malformed = |what: &str| TopologyError::MalformedHint(format!("{} in {:?}", what, raw));

    let (resource, list) = raw
        .split_once(':')
        .ok_or_else(|| malformed("missing ':' after the resource name"))?;
    let list = list.trim();
    let list = list.strip_prefix('[').unwrap_or(list);
    let list = list.strip_suffix(']').unwrap_or(list);

    let mut hints = vec![];
    for item in list.split('{').map(str::trim).filter(|s| !s.is_empty()) {
        let item = item
            .strip_suffix('}')
            .ok_or_else(|| malformed("unterminated hint"))?;
        let fields: Vec<&str> = item.split_whitespace().collect();
        let (mask, preferred) = match fields.as_slice() {
            [mask, preferred] => (*mask, *preferred),
            _ => return Err(malformed("expected {<mask> <preferred>}")),
        };
        let preferred = match preferred {
            "true" => true,
            "false" => false,
            _ => return Err(malformed("preferred must be true or false")),
        };
        hints.push(TopologyHint::from_bit_str(mask, preferred, nr_nodes)?);
    }

    Ok((resource.trim(), hints))
}
