// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Flow File Model
//!
//! On-disk representation of the converter output (`*.bf` files) and of the
//! enrichment fields added to every flow.
//!
//! ## Key Concepts
//! * **Flow file**: `{hash, trafficDate, fileName, BayseFlows: [...]}`, one per converted input.
//! * **Enrichment**: four fields (`destination_knowledge`, `destination_stats`,
//!   `destination_flow_summary`, `parent_knowledge`) that are always written,
//!   each either a named info object, `{}` for private destinations, or `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::knowledge::NamedInfo;

/// Extension (without the dot) identifying flow files in a directory.
pub const FLOW_FILE_EXTENSION: &str = "bf";

/// `destinationNameSource` value meaning `dst` is the address seen on the wire.
pub const NAME_SOURCE_ORIGINAL: &str = "original";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowFile {
    pub hash: String,
    #[serde(rename = "trafficDate")]
    pub traffic_date: Value,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "BayseFlows", default)]
    pub flows: Vec<FlowRecord>,
}

/// One summarized connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub src: String,
    pub dst: String,
    pub destination_name_source: String,
    pub src_pkts: u64,
    pub src_bytes: u64,
    pub dst_pkts: u64,
    pub dst_bytes: u64,
    pub relative_start: f64,
    pub protocol_information: String,
    pub identifier: Value,
    pub duration: f64,
    pub label: Value,

    #[serde(rename = "destination_knowledge", default, skip_deserializing)]
    pub destination_knowledge: Option<Enrichment>,
    #[serde(rename = "destination_stats", default, skip_deserializing)]
    pub destination_stats: Option<Enrichment>,
    #[serde(rename = "destination_flow_summary", default, skip_deserializing)]
    pub destination_flow_summary: Option<Enrichment>,
    #[serde(rename = "parent_knowledge", default, skip_deserializing)]
    pub parent_knowledge: Option<Enrichment>,
}

impl FlowRecord {
    pub fn is_original_name(&self) -> bool {
        self.destination_name_source == NAME_SOURCE_ORIGINAL
    }

    /// Marks the flow as pointing to a private destination.
    pub fn mark_private(&mut self) {
        self.destination_knowledge = Some(Enrichment::Private {});
        self.destination_stats = Some(Enrichment::Private {});
        self.destination_flow_summary = Some(Enrichment::Private {});
        self.parent_knowledge = Some(Enrichment::Private {});
    }

    /// Clears all enrichment fields (they serialize as `null`).
    pub fn clear_enrichment(&mut self) {
        self.destination_knowledge = None;
        self.destination_stats = None;
        self.destination_flow_summary = None;
        self.parent_knowledge = None;
    }
}

/// Value of a single enrichment field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Enrichment {
    /// Serializes as `{}`; the destination was never looked up.
    Private {},
    Destination {
        destination_nameport: Option<String>,
        info: Value,
    },
    Parent {
        parent_nameport: Option<String>,
        info: Value,
    },
}

impl Enrichment {
    pub fn destination(named: NamedInfo) -> Self {
        Self::Destination {
            destination_nameport: named.nameport,
            info: named.info,
        }
    }

    pub fn parent(named: NamedInfo) -> Self {
        Self::Parent {
            parent_nameport: named.nameport,
            info: named.info,
        }
    }
}
