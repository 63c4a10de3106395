// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Knowledge Payload Model
//!
//! The knowledge base answers with a loosely structured JSON document:
//!
//! ```json
//! { "destination_info": { "knowledge": {...}, "statistics": {...}, "flow_summary": {...} },
//!   "parent_info":      { "knowledge": {...} } }
//! ```
//!
//! Any of these sections may be missing, empty or of an unexpected type
//! depending on how much the service knows about a destination. Instead of
//! mapping the document onto rigid structs (which would reject the whole
//! payload over one odd field), [`KnowledgePayload`] keeps the raw object and
//! exposes optional accessors so each consumer can degrade independently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DESTINATION_INFO: &str = "destination_info";
pub const PARENT_INFO: &str = "parent_info";
pub const KNOWLEDGE: &str = "knowledge";
pub const STATISTICS: &str = "statistics";
pub const FLOW_SUMMARY: &str = "flow_summary";

/// The `body` of a successful knowledge-base reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgePayload(Map<String, Value>);

impl KnowledgePayload {
    /// Accepts only JSON objects; anything else is not a usable payload.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// A top-level section such as `destination_info`, if it is an object.
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    /// `payload[section][key]`. The returned value may itself be `null`.
    pub fn field(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A knowledge mapping reduced to its first entry.
///
/// The service keys knowledge by `name:port` (e.g. `{"example.com:443": {...}}`);
/// a flow only ever needs the first entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedInfo {
    pub nameport: Option<String>,
    pub info: Value,
}

impl NamedInfo {
    /// Takes the first key of `value` and its associated value. Non-objects
    /// and empty objects yield no name and an empty `info` object.
    pub fn first_entry(value: &Value) -> Self {
        match value.as_object().and_then(|map| map.iter().next()) {
            Some((name, info)) => Self {
                nameport: Some(name.clone()),
                info: info.clone(),
            },
            None => Self {
                nameport: None,
                info: Value::Object(Map::new()),
            },
        }
    }
}
