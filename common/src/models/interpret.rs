// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// Body of `POST <interpret>/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretRequest {
    pub url: String,
    pub get_screenshot: bool,
    pub all_destination_details: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReply {
    pub request_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusReply {
    pub status: Option<String>,
    pub download_link: Option<String>,
}

/// Lifecycle of a submitted interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretStatus {
    Complete,
    Failed,
    /// Any other status string; the request is still being worked on.
    InProgress(String),
}

impl From<&str> for InterpretStatus {
    fn from(status: &str) -> Self {
        match status {
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            other => Self::InProgress(other.to_string()),
        }
    }
}

/// Element kinds a result document may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    Interpretation,
    Screenshot,
    Knowledge,
    Statistics,
    PartialKnowledge,
    AllDestinationDetails,
}

impl ResultType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interpretation" => Some(Self::Interpretation),
            "screenshot" => Some(Self::Screenshot),
            "knowledge" => Some(Self::Knowledge),
            "statistics" => Some(Self::Statistics),
            "partial_knowledge" => Some(Self::PartialKnowledge),
            "all_destination_details" => Some(Self::AllDestinationDetails),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interpretation => "interpretation",
            Self::Screenshot => "screenshot",
            Self::Knowledge => "knowledge",
            Self::Statistics => "statistics",
            Self::PartialKnowledge => "partial_knowledge",
            Self::AllDestinationDetails => "all_destination_details",
        }
    }

    /// Payload is base64 encoded binary data rather than printable JSON.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Screenshot)
    }
}
