// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # URL Interpretation Client
//!
//! Drives the three-step exchange with the interpretation service:
//!
//! 1.  **Submit**: `POST /request` with the URL and options, yielding a `request_id`.
//! 2.  **Poll**: `GET /status?request_id=..` every `poll_interval` until the
//!     service reports `Complete` (with a `download_link`) or `Failed`.
//! 3.  **Fetch**: download the result document and turn each element into
//!     something printable, saving screenshots to disk on the way.
//!
//! Every failure ends the exchange with "no result" and a log line; nothing
//! in here returns an error to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use bayse_common::config::{ApiKey, Config};
use bayse_common::models::interpret::{
    InterpretRequest, InterpretStatus, ResultType, StatusReply, SubmitReply,
};
use bayse_common::utils::timing::PollBudget;
use bayse_common::{debug, error, info, success, warn};
use reqwest::Url;
use serde_json::{Map, Value};

use crate::http::{API_KEY_HEADER, HttpReply, Transport};

pub struct InterpretClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: ApiKey,
    poll_interval: Duration,
    max_polls: Option<u32>,
    status_checks: Arc<AtomicU32>,
}

/// One printable piece of a result document.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Every field of a non-binary element, in document order.
    Fields {
        kind: ResultType,
        fields: Vec<(String, Value)>,
    },
    Screenshot {
        message: Option<String>,
        path: PathBuf,
    },
}

/// What became of a result document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutcome {
    pub rendered: Vec<Rendered>,
    /// Set when processing stopped before the end of the document.
    pub stopped: Option<String>,
}

impl RenderOutcome {
    fn stop(mut self, reason: impl Into<String>) -> Self {
        self.stopped = Some(reason.into());
        self
    }
}

enum PollStep {
    Done(Option<String>),
    Continue(String),
}

impl InterpretClient {
    pub fn new(transport: Arc<dyn Transport>, cfg: &Config) -> Self {
        Self {
            transport,
            base_url: cfg.interpret_url(),
            api_key: cfg.api_key.clone(),
            poll_interval: cfg.poll_interval,
            max_polls: cfg.max_polls,
            status_checks: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Shared counter of status requests issued so far, for progress display.
    pub fn status_checks(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.status_checks)
    }

    fn auth(&self) -> [(&str, &str); 1] {
        [(API_KEY_HEADER, self.api_key.expose())]
    }

    /// Submits `url` for interpretation and returns the assigned request id.
    pub async fn submit(&self, url: &str, want_screenshot: bool, want_details: bool) -> Option<String> {
        let request = InterpretRequest {
            url: url.to_string(),
            get_screenshot: want_screenshot,
            all_destination_details: want_details,
        };
        let body = serde_json::to_value(&request).ok()?;
        let endpoint = format!("{}/request", self.base_url);

        let reply = match self.transport.post_json(&endpoint, &self.auth(), &body).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to interpret URL: {e}");
                return None;
            }
        };

        if !reply.is_ok() {
            error!("Failed to interpret URL ({}): {}", reply.status, reply.body);
            return None;
        }

        match reply.json::<SubmitReply>().ok().and_then(|r| r.request_id) {
            Some(Value::String(id)) => Some(id),
            Some(Value::Null) | None => {
                error!("Failed to interpret URL: {}", reply.body);
                None
            }
            Some(other) => Some(other.to_string()),
        }
    }

    /// Waits for `request_id` to finish and returns its download link.
    pub async fn poll(&self, request_id: &str) -> Option<String> {
        let url = match self.status_url(request_id) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot build status query for {request_id}: {e}");
                return None;
            }
        };
        let mut budget = PollBudget::new(self.max_polls);

        let first = self.status(url.as_str()).await?;
        if let PollStep::Done(link) = evaluate(&first) {
            return link;
        }

        loop {
            if !budget.try_consume() {
                warn!(
                    "Giving up on request {request_id} after {} status checks",
                    budget.attempts() + 1
                );
                return None;
            }

            tokio::time::sleep(self.poll_interval).await;

            let reply = self.status(url.as_str()).await?;
            match evaluate(&reply) {
                PollStep::Done(link) => return link,
                PollStep::Continue(status) => {
                    debug!("Interpretation {request_id} is still '{status}'");
                }
            }
        }
    }

    /// `<base>/status?request_id=<id>`, with the id query-encoded.
    pub fn status_url(&self, request_id: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/status", self.base_url))?;
        url.query_pairs_mut().append_pair("request_id", request_id);
        Ok(url)
    }

    async fn status(&self, url: &str) -> Option<HttpReply> {
        self.status_checks.fetch_add(1, Ordering::Relaxed);
        match self.transport.get(url, &self.auth()).await {
            Ok(reply) if reply.is_ok() => Some(reply),
            Ok(reply) => {
                error!("Failed to get status ({}): {}", reply.status, reply.body);
                None
            }
            Err(e) => {
                error!("Failed to get status: {e}");
                None
            }
        }
    }

    /// Downloads the result document behind `download_link`, printing
    /// nothing itself. Screenshots are written into `out_dir`.
    pub async fn fetch_and_render(&self, download_link: &str, out_dir: &Path) -> RenderOutcome {
        let reply = match self.transport.get(download_link, &[]).await {
            Ok(reply) => reply,
            Err(e) => {
                return RenderOutcome::default()
                    .stop(format!("Failed to get interpret results from url: {e}"));
            }
        };

        match reply.json::<Value>() {
            Ok(document) => render_document(&document, out_dir),
            Err(e) => RenderOutcome::default()
                .stop(format!("Failed to parse interpret result as JSON: {e}")),
        }
    }
}

fn evaluate(reply: &HttpReply) -> PollStep {
    let status: StatusReply = match reply.json() {
        Ok(status) => status,
        Err(e) => {
            error!("Error encountered while interpreting URL: {e}");
            return PollStep::Done(None);
        }
    };

    let Some(state) = status.status.as_deref() else {
        error!("Failed to interpret URL: {}", reply.body);
        return PollStep::Done(None);
    };

    match InterpretStatus::from(state) {
        InterpretStatus::Complete => {
            if status.download_link.is_none() {
                error!("Interpretation completed without a download link");
            }
            PollStep::Done(status.download_link)
        }
        InterpretStatus::Failed => {
            error!("Something failed while interpreting URL.");
            PollStep::Done(None)
        }
        InterpretStatus::InProgress(other) => PollStep::Continue(other),
    }
}

/// Walks the `results` array of a result document.
pub fn render_document(document: &Value, out_dir: &Path) -> RenderOutcome {
    let mut outcome = RenderOutcome::default();

    let Some(results) = document.get("results").and_then(Value::as_array) else {
        return outcome.stop("No results.");
    };

    for element in results {
        let Some(element) = element.as_object() else {
            return outcome.stop("Failed to get any meaningful results.");
        };

        let type_name = element.get("type").and_then(Value::as_str).unwrap_or_default();
        let Some(kind) = ResultType::parse(type_name) else {
            return outcome.stop(format!("Unrecognized result type '{type_name}'"));
        };

        let payload = element.get(kind.as_str()).filter(|v| is_present(v));
        let Some(payload) = payload else {
            debug!("Result element '{}' carries no data", kind.as_str());
            continue;
        };

        if kind.is_binary() {
            match save_screenshot(payload, out_dir) {
                Ok(path) => {
                    success!("Successfully saved {} to {}", kind.as_str(), path.display());
                    outcome.rendered.push(Rendered::Screenshot {
                        message: element
                            .get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        path,
                    });
                }
                Err(e) => return outcome.stop(format!("Failed to save {}: {e:#}", kind.as_str())),
            }
        } else {
            outcome.rendered.push(Rendered::Fields {
                kind,
                fields: fields_of(element),
            });
        }
    }

    info!(verbosity = 1, "Rendered {} result elements", outcome.rendered.len());
    outcome
}

fn fields_of(element: &Map<String, Value>) -> Vec<(String, Value)> {
    element
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Mirrors the service's notion of "has data": null, false, zero and empty
/// strings/collections do not count.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn save_screenshot(payload: &Value, out_dir: &Path) -> anyhow::Result<PathBuf> {
    let encoded = payload
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("screenshot payload is not a string"))?;
    let bytes = general_purpose::STANDARD.decode(encoded.trim())?;

    let stamp = chrono::Utc::now().format("%Y-%m-%d_%H%M%S%.6fZ");
    let path = out_dir.join(format!("{stamp}_screenshot.png"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
