// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::http::{Header, HttpReply, Transport, TransportError};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Replays queued replies in order; the last one repeats forever.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<HttpReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new<I: IntoIterator<Item = HttpReply>>(replies: I) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, method: &'static str, url: &str, headers: &[Header<'_>], body: Option<&Value>) {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        });
    }

    fn next_reply(&self) -> HttpReply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies
                .front()
                .cloned()
                .unwrap_or_else(|| HttpReply::new(404, ""))
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, headers: &[Header<'_>]) -> Result<HttpReply, TransportError> {
        self.record("GET", url, headers, None);
        Ok(self.next_reply())
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[Header<'_>],
        body: &Value,
    ) -> Result<HttpReply, TransportError> {
        self.record("POST", url, headers, Some(body));
        Ok(self.next_reply())
    }
}

pub fn json_reply(status: u16, body: Value) -> HttpReply {
    HttpReply::new(status, body.to_string())
}
