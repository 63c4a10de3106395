// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Destination Knowledge Client
//!
//! Answers "what does the knowledge base know about this destination?".
//!
//! A lookup either goes straight to the remote API or, when the caller asks
//! for it, through the on-disk [`CacheStore`]: a fresh entry is returned as
//! is, a stale or missing one is refreshed and re-stamped. Only well-formed
//! replies are ever written to the cache.

use std::sync::Arc;

use bayse_common::config::{ApiKey, Config};
use bayse_common::models::knowledge::KnowledgePayload;
use bayse_common::{debug, info, warn};
use reqwest::Url;
use serde_json::Value;

use crate::cache::{self, CacheStore};
use crate::http::{API_KEY_HEADER, HttpReply, Transport};

pub struct KnowledgeClient {
    transport: Arc<dyn Transport>,
    kb_url: String,
    api_key: ApiKey,
    cache: CacheStore,
}

impl KnowledgeClient {
    pub fn new(transport: Arc<dyn Transport>, cfg: &Config) -> Self {
        Self {
            transport,
            kb_url: cfg.kb_url(),
            api_key: cfg.api_key.clone(),
            cache: CacheStore::new(&cfg.cache_dir),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Knowledge for `destination`, or `None` if the service had nothing usable.
    ///
    /// With `use_cache`, a cache entry younger than one day short-circuits the
    /// remote call.
    pub async fn lookup(
        &self,
        destination: &str,
        protocol: &str,
        port: Option<u16>,
        use_cache: bool,
    ) -> Option<KnowledgePayload> {
        let url = match self.query_url(destination, protocol, port) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build knowledge query for {destination}: {e}");
                return None;
            }
        };

        if !use_cache {
            return self.fetch(&url).await;
        }

        if let Some(entry) = self.cache.load(destination)
            && entry.is_fresh(cache::epoch_seconds())
        {
            debug!("Using cached knowledge for {destination}");
            return Some(entry.payload);
        }

        info!(verbosity = 1, "No fresh knowledge cached for {destination}, querying");
        let Some(payload) = self.fetch(&url).await else {
            debug!("Knowledge for {destination} looks incomplete, not caching it");
            return None;
        };

        Some(self.cache.save(destination, &payload).payload)
    }

    /// `<kb>?name=..&protocol=..[&port=..]&getStatistics=true&getFlowSummary=true`
    pub fn query_url(
        &self,
        destination: &str,
        protocol: &str,
        port: Option<u16>,
    ) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.kb_url)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("name", destination);
            query.append_pair("protocol", protocol);
            if let Some(port) = port {
                query.append_pair("port", &port.to_string());
            }
            query.append_pair("getStatistics", "true");
            query.append_pair("getFlowSummary", "true");
        }
        Ok(url)
    }

    async fn fetch(&self, url: &Url) -> Option<KnowledgePayload> {
        let headers: Vec<(&str, &str)> = if self.api_key.is_empty() {
            Vec::new()
        } else {
            vec![(API_KEY_HEADER, self.api_key.expose())]
        };

        match self.transport.get(url.as_str(), &headers).await {
            Ok(reply) => payload_from_reply(&reply),
            Err(e) => {
                warn!("Knowledge lookup failed: {e}");
                None
            }
        }
    }
}

/// The single place deciding whether a knowledge reply is usable: status 200
/// and a non-empty JSON object under `body`.
pub fn payload_from_reply(reply: &HttpReply) -> Option<KnowledgePayload> {
    if !reply.is_ok() {
        debug!("Knowledge base answered with status {}", reply.status);
        return None;
    }

    let mut document: Value = reply.json().ok()?;
    let body = document.get_mut("body")?.take();
    KnowledgePayload::from_value(body).filter(|payload| !payload.is_empty())
}
