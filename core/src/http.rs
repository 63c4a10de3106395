// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # HTTP Transport
//!
//! Every remote call made by the clients goes through the [`Transport`] trait.
//! The production implementation wraps a `reqwest::Client`; tests plug in a
//! scripted implementation to count calls and replay canned replies.
//!
//! A transport only fails on the *network* level. Non-success status codes are
//! returned as regular [`HttpReply`] values because every caller treats them
//! as "no data" rather than as an error.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid header value for '{0}'")]
    InvalidHeader(String),
}

/// Status code and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only a plain `200 OK` counts as a usable reply.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

pub type Header<'a> = (&'a str, &'a str);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[Header<'_>]) -> Result<HttpReply, TransportError>;

    async fn post_json(
        &self,
        url: &str,
        headers: &[Header<'_>],
        body: &Value,
    ) -> Result<HttpReply, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bayse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Setup)?;
        Ok(Self { client })
    }

    fn request(
        &self,
        builder: reqwest::RequestBuilder,
        headers: &[Header<'_>],
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut builder = builder;
        for (name, value) in headers {
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
            builder = builder.header(*name, value);
        }
        Ok(builder)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpReply, TransportError> {
        let wrap = |source| TransportError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(wrap)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(wrap)?;
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &[Header<'_>]) -> Result<HttpReply, TransportError> {
        let request = self.request(self.client.get(url), headers)?;
        self.send(url, request).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[Header<'_>],
        body: &Value,
    ) -> Result<HttpReply, TransportError> {
        let request = self
            .request(self.client.post(url), headers)?
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body);
        self.send(url, request).await
    }
}
