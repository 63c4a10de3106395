// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.bayse.io";
pub const DEFAULT_CONVERTER: &str = "bayse-convert";
pub const DEFAULT_LABELING_PATH: &str = "labeling/";
pub const CACHE_DIRNAME: &str = "bayse_kb";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Environment variable carrying the API key, read by the CLI and handed to
/// the converter process.
pub const API_KEY_ENV: &str = "BAYSE_API_KEY";

/// The key sent as `X-API-KEY` with every authenticated request.
///
/// Wrapped so that it never ends up in logs through a stray `{:?}`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

/// Runtime configuration handed to every client.
///
/// Nothing in the library reads process-global state; the CLI builds one of
/// these from its arguments and passes it down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the knowledge-base and interpretation APIs.
    pub api_key: ApiKey,

    /// Base URL of the remote service, without a trailing slash.
    pub endpoint: String,

    /// Directory holding one cache file per destination.
    pub cache_dir: PathBuf,

    /// Delay between two interpretation status checks.
    pub poll_interval: Duration,

    /// Upper bound on status checks after the initial one.
    ///
    /// `None` keeps polling until the service reports a terminal status.
    pub max_polls: Option<u32>,

    /// External program performing the capture/log to flow conversion.
    pub converter: PathBuf,

    /// Directory with the labeling assets the converter needs.
    pub labeling_path: PathBuf,

    /// Hides the startup banner.
    pub no_banner: bool,

    /// Controls the visual density of the terminal output.
    ///
    /// * **0** (Default): Headers, trees and separators.
    /// * **1**: Reduced styling, plain log lines.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: ApiKey::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache_dir: default_cache_dir(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            converter: PathBuf::from(DEFAULT_CONVERTER),
            labeling_path: PathBuf::from(DEFAULT_LABELING_PATH),
            no_banner: false,
            quiet: 0,
        }
    }
}

impl Config {
    /// Knowledge-base lookup endpoint.
    pub fn kb_url(&self) -> String {
        format!("{}/destinations", self.base())
    }

    /// Root of the interpretation endpoints (`/request`, `/status`).
    pub fn interpret_url(&self) -> String {
        format!("{}/site/interpret", self.base())
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

/// `<platform temp dir>/bayse_kb`, e.g. `/tmp/bayse_kb` on Linux.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(CACHE_DIRNAME)
}
