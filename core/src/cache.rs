// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Destination Cache Store
//!
//! A directory with one JSON file per destination, each holding the knowledge
//! payload plus a `last_saved` epoch timestamp.
//!
//! The file name only depends on the destination string. Lookups for the same
//! host on different ports or protocols therefore share one entry; callers
//! that need a finer key must layer it on top.
//!
//! Nothing in here is allowed to fail loudly: a missing, unreadable or corrupt
//! file is a cache miss, and a failed write only costs a future remote call.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use bayse_common::models::knowledge::KnowledgePayload;
use bayse_common::{debug, warn};
use serde_json::Value;

/// Entries older than this are refreshed before use.
pub const CACHE_TTL_SECS: f64 = 86_400.0;

const LAST_SAVED: &str = "last_saved";
const CACHE_FILE_EXTENSION: &str = "json";

/// A cached payload and the moment it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: KnowledgePayload,
    /// Epoch seconds; `None` when the file carried no usable timestamp.
    pub last_saved: Option<f64>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: f64) -> bool {
        self.last_saved.is_some_and(|saved| now - saved < CACHE_TTL_SECS)
    }
}

/// Current time as fractional epoch seconds.
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the cache file for `destination`.
    ///
    /// Path separators are replaced so the file always stays inside the
    /// cache directory.
    pub fn filename_for(&self, destination: &str) -> PathBuf {
        let name: String = destination
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{name}.{CACHE_FILE_EXTENSION}"))
    }

    pub fn load(&self, destination: &str) -> Option<CacheEntry> {
        let path = self.filename_for(destination);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("Could not read cache entry {}: {e}", path.display());
                return None;
            }
        };

        let mut payload: KnowledgePayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Ignoring corrupt cache entry {}: {e}", path.display());
                return None;
            }
        };

        let last_saved = payload.remove(LAST_SAVED).as_ref().and_then(Value::as_f64);
        Some(CacheEntry {
            payload,
            last_saved,
        })
    }

    /// Stamps `payload` with the current time and writes it.
    pub fn save(&self, destination: &str, payload: &KnowledgePayload) -> CacheEntry {
        self.save_at(destination, payload, epoch_seconds())
    }

    /// Same as [`save`](Self::save) with an explicit timestamp.
    pub fn save_at(&self, destination: &str, payload: &KnowledgePayload, last_saved: f64) -> CacheEntry {
        let mut stamped = payload.clone();
        stamped.insert(LAST_SAVED, Value::from(last_saved));

        if let Err(e) = self.write(destination, &stamped) {
            warn!("Failed to save knowledge for {destination} to the cache: {e}");
        }

        let mut payload = payload.clone();
        payload.remove(LAST_SAVED);
        CacheEntry {
            payload,
            last_saved: Some(last_saved),
        }
    }

    fn write(&self, destination: &str, stamped: &KnowledgePayload) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec(stamped)?;
        fs::write(self.filename_for(destination), bytes)?;
        Ok(())
    }

    /// Removes the entry for `destination`. Returns `true` if a file was deleted.
    pub fn delete(&self, destination: &str) -> bool {
        let path = self.filename_for(destination);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                debug!("Could not remove cache entry {}: {e}", path.display());
                false
            }
        }
    }
}
