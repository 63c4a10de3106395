// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Flow Enrichment
//!
//! Infuses every flow of every `*.bf` file in a directory with what the
//! knowledge base knows about its destination.
//!
//! ## Lookup layers
//!
//! 1.  **Run memo**: an in-memory map owned by a single [`FlowEnricher::enrich_files`]
//!     call, keyed by `(host, protocol, port)`. A destination appearing in many
//!     flows costs one successful lookup per run; a lookup that came back
//!     empty is retried for the next flow.
//! 2.  **Disk cache**: the optional [`CacheStore`](crate::cache::CacheStore)
//!     behind the [`KnowledgeClient`]. Every destination touched through it is
//!     purged when the run ends, so results never leak into the next run.
//!
//! Private destinations carrying their original wire name are never looked
//! up; their enrichment fields are written as `{}`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bayse_common::models::flow::{Enrichment, FLOW_FILE_EXTENSION, FlowFile, FlowRecord};
use bayse_common::models::knowledge::{
    DESTINATION_INFO, FLOW_SUMMARY, KNOWLEDGE, KnowledgePayload, NamedInfo, PARENT_INFO,
    STATISTICS,
};
use bayse_common::utils::ip::{self, Destination};
use bayse_common::{debug, info, success, warn};
use serde_json::Value;

use crate::knowledge::KnowledgeClient;

/// Counters describing one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub files: usize,
    pub flows: usize,
    pub private_flows: usize,
    pub lookups: usize,
    pub purged_cache_entries: usize,
    pub failed_files: usize,
}

type LookupKey = (String, String, Option<u16>);

/// State that lives for exactly one `enrich_files` call.
#[derive(Default)]
struct RunState {
    memo: HashMap<LookupKey, KnowledgePayload>,
    cached_destinations: HashSet<String>,
    summary: EnrichSummary,
}

pub struct FlowEnricher {
    client: KnowledgeClient,
    use_disk_cache: bool,
}

impl FlowEnricher {
    pub fn new(client: KnowledgeClient) -> Self {
        Self {
            client,
            use_disk_cache: true,
        }
    }

    pub fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.use_disk_cache = enabled;
        self
    }

    pub fn client(&self) -> &KnowledgeClient {
        &self.client
    }

    /// Enriches every flow file in `directory` in place.
    ///
    /// A broken file is logged and skipped; only an unreadable directory
    /// fails the whole call.
    pub async fn enrich_directory(&self, directory: &Path) -> anyhow::Result<EnrichSummary> {
        info!("Adding knowledge for files in {}", directory.display());
        let files = flow_files_in(directory)?;
        Ok(self.enrich_files(&files).await)
    }

    /// Enriches exactly the given flow files in place, as one run.
    pub async fn enrich_files(&self, files: &[PathBuf]) -> EnrichSummary {
        let mut run = RunState::default();

        for path in files {
            match self.enrich_file(path, &mut run).await {
                Ok(()) => run.summary.files += 1,
                Err(e) => {
                    warn!("Skipping {}: {e:#}", path.display());
                    run.summary.failed_files += 1;
                }
            }
        }

        for destination in &run.cached_destinations {
            if self.client.cache().delete(destination) {
                run.summary.purged_cache_entries += 1;
            }
        }
        debug!(
            "Removed {} cache entries touched during this run",
            run.summary.purged_cache_entries
        );

        success!(
            "Enriched {} flows in {} files ({} private, {} lookups)",
            run.summary.flows,
            run.summary.files,
            run.summary.private_flows,
            run.summary.lookups
        );
        run.summary
    }

    async fn enrich_file(&self, path: &Path, run: &mut RunState) -> anyhow::Result<()> {
        let raw = fs::read_to_string(path).context("reading flow file")?;

        let document: Value = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw).context("parsing flow file")?
        };

        if document.is_null() || document.as_object().is_some_and(|o| o.is_empty()) {
            debug!("{} holds no flows, writing an empty document", path.display());
            fs::write(path, "{}").context("writing flow file")?;
            return Ok(());
        }

        let mut flow_file: FlowFile =
            serde_json::from_value(document).context("unexpected flow file layout")?;

        for flow in &mut flow_file.flows {
            self.enrich_flow(flow, run).await;
            run.summary.flows += 1;
        }

        let out = serde_json::to_string(&flow_file).context("serializing flow file")?;
        fs::write(path, out).context("writing flow file")?;
        Ok(())
    }

    async fn enrich_flow(&self, flow: &mut FlowRecord, run: &mut RunState) {
        let destination = match ip::parse_destination(&flow.dst, &flow.protocol_information) {
            Ok(destination) => destination,
            Err(e) => {
                warn!("Not enriching flow {}: {e}", flow.identifier);
                flow.clear_enrichment();
                return;
            }
        };

        if flow.is_original_name() && ip::is_private_host(&destination.host) {
            flow.mark_private();
            run.summary.private_flows += 1;
            return;
        }

        let payload = self
            .lookup(&destination, &flow.protocol_information, run)
            .await;
        apply_knowledge(flow, payload.as_ref());
    }

    async fn lookup(
        &self,
        destination: &Destination,
        protocol: &str,
        run: &mut RunState,
    ) -> Option<KnowledgePayload> {
        if self.use_disk_cache {
            run.cached_destinations.insert(destination.host.clone());
        }

        let key: LookupKey = (
            destination.host.clone(),
            protocol.to_string(),
            destination.port,
        );
        if let Some(known) = run.memo.get(&key) {
            return Some(known.clone());
        }

        run.summary.lookups += 1;
        let payload = self
            .client
            .lookup(
                &destination.host,
                protocol,
                destination.port,
                self.use_disk_cache,
            )
            .await;
        if let Some(known) = &payload {
            run.memo.insert(key, known.clone());
        }
        payload
    }
}

/// Fills the four enrichment fields from `payload`.
///
/// Each field is derived independently: a section missing from the payload
/// only nulls the field that needed it.
pub fn apply_knowledge(flow: &mut FlowRecord, payload: Option<&KnowledgePayload>) {
    let named = |section: &str, key: &str| {
        payload
            .and_then(|p| p.field(section, key))
            .map(NamedInfo::first_entry)
    };

    flow.destination_knowledge = named(DESTINATION_INFO, KNOWLEDGE).map(Enrichment::destination);
    flow.destination_stats = named(DESTINATION_INFO, STATISTICS).map(Enrichment::destination);
    flow.destination_flow_summary =
        named(DESTINATION_INFO, FLOW_SUMMARY).map(Enrichment::destination);
    flow.parent_knowledge = named(PARENT_INFO, KNOWLEDGE).map(Enrichment::parent);
}

/// Flow files directly inside `directory`, sorted by name.
pub fn flow_files_in(directory: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("reading directory {}", directory.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == FLOW_FILE_EXTENSION)
        })
        .collect();
    files.sort();
    Ok(files)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http::HttpReply;
    use crate::testing::{ScriptedTransport, json_reply};
    use bayse_common::config::Config;
    use serde_json::json;
    use tempfile::TempDir;

    fn flow(dst: &str, source: &str, protocol: &str) -> Value {
        json!({
            "src": "192.168.1.20:51000",
            "dst": dst,
            "destinationNameSource": source,
            "srcPkts": 3, "srcBytes": 300, "dstPkts": 4, "dstBytes": 4000,
            "relativeStart": 0.0,
            "protocolInformation": protocol,
            "identifier": "id-1",
            "duration": 0.5,
            "label": "unknown"
        })
    }

    fn flow_record(dst: &str, source: &str) -> FlowRecord {
        serde_json::from_value(flow(dst, source, "TCP")).unwrap()
    }

    fn write_flow_file(dir: &Path, name: &str, flows: Vec<Value>) -> PathBuf {
        let path = dir.join(name);
        let doc = json!({
            "hash": "abc123",
            "trafficDate": "1600000000.0",
            "fileName": "capture.pcap",
            "BayseFlows": flows
        });
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    fn enricher(transport: Arc<ScriptedTransport>, cache: &Path) -> FlowEnricher {
        let cfg = Config {
            cache_dir: cache.to_path_buf(),
            ..Config::default()
        };
        FlowEnricher::new(KnowledgeClient::new(transport, &cfg))
    }

    fn kb_reply() -> HttpReply {
        json_reply(
            200,
            json!({ "body": {
                "destination_info": {
                    "knowledge": { "example.com:443": { "category": "cdn" } },
                    "statistics": { "example.com:443": { "flows": 12 } },
                    "flow_summary": {}
                }
            }}),
        )
    }

    #[test]
    fn missing_sections_null_only_their_fields() {
        let payload = KnowledgePayload::from_value(json!({
            "destination_info": { "knowledge": { "a:1": { "k": 1 } }, "flow_summary": {} }
        }))
        .unwrap();
        let mut record = flow_record("a:1", "dns");

        apply_knowledge(&mut record, Some(&payload));

        assert_eq!(
            record.destination_knowledge,
            Some(Enrichment::Destination {
                destination_nameport: Some("a:1".to_string()),
                info: json!({ "k": 1 }),
            })
        );
        assert_eq!(record.destination_stats, None);
        assert_eq!(
            record.destination_flow_summary,
            Some(Enrichment::Destination {
                destination_nameport: None,
                info: json!({}),
            })
        );
        assert_eq!(record.parent_knowledge, None);
    }

    #[test]
    fn absent_payload_nulls_everything() {
        let mut record = flow_record("a:1", "dns");
        record.mark_private();
        apply_knowledge(&mut record, None);
        assert_eq!(record.destination_knowledge, None);
        assert_eq!(record.parent_knowledge, None);
    }

    #[tokio::test]
    async fn private_original_destinations_skip_lookup() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new([kb_reply()]));
        let path = write_flow_file(
            data.path(),
            "a.bf",
            vec![flow("10.0.0.5:443", "original", "TCP")],
        );

        let summary = enricher(transport.clone(), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 0);
        assert_eq!(summary.private_flows, 1);
        let out: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let record = &out["BayseFlows"][0];
        for key in [
            "destination_knowledge",
            "destination_stats",
            "destination_flow_summary",
            "parent_knowledge",
        ] {
            assert_eq!(record[key], json!({}));
        }
    }

    #[tokio::test]
    async fn private_address_with_resolved_name_is_looked_up() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new([kb_reply()]));
        write_flow_file(
            data.path(),
            "a.bf",
            vec![flow("10.0.0.5:443", "alias", "TCP")],
        );

        enricher(transport.clone(), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn repeated_destinations_are_looked_up_once_and_purged() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new([kb_reply()]));
        write_flow_file(
            data.path(),
            "a.bf",
            vec![
                flow("example.com:443", "dns", "TCP"),
                flow("example.com:443", "dns", "TCP"),
            ],
        );
        write_flow_file(
            data.path(),
            "b.bf",
            vec![flow("example.com:80", "dns", "TCP")],
        );

        let enricher = enricher(transport.clone(), cache.path());
        let summary = enricher.enrich_directory(data.path()).await.unwrap();

        // the :80 flow misses the memo but hits the shared disk entry
        assert_eq!(transport.call_count(), 1);
        assert_eq!(summary.lookups, 2);
        assert_eq!(summary.flows, 3);
        assert_eq!(summary.purged_cache_entries, 1);
        assert!(!enricher.client().cache().filename_for("example.com").exists());
    }

    #[tokio::test]
    async fn empty_flow_list_keeps_header_fields() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let path = write_flow_file(data.path(), "empty.bf", vec![]);

        enricher(Arc::new(ScriptedTransport::default()), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        let out: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(out["hash"], "abc123");
        assert_eq!(out["trafficDate"], "1600000000.0");
        assert_eq!(out["fileName"], "capture.pcap");
        assert_eq!(out["BayseFlows"], json!([]));
    }

    #[tokio::test]
    async fn empty_and_null_files_become_empty_documents() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(data.path().join("blank.bf"), "").unwrap();
        fs::write(data.path().join("null.bf"), "null").unwrap();

        let summary = enricher(Arc::new(ScriptedTransport::default()), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(fs::read_to_string(data.path().join("blank.bf")).unwrap(), "{}");
        assert_eq!(fs::read_to_string(data.path().join("null.bf")).unwrap(), "{}");
    }

    #[tokio::test]
    async fn other_files_and_broken_flow_files_are_left_alone() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(data.path().join("notes.txt"), "keep me").unwrap();
        fs::write(data.path().join("broken.bf"), "{ not json").unwrap();

        let summary = enricher(Arc::new(ScriptedTransport::default()), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert_eq!(summary.failed_files, 1);
        assert_eq!(fs::read_to_string(data.path().join("notes.txt")).unwrap(), "keep me");
        assert_eq!(
            fs::read_to_string(data.path().join("broken.bf")).unwrap(),
            "{ not json"
        );
    }

    #[tokio::test]
    async fn failed_lookup_writes_null_fields() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new([HttpReply::new(500, "")]));
        let path = write_flow_file(
            data.path(),
            "a.bf",
            vec![flow("8.8.8.8", "original", "ICMP")],
        );

        enricher(transport.clone(), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert!(transport.calls()[0].url.contains("name=8.8.8.8&protocol=ICMP&getStatistics"));
        let out: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(out["BayseFlows"][0]["destination_knowledge"], Value::Null);
        assert_eq!(out["BayseFlows"][0]["parent_knowledge"], Value::Null);
    }

    #[tokio::test]
    async fn empty_lookup_is_retried_for_the_next_flow() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new([HttpReply::new(503, ""), kb_reply()]));
        let path = write_flow_file(
            data.path(),
            "a.bf",
            vec![
                flow("example.com:443", "dns", "TCP"),
                flow("example.com:443", "dns", "TCP"),
            ],
        );

        let summary = enricher(transport.clone(), cache.path())
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(summary.lookups, 2);
        let out: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(out["BayseFlows"][0]["destination_knowledge"], Value::Null);
        assert_eq!(
            out["BayseFlows"][1]["destination_knowledge"],
            json!({ "destination_nameport": "example.com:443", "info": { "category": "cdn" } })
        );
    }

    #[tokio::test]
    async fn without_disk_cache_nothing_is_written_or_purged() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new([kb_reply()]));
        write_flow_file(
            data.path(),
            "a.bf",
            vec![
                flow("example.com:443", "dns", "TCP"),
                flow("example.com:443", "dns", "TCP"),
            ],
        );

        let summary = enricher(transport.clone(), cache.path())
            .with_disk_cache(false)
            .enrich_directory(data.path())
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(summary.lookups, 1);
        assert_eq!(summary.purged_cache_entries, 0);
        assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn only_listed_files_are_enriched() {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let picked = write_flow_file(
            data.path(),
            "picked.bf",
            vec![flow("example.com:443", "dns", "TCP")],
        );
        write_flow_file(
            data.path(),
            "other.bf",
            vec![flow("example.com:443", "dns", "TCP")],
        );
        let before = fs::read_to_string(data.path().join("other.bf")).unwrap();

        let summary = enricher(Arc::new(ScriptedTransport::new([kb_reply()])), cache.path())
            .enrich_files(&[picked])
            .await;

        assert_eq!(summary.files, 1);
        assert_eq!(fs::read_to_string(data.path().join("other.bf")).unwrap(), before);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let cache = TempDir::new().unwrap();
        let result = enricher(Arc::new(ScriptedTransport::default()), cache.path())
            .enrich_directory(Path::new("/definitely/not/here"))
            .await;
        assert!(result.is_err());
    }
}
