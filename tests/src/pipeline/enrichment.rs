// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bayse_common::config::Config;
use bayse_common::models::knowledge::KnowledgePayload;
use bayse_core::cache::CacheStore;
use bayse_core::convert::{ConvertError, ConvertOptions, Converter, Orchestrator};
use bayse_core::enrich::FlowEnricher;
use bayse_core::knowledge::KnowledgeClient;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::utils::{flow, flow_file, json_reply, RoutedTransport};

fn example_kb() -> Value {
    json!({ "body": {
        "destination_info": {
            "knowledge": { "example.com:443": { "category": "search" } },
            "statistics": { "example.com:443": { "seen": 9 } },
            "flow_summary": { "example.com:443": { "flows": 3 } }
        },
        "parent_info": {
            "knowledge": { "example.com": { "owner": "Example Inc." } }
        }
    }})
}

fn config(cache: &TempDir) -> Config {
    Config {
        endpoint: "https://kb.test".to_string(),
        cache_dir: cache.path().to_path_buf(),
        ..Config::default()
    }
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn cache_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_enrich_directory_end_to_end() {
    let cache = TempDir::new().unwrap();
    let flows = TempDir::new().unwrap();

    fs::write(
        flows.path().join("day1.bf"),
        flow_file(
            "day1.pcap",
            vec![
                flow("example.com:443", "dns", "TCP"),
                flow("192.168.1.1:53", "original", "UDP"),
                flow("1.1.1.1", "original", "ICMP"),
            ],
        )
        .to_string(),
    )
    .unwrap();
    fs::write(
        flows.path().join("day2.bf"),
        flow_file("day2.pcap", vec![flow("example.com:443", "dns", "TCP")]).to_string(),
    )
    .unwrap();

    let transport = Arc::new(
        RoutedTransport::default().route("name=example.com", vec![json_reply(200, example_kb())]),
    );
    let enricher = FlowEnricher::new(KnowledgeClient::new(transport.clone(), &config(&cache)));

    let summary = enricher.enrich_directory(flows.path()).await.unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.flows, 4);
    assert_eq!(summary.private_flows, 1);
    assert_eq!(transport.hits("name=example.com"), 1);
    assert_eq!(transport.hits("name=192.168.1.1"), 0);
    assert_eq!(cache_files(cache.path()), 0, "run-scoped cache entries must be purged");

    let day1 = read(&flows.path().join("day1.bf"));
    assert_eq!(day1["hash"], "hash-day1.pcap");
    let public = &day1["BayseFlows"][0];
    assert_eq!(
        public["destination_knowledge"],
        json!({ "destination_nameport": "example.com:443", "info": { "category": "search" } })
    );
    assert_eq!(
        public["destination_stats"],
        json!({ "destination_nameport": "example.com:443", "info": { "seen": 9 } })
    );
    assert_eq!(
        public["parent_knowledge"],
        json!({ "parent_nameport": "example.com", "info": { "owner": "Example Inc." } })
    );

    let private = &day1["BayseFlows"][1];
    for field in [
        "destination_knowledge",
        "destination_stats",
        "destination_flow_summary",
        "parent_knowledge",
    ] {
        assert_eq!(private[field], json!({}), "{field}");
    }

    let unknown = &day1["BayseFlows"][2];
    assert!(unknown["destination_knowledge"].is_null());
    assert!(unknown["parent_knowledge"].is_null());
}

#[tokio::test]
async fn test_fresh_cache_entry_is_used_then_purged() {
    let cache = TempDir::new().unwrap();
    let flows = TempDir::new().unwrap();

    let seeded = KnowledgePayload::from_value(json!({
        "destination_info": { "knowledge": { "cdn.example.net:443": { "category": "cdn" } } }
    }))
    .unwrap();
    CacheStore::new(cache.path()).save("cdn.example.net", &seeded);
    assert_eq!(cache_files(cache.path()), 1);

    fs::write(
        flows.path().join("c.bf"),
        flow_file("c.pcap", vec![flow("cdn.example.net:443", "dns", "TCP")]).to_string(),
    )
    .unwrap();

    let transport = Arc::new(RoutedTransport::default());
    let enricher = FlowEnricher::new(KnowledgeClient::new(transport.clone(), &config(&cache)));
    let summary = enricher.enrich_directory(flows.path()).await.unwrap();

    assert!(transport.requests().is_empty());
    assert_eq!(summary.purged_cache_entries, 1);
    assert_eq!(cache_files(cache.path()), 0);

    let out = read(&flows.path().join("c.bf"));
    assert_eq!(
        out["BayseFlows"][0]["destination_knowledge"]["info"],
        json!({ "category": "cdn" })
    );
    assert!(out["BayseFlows"][0]["destination_stats"].is_null());
}

/// Emits one flow file per input, pointing at `example.com`.
#[derive(Clone, Default)]
struct StubConverter {
    inputs: Arc<Mutex<Vec<String>>>,
}

impl StubConverter {
    fn emit(&self, input: &Path, options: &ConvertOptions) -> Result<(), ConvertError> {
        let name = input.file_name().unwrap().to_string_lossy().into_owned();
        self.inputs.lock().unwrap().push(name.clone());
        let doc = flow_file(&name, vec![flow("example.com:443", "dns", "TCP")]);
        fs::write(options.output_dir.join(format!("{name}.bf")), doc.to_string()).unwrap();
        Ok(())
    }
}

#[async_trait]
impl Converter for StubConverter {
    async fn convert_zeek(
        &self,
        conn_log: &Path,
        _dns_log: Option<&Path>,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError> {
        self.emit(conn_log, options)
    }

    async fn convert_pcap(&self, pcap: &Path, options: &ConvertOptions) -> Result<(), ConvertError> {
        self.emit(pcap, options)
    }
}

#[tokio::test]
async fn test_tree_is_converted_and_enriched() {
    let cache = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    fs::create_dir(input.path().join("site-b")).unwrap();
    fs::write(input.path().join("a.conn.log"), "").unwrap();
    fs::write(input.path().join("a.dns.log"), "").unwrap();
    fs::write(input.path().join("orphan.dns.log"), "").unwrap();
    fs::write(input.path().join("site-b").join("capture.PCAPNG"), "").unwrap();

    let transport = Arc::new(
        RoutedTransport::default().route("name=example.com", vec![json_reply(200, example_kb())]),
    );
    let cfg = config(&cache);
    let converter = StubConverter::default();
    let enricher = FlowEnricher::new(KnowledgeClient::new(transport.clone(), &cfg));
    let orchestrator = Orchestrator::new(Box::new(converter.clone()), enricher, &cfg);

    let out_dir = output.path().join("flows");
    let reports = orchestrator
        .process_tree(input.path(), &out_dir, true, false)
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].enrichment.files, 1);
    assert_eq!(transport.hits("name=example.com"), 2);
    assert_eq!(
        *converter.inputs.lock().unwrap(),
        vec!["a.conn.log".to_string(), "capture.PCAPNG".to_string()]
    );

    let enriched = read(&out_dir.join("capture.PCAPNG.bf"));
    assert_eq!(
        enriched["BayseFlows"][0]["destination_knowledge"]["destination_nameport"],
        "example.com:443"
    );
    assert_eq!(cache_files(cache.path()), 0);
}
