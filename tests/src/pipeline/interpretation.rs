// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use bayse_common::config::{ApiKey, Config};
use bayse_common::models::interpret::ResultType;
use bayse_core::http::HttpReply;
use bayse_core::interpret::{InterpretClient, Rendered};
use serde_json::json;
use tempfile::TempDir;

use crate::utils::{json_reply, RoutedTransport};

fn client(transport: Arc<RoutedTransport>, max_polls: Option<u32>) -> InterpretClient {
    let cfg = Config {
        endpoint: "https://svc.test".to_string(),
        api_key: ApiKey::new("k3y"),
        poll_interval: Duration::ZERO,
        max_polls,
        ..Config::default()
    };
    InterpretClient::new(transport, &cfg)
}

#[tokio::test]
async fn test_submit_poll_and_render() {
    let out = TempDir::new().unwrap();
    let transport = Arc::new(
        RoutedTransport::default()
            .route("/site/interpret/request", vec![json_reply(200, json!({ "request_id": "req-7" }))])
            .route(
                "/site/interpret/status?request_id=req-7",
                vec![
                    json_reply(200, json!({ "status": "Queued" })),
                    json_reply(200, json!({ "status": "Processing" })),
                    json_reply(200, json!({ "status": "Complete", "download_link": "https://dl.test/req-7" })),
                ],
            )
            .route(
                "https://dl.test/req-7",
                vec![json_reply(
                    200,
                    json!({ "results": [
                        { "type": "interpretation", "message": "done", "interpretation": "Streaming video site" },
                        { "type": "knowledge", "knowledge": null },
                        { "type": "all_destination_details", "all_destination_details": [{ "dst": "cdn.test:443" }] }
                    ]}),
                )],
            ),
    );
    let interpret = client(transport.clone(), None);

    let id = interpret.submit("https://video.test", false, true).await.unwrap();
    let link = interpret.poll(&id).await.unwrap();
    let outcome = interpret.fetch_and_render(&link, out.path()).await;

    assert_eq!(link, "https://dl.test/req-7");
    assert_eq!(transport.hits("/status?"), 3);
    assert_eq!(outcome.stopped, None);

    let kinds: Vec<ResultType> = outcome
        .rendered
        .iter()
        .map(|r| match r {
            Rendered::Fields { kind, .. } => *kind,
            Rendered::Screenshot { .. } => ResultType::Screenshot,
        })
        .collect();
    assert_eq!(kinds, vec![ResultType::Interpretation, ResultType::AllDestinationDetails]);
}

#[tokio::test]
async fn test_forbidden_status_ends_without_result() {
    let transport = Arc::new(
        RoutedTransport::default()
            .route("/request", vec![json_reply(200, json!({ "request_id": "req-8" }))])
            .route("/status", vec![HttpReply::new(403, "Forbidden")]),
    );
    let interpret = client(transport.clone(), None);

    let id = interpret.submit("https://video.test", true, false).await.unwrap();
    assert!(interpret.poll(&id).await.is_none());
    assert_eq!(transport.hits("/status"), 1);
}

#[tokio::test]
async fn test_poll_cap_gives_up() {
    let transport = Arc::new(
        RoutedTransport::default().route("/status", vec![json_reply(200, json!({ "status": "Processing" }))]),
    );
    let interpret = client(transport.clone(), Some(2));

    assert!(interpret.poll("req-9").await.is_none());
    assert_eq!(transport.hits("/status"), 3);
}
