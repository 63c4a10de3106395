// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

mod pipeline;

pub mod utils {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bayse_core::http::{Header, HttpReply, Transport, TransportError};
    use serde_json::Value;

    /// Answers requests by URL substring; every route replays its replies in
    /// order and repeats the last one. Unrouted URLs get a 404.
    #[derive(Default)]
    pub struct RoutedTransport {
        routes: Mutex<Vec<Route>>,
        log: Mutex<Vec<String>>,
    }

    struct Route {
        pattern: String,
        replies: Vec<HttpReply>,
        served: usize,
    }

    impl RoutedTransport {
        pub fn route(self, pattern: &str, replies: Vec<HttpReply>) -> Self {
            self.routes.lock().unwrap().push(Route {
                pattern: pattern.to_string(),
                replies,
                served: 0,
            });
            self
        }

        /// Every requested URL, in order.
        pub fn requests(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        pub fn hits(&self, pattern: &str) -> usize {
            self.requests().iter().filter(|u| u.contains(pattern)).count()
        }

        fn answer(&self, url: &str) -> HttpReply {
            self.log.lock().unwrap().push(url.to_string());
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| url.contains(&r.pattern)) {
                Some(route) if !route.replies.is_empty() => {
                    let idx = route.served.min(route.replies.len() - 1);
                    route.served += 1;
                    route.replies[idx].clone()
                }
                _ => HttpReply::new(404, "not found"),
            }
        }
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn get(&self, url: &str, _headers: &[Header<'_>]) -> Result<HttpReply, TransportError> {
            Ok(self.answer(url))
        }

        async fn post_json(
            &self,
            url: &str,
            _headers: &[Header<'_>],
            _body: &Value,
        ) -> Result<HttpReply, TransportError> {
            Ok(self.answer(url))
        }
    }

    pub fn json_reply(status: u16, body: Value) -> HttpReply {
        HttpReply::new(status, body.to_string())
    }

    /// A converter-style flow record.
    pub fn flow(dst: &str, name_source: &str, protocol: &str) -> Value {
        serde_json::json!({
            "src": "192.168.1.20:51000",
            "dst": dst,
            "destinationNameSource": name_source,
            "srcPkts": 4, "srcBytes": 400, "dstPkts": 6, "dstBytes": 3000,
            "relativeStart": 0.5,
            "protocolInformation": protocol,
            "identifier": format!("{dst}/{protocol}"),
            "duration": 0.75,
            "label": null
        })
    }

    pub fn flow_file(name: &str, flows: Vec<Value>) -> Value {
        serde_json::json!({
            "hash": format!("hash-{name}"),
            "trafficDate": "2026-10-01",
            "fileName": name,
            "BayseFlows": flows
        })
    }
}
