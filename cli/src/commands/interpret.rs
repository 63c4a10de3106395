// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bayse_common::{config::Config, error, info, success};
use bayse_core::http::HttpTransport;
use bayse_core::interpret::{InterpretClient, RenderOutcome, Rendered};
use colored::*;
use tracing::info_span;

use crate::terminal::spinner::SpinnerGuard;
use crate::terminal::{colors, format, print::{self, Print}};
use crate::zprint;

pub async fn interpret(
    target: &str,
    want_screenshot: bool,
    want_details: bool,
    cfg: &Config,
) -> anyhow::Result<()> {
    let client = client(cfg)?;

    info!("Sending {target} to be interpreted");
    let Some(request_id) = client.submit(target, want_screenshot, want_details).await else {
        return Ok(());
    };
    success!("Interpretation request {request_id} accepted");

    let link = {
        let _guard: SpinnerGuard = run_spinner(client.status_checks());
        client.poll(&request_id).await
    };

    match link {
        Some(link) => render(&client, &link).await,
        None => Ok(()),
    }
}

pub async fn show_result(link: &str, cfg: &Config) -> anyhow::Result<()> {
    info!("Ignoring all other args and interpreting passed in URL.");
    let client = client(cfg)?;
    render(&client, link).await
}

fn client(cfg: &Config) -> anyhow::Result<InterpretClient> {
    let transport = Arc::new(HttpTransport::new()?);
    Ok(InterpretClient::new(transport, cfg))
}

fn run_spinner(checks: Arc<AtomicU32>) -> SpinnerGuard {
    let span = info_span!("interpret", indicatif.pb_show = true);
    let _enter = span.enter();

    SpinnerGuard::with_status(span.clone(), move || {
        let count = checks.load(Ordering::Relaxed);
        let count_str = count.to_string().green().bold();
        let label = if count == 1 { "check" } else { "checks" };
        format!("Waiting for the interpretation, {count_str} status {label} so far...")
            .color(colors::TEXT_DEFAULT)
            .italic()
    })
}

async fn render(client: &InterpretClient, link: &str) -> anyhow::Result<()> {
    let out_dir = std::env::current_dir()?;
    let outcome = client.fetch_and_render(link, &out_dir).await;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &RenderOutcome) {
    if !outcome.rendered.is_empty() {
        Print::header("interpretation results");
    }

    for (idx, item) in outcome.rendered.iter().enumerate() {
        match item {
            Rendered::Fields { kind, fields } => {
                print::tree_head(idx, kind.as_str());
                print::as_tree(format::fields_to_details(fields));
            }
            Rendered::Screenshot { message, path } => {
                print::tree_head(idx, "screenshot");
                let mut details = Vec::new();
                if let Some(message) = message {
                    details.push(("message".to_string(), message.color(colors::STRING)));
                }
                details.push((
                    "saved to".to_string(),
                    path.display().to_string().color(colors::PATH),
                ));
                print::as_tree(details);
            }
        }
        if idx + 1 != outcome.rendered.len() {
            zprint!();
        }
    }

    if let Some(reason) = &outcome.stopped {
        error!("{reason}");
    }
}
