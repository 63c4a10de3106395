// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bayse_common::{config::Config, error, success};
use bayse_core::convert::{CommandConverter, LevelReport, Orchestrator};
use bayse_core::enrich::FlowEnricher;
use bayse_core::http::HttpTransport;
use bayse_core::knowledge::KnowledgeClient;
use colored::*;

use crate::terminal::colors;
use crate::zprint;
use crate::terminal::print::{self, Print};

type Detail = (String, ColoredString);

pub async fn e2e(
    root: &Path,
    output_dir: &Path,
    timing: bool,
    share_stats: bool,
    cfg: &Config,
) -> anyhow::Result<()> {
    if !root.is_dir() {
        error!(
            "{} is not a directory. Please supply a directory for this argument!",
            root.display()
        );
        return Ok(());
    }

    Print::header("converting and enriching captures");

    let transport = Arc::new(HttpTransport::new()?);
    let enricher = FlowEnricher::new(KnowledgeClient::new(transport, cfg));
    let converter = CommandConverter::new(&cfg.converter);
    let orchestrator = Orchestrator::new(Box::new(converter), enricher, cfg);

    let start = Instant::now();
    let reports = orchestrator
        .process_tree(root, output_dir, timing, share_stats)
        .await?;

    print_reports(&reports);
    print_summary(&reports, output_dir, start.elapsed(), cfg);
    Ok(())
}

fn print_reports(reports: &[LevelReport]) {
    Print::header("directories");
    for (idx, report) in reports.iter().enumerate() {
        print::tree_head(idx, &report.directory.display().to_string());
        print::as_tree(report_details(report));
        if idx + 1 != reports.len() {
            zprint!();
        }
    }
}

fn report_details(report: &LevelReport) -> Vec<Detail> {
    let count = |n: usize| n.to_string().color(colors::NUMBER);
    let mut details: Vec<Detail> = vec![
        ("Converted".to_string(), count(report.converted)),
        ("Flow files".to_string(), count(report.enrichment.files)),
        ("Flows".to_string(), count(report.enrichment.flows)),
        ("Private".to_string(), count(report.enrichment.private_flows)),
        ("Lookups".to_string(), count(report.enrichment.lookups)),
    ];
    if report.failed > 0 {
        details.insert(1, ("Failed".to_string(), report.failed.to_string().red().bold()));
    }
    if report.enrichment.failed_files > 0 {
        details.push((
            "Skipped".to_string(),
            report.enrichment.failed_files.to_string().yellow(),
        ));
    }
    details
}

fn print_summary(reports: &[LevelReport], output_dir: &Path, elapsed: Duration, cfg: &Config) {
    let converted: usize = reports.iter().map(|r| r.converted).sum();
    let flows: usize = reports.iter().map(|r| r.enrichment.flows).sum();

    let converted = format!("{converted} inputs").bold().green();
    let flows = format!("{flows} flows").bold().green();
    let elapsed = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();
    let output = format!("Pipeline Complete: {converted} converted, {flows} enriched in {elapsed}")
        .color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::divider();
            print::centerln(&output.to_string());
        }
        _ => success!("{output}"),
    }
    print::aligned_line("Output", output_dir.display());
}
