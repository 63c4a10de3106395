// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Conversion Orchestrator
//!
//! Turns a directory of raw captures into enriched flow files:
//!
//! * **Collect**: classify one directory level into Zeek log sets, packet
//!   captures and subdirectories.
//! * **Convert**: hand each input to the external [`Converter`], which writes
//!   flow files into the output directory.
//! * **Enrich**: run the [`FlowEnricher`] over the flow files this level
//!   wrote or rewrote. Files left by earlier levels in a shared output
//!   directory are not touched again.
//!
//! [`Orchestrator::process_tree`] repeats this for every directory below the
//! root, breadth-first.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;

use anyhow::Context;
use async_trait::async_trait;
use bayse_common::config::{API_KEY_ENV, ApiKey, Config};
use bayse_common::utils::timing::Stopwatch;
use bayse_common::{debug, error, info, success};
use thiserror::Error;
use tokio::process::Command;

use crate::enrich::{self, EnrichSummary, FlowEnricher};

const CONN_LOG_SUFFIX: &str = "conn.log";
const DNS_LOG_SUFFIX: &str = "dns.log";
const PCAP_EXTENSIONS: [&str; 3] = ["cap", "pcap", "pcapng"];

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not start converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("converter exited with {code} on {input}: {stderr}")]
    Failed {
        input: String,
        code: String,
        stderr: String,
    },
}

/// Settings shared by every conversion in one run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output_dir: PathBuf,
    pub labeling_path: PathBuf,
    pub api_key: ApiKey,
    pub share_stats: bool,
}

#[async_trait]
pub trait Converter: Send + Sync {
    /// Converts a Zeek connection log, optionally joined with its DNS log.
    async fn convert_zeek(
        &self,
        conn_log: &Path,
        dns_log: Option<&Path>,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError>;

    async fn convert_pcap(&self, pcap: &Path, options: &ConvertOptions) -> Result<(), ConvertError>;
}

/// Runs the external converter program once per input.
pub struct CommandConverter {
    program: PathBuf,
}

impl CommandConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `<kind> <input> [--dns <file>] --output <dir> --labeling-path <dir> [--no-share]`
    ///
    /// The API key never appears here; see [`CommandConverter::command`].
    pub fn arguments(
        kind: &str,
        input: &Path,
        dns_log: Option<&Path>,
        options: &ConvertOptions,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![kind.into(), input.into()];
        if let Some(dns) = dns_log {
            args.push("--dns".into());
            args.push(dns.into());
        }
        args.push("--output".into());
        args.push(options.output_dir.as_os_str().into());
        args.push("--labeling-path".into());
        args.push(options.labeling_path.as_os_str().into());
        if !options.share_stats {
            args.push("--no-share".into());
        }
        args
    }

    /// The converter invocation. A configured API key is set in the child's
    /// environment as `BAYSE_API_KEY`.
    pub fn command(&self, args: Vec<OsString>, options: &ConvertOptions) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null());
        if !options.api_key.is_empty() {
            command.env(API_KEY_ENV, options.api_key.expose());
        }
        command
    }

    async fn run(
        &self,
        input: &Path,
        args: Vec<OsString>,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError> {
        let program = self.program.display().to_string();
        debug!("Running {program} on {}", input.display());

        let output = self
            .command(args, options)
            .output()
            .await
            .map_err(|source| ConvertError::Spawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(ConvertError::Failed {
            input: input.display().to_string(),
            code: output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| format!("status {c}")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[async_trait]
impl Converter for CommandConverter {
    async fn convert_zeek(
        &self,
        conn_log: &Path,
        dns_log: Option<&Path>,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError> {
        let args = Self::arguments("zeek", conn_log, dns_log, options);
        self.run(conn_log, args, options).await
    }

    async fn convert_pcap(&self, pcap: &Path, options: &ConvertOptions) -> Result<(), ConvertError> {
        let args = Self::arguments("pcap", pcap, None, options);
        self.run(pcap, args, options).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeekInput {
    pub conn_log: PathBuf,
    pub dns_log: Option<PathBuf>,
}

/// Everything convertible found at one directory level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    pub zeek: Vec<ZeekInput>,
    pub pcaps: Vec<PathBuf>,
    pub subdirs: Vec<PathBuf>,
}

#[derive(Default)]
struct ZeekPair {
    conn: Option<PathBuf>,
    dns: Option<PathBuf>,
}

/// Classifies the entries of `directory` (not recursive).
///
/// Zeek logs pair up by the file name with `conn.log` / `dns.log` cut off,
/// so `day1.conn.log` and `day1.dns.log` belong together.
pub fn collect_inputs(directory: &Path) -> io::Result<InputSet> {
    let mut set = InputSet::default();
    let mut pairs: BTreeMap<String, ZeekPair> = BTreeMap::new();

    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();

        if path.is_dir() {
            set.subdirs.push(path);
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(stem) = name.strip_suffix(CONN_LOG_SUFFIX) {
            pairs.entry(stem.to_string()).or_default().conn = Some(path);
        } else if let Some(stem) = name.strip_suffix(DNS_LOG_SUFFIX) {
            pairs.entry(stem.to_string()).or_default().dns = Some(path);
        } else if is_packet_capture(&path) {
            set.pcaps.push(path);
        }
    }

    for (stem, pair) in pairs {
        match pair {
            ZeekPair {
                conn: Some(conn_log),
                dns: dns_log,
            } => set.zeek.push(ZeekInput { conn_log, dns_log }),
            ZeekPair {
                conn: None,
                dns: Some(dns),
            } => debug!("Ignoring {} without a matching {stem}{CONN_LOG_SUFFIX}", dns.display()),
            _ => {}
        }
    }

    set.pcaps.sort();
    set.subdirs.sort();
    Ok(set)
}

fn is_packet_capture(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PCAP_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
}

/// Result of processing one directory level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelReport {
    pub directory: PathBuf,
    pub converted: usize,
    pub failed: usize,
    pub enrichment: EnrichSummary,
    /// Subdirectories still to be processed.
    pub subdirs: Vec<PathBuf>,
}

pub struct Orchestrator {
    converter: Box<dyn Converter>,
    enricher: FlowEnricher,
    labeling_path: PathBuf,
    api_key: ApiKey,
}

impl Orchestrator {
    pub fn new(converter: Box<dyn Converter>, enricher: FlowEnricher, cfg: &Config) -> Self {
        Self {
            converter,
            enricher,
            labeling_path: cfg.labeling_path.clone(),
            api_key: cfg.api_key.clone(),
        }
    }

    /// Converts and enriches everything directly inside `directory`.
    ///
    /// Conversion failures are logged per input. Errors are returned only
    /// when the directory cannot be listed or the output directory cannot be
    /// used.
    pub async fn process_directory(
        &self,
        directory: &Path,
        output_dir: &Path,
        timing: bool,
        share_stats: bool,
    ) -> anyhow::Result<LevelReport> {
        let inputs = collect_inputs(directory)
            .with_context(|| format!("failed to list {}", directory.display()))?;
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        info!(
            "About to process {} PCAPs and {} Zeek logs found in {}",
            inputs.pcaps.len(),
            inputs.zeek.len(),
            directory.display()
        );

        let options = ConvertOptions {
            output_dir: output_dir.to_path_buf(),
            labeling_path: self.labeling_path.clone(),
            api_key: self.api_key.clone(),
            share_stats,
        };
        let mut report = LevelReport {
            directory: directory.to_path_buf(),
            ..LevelReport::default()
        };
        let existing = flow_file_stamps(output_dir)?;

        for zeek in &inputs.zeek {
            info!("Converting {}", zeek.conn_log.display());
            let watch = Stopwatch::start(timing);
            let result = self
                .converter
                .convert_zeek(&zeek.conn_log, zeek.dns_log.as_deref(), &options)
                .await;
            record(&mut report, &zeek.conn_log, result, watch);
        }

        for pcap in &inputs.pcaps {
            info!("Converting {}", pcap.display());
            let watch = Stopwatch::start(timing);
            let result = self.converter.convert_pcap(pcap, &options).await;
            record(&mut report, pcap, result, watch);
        }

        let mut produced: Vec<PathBuf> = flow_file_stamps(output_dir)?
            .into_iter()
            .filter(|(path, stamp)| existing.get(path) != Some(stamp))
            .map(|(path, _)| path)
            .collect();
        produced.sort();
        debug!(
            "{} flow files written by this level in {}",
            produced.len(),
            output_dir.display()
        );

        let watch = Stopwatch::start(timing);
        report.enrichment = self.enricher.enrich_files(&produced).await;
        if let Some(elapsed) = watch.elapsed() {
            info!("Enrichment took {:.3}s", elapsed.as_secs_f64());
        }

        report.subdirs = inputs.subdirs;
        Ok(report)
    }

    /// Processes `root` and every directory below it, breadth-first.
    ///
    /// A subdirectory that cannot be processed is logged and skipped; only a
    /// failure on `root` itself is returned.
    pub async fn process_tree(
        &self,
        root: &Path,
        output_dir: &Path,
        timing: bool,
        share_stats: bool,
    ) -> anyhow::Result<Vec<LevelReport>> {
        let first = self
            .process_directory(root, output_dir, timing, share_stats)
            .await?;
        let mut pending: VecDeque<PathBuf> = first.subdirs.iter().cloned().collect();
        let mut reports = vec![first];

        while let Some(directory) = pending.pop_front() {
            match self
                .process_directory(&directory, output_dir, timing, share_stats)
                .await
            {
                Ok(report) => {
                    pending.extend(report.subdirs.iter().cloned());
                    reports.push(report);
                }
                Err(e) => error!("Skipping {}: {e:#}", directory.display()),
            }
        }

        let converted: usize = reports.iter().map(|r| r.converted).sum();
        success!("Processed {} directories, converted {converted} inputs", reports.len());
        Ok(reports)
    }
}

/// Flow files in `output_dir` with their modification times, so a level can
/// tell which files it wrote from the ones left by earlier levels.
fn flow_file_stamps(output_dir: &Path) -> anyhow::Result<HashMap<PathBuf, Option<SystemTime>>> {
    Ok(enrich::flow_files_in(output_dir)?
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
            (path, modified)
        })
        .collect())
}

fn record(
    report: &mut LevelReport,
    input: &Path,
    result: Result<(), ConvertError>,
    watch: Stopwatch,
) {
    match result {
        Ok(()) => {
            report.converted += 1;
            if let Some(elapsed) = watch.elapsed() {
                info!("Converted {} in {:.3}s", input.display(), elapsed.as_secs_f64());
            }
        }
        Err(e) => {
            report.failed += 1;
            error!("Failed to convert {}: {e}", input.display());
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
