// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Command Line Interface Definitions
//!
//! The flags, their help text and defaults live here; the work behind each
//! mode lives in the submodules.
//!
//! The interface is flat rather than subcommand based. Which mode runs is
//! decided by [`CommandLine::mode`]:
//!
//! 1.  `--e2e <dir>` converts and enriches a whole directory tree.
//! 2.  `--url <link>` renders an existing interpretation result.
//! 3.  `--interpret <url>` submits a URL, waits for it and renders the result.
//!
//! With none of them present the help text is printed and the process exits
//! with status 1.
//!
//! [`Config`] is built from the parsed flags via `From<&CommandLine>`, so the
//! core libraries never see `clap` types.

pub mod e2e;
pub mod interpret;

use std::path::{Path, PathBuf};
use std::time::Duration;

use bayse_common::config::{
    ApiKey, Config, DEFAULT_CONVERTER, DEFAULT_ENDPOINT, DEFAULT_LABELING_PATH, default_cache_dir,
};
use clap::{ArgAction, Parser};

const OUTPUT_DIRNAME: &str = "bayseflows";

#[derive(Parser, Debug)]
#[command(name = "bayse", version)]
#[command(about = "Convert captures into enriched flow files and interpret URLs.")]
pub struct CommandLine {
    /// Convert, label and enrich every capture below this directory
    #[arg(long, value_name = "DIR")]
    pub e2e: Option<PathBuf>,

    /// Where flow files are written [default: <temp dir>/bayseflows]
    #[arg(long = "outputdirectory", value_name = "DIR")]
    pub output_directory: Option<PathBuf>,

    /// Report how long each conversion and enrichment step took
    #[arg(short = 't', long)]
    pub timing: bool,

    /// Keep conversion statistics local instead of sharing them
    #[arg(long)]
    pub noupload: bool,

    /// A URL or destination to interpret
    #[arg(long, value_name = "URL")]
    pub interpret: Option<String>,

    /// Capture a screenshot of the interpreted URL
    #[arg(short = 's', long)]
    pub screenshot: bool,

    /// Include every destination contacted while visiting the URL
    #[arg(short = 'd', long)]
    pub details: bool,

    /// Link to an existing interpretation result; other modes are ignored
    #[arg(long, value_name = "RESULT_URL")]
    pub url: Option<String>,

    /// API key sent with every request
    #[arg(long = "api-key", env = "BAYSE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the remote service
    #[arg(long, env = "BAYSE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// External program used to convert captures into flow files
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_CONVERTER)]
    pub converter: PathBuf,

    /// Labeling assets handed to the converter
    #[arg(long = "labeling-path", value_name = "DIR", default_value = DEFAULT_LABELING_PATH)]
    pub labeling_path: PathBuf,

    /// Directory of the destination knowledge cache [default: <temp dir>/bayse_kb]
    #[arg(long = "cache-dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Give up after this many status checks (default: wait indefinitely)
    #[arg(long = "max-polls", value_name = "N")]
    pub max_polls: Option<u32>,

    /// Seconds between two status checks
    #[arg(long = "poll-interval", value_name = "SECS", default_value_t = 10)]
    pub poll_interval: u64,

    /// Keep logs and colors but hide the ASCII art
    #[arg(long = "no-banner")]
    pub no_banner: bool,

    /// Reduce UI visual density
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Increase logging detail (-v: debug logs)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,
}

/// What the process was asked to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Mode<'a> {
    EndToEnd(&'a Path),
    FetchResult(&'a str),
    Interpret(&'a str),
    Help,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn mode(&self) -> Mode<'_> {
        if let Some(dir) = &self.e2e {
            Mode::EndToEnd(dir)
        } else if let Some(link) = &self.url {
            Mode::FetchResult(link)
        } else if let Some(target) = &self.interpret {
            Mode::Interpret(target)
        } else {
            Mode::Help
        }
    }

    pub fn output_directory(&self) -> PathBuf {
        self.output_directory
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(OUTPUT_DIRNAME))
    }
}

impl From<&CommandLine> for Config {
    fn from(cmd: &CommandLine) -> Self {
        Self {
            api_key: ApiKey::new(cmd.api_key.clone().unwrap_or_default()),
            endpoint: cmd.endpoint.clone(),
            cache_dir: cmd.cache_dir.clone().unwrap_or_else(default_cache_dir),
            poll_interval: Duration::from_secs(cmd.poll_interval),
            max_polls: cmd.max_polls,
            converter: cmd.converter.clone(),
            labeling_path: cmd.labeling_path.clone(),
            no_banner: cmd.no_banner,
            quiet: cmd.quiet,
        }
    }
}
