// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Bayse CLI Entry Point
//!
//! Bootstraps the runtime and owns the process lifecycle.
//!
//! ## Responsibilities
//!
//! 1.  **Runtime Initialization**: `#[tokio::main]` sets up the async runtime the
//!     HTTP clients and the converter subprocesses run on.
//! 2.  **Global State Setup**: installs the `tracing` subscriber and the
//!     terminal printer (verbosity, quiet mode, banner).
//! 3.  **Configuration Mapping**: turns parsed flags into the `Config` handed
//!     to the core clients.
//! 4.  **Command Dispatch**: routes to the mode selected on the command line.
//! 5.  **Error Boundary**: any error bubbling up from a command is logged here
//!     and mapped to a non-zero `ExitCode`.

mod commands;
mod terminal;

use std::process::ExitCode;

use bayse_common::{config::Config, error};
use clap::CommandFactory;

use crate::{
    commands::{CommandLine, Mode, e2e, interpret},
    terminal::{print::Print, spinner},
};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();
    spinner::init_logging(commands.verbosity);

    let cfg = Config::from(&commands);
    let _ = Print::init(&cfg);

    let mode = commands.mode();
    if mode == Mode::Help {
        let _ = CommandLine::command().print_help();
        return ExitCode::FAILURE;
    }

    Print::banner();

    let result = match mode {
        Mode::EndToEnd(root) => {
            let output_dir = commands.output_directory();
            e2e::e2e(root, &output_dir, commands.timing, !commands.noupload, &cfg).await
        }
        Mode::FetchResult(link) => interpret::show_result(link, &cfg).await,
        Mode::Interpret(target) => {
            interpret::interpret(target, commands.screenshot, commands.details, &cfg).await
        }
        Mode::Help => Ok(()),
    };

    let exit_code = match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Critical failure: {e:#}");
            ExitCode::FAILURE
        }
    };

    Print::end_of_program();

    exit_code
}
