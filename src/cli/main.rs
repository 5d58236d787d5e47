// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;

use super::logger;
use super::subcommands::Cli;
use crate::error::Error;

/// Conversion or I/O failure.
const EXIT_FAILURE: u8 = 3;
/// The locator could not find a block of the raw file.
const EXIT_BLOCK_NOT_FOUND: u8 = 4;

pub fn main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> ExitCode
where
    ArgT: Into<OsString> + Clone,
{
    // Exits with status 2 on bad arguments
    let Cli { cmd } = Cli::parse_from(args);
    logger::setup_minimal_logger();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    match runtime.block_on(cmd.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<Error>() {
        Some(Error::BlockNotFound { .. }) => EXIT_BLOCK_NOT_FOUND,
        _ => EXIT_FAILURE,
    }
}
