// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod convert_cmd;
mod locate_cmd;

use clap::Parser;

pub(super) use self::{convert_cmd::ConvertCommand, locate_cmd::LocateCommand};

/// Packs files into CARv1 archives for Filecoin deals
#[derive(Parser)]
#[command(name = "fcp-car", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Subcommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Convert a file into a CAR and print `<root> <size>`
    Convert(ConvertCommand),
    /// Find the offset of every raw block inside a CAR
    Locate(LocateCommand),
}

impl Subcommand {
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Convert(cmd) => cmd.run().await,
            Self::Locate(cmd) => cmd.run().await,
        }
    }
}
