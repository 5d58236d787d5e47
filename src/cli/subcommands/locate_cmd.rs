// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use clap::Args;

use crate::locate::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_SIZE, locate_files};

#[derive(Debug, Args)]
pub struct LocateCommand {
    /// Raw file the CAR was built from
    #[arg(short, long)]
    pub raw: PathBuf,
    /// CAR file to search
    #[arg(short, long)]
    pub car: PathBuf,
    /// Size of the raw blocks, must divide the raw file size
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u64,
    /// Bytes taken from the start of each block as its fingerprint
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    pub sample_size: usize,
}

impl LocateCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            raw,
            car,
            block_size,
            sample_size,
        } = self;
        let locations = tokio::task::spawn_blocking(move || {
            locate_files(&raw, &car, block_size, sample_size)
        })
        .await??;
        for location in locations {
            println!("Block {} Location {}", location.index, location.offset);
        }
        Ok(())
    }
}
