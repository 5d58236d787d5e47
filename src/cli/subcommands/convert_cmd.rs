// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::{ConvertConfig, PackageType};
use crate::convert::file_convert_to_car;

#[derive(Debug, Args)]
pub struct ConvertCommand {
    /// File to convert
    #[arg(short, long)]
    pub input: PathBuf,
    /// Destination CAR, created or truncated
    #[arg(short, long)]
    pub output: PathBuf,
    /// TOML file with conversion settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Fail before writing if the CAR does not fit a package of this type
    #[arg(long)]
    pub package: Option<PackageType>,
}

impl ConvertCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            input,
            output,
            config,
            package,
        } = self;
        let mut config = match &config {
            Some(path) => ConvertConfig::load(path)?,
            None => ConvertConfig::default(),
        };
        if let Some(package) = package {
            config = config.with_package(package);
        }

        let cancel = CancellationToken::new();
        let mut job = tokio::task::spawn_blocking({
            let cancel = cancel.clone();
            let input = input.clone();
            move || file_convert_to_car(&input, &output, &config, &cancel)
        });
        let result = tokio::select! {
            result = &mut job => result?,
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling conversion");
                cancel.cancel();
                job.await?
            }
        };
        let summary = result.with_context(|| format!("converting {}", input.display()))?;
        println!("{} {}", summary.root, summary.car_size);
        Ok(())
    }
}
