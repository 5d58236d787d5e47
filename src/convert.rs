// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! File to CAR conversion.
//!
//! A job walks `Init → Chunking → Building → SizeEstimated → Serializing →
//! Done`, or stops in `Failed` at the first error.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use cid::Cid;
use human_repr::HumanCount as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::car;
use crate::config::ConvertConfig;
use crate::dag::balanced;
use crate::dag::chunker::Chunker;
use crate::dag::store::NodeStore;
use crate::error::{Error, IoContext as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum JobStage {
    Init,
    Chunking,
    Building,
    SizeEstimated,
    Serializing,
    Done,
    Failed,
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarSummary {
    pub root: Cid,
    /// Exact number of bytes in the CAR.
    pub car_size: u64,
}

struct ConversionJob<'a> {
    config: &'a ConvertConfig,
    cancel: &'a CancellationToken,
    store: NodeStore,
    stage: JobStage,
}

impl<'a> ConversionJob<'a> {
    fn new(config: &'a ConvertConfig, cancel: &'a CancellationToken) -> Self {
        Self {
            config,
            cancel,
            store: NodeStore::new(),
            stage: JobStage::Init,
        }
    }

    fn advance(&mut self, next: JobStage) {
        debug!(from = %self.stage, to = %next, "conversion stage");
        self.stage = next;
    }

    fn run<R: Read, W: Write>(
        &mut self,
        chunker: Chunker<R>,
        source: Option<Arc<Path>>,
        out: W,
    ) -> Result<CarSummary, Error> {
        let result = self.run_stages(chunker, source, out);
        match &result {
            Ok(_) => self.advance(JobStage::Done),
            Err(e) => {
                warn!(stage = %self.stage, "conversion failed: {e}");
                self.advance(JobStage::Failed);
            }
        }
        result
    }

    fn run_stages<R: Read, W: Write>(
        &mut self,
        chunker: Chunker<R>,
        source: Option<Arc<Path>>,
        out: W,
    ) -> Result<CarSummary, Error> {
        self.config.validate()?;
        self.advance(JobStage::Chunking);
        // chunks are produced lazily, as the builder consumes them
        self.advance(JobStage::Building);
        let root = balanced::layout(
            chunker,
            &self.store,
            self.config.fan_out,
            self.config.hash,
            source,
            self.cancel,
        )?;

        let car_size = car::estimate(&self.store, root)?;
        self.advance(JobStage::SizeEstimated);
        debug!(%root, nodes = self.store.len(), car_size, "estimated CAR size");
        if let Some(capacity) = self.config.max_car_size {
            if car_size > capacity {
                return Err(Error::PackageOverflow {
                    size: car_size,
                    capacity,
                });
            }
        }

        self.advance(JobStage::Serializing);
        let written = car::serialize(
            &self.store,
            root,
            out,
            self.config.verify_file_leaves,
            self.cancel,
        )?;
        if written != car_size {
            return Err(Error::EstimateMismatch {
                estimated: car_size,
                written,
            });
        }
        Ok(CarSummary { root, car_size })
    }
}

/// Converts `input` into a CAR at `output`, created or truncated.
///
/// Leaves are kept as references into `input`, which must not change until
/// this returns. On error `output` is invalid; on cancellation it is removed.
pub fn file_convert_to_car(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConvertConfig,
    cancel: &CancellationToken,
) -> Result<CarSummary, Error> {
    let (input, output) = (input.as_ref(), output.as_ref());
    config.validate()?;
    let source = File::open(input).io_context(|| format!("opening {}", input.display()))?;
    let len = source
        .metadata()
        .io_context(|| format!("reading metadata of {}", input.display()))?
        .len();
    let full_path: Arc<Path> = input
        .canonicalize()
        .io_context(|| format!("resolving {}", input.display()))?
        .into();
    let sink = File::create(output).io_context(|| format!("creating {}", output.display()))?;

    let chunker = Chunker::new(source, config.chunk_size as usize).with_declared_len(len);
    let result = ConversionJob::new(config, cancel).run(
        chunker,
        Some(full_path),
        BufWriter::new(sink),
    );
    match &result {
        Ok(summary) => info!(
            root = %summary.root,
            "packed {} into {} ({})",
            input.display(),
            output.display(),
            summary.car_size.human_count_bytes()
        ),
        Err(Error::Cancelled) => {
            if let Err(e) = std::fs::remove_file(output) {
                warn!("failed to remove partial CAR {}: {e}", output.display());
            }
        }
        Err(_) => {}
    }
    result
}

/// Converts any reader into a CAR written to `output`. Leaves are held in
/// memory until serialization.
pub fn convert_to_car<R: Read, W: Write>(
    input: R,
    output: W,
    config: &ConvertConfig,
    cancel: &CancellationToken,
) -> Result<CarSummary, Error> {
    config.validate()?;
    let chunker = Chunker::new(input, config.chunk_size as usize);
    ConversionJob::new(config, cancel).run(chunker, None, output)
}
