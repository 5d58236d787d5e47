// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io;
use std::path::PathBuf;

use cid::Cid;
use thiserror::Error;

/// Errors raised while turning a file into a CAR archive.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("block {0} is not in the node store")]
    NotFound(Cid),
    #[error("unsupported multihash code {0:#x}")]
    Hash(u64),
    #[error(
        "{cid}: expected {expected} bytes at offset {offset} of {}, read {actual}",
        path.display()
    )]
    SizeMismatch {
        cid: Cid,
        path: PathBuf,
        offset: u64,
        expected: u64,
        actual: u64,
    },
    #[error("{cid}: content at offset {offset} of {} no longer matches its digest", path.display())]
    DigestMismatch {
        cid: Cid,
        path: PathBuf,
        offset: u64,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("conversion cancelled")]
    Cancelled,
    #[error("estimated {estimated} bytes but wrote {written}")]
    EstimateMismatch { estimated: u64, written: u64 },
    #[error("CAR of {size} bytes exceeds the package capacity of {capacity} bytes")]
    PackageOverflow { size: u64, capacity: u64 },
    #[error("failed to encode CAR header: {0}")]
    Encoding(String),
    #[error("block {index} not found in CAR")]
    BlockNotFound { index: u64 },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error comes from reading or writing the file system,
    /// including a source file that changed size under a running job.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::SizeMismatch { .. } | Self::DigestMismatch { .. }
        )
    }
}

/// Attaches a human readable context to [`io::Result`]s.
pub(crate) trait IoContext<T> {
    fn io_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T, Error>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T, Error> {
        self.map_err(|e| Error::io(context(), e))
    }
}
