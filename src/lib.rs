// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Packs files into CARv1 archives backed by a balanced UnixFS DAG.
//!
//! ```no_run
//! use fcp::{ConvertConfig, file_convert_to_car};
//! use tokio_util::sync::CancellationToken;
//!
//! let summary = file_convert_to_car(
//!     "movie.mkv",
//!     "movie.car",
//!     &ConvertConfig::default(),
//!     &CancellationToken::new(),
//! )?;
//! println!("{} {}", summary.root, summary.car_size);
//! # Ok::<(), fcp::Error>(())
//! ```

pub mod car;
pub mod cli;
pub mod config;
pub mod convert;
pub mod dag;
pub mod error;
pub mod locate;
pub mod utils;

pub use config::{ConvertConfig, PackageType};
pub use convert::{CarSummary, JobStage, convert_to_car, file_convert_to_car};
pub use error::Error;
