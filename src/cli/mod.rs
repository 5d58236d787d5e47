// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod logger;
mod main;
mod subcommands;

pub use main::main;
