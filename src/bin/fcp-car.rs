// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

fn main() -> std::process::ExitCode {
    fcp::cli::main(std::env::args_os())
}
