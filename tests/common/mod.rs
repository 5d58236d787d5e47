// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use cid::Cid;
use integer_encoding::VarInt as _;

pub fn fcp_car() -> Command {
    cargo_bin_cmd!("fcp-car")
}

/// Deterministic incompressible bytes.
pub fn noise(len: usize, mut seed: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (seed >> 56) as u8
        })
        .collect()
}

pub fn write_file(path: &Path, data: &[u8]) {
    std::fs::write(path, data).unwrap();
}

/// Splits a CAR into its header body and `(cid, data)` records.
pub fn parse_car(mut car: &[u8]) -> (Vec<u8>, Vec<(Cid, Vec<u8>)>) {
    let (len, n) = usize::decode_var(car).unwrap();
    let header = car[n..n + len].to_vec();
    car = &car[n + len..];
    let mut records = vec![];
    while !car.is_empty() {
        let (len, n) = usize::decode_var(car).unwrap();
        let mut body = &car[n..n + len];
        let cid = Cid::read_bytes(&mut body).unwrap();
        records.push((cid, body.to_vec()));
        car = &car[n + len..];
    }
    (header, records)
}
