// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Finds where each fixed-size block of a raw file landed inside a CAR built
//! from it, by matching a short fingerprint taken from the start of the block.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use integer_encoding::{VarInt as _, VarIntReader as _};
use tracing::debug;

use crate::dag::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, IoContext as _};

pub const DEFAULT_BLOCK_SIZE: u64 = DEFAULT_CHUNK_SIZE;
pub const DEFAULT_SAMPLE_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    pub index: u64,
    /// Absolute offset in the CAR of the block's first byte.
    pub offset: u64,
}

/// Position of the first occurrence of `sample` in `window`.
pub fn find_sample(window: &[u8], sample: &[u8]) -> Option<usize> {
    if sample.is_empty() || window.len() < sample.len() {
        return None;
    }
    window.windows(sample.len()).position(|w| w == sample)
}

/// Opens both files and runs [`locate_blocks`] over them.
pub fn locate_files(
    raw: &Path,
    car: &Path,
    block_size: u64,
    sample_size: usize,
) -> Result<Vec<BlockLocation>, Error> {
    let raw_file = File::open(raw).io_context(|| format!("opening {}", raw.display()))?;
    let car_file = File::open(car).io_context(|| format!("opening {}", car.display()))?;
    locate_blocks(raw_file, car_file, block_size, sample_size)
}

/// Locates every `block_size` block of `raw` in `car`, in order.
///
/// The scan starts right after the CAR header and only moves forward, so
/// blocks must appear in the CAR in the order they have in `raw`.
pub fn locate_blocks<R: Read + Seek, C: Read + Seek>(
    mut raw: R,
    mut car: C,
    block_size: u64,
    sample_size: usize,
) -> Result<Vec<BlockLocation>, Error> {
    if block_size == 0 || sample_size == 0 || sample_size as u64 > block_size {
        return Err(Error::InvalidInput(format!(
            "sample size {sample_size} must be within 1..={block_size}"
        )));
    }
    let raw_len = raw
        .seek(SeekFrom::End(0))
        .io_context(|| "measuring raw file")?;
    let car_len = car
        .seek(SeekFrom::End(0))
        .io_context(|| "measuring CAR file")?;
    if raw_len % block_size != 0 {
        return Err(Error::InvalidInput(format!(
            "raw file size {raw_len} is not a multiple of {block_size}"
        )));
    }
    if car_len <= raw_len {
        return Err(Error::InvalidInput(format!(
            "CAR size {car_len} is not larger than raw size {raw_len}"
        )));
    }

    car.seek(SeekFrom::Start(0))
        .io_context(|| "seeking CAR header")?;
    let header_len: u64 = car
        .read_varint()
        .io_context(|| "reading CAR header length")?;
    let mut offset = header_len.required_space() as u64 + header_len;

    let mut sample = vec![0; sample_size];
    let mut window = Vec::with_capacity(block_size as usize);
    let mut found = Vec::with_capacity((raw_len / block_size) as usize);
    for index in 0..raw_len / block_size {
        raw.seek(SeekFrom::Start(index * block_size))
            .and_then(|_| raw.read_exact(&mut sample))
            .io_context(|| format!("reading sample of block {index}"))?;
        loop {
            window.clear();
            car.seek(SeekFrom::Start(offset))
                .and_then(|_| (&mut car).take(block_size).read_to_end(&mut window))
                .io_context(|| format!("reading CAR at {offset}"))?;
            if window.len() < sample_size {
                return Err(Error::BlockNotFound { index });
            }
            match find_sample(&window, &sample) {
                Some(pos) => {
                    let location = offset + pos as u64;
                    debug!(index, location, "located block");
                    found.push(BlockLocation {
                        index,
                        offset: location,
                    });
                    offset = location + block_size;
                    break;
                }
                None => offset += (window.len() - sample_size + 1) as u64,
            }
        }
    }
    Ok(found)
}
