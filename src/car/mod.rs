// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! CARv1 framing, see <https://ipld.io/specs/transport/car/carv1/>.
//!
//! ```text
//! uvarint(len(header)) || dag-cbor header
//! uvarint(len(cid) + len(data)) || cid || data
//! ...
//! ```

pub mod estimate;
pub mod writer;

use cid::Cid;
use integer_encoding::VarInt as _;
use nunny::Vec as NonEmpty;
use serde::{Deserialize, Serialize};

pub use estimate::estimate;
pub use writer::{CarWriter, serialize};

use crate::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarV1Header {
    // The roots array must contain one or more CIDs,
    // each of which should be present somewhere in the remainder of the CAR.
    // See <https://ipld.io/specs/transport/car/carv1/#constraints>
    pub roots: NonEmpty<Cid>,
    pub version: u64,
}

impl CarV1Header {
    pub fn new(root: Cid) -> Self {
        Self {
            roots: nunny::vec![root],
            version: 1,
        }
    }

    /// The varint-framed DAG-CBOR encoding, exactly as it leads the file.
    pub fn to_frame(&self) -> Result<Vec<u8>, Error> {
        let body = fvm_ipld_encoding::to_vec(self).map_err(|e| Error::Encoding(e.to_string()))?;
        let mut frame = body.len().encode_var_vec();
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    pub fn encoded_len(&self) -> Result<u64, Error> {
        Ok(self.to_frame()?.len() as u64)
    }
}

/// Bytes taken by one record holding `payload_len` bytes under `cid`.
pub fn record_len(cid: &Cid, payload_len: u64) -> u64 {
    let body = cid.encoded_len() as u64 + payload_len;
    body.required_space() as u64 + body
}
