// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//!
//! Hash functions a packer job may be configured with.
//!
//! Every entry produces a 32-byte digest, so the encoded CID length only
//! depends on the varint width of the multihash code.
//!

pub mod prelude {
    pub use super::MultihashCode;
    pub use multihash_codetable::MultihashDigest as _;
}

use multihash_derive::MultihashDigest;
use serde::{Deserialize, Serialize};

/// Subset of [`multihash_codetable::Code`] usable for CAR packing.
#[derive(
    Clone, Copy, Debug, Default, Eq, MultihashDigest, PartialEq, Serialize, Deserialize,
)]
#[mh(alloc_size = 64)]
pub enum MultihashCode {
    /// BLAKE2b-256 (32-byte hash size), the Filecoin default
    #[default]
    #[serde(rename = "blake2b-256")]
    #[mh(code = 0xb220, hasher = multihash_codetable::Blake2b256)]
    Blake2b256,
    /// SHA-256 (32-byte hash size)
    #[serde(rename = "sha2-256")]
    #[mh(code = 0x12, hasher = multihash_codetable::Sha2_256)]
    Sha2_256,
    /// BLAKE3-256 (32-byte hash size)
    #[serde(rename = "blake3-256")]
    #[mh(code = 0x1e, hasher = multihash_codetable::Blake3_256)]
    Blake3_256,
}
