// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Merkle-DAG representation of a chunked file.
//!
//! Leaves are `raw` blocks holding one chunk each. Intermediate nodes are
//! UnixFS `dag-pb` file nodes linking to their children in file order.

pub mod balanced;
pub mod chunker;
mod pb;
pub mod store;

use std::fs::File;
use std::io::{Read as _, Seek as _, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use cid::Cid;
pub use fvm_ipld_encoding::IPLD_RAW;

use crate::error::{Error, IoContext as _};
use crate::utils::multihash::prelude::*;

/// Multicodec code of `dag-pb`.
pub const DAG_PB: u64 = 0x70;

/// Location of a chunk inside its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosInfo {
    pub path: Arc<Path>,
    pub offset: u64,
}

/// A leaf whose bytes stay in the source file until serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: Arc<Path>,
    pub offset: u64,
    pub size: u64,
}

impl FileRef {
    /// Reads exactly `size` bytes at `offset`. Every call opens its own handle.
    pub fn read(&self, cid: &Cid) -> Result<Bytes, Error> {
        let context = || {
            format!(
                "reading {cid} from {} at offset {}",
                self.path.display(),
                self.offset
            )
        };
        let mut file = File::open(&self.path).io_context(context)?;
        file.seek(SeekFrom::Start(self.offset))
            .io_context(context)?;
        let mut buf = Vec::with_capacity(self.size as usize);
        file.take(self.size)
            .read_to_end(&mut buf)
            .io_context(context)?;
        if buf.len() as u64 != self.size {
            return Err(Error::SizeMismatch {
                cid: *cid,
                path: self.path.to_path_buf(),
                offset: self.offset,
                expected: self.size,
                actual: buf.len() as u64,
            });
        }
        Ok(buf.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafNode {
    Materialized(Bytes),
    FileRef(FileRef),
}

impl LeafNode {
    pub fn declared_size(&self) -> u64 {
        match self {
            Self::Materialized(data) => data.len() as u64,
            Self::FileRef(file_ref) => file_ref.size,
        }
    }
}

/// A link from an intermediate node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub cid: Cid,
    /// Cumulative size of the child, `Tsize` in `dag-pb`.
    pub size: u64,
    /// Number of file bytes under the child.
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    links: Vec<Link>,
    encoded: Bytes,
}

impl InternalNode {
    pub fn new(links: Vec<Link>) -> Self {
        let encoded = pb::encode_file_node(&links).into();
        Self { links, encoded }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The canonical `dag-pb` bytes this node is addressed by.
    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }

    pub fn file_size(&self) -> u64 {
        self.links.iter().map(|l| l.file_size).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    /// Size of this node plus everything below it, without touching the disk.
    pub fn declared_size(&self) -> u64 {
        match self {
            Self::Leaf(leaf) => leaf.declared_size(),
            Self::Internal(node) => {
                node.encoded.len() as u64 + node.links.iter().map(|l| l.size).sum::<u64>()
            }
        }
    }

    pub fn file_size(&self) -> u64 {
        match self {
            Self::Leaf(leaf) => leaf.declared_size(),
            Self::Internal(node) => node.file_size(),
        }
    }

    pub fn links(&self) -> &[Link] {
        match self {
            Self::Leaf(_) => &[],
            Self::Internal(node) => node.links(),
        }
    }

    /// Loads the bytes stored in this node's CAR record. File references hit
    /// the disk.
    pub fn read_payload(&self, cid: &Cid) -> Result<Bytes, Error> {
        match self {
            Self::Leaf(LeafNode::Materialized(data)) => Ok(data.clone()),
            Self::Leaf(LeafNode::FileRef(file_ref)) => file_ref.read(cid),
            Self::Internal(node) => Ok(node.encoded.clone()),
        }
    }

    pub fn link(&self, cid: Cid) -> Link {
        Link {
            cid,
            size: self.declared_size(),
            file_size: self.file_size(),
        }
    }
}

/// CID of a `raw` leaf holding `data`.
pub fn raw_cid(code: MultihashCode, data: &[u8]) -> Cid {
    Cid::new_v1(IPLD_RAW, code.digest(data))
}

/// CID of an intermediate node.
pub fn internal_cid(code: MultihashCode, node: &InternalNode) -> Cid {
    Cid::new_v1(DAG_PB, code.digest(node.encoded()))
}

/// Recomputes the digest of `payload` with the hash function named by `cid`.
pub fn verify_payload(cid: &Cid, payload: &[u8]) -> Result<bool, Error> {
    let code = cid.hash().code();
    let code = MultihashCode::try_from(code).map_err(|_| Error::Hash(code))?;
    Ok(Cid::new_v1(cid.codec(), code.digest(payload)) == *cid)
}
