// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Balanced layout: leaves are grouped into parents of at most `fan_out`
//! children, parents into grandparents, and so on until a single root
//! remains. All leaves end up at the same depth and every level is filled
//! from the left, which matches the `go-unixfs` balanced importer.

use std::io;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use cid::Cid;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::chunker::Chunk;
use super::store::NodeStore;
use super::{InternalNode, LeafNode, Link, Node, PosInfo, internal_cid, raw_cid};
use crate::error::{Error, IoContext as _};
use crate::utils::multihash::MultihashCode;

/// Default maximum number of children per intermediate node.
pub const DEFAULT_FAN_OUT: usize = 1024;

pub struct BalancedBuilder<'a> {
    store: &'a NodeStore,
    fan_out: usize,
    hash: MultihashCode,
    source: Option<Arc<Path>>,
    /// `levels[0]` holds leaves, `levels[n]` holds nodes of height `n`.
    levels: Vec<Vec<Link>>,
    leaves: u64,
}

impl<'a> BalancedBuilder<'a> {
    pub fn new(store: &'a NodeStore, fan_out: usize, hash: MultihashCode) -> Self {
        Self {
            store,
            fan_out,
            hash,
            source: None,
            levels: vec![vec![]],
            leaves: 0,
        }
    }

    /// Leaves are stored as references into `path` instead of by value.
    pub fn with_source(mut self, path: impl Into<Arc<Path>>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn leaves(&self) -> u64 {
        self.leaves
    }

    /// Hashes `chunk` into a leaf and appends it to the tree.
    pub fn push_chunk(&mut self, chunk: Chunk) -> Result<(), Error> {
        if self.fan_out == 0 || (self.fan_out == 1 && self.leaves > 0) {
            return Err(Error::InvalidConfig(format!(
                "a fan-out of {} cannot hold {} chunks",
                self.fan_out,
                self.leaves + 1
            )));
        }
        let cid = raw_cid(self.hash, &chunk.data);
        let node = Node::Leaf(LeafNode::Materialized(chunk.data));
        let link = node.link(cid);
        let origin = self.source.as_ref().map(|path| PosInfo {
            path: path.clone(),
            offset: chunk.offset,
        });
        self.store.put(cid, node, origin);
        self.leaves += 1;
        self.push_link(0, link);
        Ok(())
    }

    fn push_link(&mut self, height: usize, link: Link) {
        if self.levels.len() == height {
            self.levels.push(vec![]);
        }
        if self.levels[height].len() == self.fan_out {
            let full = std::mem::take(&mut self.levels[height]);
            let parent = self.seal(full);
            self.push_link(height + 1, parent);
        }
        self.levels[height].push(link);
    }

    fn seal(&mut self, children: Vec<Link>) -> Link {
        let node = InternalNode::new(children);
        let cid = internal_cid(self.hash, &node);
        let node = Node::Internal(node);
        let link = node.link(cid);
        self.store.put(cid, node, None);
        link
    }

    /// Flushes every partially filled level and returns the root.
    pub fn finish(mut self) -> Result<Cid, Error> {
        if self.leaves == 0 {
            let cid = raw_cid(self.hash, &[]);
            self.store
                .put(cid, Node::Leaf(LeafNode::Materialized(Bytes::new())), None);
            return Ok(cid);
        }
        let mut height = 0;
        loop {
            let is_top = height + 1 == self.levels.len();
            let pending = std::mem::take(&mut self.levels[height]);
            if is_top && pending.len() == 1 {
                let root = pending[0].cid;
                debug!(leaves = self.leaves, height, %root, "built balanced DAG");
                return Ok(root);
            }
            if !pending.is_empty() {
                let parent = self.seal(pending);
                self.push_link(height + 1, parent);
            }
            height += 1;
        }
    }
}

/// Lays out `chunks` as a balanced DAG inside `store` and returns its root.
pub fn layout(
    chunks: impl IntoIterator<Item = io::Result<Chunk>>,
    store: &NodeStore,
    fan_out: usize,
    hash: MultihashCode,
    source: Option<Arc<Path>>,
    cancel: &CancellationToken,
) -> Result<Cid, Error> {
    let mut builder = BalancedBuilder::new(store, fan_out, hash);
    if let Some(source) = source {
        builder = builder.with_source(source);
    }
    for chunk in chunks {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let chunk = chunk.io_context(|| format!("reading chunk {}", builder.leaves()))?;
        builder.push_chunk(chunk)?;
    }
    builder.finish()
}
