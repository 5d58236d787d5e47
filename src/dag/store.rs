// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashMap;
use cid::Cid;
use parking_lot::Mutex;
use tracing::trace;

use super::{FileRef, LeafNode, Node, PosInfo};
use crate::error::Error;

/// Per-job map from [`Cid`] to [`Node`].
///
/// Leaves submitted together with their [`PosInfo`] are kept as
/// [`LeafNode::FileRef`], so the store never holds more than the
/// intermediate nodes and small materialized leaves in memory.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Mutex<HashMap<Cid, Node>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `node` under `cid`. A file-referenced node already stored under
    /// the same key is kept, otherwise the new node replaces the old one.
    pub fn put(&self, cid: Cid, node: Node, origin: Option<PosInfo>) {
        let node = match (node, origin) {
            (Node::Leaf(leaf), Some(PosInfo { path, offset })) => {
                Node::Leaf(LeafNode::FileRef(FileRef {
                    path,
                    offset,
                    size: leaf.declared_size(),
                }))
            }
            (node, _) => node,
        };
        let mut nodes = self.nodes.lock();
        if let Some(Node::Leaf(LeafNode::FileRef(_))) = nodes.get(&cid) {
            trace!(%cid, "keeping file reference");
            return;
        }
        nodes.insert(cid, node);
    }

    pub fn get(&self, cid: &Cid) -> Result<Node, Error> {
        self.nodes
            .lock()
            .get(cid)
            .cloned()
            .ok_or(Error::NotFound(*cid))
    }

    /// Looks up every key under one lock acquisition. Results are in input
    /// order.
    pub fn get_many<'a>(
        &self,
        cids: impl IntoIterator<Item = &'a Cid>,
    ) -> Vec<Result<Node, Error>> {
        let nodes = self.nodes.lock();
        cids.into_iter()
            .map(|cid| nodes.get(cid).cloned().ok_or(Error::NotFound(*cid)))
            .collect()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.nodes.lock().contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}
