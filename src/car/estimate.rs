// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashSet;
use cid::Cid;

use super::{CarV1Header, record_len};
use crate::dag::Node;
use crate::dag::store::NodeStore;
use crate::error::Error;

/// Exact size of the CAR [`super::serialize`] writes for `root`. Nothing is
/// written and no file-referenced leaf is read.
pub fn estimate(store: &NodeStore, root: Cid) -> Result<u64, Error> {
    Ok(CarV1Header::new(root).encoded_len()? + dag_size(store, root)?)
}

/// Sum of the record sizes of every distinct node reachable from `root`.
pub fn dag_size(store: &NodeStore, root: Cid) -> Result<u64, Error> {
    let mut seen = HashSet::default();
    let mut stack = vec![root];
    let mut total = 0;
    while let Some(cid) = stack.pop() {
        if !seen.insert(cid) {
            continue;
        }
        let node = store.get(&cid)?;
        total += node_size(&cid, &node);
        stack.extend(node.links().iter().rev().map(|l| l.cid));
    }
    Ok(total)
}

/// Size of the record of `node` alone. Children are accounted for separately.
pub fn node_size(cid: &Cid, node: &Node) -> u64 {
    let children: u64 = node.links().iter().map(|l| l.size).sum();
    record_len(cid, node.declared_size() - children)
}
