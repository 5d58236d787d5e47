// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::Write;

use ahash::HashSet;
use cid::Cid;
use integer_encoding::VarInt as _;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::CarV1Header;
use crate::dag::store::NodeStore;
use crate::dag::{LeafNode, Node, verify_payload};
use crate::error::{Error, IoContext as _};

/// Writes a CARv1 stream record by record, counting the bytes it emits.
pub struct CarWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CarWriter<W> {
    pub fn new(mut inner: W, header: &CarV1Header) -> Result<Self, Error> {
        let frame = header.to_frame()?;
        inner
            .write_all(&frame)
            .io_context(|| "writing CAR header")?;
        Ok(Self {
            inner,
            written: frame.len() as u64,
        })
    }

    // Write a varint frame containing the cid and the data
    pub fn write_record(&mut self, cid: &Cid, data: &[u8]) -> Result<(), Error> {
        let cid_bytes = cid.to_bytes();
        let prefix = (cid_bytes.len() + data.len()).encode_var_vec();
        let context = || format!("writing record {cid}");
        self.inner.write_all(&prefix).io_context(context)?;
        self.inner.write_all(&cid_bytes).io_context(context)?;
        self.inner.write_all(data).io_context(context)?;
        self.written += (prefix.len() + cid_bytes.len() + data.len()) as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes the sink and returns it with the number of bytes written.
    pub fn finish(mut self) -> Result<(W, u64), Error> {
        self.inner.flush().io_context(|| "flushing CAR")?;
        Ok((self.inner, self.written))
    }
}

/// Writes `root` and every distinct node below it to `out`, depth first in
/// link order. Returns the number of bytes written.
///
/// On error the output is left truncated.
pub fn serialize<W: Write>(
    store: &NodeStore,
    root: Cid,
    out: W,
    verify_file_leaves: bool,
    cancel: &CancellationToken,
) -> Result<u64, Error> {
    let root_node = store.get(&root)?;
    let mut car = CarWriter::new(out, &CarV1Header::new(root))?;
    let mut seen = HashSet::default();
    let mut stack = vec![(root, root_node)];
    while let Some((cid, node)) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if !seen.insert(cid) {
            continue;
        }
        let payload = node.read_payload(&cid)?;
        if verify_file_leaves {
            if let Node::Leaf(LeafNode::FileRef(file_ref)) = &node {
                if !verify_payload(&cid, &payload)? {
                    return Err(Error::DigestMismatch {
                        cid,
                        path: file_ref.path.to_path_buf(),
                        offset: file_ref.offset,
                    });
                }
            }
        }
        trace!(%cid, len = payload.len(), "writing record");
        car.write_record(&cid, &payload)?;

        let pending: Vec<Cid> = node
            .links()
            .iter()
            .map(|l| l.cid)
            .filter(|cid| !seen.contains(cid))
            .collect();
        let children = store.get_many(&pending);
        for (cid, child) in pending.into_iter().zip(children).rev() {
            stack.push((cid, child?));
        }
    }
    let (_, written) = car.finish()?;
    Ok(written)
}
