// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Canonical `dag-pb` encoding of UnixFS file nodes.
//!
//! ```proto
//! message PBLink {
//!   optional bytes Hash = 1;
//!   optional string Name = 2;
//!   optional uint64 Tsize = 3;
//! }
//! message PBNode {
//!   repeated PBLink Links = 2;
//!   optional bytes Data = 1;
//! }
//! message Data {
//!   required DataType Type = 1;
//!   optional bytes Data = 2;
//!   optional uint64 filesize = 3;
//!   repeated uint64 blocksizes = 4;
//! }
//! ```
//!
//! Links are written before `Data`, see <https://ipld.io/specs/codecs/dag-pb/spec/>.

use integer_encoding::VarInt;

use super::Link;

/// `Data.Type = File`
const UNIXFS_FILE: u64 = 2;

const fn tag(field: u8, wire_type: u8) -> u8 {
    (field << 3) | wire_type
}

const VARINT: u8 = 0;
const LEN: u8 = 2;

fn put_varint(buf: &mut Vec<u8>, value: u64) {
    let mut scratch = [0u8; 10];
    let n = value.encode_var(&mut scratch);
    buf.extend_from_slice(&scratch[..n]);
}

fn put_bytes(buf: &mut Vec<u8>, field: u8, bytes: &[u8]) {
    buf.push(tag(field, LEN));
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn put_uint(buf: &mut Vec<u8>, field: u8, value: u64) {
    buf.push(tag(field, VARINT));
    put_varint(buf, value);
}

fn encode_link(link: &Link) -> Vec<u8> {
    let mut buf = Vec::with_capacity(link.cid.encoded_len() + 16);
    put_bytes(&mut buf, 1, &link.cid.to_bytes());
    // go-merkledag always emits the (empty) name
    put_bytes(&mut buf, 2, &[]);
    put_uint(&mut buf, 3, link.size);
    buf
}

fn encode_unixfs_file(links: &[Link]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + links.len() * 5);
    put_uint(&mut buf, 1, UNIXFS_FILE);
    put_uint(&mut buf, 3, links.iter().map(|l| l.file_size).sum());
    for link in links {
        put_uint(&mut buf, 4, link.file_size);
    }
    buf
}

/// Encodes an intermediate UnixFS file node pointing at `links`, in order.
pub(super) fn encode_file_node(links: &[Link]) -> Vec<u8> {
    let data = encode_unixfs_file(links);
    let mut buf = Vec::with_capacity(links.len() * 48 + data.len() + 8);
    for link in links {
        put_bytes(&mut buf, 2, &encode_link(link));
    }
    put_bytes(&mut buf, 1, &data);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::multihash::prelude::*;
    use cid::Cid;
    use integer_encoding::VarInt as _;
    use pretty_assertions::assert_eq;

    fn raw_link(data: &[u8]) -> Link {
        Link {
            cid: Cid::new_v1(
                fvm_ipld_encoding::IPLD_RAW,
                MultihashCode::Blake2b256.digest(data),
            ),
            size: data.len() as u64,
            file_size: data.len() as u64,
        }
    }

    /// Splits a protobuf message into `(field, wire type, payload)` triples.
    fn fields(mut bytes: &[u8]) -> Vec<(u8, u8, Vec<u8>)> {
        let mut out = vec![];
        while let Some((&key, rest)) = bytes.split_first() {
            let (value, n) = u64::decode_var(rest).unwrap();
            match key & 0x7 {
                VARINT => {
                    out.push((key >> 3, VARINT, value.encode_var_vec()));
                    bytes = &rest[n..];
                }
                LEN => {
                    let len = value as usize;
                    out.push((key >> 3, LEN, rest[n..n + len].to_vec()));
                    bytes = &rest[n + len..];
                }
                other => panic!("unexpected wire type {other}"),
            }
        }
        out
    }

    #[test]
    fn links_precede_data() {
        let links = [raw_link(b"a"), raw_link(b"bc")];
        let encoded = encode_file_node(&links);
        let top = fields(&encoded);
        let order: Vec<u8> = top.iter().map(|(f, _, _)| *f).collect();
        assert_eq!(order, vec![2, 2, 1]);
    }

    #[test]
    fn link_layout() {
        let link = raw_link(b"hello");
        let encoded = encode_link(&link);
        let parts = fields(&encoded);
        assert_eq!(parts[0], (1, LEN, link.cid.to_bytes()));
        assert_eq!(parts[1], (2, LEN, vec![]));
        assert_eq!(parts[2], (3, VARINT, 5u64.encode_var_vec()));
        // 0x0a 0x26 <38 cid bytes> 0x12 0x00 0x18 0x05
        assert_eq!(encoded.len(), 2 + 38 + 2 + 2);
    }

    #[test]
    fn unixfs_file_sizes() {
        let links = [raw_link(&[0; 300]), raw_link(&[1; 7])];
        let data = encode_unixfs_file(&links);
        let parts = fields(&data);
        assert_eq!(parts[0], (1, VARINT, vec![2]));
        assert_eq!(parts[1], (3, VARINT, 307u64.encode_var_vec()));
        assert_eq!(parts[2], (4, VARINT, 300u64.encode_var_vec()));
        assert_eq!(parts[3], (4, VARINT, 7u64.encode_var_vec()));
        assert_eq!(parts.len(), 4);
    }
}
