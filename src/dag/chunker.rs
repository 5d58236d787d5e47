// Copyright 2019-2025 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

/// Default chunk size, 1 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 1 << 20;

/// A contiguous range of the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u64,
    pub offset: u64,
    pub data: Bytes,
}

impl Chunk {
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Splits a reader into fixed-size chunks. Only the final chunk may be short.
///
/// The iterator is fused: it yields nothing after the end of the stream or the
/// first error.
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
    declared_len: Option<u64>,
    next_index: u64,
    offset: u64,
    done: bool,
}

impl<R: Read> Chunker<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            reader,
            chunk_size,
            declared_len: None,
            next_index: 0,
            offset: 0,
            done: false,
        }
    }

    /// Expects exactly `len` bytes. Ending early is an
    /// [`io::ErrorKind::UnexpectedEof`] error and anything past `len` is
    /// ignored.
    pub fn with_declared_len(self, len: u64) -> Chunker<io::Take<R>> {
        Chunker {
            reader: self.reader.take(len),
            chunk_size: self.chunk_size,
            declared_len: Some(len),
            next_index: self.next_index,
            offset: self.offset,
            done: self.done,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fills `buf` completely unless the stream ends first.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn check_declared_len(&self) -> io::Result<()> {
        match self.declared_len {
            Some(len) if self.offset < len => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended at {} of {len} declared bytes", self.offset),
            )),
            _ => Ok(()),
        }
    }
}

impl<R: Read> Iterator for Chunker<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = BytesMut::zeroed(self.chunk_size);
        let filled = match self.fill(&mut buf) {
            Ok(filled) => filled,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if filled < self.chunk_size {
            self.done = true;
        }
        if filled == 0 {
            return self.check_declared_len().err().map(Err);
        }
        buf.truncate(filled);
        let chunk = Chunk {
            index: self.next_index,
            offset: self.offset,
            data: buf.freeze(),
        };
        self.next_index += 1;
        self.offset += filled as u64;
        if self.done {
            if let Err(e) = self.check_declared_len() {
                return Some(Err(e));
            }
        }
        Some(Ok(chunk))
    }
}

impl<R: Read> std::iter::FusedIterator for Chunker<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    const S: usize = 64;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn chunks(data: &[u8], chunk_size: usize) -> Vec<Chunk> {
        Chunker::new(data, chunk_size)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(S - 1, 1)]
    #[case(S, 1)]
    #[case(S + 1, 2)]
    #[case(10 * S + 37, 11)]
    fn covers_stream(#[case] len: usize, #[case] expected_chunks: usize) {
        let data = pattern(len);
        let chunks = chunks(&data, S);
        assert_eq!(chunks.len(), expected_chunks);

        let mut offset = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as u64);
            assert_eq!(chunk.offset, offset);
            offset += chunk.len();
        }
        let last_len = match len % S {
            0 => S,
            rem => rem,
        };
        if let Some(last) = chunks.last() {
            assert_eq!(last.len(), last_len as u64);
        }
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(joined, data);
    }

    /// Yields at most 3 bytes per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn short_reads_still_fill_chunks() {
        let data = pattern(3 * S + 5);
        let chunks = Chunker::new(Trickle(&data), S)
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        let lens: Vec<u64> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(lens, vec![S as u64, S as u64, S as u64, 5]);
    }

    #[test]
    fn stream_shorter_than_declared_fails() {
        let data = pattern(S + 10);
        let results: Vec<_> = Chunker::new(data.as_slice(), S)
            .with_declared_len(2 * S as u64)
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn stream_longer_than_declared_is_cut() {
        let data = pattern(3 * S);
        let chunks = Chunker::new(data.as_slice(), S)
            .with_declared_len(S as u64 + 1)
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 1);
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn read_error_is_surfaced_once() {
        let mut chunker = Chunker::new(Failing, S);
        assert!(chunker.next().unwrap().is_err());
        assert!(chunker.next().is_none());
    }

    #[quickcheck]
    fn chunks_reassemble(data: Vec<u8>, chunk_size: u8) -> bool {
        let chunk_size = usize::from(chunk_size).max(1);
        let joined: Vec<u8> = chunks(&data, chunk_size)
            .iter()
            .flat_map(|c| c.data.iter().copied())
            .collect();
        joined == data
    }
}
