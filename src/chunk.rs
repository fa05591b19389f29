//! Splitting a file into its length-prefixed chunks.

use crate::prelude::*;
use tracing::{debug, warn};

/// How a chunk is handed downstream.
///
/// Only the `MThd` tag is special. Every other tag, including unknown ones, is treated like a
/// track chunk.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ChunkKind {
    Header,
    Track,
}
impl ChunkKind {
    /// Classify a 4-byte chunk tag.
    #[inline]
    pub fn from_tag(tag: &[u8; 4]) -> ChunkKind {
        match tag {
            b"MThd" => ChunkKind::Header,
            _ => ChunkKind::Track,
        }
    }
}

/// A single chunk as laid out in the file: a tag, a big-endian length, and exactly that many
/// payload bytes.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct RawChunk<'a> {
    /// The raw 4-byte ASCII tag, usually `MThd` or `MTrk`.
    pub tag: [u8; 4],
    pub kind: ChunkKind,
    pub payload: &'a [u8],
}
impl<'a> RawChunk<'a> {
    /// The declared length of the chunk, which is always the length of the payload.
    #[inline]
    pub fn length(&self) -> u32 {
        self.payload.len() as u32
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        self.kind == ChunkKind::Header
    }

    /// The tag as text, with non-ASCII bytes replaced.
    pub fn tag_str(&self) -> String {
        self.tag
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
            .collect()
    }
}

/// A forward-only reader over the chunks of a file.
///
/// Ends cleanly when fewer than 4 bytes (a full tag) are left. A chunk whose length field or
/// payload runs past the end of the file is a `Truncated` error; the reader is rewound to the
/// start of that chunk and yields nothing afterwards.
#[derive(Copy, Clone, Debug)]
pub struct ChunkReader<'a> {
    cursor: ByteCursor<'a>,
    failed: bool,
}
impl<'a> ChunkReader<'a> {
    pub fn new(raw: &'a [u8]) -> ChunkReader<'a> {
        ChunkReader {
            cursor: ByteCursor::new(raw),
            failed: false,
        }
    }

    /// Byte offset of the next chunk in the file.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Get the remaining unread bytes.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        self.cursor.unread()
    }

    /// Read the next chunk.
    ///
    /// Returns `Ok(None)` on a clean end of file.
    pub fn next_chunk(&mut self) -> Result<Option<RawChunk<'a>>> {
        if self.failed {
            return Ok(None);
        }
        let start = self.cursor.position();
        let mut probe = self.cursor;
        let tag = match probe.take_array::<4>() {
            Some(tag) => tag,
            None => {
                if !probe.is_empty() {
                    debug!(
                        "ignoring {} trailing bytes after the last chunk",
                        probe.remaining()
                    );
                }
                return Ok(None);
            }
        };
        let read = probe
            .take_u32_be()
            .at(start + 4, "chunk length")
            .and_then(|len| probe.take(len as usize).at(start + 8, "chunk payload"));
        let payload = match read {
            Ok(payload) => payload,
            Err(err) => {
                //Ensure no chunk is read from the middle of a corrupted one
                self.failed = true;
                warn!("chunk at byte {} is cut short: {}", start, err);
                return Err(err);
            }
        };
        self.cursor = probe;
        let kind = ChunkKind::from_tag(&tag);
        let chunk = RawChunk { tag, kind, payload };
        if kind == ChunkKind::Track && &tag != b"MTrk" {
            debug!("decoding unknown chunk '{}' as a track", chunk.tag_str());
        }
        Ok(Some(chunk))
    }
}
impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<RawChunk<'a>>;
    fn next(&mut self) -> Option<Result<RawChunk<'a>>> {
        //Flip around option and result
        self.next_chunk().transpose()
    }
}
impl core::iter::FusedIterator for ChunkReader<'_> {}
