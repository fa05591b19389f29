//! Bounded sequential reads over a borrowed byte buffer.
//! Every read either succeeds and advances by exactly the amount read, or fails and leaves the
//! position untouched.

use crate::prelude::*;

/// Most 7-bit groups a variable-length quantity may span.
const VLQ_MAX_GROUPS: usize = 5;

/// A read position over a byte buffer.
///
/// This `struct` is very light, so it can be copied freely. Copying a cursor and only writing the
/// copy back on success is how multi-field reads are made all-or-nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ByteCursor<'a> {
    raw: &'a [u8],
    pos: usize,
}
impl<'a> ByteCursor<'a> {
    #[inline]
    pub fn new(raw: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor { raw, pos: 0 }
    }

    /// Offset of the next unread byte from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.raw.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Get the remaining unread bytes.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        &self.raw[self.pos..]
    }

    /// Look at the next `n` bytes without consuming them.
    #[inline]
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        self.raw.get(self.pos..end)
    }

    /// Consume exactly `n` bytes, or nothing at all if fewer than `n` remain.
    #[inline]
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Some(bytes)
    }

    #[inline]
    pub fn peek_u8(&self) -> Option<u8> {
        self.raw.get(self.pos).copied()
    }

    #[inline]
    pub fn take_u8(&mut self) -> Option<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume a fixed-size array of bytes.
    #[inline]
    pub fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Some(out)
    }

    /// Read a big-endian `u16`.
    #[inline]
    pub fn take_u16_be(&mut self) -> Option<u16> {
        self.take_array().map(u16::from_be_bytes)
    }

    /// Read a big-endian `u32`.
    #[inline]
    pub fn take_u32_be(&mut self) -> Option<u32> {
        self.take_array().map(u32::from_be_bytes)
    }

    /// Read a MIDI variable-length quantity.
    ///
    /// Each byte contributes its bottom 7 bits, most significant group first, and a set top bit
    /// means more bytes follow.
    /// At most 5 groups are read; a fifth group that still has the top bit set, or a value that
    /// does not fit in a `u32`, is an `Overflow`.
    /// Running out of bytes before a terminating byte is `Truncated`.
    pub fn take_vlq(&mut self) -> StdResult<u32, ErrorKind> {
        let mut probe = *self;
        let mut int: u64 = 0;
        for _ in 0..VLQ_MAX_GROUPS {
            let byte = probe.take_u8().ok_or(ErrorKind::Truncated)?;
            int = (int << 7) | u64::from(bit_range(byte, 0..7));
            if bit_range(byte, 7..8) == 0 {
                let int = u32::try_from(int).map_err(|_| ErrorKind::Overflow)?;
                *self = probe;
                return Ok(int);
            }
        }
        Err(ErrorKind::Overflow)
    }

    /// Reads a slice represented in the input as a variable-length `len` followed by `len` bytes.
    ///
    /// Fails with `Truncated` if fewer than `len` bytes follow, consuming nothing.
    pub fn take_vlq_slice(&mut self) -> StdResult<&'a [u8], ErrorKind> {
        let mut probe = *self;
        let len = probe.take_vlq()?;
        let slice = probe.take(len as usize).ok_or(ErrorKind::Truncated)?;
        *self = probe;
        Ok(slice)
    }
}
