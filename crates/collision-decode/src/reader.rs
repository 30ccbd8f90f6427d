//! Bounds-checked little-endian cursor over a byte slice.

use glam::DVec3;

use crate::error::{ParseError, ParseResult};

/// A forward-only reader that never indexes past the end of its buffer.
///
/// Every read names a `context` so truncation errors point at the field
/// that could not be read.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Take the next `len` bytes.
    pub(crate) fn take(&mut self, len: usize, context: &'static str) -> ParseResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(ParseError::Truncated {
                context,
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub(crate) fn read_array<const N: usize>(
        &mut self,
        context: &'static str,
    ) -> ParseResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, context)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self, context: &'static str) -> ParseResult<u8> {
        Ok(self.read_array::<1>(context)?[0])
    }

    pub(crate) fn read_u32(&mut self, context: &'static str) -> ParseResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    /// Read an `f32` and widen it. Finiteness is checked by the caller.
    pub(crate) fn read_f32(&mut self, context: &'static str) -> ParseResult<f64> {
        Ok(f64::from(f32::from_le_bytes(self.read_array(context)?)))
    }

    pub(crate) fn read_dvec3(&mut self, context: &'static str) -> ParseResult<DVec3> {
        Ok(DVec3::new(
            self.read_f32(context)?,
            self.read_f32(context)?,
            self.read_f32(context)?,
        ))
    }

    /// Read a `u32` length prefix followed by that many bytes of UTF-8.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; names are labels only.
    pub(crate) fn read_string(&mut self, context: &'static str) -> ParseResult<String> {
        let len = self.read_u32(context)? as usize;
        let bytes = self.take(len, context)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Capacity to reserve for `count` items of at least `item_size` bytes.
    ///
    /// Bounded by what the rest of the buffer could possibly hold, so a
    /// corrupt count cannot trigger a huge allocation.
    pub(crate) fn capacity_hint(&self, count: usize, item_size: usize) -> usize {
        count.min(self.remaining() / item_size.max(1))
    }
}
