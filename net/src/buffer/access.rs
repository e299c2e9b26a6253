// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bounds-checked reads, writes and moves over packet bytes.
//!
//! Header rewriting touches the frame at computed offsets, often with overlapping source and
//! destination regions.
//! Every accessor here refuses to touch memory outside of the slice and reports an
//! [`OutOfBounds`] error instead.

use std::ops::Range;

/// An access fell (at least partially) outside of the available data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access of {len} bytes at offset {offset} exceeds buffer of {available} bytes")]
pub struct OutOfBounds {
    /// Offset of the rejected access
    pub offset: usize,
    /// Length of the rejected access
    pub len: usize,
    /// Number of bytes actually available
    pub available: usize,
}

/// Network byte order accessors over a byte slice.
///
/// All multi-byte values are big endian.
pub trait ByteAccess {
    /// Borrow `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn slice_at(&self, offset: usize, len: usize) -> Result<&[u8], OutOfBounds>;

    /// Mutably borrow `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn slice_at_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], OutOfBounds>;

    /// Copy `N` bytes starting at `offset` into an array.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn read_array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N], OutOfBounds> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice_at(offset, N)?);
        Ok(out)
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if `offset` is past the end.
    fn read_u8_at(&self, offset: usize) -> Result<u8, OutOfBounds> {
        Ok(self.read_array_at::<1>(offset)?[0])
    }

    /// Read a big endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn read_u16_at(&self, offset: usize) -> Result<u16, OutOfBounds> {
        Ok(u16::from_be_bytes(self.read_array_at(offset)?))
    }

    /// Read a big endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn read_u32_at(&self, offset: usize) -> Result<u32, OutOfBounds> {
        Ok(u32::from_be_bytes(self.read_array_at(offset)?))
    }

    /// Overwrite `bytes.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), OutOfBounds> {
        self.slice_at_mut(offset, bytes.len())?
            .copy_from_slice(bytes);
        Ok(())
    }

    /// Write one byte.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if `offset` is past the end.
    fn write_u8_at(&mut self, offset: usize, value: u8) -> Result<(), OutOfBounds> {
        self.write_at(offset, &[value])
    }

    /// Write a big endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn write_u16_at(&mut self, offset: usize, value: u16) -> Result<(), OutOfBounds> {
        self.write_at(offset, &value.to_be_bytes())
    }

    /// Write a big endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not fit.
    fn write_u32_at(&mut self, offset: usize, value: u32) -> Result<(), OutOfBounds> {
        self.write_at(offset, &value.to_be_bytes())
    }

    /// Move the bytes in `src` so that they start at `dest`, like [`slice::copy_within`], but
    /// without panicking.
    /// Source and destination may overlap.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if either the source or the destination range does not fit.
    fn copy_within_checked(&mut self, src: Range<usize>, dest: usize) -> Result<(), OutOfBounds>;
}

impl ByteAccess for [u8] {
    fn slice_at(&self, offset: usize, len: usize) -> Result<&[u8], OutOfBounds> {
        let available = self.len();
        offset
            .checked_add(len)
            .and_then(|end| self.get(offset..end))
            .ok_or(OutOfBounds {
                offset,
                len,
                available,
            })
    }

    fn slice_at_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], OutOfBounds> {
        let available = self.len();
        offset
            .checked_add(len)
            .and_then(|end| self.get_mut(offset..end))
            .ok_or(OutOfBounds {
                offset,
                len,
                available,
            })
    }

    fn copy_within_checked(&mut self, src: Range<usize>, dest: usize) -> Result<(), OutOfBounds> {
        let available = self.len();
        let len = src.end.saturating_sub(src.start);
        let fits = |offset: usize| offset.checked_add(len).is_some_and(|end| end <= available);
        if src.start > src.end || !fits(src.start) {
            return Err(OutOfBounds {
                offset: src.start,
                len,
                available,
            });
        }
        if !fits(dest) {
            return Err(OutOfBounds {
                offset: dest,
                len,
                available,
            });
        }
        self.copy_within(src, dest);
        Ok(())
    }
}
