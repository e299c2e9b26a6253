// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Packet buffers as seen by the translator: a frame with spare room on either side.
//!
//! A buffer exposes the frame through [`AsRef`]/[`AsMut`]. The frame can grow into the spare
//! room ([`Prepend`], [`Append`]) or give bytes back to it ([`TrimFromStart`], [`TrimFromEnd`]).
//! Every resize can fail; the frame is then left as it was.

mod access;
#[cfg(any(doc, test, feature = "test_buffer"))]
pub mod test_buffer;

use core::fmt::Debug;

pub use access::{ByteAccess, OutOfBounds};
#[allow(unused_imports)] // re-export
#[cfg(any(doc, test, feature = "test_buffer"))]
pub use test_buffer::*;

/// A read-only view of a packet buffer.
pub trait PacketBuffer: AsRef<[u8]> + Headroom + Debug + 'static {}
impl<T> PacketBuffer for T where T: AsRef<[u8]> + Headroom + Debug + 'static {}

/// A packet buffer whose frame may be rewritten and resized at both ends.
pub trait PacketBufferMut:
    PacketBuffer
    + AsMut<[u8]>
    + Prepend
    + Append
    + Send
    + TrimFromStart
    + TrimFromEnd
    + Tailroom
{
}
impl<T> PacketBufferMut for T where
    T: PacketBuffer
        + AsMut<[u8]>
        + Prepend
        + Append
        + Send
        + TrimFromStart
        + TrimFromEnd
        + Tailroom
{
}

/// Spare room before the frame.
pub trait Headroom {
    /// Bytes the frame may still grow by at the front
    fn headroom(&self) -> u16;
}

/// Spare room after the frame.
pub trait Tailroom {
    /// Bytes the frame may still grow by at the end
    fn tailroom(&self) -> u16;
}

/// Grow the frame at the front.
pub trait Prepend {
    /// Why the frame could not grow
    type Error: Debug;
    /// Grow the frame by `len` bytes at the front, returning the whole frame.
    ///
    /// The new bytes come first; the old ones keep their values.
    ///
    /// # Errors
    ///
    /// Fails when the headroom is smaller than `len`.
    fn prepend(&mut self, len: u16) -> Result<&mut [u8], Self::Error>;
}

/// Grow the frame at the end.
pub trait Append {
    /// Why the frame could not grow
    type Error: Debug;
    /// Grow the frame by `len` bytes at the end, returning the whole frame.
    ///
    /// The value of the new bytes is unspecified.
    ///
    /// # Errors
    ///
    /// Fails when the tailroom is smaller than `len`.
    fn append(&mut self, len: u16) -> Result<&mut [u8], Self::Error>;
}

/// Shrink the frame from the front.
pub trait TrimFromStart {
    /// Why the frame could not shrink
    type Error: Debug;
    /// Hand the first `len` bytes of the frame back to the headroom, returning what is left.
    ///
    /// # Errors
    ///
    /// Fails when the frame is shorter than `len`.
    fn trim_from_start(&mut self, len: u16) -> Result<&mut [u8], Self::Error>;
}

/// Shrink the frame from the end.
pub trait TrimFromEnd {
    /// Why the frame could not shrink
    type Error: Debug;
    /// Hand the last `len` bytes of the frame back to the tailroom, returning what is left.
    ///
    /// # Errors
    ///
    /// Fails when the frame is shorter than `len`.
    fn trim_from_end(&mut self, len: u16) -> Result<&mut [u8], Self::Error>;
}

/// The headroom is too small for a [`Prepend`].
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
#[error("not enough headroom")]
pub struct NotEnoughHeadRoom;

/// The tailroom is too small for an [`Append`].
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
#[error("not enough tailroom")]
pub struct NotEnoughTailRoom;

/// The frame is too short to be trimmed by the requested amount.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
#[error("frame too short to be trimmed")]
pub struct MemoryBufferNotLongEnough;
