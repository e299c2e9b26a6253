// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A packet buffer together with the header cursors filled in by parsing.

mod meta;

#[cfg(any(doc, test, feature = "test_buffer"))]
pub mod test_utils;

use crate::buffer::PacketBufferMut;
use crate::eth::EthType;
use crate::ip::NextHeader;
use crate::parse::{ParseError, parse_cursors};
#[allow(unused_imports)] // re-export
pub use meta::*;
use tracing::debug;

/// Location and type of the network header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NetworkHeader {
    /// Ethertype announcing the network header
    pub ty: EthType,
    /// Offset of the network header from the start of the frame
    pub offset: u16,
}

/// Location and type of the transport header.
///
/// For IPv6 the offset may initially point at the first extension header; the type is then the
/// next-header value of the fixed header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransportHeader {
    /// Protocol (or next-header) value
    pub ty: NextHeader,
    /// Offset of the header from the start of the frame
    pub offset: u16,
}

/// A failed resize of the underlying packet buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResizeError {
    /// Not enough headroom
    #[error("cannot prepend {0} bytes")]
    Prepend(u16),
    /// Not enough tailroom
    #[error("cannot append {0} bytes")]
    Append(u16),
    /// Buffer too short
    #[error("cannot trim {0} bytes from the start")]
    TrimFromStart(u16),
    /// Buffer too short
    #[error("cannot trim {0} bytes from the end")]
    TrimFromEnd(u16),
}

/// A frame and the header cursors describing it.
///
/// The view owns the buffer while a stage works on it; the cursors and the buffer contents are
/// mutated in place.
#[derive(Debug)]
pub struct PacketView<Buf: PacketBufferMut> {
    buf: Buf,
    /// Network header cursor
    pub network_header: NetworkHeader,
    /// Transport header cursor
    pub transport_header: TransportHeader,
    /// packet metadata added by stages to drive other stages down the pipeline
    pub meta: PacketMeta,
}

/// Errors which may occur when failing to produce a [`PacketView`]
#[derive(Debug, thiserror::Error)]
#[error("invalid packet: {error}")]
pub struct InvalidPacket<Buf: PacketBufferMut> {
    #[allow(unused)]
    mbuf: Buf,
    #[source]
    error: ParseError,
}

impl<Buf: PacketBufferMut> InvalidPacket<Buf> {
    /// The reason why parsing failed.
    #[must_use]
    pub fn error(&self) -> &ParseError {
        &self.error
    }

    /// Give back the buffer which could not be parsed.
    #[must_use]
    pub fn into_buffer(self) -> Buf {
        self.mbuf
    }
}

impl<Buf: PacketBufferMut> PacketView<Buf> {
    /// Wrap a buffer whose cursors are already known.
    #[must_use]
    pub fn new(buf: Buf, network_header: NetworkHeader, transport_header: TransportHeader) -> Self {
        Self {
            buf,
            network_header,
            transport_header,
            meta: PacketMeta::default(),
        }
    }

    /// Map a `PacketBufferMut` to a `PacketView` if the buffer contains an ethernet frame.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidPacket`] error if the buffer does not parse as an ethernet frame.
    pub fn parse(buf: Buf) -> Result<Self, InvalidPacket<Buf>> {
        match parse_cursors(buf.as_ref()) {
            Ok((network_header, transport_header)) => {
                Ok(Self::new(buf, network_header, transport_header))
            }
            Err(error) => {
                debug!("failed to parse packet: {error}");
                Err(InvalidPacket { mbuf: buf, error })
            }
        }
    }

    /// The frame bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// The frame bytes, mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Length of the frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// True if the frame holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Give up the view and get the buffer back.
    #[must_use]
    pub fn into_buffer(self) -> Buf {
        self.buf
    }

    /// Grow the frame at the front. Existing bytes keep their values but move `len` bytes up.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Prepend`] if the buffer lacks headroom.
    pub fn prepend(&mut self, len: u16) -> Result<(), ResizeError> {
        self.buf.prepend(len).map(|_| ()).map_err(|e| {
            debug!("prepend failed: {e:?}");
            ResizeError::Prepend(len)
        })
    }

    /// Grow the frame at the end. The new bytes are unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Append`] if the buffer lacks tailroom.
    pub fn append(&mut self, len: u16) -> Result<(), ResizeError> {
        self.buf.append(len).map(|_| ()).map_err(|e| {
            debug!("append failed: {e:?}");
            ResizeError::Append(len)
        })
    }

    /// Drop `len` bytes from the front of the frame.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::TrimFromStart`] if the frame is shorter than `len`.
    pub fn trim_from_start(&mut self, len: u16) -> Result<(), ResizeError> {
        self.buf.trim_from_start(len).map(|_| ()).map_err(|e| {
            debug!("trim from start failed: {e:?}");
            ResizeError::TrimFromStart(len)
        })
    }

    /// Drop `len` bytes from the end of the frame.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::TrimFromEnd`] if the frame is shorter than `len`.
    pub fn trim_from_end(&mut self, len: u16) -> Result<(), ResizeError> {
        self.buf.trim_from_end(len).map(|_| ()).map_err(|e| {
            debug!("trim from end failed: {e:?}");
            ResizeError::TrimFromEnd(len)
        })
    }
}

impl<Buf: PacketBufferMut> PacketView<Buf> {
    /// Mark the packet as done, unless it already carries a verdict.
    pub fn done(&mut self, reason: DoneReason) {
        if self.meta.done.is_none() {
            self.meta.done = Some(reason);
        }
    }

    /// Like [`PacketView::done`] but overwrites any earlier verdict.
    pub fn done_force(&mut self, reason: DoneReason) {
        self.meta.done = Some(reason);
    }

    /// Tell if a packet has been marked as done.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.meta.done.is_some()
    }

    /// Get the reason why a packet has been marked as done.
    #[must_use]
    pub fn get_done(&self) -> Option<DoneReason> {
        self.meta.done
    }

    /// Consume the packet if it was marked as done for any reason but delivery.
    #[must_use]
    pub fn enforce(self) -> Option<Self> {
        match self.get_done() {
            Some(DoneReason::Delivered) | None => Some(self),
            Some(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{DoneReason, PacketView};
    use crate::buffer::TestBuffer;
    use crate::eth::EthType;
    use crate::packet::test_utils::ipv4_udp_frame;
    use std::net::Ipv4Addr;

    fn packet() -> PacketView<TestBuffer> {
        let frame = ipv4_udp_frame(Ipv4Addr::new(192, 0, 2, 1), Ipv4Addr::new(192, 0, 2, 2), &[]);
        PacketView::parse(TestBuffer::from_raw_data(&frame)).unwrap()
    }

    #[test]
    fn first_verdict_wins() {
        let mut packet = packet();
        assert!(!packet.is_done());
        packet.done(DoneReason::Filtered);
        packet.done(DoneReason::Malformed);
        assert_eq!(packet.get_done(), Some(DoneReason::Filtered));
        packet.done_force(DoneReason::Delivered);
        assert_eq!(packet.get_done(), Some(DoneReason::Delivered));
        assert!(packet.enforce().is_some());
    }

    #[test]
    fn enforce_drops_done_packets() {
        let mut packet = packet();
        packet.done(DoneReason::Unhandled);
        assert!(packet.enforce().is_none());
    }

    #[test]
    fn resize_reports_failures() {
        let mut packet = packet();
        assert_eq!(packet.network_header.ty, EthType::IPV4);
        let len = packet.len();
        packet.prepend(4).unwrap();
        assert_eq!(packet.len(), len + 4);
        assert!(packet.prepend(TestBuffer::HEADROOM).is_err());
        packet.trim_from_start(4).unwrap();
        packet.append(2).unwrap();
        packet.trim_from_end(2).unwrap();
        assert_eq!(packet.len(), len);
        assert!(packet.trim_from_end(u16::MAX).is_err());
    }
}
