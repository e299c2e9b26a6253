// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Translation failures

use crate::frag::FragmentError;
use net::buffer::OutOfBounds;
use net::packet::{DoneReason, ResizeError};

/// Why a packet could not be translated.
///
/// Every failure is packet scoped: the packet is dropped and processing goes on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    /// No address mapping (or prefix) covers the address to translate
    #[error("no address mapping")]
    NoMapping,
    /// IPv6 extension header chain violates ordering, cardinality or length rules
    #[error("malformed extension header chain: {0}")]
    MalformedExtensionHeader(&'static str),
    /// Extension header (or IPv4 option) that cannot be translated
    #[error("unsupported extension header {0}")]
    UnsupportedExtensionHeader(u8),
    /// Fragment metadata fails validation
    #[error("invalid fragment: {0}")]
    InvalidFragment(#[from] FragmentError),
    /// ICMP message without a counterpart in the other protocol
    #[error("untranslatable icmp message type {ty} code {code}")]
    UntranslatableIcmp {
        /// message type
        ty: u8,
        /// message code
        code: u8,
    },
    /// The translated headers would not fit
    #[error("header size overflow")]
    HeaderSizeOverflow,
    /// The packet buffer refused to grow or shrink
    #[error("packet buffer operation failed")]
    BufferOperationFailed,
    /// The packet ends before a header it announces
    #[error("truncated packet")]
    Truncated,
    /// Fixed header fields disagree with each other or with the frame
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),
    /// Neither IPv4 nor IPv6
    #[error("not an ip packet")]
    NotIp,
}

impl TranslateError {
    /// The verdict to record on a packet which failed translation.
    #[must_use]
    pub fn done_reason(&self) -> DoneReason {
        match self {
            TranslateError::NoMapping => DoneReason::Filtered,
            TranslateError::MalformedExtensionHeader(_)
            | TranslateError::InvalidFragment(_)
            | TranslateError::Truncated
            | TranslateError::MalformedHeader(_) => DoneReason::Malformed,
            TranslateError::UnsupportedExtensionHeader(_)
            | TranslateError::UntranslatableIcmp { .. }
            | TranslateError::HeaderSizeOverflow => DoneReason::Unhandled,
            TranslateError::BufferOperationFailed => DoneReason::InternalFailure,
            TranslateError::NotIp => DoneReason::NotIp,
        }
    }
}

impl From<OutOfBounds> for TranslateError {
    fn from(_: OutOfBounds) -> Self {
        TranslateError::Truncated
    }
}

impl From<ResizeError> for TranslateError {
    fn from(_: ResizeError) -> Self {
        TranslateError::BufferOperationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::TranslateError;
    use crate::frag::FragmentError;
    use net::buffer::{ByteAccess, OutOfBounds};
    use net::packet::DoneReason;

    fn read_past_end() -> Result<u16, TranslateError> {
        Ok([0u8; 3].read_u16_at(2)?)
    }

    #[test]
    fn conversions() {
        assert_eq!(read_past_end(), Err(TranslateError::Truncated));
        let oob = OutOfBounds {
            offset: 0,
            len: 1,
            available: 0,
        };
        assert_eq!(TranslateError::from(oob), TranslateError::Truncated);
        assert_eq!(
            TranslateError::from(FragmentError::Icmp),
            TranslateError::InvalidFragment(FragmentError::Icmp)
        );
    }

    #[test]
    fn verdicts() {
        assert_eq!(TranslateError::NoMapping.done_reason(), DoneReason::Filtered);
        assert_eq!(
            TranslateError::InvalidFragment(FragmentError::Misaligned(100)).done_reason(),
            DoneReason::Malformed
        );
        assert_eq!(
            TranslateError::UnsupportedExtensionHeader(51).done_reason(),
            DoneReason::Unhandled
        );
        assert_eq!(
            TranslateError::BufferOperationFailed.done_reason(),
            DoneReason::InternalFailure
        );
        assert_eq!(TranslateError::NotIp.done_reason(), DoneReason::NotIp);
    }
}
