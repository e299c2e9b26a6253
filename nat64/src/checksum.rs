// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transport checksum recomputation after a change of network header.

use crate::error::TranslateError;
use net::buffer::ByteAccess;
use net::checksum::{finish, fold, ipv4_pseudo_header_sum, ipv6_pseudo_header_sum, raw_sum};
use net::ip::NextHeader;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Addresses of the network header a transport checksum depends on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PseudoHeader {
    V4 { src: Ipv4Addr, dst: Ipv4Addr },
    V6 { src: Ipv6Addr, dst: Ipv6Addr },
}

impl PseudoHeader {
    /// Full pseudo header sum for a segment of `len` bytes.
    pub(crate) fn sum(&self, protocol: NextHeader, len: usize) -> u32 {
        match *self {
            #[allow(clippy::cast_possible_truncation)] // IPv4 lengths fit in 16 bits
            PseudoHeader::V4 { src, dst } => {
                ipv4_pseudo_header_sum(src, dst, protocol.as_u8(), len as u16)
            }
            #[allow(clippy::cast_possible_truncation)]
            PseudoHeader::V6 { src, dst } => {
                ipv6_pseudo_header_sum(src, dst, protocol.as_u8(), len as u32)
            }
        }
    }

    /// Sum of the addresses alone.
    ///
    /// Protocol and length are left out as they are preserved by translation.
    pub(crate) fn addr_sum(&self) -> u32 {
        match *self {
            PseudoHeader::V4 { src, dst } => raw_sum(&dst.octets(), raw_sum(&src.octets(), 0)),
            PseudoHeader::V6 { src, dst } => raw_sum(&dst.octets(), raw_sum(&src.octets(), 0)),
        }
    }
}

/// Offset of the checksum field within a transport header.
pub(crate) fn checksum_offset(protocol: NextHeader) -> Option<usize> {
    match protocol {
        NextHeader::UDP => Some(6),
        NextHeader::TCP => Some(16),
        NextHeader::ICMP | NextHeader::ICMP6 => Some(2),
        _ => None,
    }
}

/// Recompute the checksum of the complete transport segment `data[offset..offset + len]`.
///
/// ICMPv4 has no pseudo header. A UDP checksum computing to zero is stored as all ones.
/// Protocols without a checksum are left alone.
///
/// # Errors
///
/// Returns [`TranslateError::Truncated`] if the segment does not fit.
pub(crate) fn recompute(
    data: &mut [u8],
    offset: usize,
    len: usize,
    protocol: NextHeader,
    pseudo: PseudoHeader,
) -> Result<(), TranslateError> {
    let Some(field) = checksum_offset(protocol) else {
        return Ok(());
    };
    data.write_u16_at(offset + field, 0)?;
    let initial = if protocol == NextHeader::ICMP {
        0
    } else {
        pseudo.sum(protocol, len)
    };
    let mut checksum = finish(raw_sum(data.slice_at(offset, len)?, initial));
    if protocol == NextHeader::UDP && checksum == 0 {
        checksum = 0xffff;
    }
    data.write_u16_at(offset + field, checksum)?;
    Ok(())
}

/// True if a transport header of `present` bytes reaches past its checksum field.
pub(crate) fn has_checksum(protocol: NextHeader, present: usize) -> bool {
    checksum_offset(protocol).is_some_and(|field| present >= field + 2)
}

/// Incrementally update a checksum (RFC 1624 eqn. 3): the words summing to `old` are replaced
/// by words summing to `new`.
#[must_use]
pub(crate) fn adjust(checksum: u16, old: u32, new: u32) -> u16 {
    !fold(u32::from(!checksum) + u32::from(!fold(old)) + u32::from(fold(new)))
}

/// Patch the checksum of a transport header whose payload is not (all) there, for a change of
/// pseudo header from `from` to `to`.
///
/// A zero UDP checksum means none was computed and stays that way.
///
/// # Errors
///
/// Returns [`TranslateError::Truncated`] if the checksum field does not fit.
pub(crate) fn adjust_pseudo(
    data: &mut [u8],
    offset: usize,
    protocol: NextHeader,
    from: PseudoHeader,
    to: PseudoHeader,
) -> Result<(), TranslateError> {
    let Some(field) = checksum_offset(protocol) else {
        return Ok(());
    };
    let current = data.read_u16_at(offset + field)?;
    if protocol == NextHeader::UDP && current == 0 {
        return Ok(());
    }
    let mut checksum = adjust(current, from.addr_sum(), to.addr_sum());
    if protocol == NextHeader::UDP && checksum == 0 {
        checksum = 0xffff;
    }
    data.write_u16_at(offset + field, checksum)?;
    Ok(())
}
