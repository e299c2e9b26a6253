// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Base Ethernet / VLAN / IPv4 / IPv6 parsing.
//!
//! Only the header cursors are produced here; IPv6 extension headers are left in place for
//! whoever needs to walk them.

use crate::eth::{ETH_HEADER_LEN, EthType, VLAN_TAG_LEN};
use crate::ip::{IPV6_HEADER_LEN, NextHeader};
use crate::packet::{NetworkHeader, TransportHeader};
use etherparse::{Ethernet2HeaderSlice, Ipv4HeaderSlice, Ipv6HeaderSlice, SingleVlanHeaderSlice};
use tracing::trace;

/// Maximum number of stacked VLAN tags we look through.
pub const MAX_VLANS: usize = 2;

/// Errors which may occur while locating the headers of a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The frame is shorter than an ethernet header
    #[error("not an ethernet frame: {0}")]
    NotEthernet(String),
    /// A VLAN tag was cut short
    #[error("truncated vlan tag: {0}")]
    Vlan(String),
    /// More tags than [`MAX_VLANS`]
    #[error("too many vlan tags")]
    TooManyVlans,
    /// Invalid or truncated IPv4 header
    #[error("invalid ipv4 header: {0}")]
    Ipv4(String),
    /// Invalid or truncated IPv6 header
    #[error("invalid ipv6 header: {0}")]
    Ipv6(String),
}

fn tail(data: &[u8], offset: u16) -> &[u8] {
    data.get(offset as usize..).unwrap_or_default()
}

/// Locate the network and transport headers of an ethernet frame.
///
/// Frames carrying neither IPv4 nor IPv6 are accepted: the transport cursor then points at the
/// network offset with a reserved protocol value.
///
/// # Errors
///
/// Returns a [`ParseError`] if a header which is announced is missing or invalid.
pub fn parse_cursors(data: &[u8]) -> Result<(NetworkHeader, TransportHeader), ParseError> {
    let eth =
        Ethernet2HeaderSlice::from_slice(data).map_err(|e| ParseError::NotEthernet(e.to_string()))?;
    let mut ty = EthType::from(eth.ether_type());
    let mut offset = ETH_HEADER_LEN;
    let mut tags = 0;
    while ty.is_vlan() {
        if tags == MAX_VLANS {
            return Err(ParseError::TooManyVlans);
        }
        let vlan = SingleVlanHeaderSlice::from_slice(tail(data, offset))
            .map_err(|e| ParseError::Vlan(e.to_string()))?;
        ty = EthType::from(vlan.ether_type());
        offset += VLAN_TAG_LEN;
        tags += 1;
    }
    let network = NetworkHeader { ty, offset };
    let transport = if ty == EthType::IPV4 {
        let ipv4 = Ipv4HeaderSlice::from_slice(tail(data, offset))
            .map_err(|e| ParseError::Ipv4(e.to_string()))?;
        TransportHeader {
            ty: NextHeader::from(ipv4.protocol()),
            offset: offset + u16::from(ipv4.ihl()) * 4,
        }
    } else if ty == EthType::IPV6 {
        let ipv6 = Ipv6HeaderSlice::from_slice(tail(data, offset))
            .map_err(|e| ParseError::Ipv6(e.to_string()))?;
        TransportHeader {
            ty: NextHeader::from(ipv6.next_header()),
            offset: offset + IPV6_HEADER_LEN,
        }
    } else {
        TransportHeader {
            ty: NextHeader::RESERVED,
            offset,
        }
    };
    trace!("parsed cursors: {network:?} {transport:?}");
    Ok((network, transport))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{ParseError, parse_cursors};
    use crate::eth::EthType;
    use crate::ip::NextHeader;
    use crate::packet::test_utils::{ipv4_udp_frame, ipv6_udp_frame, with_vlan_tags};
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn ipv4_cursors() {
        let frame = ipv4_udp_frame(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2), b"hi");
        let (net, transport) = parse_cursors(&frame).unwrap();
        assert_eq!(net.ty, EthType::IPV4);
        assert_eq!(net.offset, 14);
        assert_eq!(transport.ty, NextHeader::UDP);
        assert_eq!(transport.offset, 34);
    }

    #[test]
    fn ipv6_cursors_behind_two_tags() {
        let frame = ipv6_udp_frame(Ipv6Addr::LOCALHOST, Ipv6Addr::LOCALHOST, b"hi");
        let frame = with_vlan_tags(&frame, &[100, 200]);
        let (net, transport) = parse_cursors(&frame).unwrap();
        assert_eq!(net.ty, EthType::IPV6);
        assert_eq!(net.offset, 22);
        assert_eq!(transport.ty, NextHeader::UDP);
        assert_eq!(transport.offset, 62);
    }

    #[test]
    fn three_tags_are_refused() {
        let frame = ipv6_udp_frame(Ipv6Addr::LOCALHOST, Ipv6Addr::LOCALHOST, b"hi");
        let frame = with_vlan_tags(&frame, &[1, 2, 3]);
        assert_eq!(parse_cursors(&frame), Err(ParseError::TooManyVlans));
    }

    #[test]
    fn truncated_ip_header_is_refused() {
        let frame = ipv4_udp_frame(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2), b"");
        assert!(matches!(
            parse_cursors(&frame[..30]),
            Err(ParseError::Ipv4(_))
        ));
        assert!(matches!(
            parse_cursors(&frame[..10]),
            Err(ParseError::NotEthernet(_))
        ));
    }

    #[test]
    fn non_ip_frames_only_get_a_network_cursor() {
        let mut frame = [0u8; 60];
        frame[12..14].copy_from_slice(&0x0806u16.to_be_bytes());
        let (net, transport) = parse_cursors(&frame).unwrap();
        assert_eq!(net.ty, EthType::new(0x0806));
        assert_eq!(transport.ty, NextHeader::RESERVED);
        assert_eq!(transport.offset, net.offset);
    }
}
