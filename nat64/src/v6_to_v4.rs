// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv6 to IPv4 translation (RFC 7915 section 5)

use crate::checksum::{PseudoHeader, adjust_pseudo, recompute};
use crate::config::TranslationConfig;
use crate::dispatch::Verdict;
use crate::error::TranslateError;
use crate::exthdr::{self, ExtensionChain};
use crate::fields::{
    IPV4_LEN, IPV6_LEN, Ipv4Fields, Ipv6Fields, embedded_ipv4, set_ethertype, write_ipv4_checksum,
};
use crate::icmp::icmp6_to_icmp4;
use net::buffer::{ByteAccess, PacketBufferMut};
use net::eth::EthType;
use net::ip::NextHeader;
use net::packet::{PacketView, TransportHeader};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, trace};

/// Write the IPv4 header replacing the IPv6 header at `net_off` and its extension headers.
///
/// The new header ends where the extension headers end, the transport header stays in place.
/// The header checksum is left to the caller.
pub(crate) fn rewrite_header(
    data: &mut [u8],
    net_off: usize,
    ip6: &Ipv6Fields,
    chain: &ExtensionChain,
    src: Ipv4Addr,
    dst: Ipv4Addr,
) -> Result<Ipv4Fields, TranslateError> {
    let transport_len = usize::from(ip6.payload_len)
        .checked_sub(chain.len)
        .ok_or(TranslateError::MalformedHeader(
            "payload shorter than its extension headers",
        ))?;
    let total_len =
        u16::try_from(transport_len + IPV4_LEN).map_err(|_| TranslateError::HeaderSizeOverflow)?;
    let [_, _, id_hi, id_lo] = chain.frag.id.to_be_bytes();
    let fields = Ipv4Fields {
        ihl: IPV4_LEN,
        tos: ip6.traffic_class,
        total_len,
        id: u16::from_be_bytes([id_hi, id_lo]),
        flags_offset: chain.frag.ipv4_frag_field(),
        ttl: ip6.hop_limit,
        protocol: chain.next_header.to_ipv4(),
        src,
        dst,
    };
    fields.write(data, net_off + IPV6_LEN + chain.len - IPV4_LEN)?;
    Ok(fields)
}

/// What to do with a packet from a source we have no mapping for.
fn unknown_source(config: &TranslationConfig, src: &Ipv6Addr) -> Result<Verdict, TranslateError> {
    let params = config.params();
    if params.drop_unknown_prefix && config.find_prefix(src).is_none() {
        debug!("Source {src} is outside of all NAT64 prefixes, dropping");
        return Err(TranslateError::NoMapping);
    }
    if params.drop_unknown_mapping {
        debug!("No mapping for source {src}, dropping");
        return Err(TranslateError::NoMapping);
    }
    debug!("No mapping for source {src}, passing through");
    Ok(Verdict::PassedThrough)
}

/// Translate the IPv6 packet whose network header the packet cursor points at to IPv4.
///
/// The packet shrinks by the size difference of the headers: the link layer headers are moved
/// up and the start of the buffer trimmed.
pub(crate) fn translate<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
) -> Result<Verdict, TranslateError> {
    let net_off = usize::from(packet.network_header.offset);
    let len = packet.len();
    let ip6 = Ipv6Fields::read(packet.data(), net_off)?;
    let end = net_off + IPV6_LEN + usize::from(ip6.payload_len);
    if end > len {
        debug!("IPv6 payload length {} overruns the frame", ip6.payload_len);
        return Err(TranslateError::Truncated);
    }

    let Some(mapping) = config.find_v6_to_v4(&ip6.src) else {
        return unknown_source(config, &ip6.src);
    };
    let src = mapping.ip4;
    let dst = embedded_ipv4(&ip6.dst);

    let chain = exthdr::walk(
        packet.data().slice_at(0, end)?,
        net_off + IPV6_LEN,
        ip6.next_header,
    )?;
    if chain.frag.is_fragmented() {
        let size = u32::try_from(usize::from(ip6.payload_len).saturating_sub(chain.len))
            .map_err(|_| TranslateError::HeaderSizeOverflow)?;
        chain
            .frag
            .validate(size, chain.next_header == NextHeader::ICMP6)?;
    }

    if end < len {
        trace!("Trimming {} bytes of padding", len - end);
        let padding = u16::try_from(len - end).map_err(|_| TranslateError::HeaderSizeOverflow)?;
        packet.trim_from_end(padding)?;
    }

    let delta = IPV6_LEN + chain.len - IPV4_LEN;
    let ipv4_off = net_off + delta;
    let transport_off = ipv4_off + IPV4_LEN;
    let fields = rewrite_header(packet.data_mut(), net_off, &ip6, &chain, src, dst)?;
    let pseudo = PseudoHeader::V4 { src, dst };

    if chain.frag.is_first() {
        match chain.next_header {
            NextHeader::ICMP6 => {
                icmp6_to_icmp4(config, packet, ipv4_off, transport_off, pseudo)?;
            }
            protocol if chain.frag.is_whole() => {
                recompute(
                    packet.data_mut(),
                    transport_off,
                    fields.payload_len(),
                    protocol,
                    pseudo,
                )?;
            }
            protocol => {
                let from = PseudoHeader::V6 {
                    src: ip6.src,
                    dst: ip6.dst,
                };
                adjust_pseudo(packet.data_mut(), transport_off, protocol, from, pseudo)?;
            }
        }
    }

    let data = packet.data_mut();
    write_ipv4_checksum(data, ipv4_off)?;
    data.copy_within_checked(0..net_off, delta)?;
    let delta = u16::try_from(delta).map_err(|_| TranslateError::HeaderSizeOverflow)?;
    packet.trim_from_start(delta)?;
    set_ethertype(packet.data_mut(), net_off, EthType::IPV4)?;

    packet.network_header.ty = EthType::IPV4;
    packet.transport_header = TransportHeader {
        ty: fields.protocol,
        offset: u16::try_from(net_off + IPV4_LEN)
            .map_err(|_| TranslateError::HeaderSizeOverflow)?,
    };
    debug!(
        "Translated {} -> {} into {src} -> {dst} ({})",
        ip6.src, ip6.dst, fields.protocol
    );
    Ok(Verdict::Translated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frag::FragmentDescriptor;
    use etherparse::Ipv4HeaderSlice;

    fn ipv6(payload_len: u16) -> Ipv6Fields {
        Ipv6Fields {
            traffic_class: 0x20,
            flow_label: 0x12345,
            payload_len,
            next_header: NextHeader::FRAGMENT,
            hop_limit: 9,
            src: "2001:db8::5".parse().unwrap(),
            dst: "64:ff9b::c633:6405".parse().unwrap(),
        }
    }

    #[test]
    fn header_lands_before_the_transport() {
        let chain = ExtensionChain {
            next_header: NextHeader::ICMP6,
            frag: FragmentDescriptor {
                fragmented: true,
                offset_units: 0x10,
                more: true,
                id: 0xdead_beef,
            },
            len: 8,
        };
        let mut data = vec![0u8; 48];
        let src = Ipv4Addr::new(192, 0, 2, 5);
        let dst = Ipv4Addr::new(198, 51, 100, 5);
        let fields = rewrite_header(&mut data, 0, &ipv6(24), &chain, src, dst).unwrap();
        assert_eq!(fields.total_len, 36);
        assert_eq!(fields.protocol, NextHeader::ICMP);
        write_ipv4_checksum(&mut data, 28).unwrap();

        let slice = Ipv4HeaderSlice::from_slice(&data[28..]).unwrap();
        assert_eq!(slice.identification(), 0xbeef);
        assert_eq!(slice.fragments_offset().value(), 0x10);
        assert!(slice.more_fragments());
        assert!(!slice.dont_fragment());
        assert_eq!(slice.ttl(), 9);
        assert_eq!(slice.source_addr(), src);
        assert_eq!(slice.destination_addr(), dst);
        assert_eq!(slice.to_header().calc_header_checksum(), slice.header_checksum());
    }

    #[test]
    fn lengths_must_add_up() {
        let chain = ExtensionChain {
            next_header: NextHeader::UDP,
            frag: FragmentDescriptor::default(),
            len: 16,
        };
        let mut data = vec![0u8; 64];
        let any = Ipv4Addr::UNSPECIFIED;
        assert!(matches!(
            rewrite_header(&mut data, 0, &ipv6(8), &chain, any, any),
            Err(TranslateError::MalformedHeader(_))
        ));
    }
}
