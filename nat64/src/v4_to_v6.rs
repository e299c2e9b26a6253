// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 to IPv6 translation (RFC 7915 section 4)

use crate::checksum::{PseudoHeader, adjust_pseudo, recompute};
use crate::config::TranslationConfig;
use crate::dispatch::Verdict;
use crate::error::TranslateError;
use crate::fields::{
    FRAG_LEN, IPV4_LEN, IPV6_LEN, Ipv4Fields, Ipv6Fields, set_ethertype, write_fragment_header,
};
use crate::icmp::icmp4_to_icmp6;
use net::buffer::{ByteAccess, PacketBufferMut};
use net::eth::EthType;
use net::ip::NextHeader;
use net::packet::{PacketView, TransportHeader};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, trace};

const OPT_EOL: u8 = 0;
const OPT_NOP: u8 = 1;
const OPT_LSRR: u8 = 0x83;
const OPT_SSRR: u8 = 0x89;

/// Walk the options of the IPv4 header at `net_off`, `ihl` bytes long.
///
/// Source routes cannot be honoured once translated: packets carrying one are refused.
fn check_options(data: &[u8], net_off: usize, ihl: usize) -> Result<(), TranslateError> {
    let options = data.slice_at(net_off + IPV4_LEN, ihl - IPV4_LEN)?;
    let mut cursor = 0;
    while let Some(&kind) = options.get(cursor) {
        match kind {
            OPT_EOL => break,
            OPT_NOP => cursor += 1,
            OPT_LSRR | OPT_SSRR => {
                debug!("Source route option {kind:#x}, dropping");
                return Err(TranslateError::UnsupportedExtensionHeader(kind));
            }
            _ => {
                let len = options.get(cursor + 1).map_or(0, |&len| usize::from(len));
                if len < 2 || cursor + len > options.len() {
                    return Err(TranslateError::MalformedHeader("bad ipv4 option length"));
                }
                trace!("Skipping option {kind:#x}");
                cursor += len;
            }
        }
    }
    Ok(())
}

/// Write the IPv6 header, and the fragment header of fragmented packets, replacing the IPv4
/// header whose fields are `ip4` at `net_off`.
///
/// Room must have been made: the headers written run past the end of the IPv4 header unless
/// it carried options. Returns their total length.
pub(crate) fn rewrite_header(
    data: &mut [u8],
    net_off: usize,
    ip4: &Ipv4Fields,
    src: Ipv6Addr,
    dst: Ipv6Addr,
) -> Result<usize, TranslateError> {
    let frag = ip4.frag();
    let protocol = ip4.protocol.to_ipv6();
    let (next_header, frag_len) = if frag.is_fragmented() {
        (NextHeader::FRAGMENT, FRAG_LEN)
    } else {
        (protocol, 0)
    };
    let payload_len = u16::try_from(ip4.payload_len() + frag_len)
        .map_err(|_| TranslateError::HeaderSizeOverflow)?;
    Ipv6Fields {
        traffic_class: ip4.tos,
        flow_label: 0,
        payload_len,
        next_header,
        hop_limit: ip4.ttl,
        src,
        dst,
    }
    .write(data, net_off)?;
    if frag.is_fragmented() {
        write_fragment_header(data, net_off + IPV6_LEN, protocol, &frag)?;
    }
    Ok(IPV6_LEN + frag_len)
}

/// What to do with a packet to a destination we have no mapping for.
fn unknown_destination(
    config: &TranslationConfig,
    dst: &Ipv4Addr,
) -> Result<Verdict, TranslateError> {
    if config.params().drop_unknown_mapping {
        debug!("No mapping for destination {dst}, dropping");
        return Err(TranslateError::NoMapping);
    }
    debug!("No mapping for destination {dst}, passing through");
    Ok(Verdict::PassedThrough)
}

/// Translate the IPv4 packet whose network header the packet cursor points at to IPv6.
///
/// The packet grows by the size difference of the headers: room is made at the start of the
/// buffer and the link layer headers are moved down into it.
pub(crate) fn translate<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
) -> Result<Verdict, TranslateError> {
    let net_off = usize::from(packet.network_header.offset);
    let len = packet.len();
    let ip4 = Ipv4Fields::read(packet.data(), net_off)?;
    let end = net_off + usize::from(ip4.total_len);
    if end > len {
        debug!("IPv4 total length {} overruns the frame", ip4.total_len);
        return Err(TranslateError::Truncated);
    }

    let Some(mapping) = config.find_v4_to_v6(&ip4.dst) else {
        return unknown_destination(config, &ip4.dst);
    };
    if ip4.ihl > IPV4_LEN {
        check_options(packet.data(), net_off, ip4.ihl)?;
    }
    let prefix = mapping.prefix(config).ok_or_else(|| {
        debug!("Mapping for {} has no prefix", ip4.dst);
        TranslateError::NoMapping
    })?;
    let src = prefix.synthesize(ip4.src);
    let dst = mapping.ip6;

    let frag = ip4.frag();
    if frag.is_fragmented() {
        let size =
            u32::try_from(ip4.payload_len()).map_err(|_| TranslateError::HeaderSizeOverflow)?;
        frag.validate(size, ip4.protocol == NextHeader::ICMP)?;
        if frag.is_first()
            && ip4.protocol == NextHeader::UDP
            && packet.data().read_u16_at(net_off + ip4.ihl + 6)? == 0
        {
            return Err(TranslateError::MalformedHeader(
                "fragmented udp datagram without checksum",
            ));
        }
    }

    if end < len {
        trace!("Trimming {} bytes of padding", len - end);
        let padding = u16::try_from(len - end).map_err(|_| TranslateError::HeaderSizeOverflow)?;
        packet.trim_from_end(padding)?;
    }

    let headers_len = IPV6_LEN + if frag.is_fragmented() { FRAG_LEN } else { 0 };
    let delta = headers_len.checked_sub(ip4.ihl).ok_or_else(|| {
        debug!("IPv4 header of {} bytes does not fit in IPv6 headers", ip4.ihl);
        TranslateError::HeaderSizeOverflow
    })?;
    if delta > 0 {
        let grow = u16::try_from(delta).map_err(|_| TranslateError::HeaderSizeOverflow)?;
        packet.prepend(grow)?;
        packet
            .data_mut()
            .copy_within_checked(delta..delta + net_off, 0)?;
    }

    let transport_off = net_off + rewrite_header(packet.data_mut(), net_off, &ip4, src, dst)?;
    let pseudo = PseudoHeader::V6 { src, dst };

    if frag.is_first() {
        match ip4.protocol {
            NextHeader::ICMP => {
                icmp4_to_icmp6(config, packet, net_off, transport_off, pseudo)?;
            }
            // a zero UDP checksum is replaced by a real one
            protocol if frag.is_whole() => {
                recompute(
                    packet.data_mut(),
                    transport_off,
                    ip4.payload_len(),
                    protocol,
                    pseudo,
                )?;
            }
            protocol => {
                let from = PseudoHeader::V4 {
                    src: ip4.src,
                    dst: ip4.dst,
                };
                adjust_pseudo(packet.data_mut(), transport_off, protocol, from, pseudo)?;
            }
        }
    }
    set_ethertype(packet.data_mut(), net_off, EthType::IPV6)?;

    let protocol = ip4.protocol.to_ipv6();
    packet.network_header.ty = EthType::IPV6;
    packet.transport_header = TransportHeader {
        ty: protocol,
        offset: u16::try_from(transport_off).map_err(|_| TranslateError::HeaderSizeOverflow)?,
    };
    debug!(
        "Translated {} -> {} into {src} -> {dst} ({protocol})",
        ip4.src, ip4.dst
    );
    Ok(Verdict::Translated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use etherparse::Ipv6HeaderSlice;

    fn header_with_options(options: &[u8]) -> Vec<u8> {
        let ihl = IPV4_LEN + options.len();
        let mut data = vec![0u8; ihl];
        data[0] = 0x40 | u8::try_from(ihl / 4).unwrap();
        data[IPV4_LEN..].copy_from_slice(options);
        data
    }

    #[test]
    fn options_are_walked() {
        let data = header_with_options(&[OPT_NOP, 0x44, 4, 5, 0, OPT_EOL, 0xff, 0xff]);
        assert_eq!(check_options(&data, 0, data.len()), Ok(()));
        let data = header_with_options(&[OPT_NOP, OPT_NOP, OPT_NOP, OPT_NOP]);
        assert_eq!(check_options(&data, 0, data.len()), Ok(()));
    }

    #[test]
    fn source_routes_are_refused() {
        for kind in [OPT_LSRR, OPT_SSRR] {
            let data = header_with_options(&[OPT_NOP, kind, 7, 4, 192, 0, 2, 1]);
            assert_eq!(
                check_options(&data, 0, data.len()),
                Err(TranslateError::UnsupportedExtensionHeader(kind))
            );
        }
    }

    #[test]
    fn bad_option_lengths() {
        for options in [[0x44, 1, 0, 0], [0x44, 9, 0, 0], [OPT_NOP, OPT_NOP, OPT_NOP, 0x44]] {
            let data = header_with_options(&options);
            assert!(matches!(
                check_options(&data, 0, data.len()),
                Err(TranslateError::MalformedHeader(_))
            ));
        }
    }

    #[test]
    fn fragments_get_a_fragment_header() {
        let ip4 = Ipv4Fields {
            ihl: IPV4_LEN,
            tos: 0x10,
            total_len: 1020,
            id: 0x4242,
            flags_offset: 0x2000 | 185,
            ttl: 33,
            protocol: NextHeader::ICMP,
            src: Ipv4Addr::new(198, 51, 100, 5),
            dst: Ipv4Addr::new(192, 0, 2, 5),
        };
        let src: Ipv6Addr = "64:ff9b::c633:6405".parse().unwrap();
        let dst: Ipv6Addr = "2001:db8::5".parse().unwrap();
        let mut data = vec![0u8; 48];
        assert_eq!(rewrite_header(&mut data, 0, &ip4, src, dst).unwrap(), 48);

        let slice = Ipv6HeaderSlice::from_slice(&data).unwrap();
        assert_eq!(slice.payload_length(), 1008);
        assert_eq!(slice.next_header(), etherparse::IpNumber::IPV6_FRAGMENTATION_HEADER);
        assert_eq!(slice.hop_limit(), 33);
        assert_eq!(slice.traffic_class(), 0x10);
        assert_eq!(data[40], NextHeader::ICMP6.as_u8());
        assert_eq!(u16::from_be_bytes([data[42], data[43]]), (185 << 3) | 1);
        assert_eq!(&data[44..48], &[0, 0, 0x42, 0x42]);
    }
}
