// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ICMPv6 to ICMPv4 (RFC 7915 section 5.2)

use super::tables::{self, ICMP6_TO_ICMP4, Transform};
use super::{ICMP_HEADER_LEN, retype_echo};
use crate::checksum::{PseudoHeader, adjust_pseudo, has_checksum, recompute};
use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::exthdr;
use crate::fields::{IPV6_LEN, Ipv6Fields, embedded_ipv4, write_ipv4_checksum};
use crate::v6_to_v4::rewrite_header;
use net::buffer::{ByteAccess, PacketBufferMut};
use net::ip::NextHeader;
use net::packet::PacketView;
use tracing::{debug, trace};

/// Translate the ICMPv6 message at `icmp_off`, which runs to the end of the packet, once the
/// IPv4 header at `ipv4_off` has been written.
///
/// Error messages have the packet they carry translated too. The packet then shrinks and the
/// total length of the outer IPv4 header follows.
pub(crate) fn icmp6_to_icmp4<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
    ipv4_off: usize,
    icmp_off: usize,
    pseudo: PseudoHeader,
) -> Result<(), TranslateError> {
    let data = packet.data_mut();
    let ty = data.read_u8_at(icmp_off)?;
    let code = data.read_u8_at(icmp_off + 1)?;
    let mapped = tables::lookup(ICMP6_TO_ICMP4, ty, code)?;
    debug!("ICMPv6 {ty}/{code} becomes ICMPv4 {}/{}", mapped.ty, mapped.code);

    match mapped.transform {
        Transform::PacketTooBig => {
            let reported = data.read_u32_at(icmp_off + 4)?;
            let mtu = tables::mtu_6_to_4(reported, config.mtu());
            trace!("MTU {reported} -> {mtu}");
            data.write_u16_at(icmp_off + 4, 0)?;
            data.write_u16_at(icmp_off + 6, mtu)?;
        }
        Transform::Pointer => {
            let pointer = data.read_u32_at(icmp_off + 4)?;
            let Some(mapped_pointer) = tables::pointer_6_to_4(pointer) else {
                debug!("Pointer {pointer} has no IPv4 counterpart");
                return Err(TranslateError::UntranslatableIcmp { ty, code });
            };
            data.write_u32_at(icmp_off + 4, u32::from(mapped_pointer) << 24)?;
        }
        Transform::Plain if tables::is_icmp6_error(ty) => data.write_u32_at(icmp_off + 4, 0)?,
        Transform::Plain | Transform::ProtocolPointer => {}
    }
    data.write_u8_at(icmp_off, mapped.ty)?;
    data.write_u8_at(icmp_off + 1, mapped.code)?;

    if tables::is_icmp6_error(ty) {
        let shrink = embedded(config, packet, icmp_off + ICMP_HEADER_LEN)?;
        let data = packet.data_mut();
        let total = data
            .read_u16_at(ipv4_off + 2)?
            .checked_sub(shrink)
            .ok_or(TranslateError::Truncated)?;
        data.write_u16_at(ipv4_off + 2, total)?;
    }

    let len = packet.len();
    recompute(packet.data_mut(), icmp_off, len - icmp_off, NextHeader::ICMP, pseudo)
}

/// Translate the IPv6 packet carried by an error message, at `emb_off`, to IPv4.
///
/// Returns by how many bytes the packet shrank.
fn embedded<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
    emb_off: usize,
) -> Result<u16, TranslateError> {
    let len = packet.len();
    let data = packet.data_mut();
    let ip6 = Ipv6Fields::read(data, emb_off)?;
    let chain = exthdr::walk(data, emb_off + IPV6_LEN, ip6.next_header)?;

    // the packet was sent by the remote IPv4 host to the IPv6 host we map
    let mapping = config.find_v6_to_v4(&ip6.dst).ok_or_else(|| {
        debug!("No mapping for embedded destination {}", ip6.dst);
        TranslateError::NoMapping
    })?;
    let src = embedded_ipv4(&ip6.src);
    let dst = mapping.ip4;

    let fields = rewrite_header(data, emb_off, &ip6, &chain, src, dst)?;
    let transport_off = emb_off + IPV6_LEN + chain.len;
    let ipv4_off = transport_off - fields.ihl;

    if chain.frag.is_first() {
        let declared = fields.payload_len();
        let present = len - transport_off;
        let from = PseudoHeader::V6 {
            src: ip6.src,
            dst: ip6.dst,
        };
        match chain.next_header {
            NextHeader::ICMP6 => {
                let inner_ty = data.read_u8_at(transport_off)?;
                let new_ty = match inner_ty {
                    128 => 8,
                    129 => 0,
                    _ => {
                        return Err(TranslateError::UntranslatableIcmp {
                            ty: inner_ty,
                            code: data.read_u8_at(transport_off + 1)?,
                        });
                    }
                };
                retype_echo(
                    data,
                    transport_off,
                    new_ty,
                    from.sum(NextHeader::ICMP6, declared),
                    0,
                )?;
            }
            protocol if has_checksum(protocol, present) => {
                let to = PseudoHeader::V4 { src, dst };
                if chain.frag.is_whole() && present >= declared {
                    recompute(data, transport_off, declared, protocol, to)?;
                } else {
                    adjust_pseudo(data, transport_off, protocol, from, to)?;
                }
            }
            protocol => trace!("Embedded {protocol} header left as is"),
        }
    }
    write_ipv4_checksum(data, ipv4_off)?;

    data.copy_within_checked(ipv4_off..len, emb_off)?;
    let shrink = u16::try_from(ipv4_off - emb_off).map_err(|_| TranslateError::HeaderSizeOverflow)?;
    packet.trim_from_end(shrink)?;
    Ok(shrink)
}
