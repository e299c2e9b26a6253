// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ICMPv4 to ICMPv6 (RFC 7915 section 4.2)

use super::tables::{self, ICMP4_TO_ICMP6, Transform};
use super::{ICMP_HEADER_LEN, retype_echo};
use crate::checksum::{PseudoHeader, adjust_pseudo, has_checksum, recompute};
use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::fields::{FRAG_LEN, IPV6_LEN, Ipv4Fields};
use crate::v4_to_v6::rewrite_header;
use net::buffer::{ByteAccess, PacketBufferMut};
use net::ip::NextHeader;
use net::packet::PacketView;
use tracing::{debug, trace};

/// Offset of the next header field in the IPv6 header.
const NEXT_HEADER_POINTER: u32 = 6;

/// Translate the ICMPv4 message at `icmp_off`, which runs to the end of the packet, once the
/// IPv6 header at `ipv6_off` has been written.
///
/// Error messages have the packet they carry translated too, which may grow or shrink the
/// packet. The payload length of the outer header is set from the final packet length.
pub(crate) fn icmp4_to_icmp6<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
    ipv6_off: usize,
    icmp_off: usize,
    pseudo: PseudoHeader,
) -> Result<(), TranslateError> {
    let data = packet.data_mut();
    let ty = data.read_u8_at(icmp_off)?;
    let code = data.read_u8_at(icmp_off + 1)?;
    let mapped = tables::lookup(ICMP4_TO_ICMP6, ty, code)?;
    debug!("ICMPv4 {ty}/{code} becomes ICMPv6 {}/{}", mapped.ty, mapped.code);

    match mapped.transform {
        Transform::PacketTooBig => {
            let reported = data.read_u16_at(icmp_off + 6)?;
            let mtu = tables::mtu_4_to_6(reported, config.mtu());
            trace!("MTU {reported} -> {mtu}");
            data.write_u32_at(icmp_off + 4, mtu)?;
        }
        Transform::Pointer => {
            let pointer = data.read_u8_at(icmp_off + 4)?;
            let Some(mapped_pointer) = tables::pointer_4_to_6(pointer) else {
                debug!("Pointer {pointer} has no IPv6 counterpart");
                return Err(TranslateError::UntranslatableIcmp { ty, code });
            };
            data.write_u32_at(icmp_off + 4, mapped_pointer)?;
        }
        Transform::ProtocolPointer => data.write_u32_at(icmp_off + 4, NEXT_HEADER_POINTER)?,
        Transform::Plain if tables::is_icmp4_error(ty) => data.write_u32_at(icmp_off + 4, 0)?,
        Transform::Plain => {}
    }
    data.write_u8_at(icmp_off, mapped.ty)?;
    data.write_u8_at(icmp_off + 1, mapped.code)?;

    if tables::is_icmp4_error(ty) {
        embedded(config, packet, ipv6_off, icmp_off + ICMP_HEADER_LEN)?;
    }

    let len = packet.len();
    let data = packet.data_mut();
    let payload_len =
        u16::try_from(len - ipv6_off - IPV6_LEN).map_err(|_| TranslateError::HeaderSizeOverflow)?;
    data.write_u16_at(ipv6_off + 4, payload_len)?;
    recompute(data, icmp_off, len - icmp_off, NextHeader::ICMP6, pseudo)
}

/// Translate the IPv4 packet carried by an error message, at `emb_off`, to IPv6.
///
/// The message is cut so that the outer packet fits the IPv6 link MTU, when known.
fn embedded<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
    ipv6_off: usize,
    emb_off: usize,
) -> Result<(), TranslateError> {
    let len = packet.len();
    let ip4 = Ipv4Fields::read(packet.data(), emb_off)?;
    if emb_off + ip4.ihl > len {
        return Err(TranslateError::Truncated);
    }

    // the packet was sent by the host we map to the remote IPv4 host
    let mapping = config.find_v4_to_v6(&ip4.src).ok_or_else(|| {
        debug!("No mapping for embedded source {}", ip4.src);
        TranslateError::NoMapping
    })?;
    let prefix = mapping.prefix(config).ok_or(TranslateError::NoMapping)?;
    let src = mapping.ip6;
    let dst = prefix.synthesize(ip4.dst);

    let frag = ip4.frag();
    let headers_len = IPV6_LEN + if frag.is_fragmented() { FRAG_LEN } else { 0 };
    let grow = headers_len
        .checked_sub(ip4.ihl)
        .ok_or(TranslateError::HeaderSizeOverflow)?;
    let mtu = usize::from(config.mtu().ipv6);
    let mut target = len + grow;
    if mtu > 0 {
        target = target.min(ipv6_off + mtu);
    }
    let transport_off = emb_off + headers_len;
    if target < transport_off {
        return Err(TranslateError::HeaderSizeOverflow);
    }
    let present = target - transport_off;
    if target > len {
        let more = u16::try_from(target - len).map_err(|_| TranslateError::HeaderSizeOverflow)?;
        packet.append(more)?;
    }

    let data = packet.data_mut();
    let payload_off = emb_off + ip4.ihl;
    data.copy_within_checked(payload_off..payload_off + present, transport_off)?;
    rewrite_header(data, emb_off, &ip4, src, dst)?;

    if frag.is_first() {
        let declared = ip4.payload_len();
        let to = PseudoHeader::V6 { src, dst };
        match ip4.protocol {
            NextHeader::ICMP => {
                if present < 4 {
                    return Err(TranslateError::Truncated);
                }
                let inner_ty = data.read_u8_at(transport_off)?;
                let new_ty = match inner_ty {
                    8 => 128,
                    0 => 129,
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
                    0,
                    to.sum(NextHeader::ICMP6, declared),
                )?;
            }
            protocol if has_checksum(protocol, present) => {
                if frag.is_whole() && present >= declared {
                    recompute(data, transport_off, declared, protocol, to)?;
                } else {
                    let from = PseudoHeader::V4 {
                        src: ip4.src,
                        dst: ip4.dst,
                    };
                    adjust_pseudo(data, transport_off, protocol, from, to)?;
                }
            }
            protocol => trace!("Embedded {protocol} header left as is"),
        }
    }

    if target < len {
        let less = u16::try_from(len - target).map_err(|_| TranslateError::HeaderSizeOverflow)?;
        packet.trim_from_end(less)?;
    }
    Ok(())
}
