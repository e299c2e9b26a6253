// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Frame builders for tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub use crate::buffer::TestBuffer;
use crate::checksum::ipv4_header_checksum;
use crate::eth::ETH_HEADER_LEN;
use crate::packet::PacketView;
use etherparse::PacketBuilder;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Source mac of every frame built here
pub const SRC_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 1];
/// Destination mac of every frame built here
pub const DST_MAC: [u8; 6] = [0x02, 0, 0, 0, 0, 2];
/// Hop limit / TTL of every frame built here
pub const TTL: u8 = 64;
/// UDP source port
pub const SPORT: u16 = 4000;
/// UDP destination port
pub const DPORT: u16 = 53;

macro_rules! build {
    ($builder:expr, $payload:expr) => {{
        let builder = $builder;
        let mut out = Vec::with_capacity(builder.size($payload.len()));
        builder.write(&mut out, $payload).unwrap();
        out
    }};
}

#[must_use]
/// Builds a UDP/IPv4/Eth frame
pub fn ipv4_udp_frame(src: Ipv4Addr, dst: Ipv4Addr, payload: &[u8]) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv4(src.octets(), dst.octets(), TTL)
            .udp(SPORT, DPORT),
        payload
    )
}

#[must_use]
/// Builds a TCP/IPv4/Eth frame
pub fn ipv4_tcp_frame(src: Ipv4Addr, dst: Ipv4Addr, payload: &[u8]) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv4(src.octets(), dst.octets(), TTL)
            .tcp(SPORT, DPORT, 1, 1024),
        payload
    )
}

#[must_use]
/// Builds an ICMP echo request/IPv4/Eth frame
pub fn ipv4_echo_frame(src: Ipv4Addr, dst: Ipv4Addr, id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv4(src.octets(), dst.octets(), TTL)
            .icmpv4_echo_request(id, seq),
        payload
    )
}

#[must_use]
/// Builds an ICMP/IPv4/Eth frame of arbitrary type and code.
///
/// `rest` is the second 32-bit word of the ICMP header.
pub fn ipv4_icmp_frame(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    ty: u8,
    code: u8,
    rest: [u8; 4],
    payload: &[u8],
) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv4(src.octets(), dst.octets(), TTL)
            .icmpv4_raw(ty, code, rest),
        payload
    )
}

#[must_use]
/// Builds a UDP/IPv6/Eth frame
pub fn ipv6_udp_frame(src: Ipv6Addr, dst: Ipv6Addr, payload: &[u8]) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv6(src.octets(), dst.octets(), TTL)
            .udp(SPORT, DPORT),
        payload
    )
}

#[must_use]
/// Builds a TCP/IPv6/Eth frame
pub fn ipv6_tcp_frame(src: Ipv6Addr, dst: Ipv6Addr, payload: &[u8]) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv6(src.octets(), dst.octets(), TTL)
            .tcp(SPORT, DPORT, 1, 1024),
        payload
    )
}

#[must_use]
/// Builds an ICMPv6 echo request/IPv6/Eth frame
pub fn ipv6_echo_frame(src: Ipv6Addr, dst: Ipv6Addr, id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv6(src.octets(), dst.octets(), TTL)
            .icmpv6_echo_request(id, seq),
        payload
    )
}

#[must_use]
/// Builds an ICMPv6/IPv6/Eth frame of arbitrary type and code.
///
/// `rest` is the second 32-bit word of the ICMPv6 header.
pub fn ipv6_icmp_frame(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    ty: u8,
    code: u8,
    rest: [u8; 4],
    payload: &[u8],
) -> Vec<u8> {
    build!(
        PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv6(src.octets(), dst.octets(), TTL)
            .icmpv6_raw(ty, code, rest),
        payload
    )
}

#[must_use]
/// Strip the ethernet header of a frame, leaving the IP packet.
pub fn ip_packet(frame: &[u8]) -> Vec<u8> {
    frame[ETH_HEADER_LEN as usize..].to_vec()
}

#[must_use]
/// Insert 802.1Q tags with the given VLAN ids right after the mac addresses.
pub fn with_vlan_tags(frame: &[u8], vids: &[u16]) -> Vec<u8> {
    let mut out = frame[..12].to_vec();
    for vid in vids {
        out.extend_from_slice(&0x8100u16.to_be_bytes());
        out.extend_from_slice(&(vid & 0x0fff).to_be_bytes());
    }
    out.extend_from_slice(&frame[12..]);
    out
}

/// Overwrite the type-of-service byte of the IPv4 header at `net_offset` and fix its checksum.
pub fn set_ipv4_tos(frame: &mut [u8], net_offset: usize, tos: u8) {
    frame[net_offset + 1] = tos;
    fix_ipv4_checksum(frame, net_offset);
}

/// Recompute the checksum of the IPv4 header at `net_offset`.
pub fn fix_ipv4_checksum(frame: &mut [u8], net_offset: usize) {
    let ihl = usize::from(frame[net_offset] & 0x0f) * 4;
    let checksum = ipv4_header_checksum(&frame[net_offset..net_offset + ihl]);
    frame[net_offset + 10..net_offset + 12].copy_from_slice(&checksum.to_be_bytes());
}

#[must_use]
/// Parse a frame into a [`PacketView`] backed by a [`TestBuffer`].
pub fn packet_from_frame(frame: &[u8]) -> PacketView<TestBuffer> {
    PacketView::parse(TestBuffer::from_raw_data(frame)).expect("test frame should parse")
}
