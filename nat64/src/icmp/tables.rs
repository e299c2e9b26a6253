// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ICMP type and code mappings (RFC 7915 sections 4.2 and 5.2)

use crate::config::{IPV6_MIN_MTU, Mtu};
use crate::error::TranslateError;

/// Extra work a translated message needs beyond its new type and code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Transform {
    Plain,
    /// Rewrite the MTU field
    PacketTooBig,
    /// Remap the parameter problem pointer
    Pointer,
    /// Point at the IPv6 next header field
    ProtocolPointer,
}

/// `(type, code)` to `(type, code)`. A code of `None` matches any code, or keeps the code as is.
#[derive(Debug)]
pub(crate) struct Rule {
    ty: u8,
    code: Option<u8>,
    new_ty: u8,
    new_code: Option<u8>,
    transform: Transform,
}

const fn rule(
    ty: u8,
    code: Option<u8>,
    new_ty: u8,
    new_code: Option<u8>,
    transform: Transform,
) -> Rule {
    Rule {
        ty,
        code,
        new_ty,
        new_code,
        transform,
    }
}

/// Outcome of a rule lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Mapped {
    pub ty: u8,
    pub code: u8,
    pub transform: Transform,
}

use Transform::{PacketTooBig, Plain, Pointer, ProtocolPointer};

pub(crate) const ICMP6_TO_ICMP4: &[Rule] = &[
    rule(128, None, 8, Some(0), Plain),
    rule(129, None, 0, Some(0), Plain),
    // destination unreachable
    rule(1, Some(0), 3, Some(1), Plain),
    rule(1, Some(2), 3, Some(1), Plain),
    rule(1, Some(3), 3, Some(1), Plain),
    rule(1, Some(1), 3, Some(10), Plain),
    rule(1, Some(4), 3, Some(3), Plain),
    // packet too big
    rule(2, None, 3, Some(4), PacketTooBig),
    // time exceeded
    rule(3, None, 11, None, Plain),
    // parameter problem
    rule(4, Some(0), 12, Some(0), Pointer),
    rule(4, Some(1), 3, Some(2), Plain),
];

pub(crate) const ICMP4_TO_ICMP6: &[Rule] = &[
    rule(8, None, 128, Some(0), Plain),
    rule(0, None, 129, Some(0), Plain),
    // destination unreachable
    rule(3, Some(0), 1, Some(0), Plain),
    rule(3, Some(1), 1, Some(0), Plain),
    rule(3, Some(2), 4, Some(1), ProtocolPointer),
    rule(3, Some(3), 1, Some(4), Plain),
    rule(3, Some(4), 2, Some(0), PacketTooBig),
    rule(3, Some(5), 1, Some(0), Plain),
    rule(3, Some(6), 1, Some(0), Plain),
    rule(3, Some(7), 1, Some(0), Plain),
    rule(3, Some(8), 1, Some(0), Plain),
    rule(3, Some(9), 1, Some(1), Plain),
    rule(3, Some(10), 1, Some(1), Plain),
    rule(3, Some(11), 1, Some(0), Plain),
    rule(3, Some(12), 1, Some(0), Plain),
    rule(3, Some(13), 1, Some(1), Plain),
    rule(3, Some(15), 1, Some(1), Plain),
    // time exceeded
    rule(11, None, 3, None, Plain),
    // parameter problem
    rule(12, Some(0), 4, Some(0), Pointer),
    rule(12, Some(2), 4, Some(0), Pointer),
];

/// Find the first rule of `table` matching `ty` and `code`.
///
/// # Errors
///
/// Returns [`TranslateError::UntranslatableIcmp`] if none matches.
pub(crate) fn lookup(table: &[Rule], ty: u8, code: u8) -> Result<Mapped, TranslateError> {
    table
        .iter()
        .find(|rule| rule.ty == ty && rule.code.is_none_or(|c| c == code))
        .map(|rule| Mapped {
            ty: rule.new_ty,
            code: rule.new_code.unwrap_or(code),
            transform: rule.transform,
        })
        .ok_or(TranslateError::UntranslatableIcmp { ty, code })
}

/// ICMPv6 error messages are the types below 128.
pub(crate) fn is_icmp6_error(ty: u8) -> bool {
    ty < 128
}

/// ICMPv4 error messages which carry a packet we know how to translate.
pub(crate) fn is_icmp4_error(ty: u8) -> bool {
    matches!(ty, 3 | 11 | 12)
}

/// Map an IPv6 parameter problem pointer to its IPv4 counterpart.
///
/// Pointers into the flow label or past the fixed header have none.
pub(crate) fn pointer_6_to_4(ptr: u32) -> Option<u8> {
    match ptr {
        0 => Some(0),
        1 => Some(1),
        4 | 5 => Some(2),
        6 => Some(9),
        7 => Some(8),
        8..=23 => Some(12),
        24..=39 => Some(16),
        _ => None,
    }
}

/// Map an IPv4 parameter problem pointer to its IPv6 counterpart.
///
/// Fields without an IPv6 equivalent (identification, fragmentation, checksum) have none.
pub(crate) fn pointer_4_to_6(ptr: u8) -> Option<u32> {
    match ptr {
        0 => Some(0),
        1 => Some(1),
        2 | 3 => Some(4),
        8 => Some(7),
        9 => Some(6),
        12..=15 => Some(8),
        16..=19 => Some(24),
        _ => None,
    }
}

/// MTU for an ICMPv4 "fragmentation needed" built from an ICMPv6 "packet too big".
///
/// `min(mtu - 20, ipv6 link - 20, ipv4 link)`, skipping the links with an unknown MTU.
/// An unset MTU in the message is taken to be the IPv4 link MTU.
pub(crate) fn mtu_6_to_4(reported: u32, links: Mtu) -> u16 {
    let reported = if reported == 0 {
        u32::from(links.ipv4)
    } else {
        reported
    };
    let mut mtu = reported.saturating_sub(20);
    if links.ipv6 > 0 {
        mtu = mtu.min(u32::from(links.ipv6).saturating_sub(20));
    }
    if links.ipv4 > 0 {
        mtu = mtu.min(u32::from(links.ipv4));
    }
    u16::try_from(mtu).unwrap_or(u16::MAX)
}

/// MTU for an ICMPv6 "packet too big" built from an ICMPv4 "fragmentation needed".
///
/// `max(1280, min(mtu + 20, ipv6 link, ipv4 link + 20))`, skipping the links with an unknown
/// MTU. An unset MTU in the message is taken to be the IPv4 link MTU.
pub(crate) fn mtu_4_to_6(reported: u16, links: Mtu) -> u32 {
    let reported = if reported == 0 { links.ipv4 } else { reported };
    let mut mtu = u32::from(reported) + 20;
    if links.ipv6 > 0 {
        mtu = mtu.min(u32::from(links.ipv6));
    }
    if links.ipv4 > 0 {
        mtu = mtu.min(u32::from(links.ipv4) + 20);
    }
    mtu.max(u32::from(IPV6_MIN_MTU))
}
