// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Helper methods and types which are common between IPv4 and IPv6

use etherparse::IpNumber;
use std::fmt::{Display, Formatter};

/// Length of an IPv4 header without options.
pub const IPV4_MIN_HEADER_LEN: u16 = 20;
/// Length of the fixed IPv6 header.
pub const IPV6_HEADER_LEN: u16 = 40;
/// Length of the IPv6 fragment extension header.
pub const IPV6_FRAGMENT_HEADER_LEN: u16 = 8;

/// Thin wrapper around [`IpNumber`]
///
/// Used both for the IPv4 protocol field and for IPv6 next-header values (extension headers
/// included).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NextHeader(IpNumber);

impl From<NextHeader> for IpNumber {
    fn from(value: NextHeader) -> Self {
        value.0
    }
}

impl From<IpNumber> for NextHeader {
    fn from(value: IpNumber) -> Self {
        NextHeader(value)
    }
}

impl NextHeader {
    /// IPv6 Hop-by-Hop options
    pub const HOP_BY_HOP: NextHeader = NextHeader(IpNumber::IPV6_HEADER_HOP_BY_HOP);
    /// ICMP (v4)
    pub const ICMP: NextHeader = NextHeader(IpNumber::ICMP);
    /// TCP
    pub const TCP: NextHeader = NextHeader(IpNumber::TCP);
    /// UDP
    pub const UDP: NextHeader = NextHeader(IpNumber::UDP);
    /// IPv6 routing header
    pub const ROUTING: NextHeader = NextHeader(IpNumber::IPV6_ROUTE_HEADER);
    /// IPv6 fragment header
    pub const FRAGMENT: NextHeader = NextHeader(IpNumber::IPV6_FRAGMENTATION_HEADER);
    /// IPsec encapsulating security payload
    pub const ESP: NextHeader = NextHeader(IpNumber::ENCAPSULATING_SECURITY_PAYLOAD);
    /// IPsec authentication header
    pub const AUTH: NextHeader = NextHeader(IpNumber::AUTHENTICATION_HEADER);
    /// ICMPv6
    pub const ICMP6: NextHeader = NextHeader(IpNumber::IPV6_ICMP);
    /// IPv6 destination options
    pub const DEST_OPTS: NextHeader = NextHeader(IpNumber::IPV6_DESTINATION_OPTIONS);
    /// Reserved value (255), used when there is no transport header to speak of
    pub const RESERVED: NextHeader = NextHeader(IpNumber(255));

    /// Generate a new [`NextHeader`]
    #[must_use]
    pub const fn new(inner: u8) -> Self {
        Self(IpNumber(inner))
    }

    /// Return the [`NextHeader`] represented as a `u8`
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0.0
    }

    /// Map ICMPv6 to ICMP, leaving every other protocol as is.
    #[must_use]
    pub fn to_ipv4(self) -> Self {
        if self == Self::ICMP6 { Self::ICMP } else { self }
    }

    /// Map ICMP to ICMPv6, leaving every other protocol as is.
    #[must_use]
    pub fn to_ipv6(self) -> Self {
        if self == Self::ICMP { Self::ICMP6 } else { self }
    }
}

impl Display for NextHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
