// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet type related fields

use etherparse::EtherType;
use std::fmt::{Display, Formatter};

/// Length of an untagged ethernet header.
pub const ETH_HEADER_LEN: u16 = 14;
/// Length of a single 802.1Q / 802.1ad tag.
pub const VLAN_TAG_LEN: u16 = 4;

/// The ethernet header's ethertype field.
///
/// This is a transparent wrapper around the type provided by etherparse.
/// It is what the packet's network cursor records as the "type" of the network header.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EthType(pub(crate) EtherType);

impl EthType {
    /// Ethernet type for [IPv4](https://en.wikipedia.org/wiki/IPv4)
    pub const IPV4: EthType = EthType(EtherType::IPV4);
    /// Ethernet type for [IPv6](https://en.wikipedia.org/wiki/IPv6)
    pub const IPV6: EthType = EthType(EtherType::IPV6);
    /// Ethernet type for [VLAN](https://en.wikipedia.org/wiki/IEEE_802.1Q)
    pub const VLAN: EthType = EthType(EtherType::VLAN_TAGGED_FRAME);
    /// Ethernet type for [QinQ (old standard ethtype)](https://en.wikipedia.org/wiki/IEEE_802.1ad#cite_ref-2)
    pub const VLAN_DOUBLE_TAGGED: EthType = EthType(EtherType::VLAN_DOUBLE_TAGGED_FRAME);
    /// Ethernet type for [QinQ (aka provider bridging)](https://en.wikipedia.org/wiki/IEEE_802.1ad)
    pub const VLAN_QINQ: EthType = EthType(EtherType::PROVIDER_BRIDGING);

    /// Map a raw (native-endian) u16 into an [`EthType`]
    #[must_use]
    pub const fn new(raw: u16) -> EthType {
        EthType(EtherType(raw))
    }

    /// get the raw `u16` value (native-endian)
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0.0
    }

    /// True for the ethertypes announcing a VLAN tag.
    #[must_use]
    pub const fn is_vlan(self) -> bool {
        let raw = self.raw();
        raw == EtherType::VLAN_TAGGED_FRAME.0
            || raw == EtherType::VLAN_DOUBLE_TAGGED_FRAME.0
            || raw == EtherType::PROVIDER_BRIDGING.0
    }
}

impl From<EtherType> for EthType {
    fn from(value: EtherType) -> Self {
        EthType(value)
    }
}

impl Display for EthType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.raw())
    }
}
