// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Translation configuration: address mappings, NAT64 prefixes and MTUs.
//!
//! A [`TranslationConfig`] is built once per configuration generation and is never mutated
//! afterwards. Generations are handed to the data path with [`ConfigWriter`].

pub mod rw;
pub mod spec;

pub use rw::{ConfigReader, ConfigWriter};
pub use spec::{MappingSpec, Nat64ConfigSpec};

use derive_builder::Builder;
use ipnet::Ipv6Net;
use lpm::prefix::{IpPrefix, Ipv4Prefix, Ipv6Prefix};
use lpm::trie::{PrefixMapTrie, TrieMap};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// Smallest MTU an IPv6 link may have (RFC 8200).
pub const IPV6_MIN_MTU: u16 = 1280;
/// Smallest MTU an IPv4 link may have (RFC 791).
pub const IPV4_MIN_MTU: u16 = 68;

/// Errors found while building a [`TranslationConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("prefix index {0} does not exist")]
    InvalidPrefixIndex(usize),
    #[error("bad NAT64 prefix: {0}")]
    BadPrefix(String),
    #[error("address {0} is already mapped")]
    DuplicateMapping(String),
    #[error("bad MTU: {0:?}")]
    BadMtu(Mtu),
    #[error("bad translation parameters: {0}")]
    BadParams(String),
}

/// A 96-bit prefix to embed IPv4 addresses in (RFC 6052, /96 format).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Nat64Prefix([u8; 12]);

impl Nat64Prefix {
    /// Length of the prefix in bits
    pub const LEN: u8 = 96;
    /// The well-known prefix 64:ff9b::/96
    pub const WELL_KNOWN: Nat64Prefix =
        Nat64Prefix([0x00, 0x64, 0xff, 0x9b, 0, 0, 0, 0, 0, 0, 0, 0]);

    #[must_use]
    pub const fn new(octets: [u8; 12]) -> Self {
        Self(octets)
    }

    #[must_use]
    pub const fn octets(&self) -> [u8; 12] {
        self.0
    }

    /// The IPv4-embedded IPv6 address of `addr`.
    #[must_use]
    pub fn synthesize(&self, addr: Ipv4Addr) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets[..12].copy_from_slice(&self.0);
        octets[12..].copy_from_slice(&addr.octets());
        Ipv6Addr::from(octets)
    }

    /// This prefix, as something a trie can store.
    #[must_use]
    pub fn as_prefix(&self) -> Ipv6Prefix {
        Ipv6Prefix::new_masked(self.synthesize(Ipv4Addr::UNSPECIFIED), Self::LEN)
    }
}

impl From<[u8; 12]> for Nat64Prefix {
    fn from(octets: [u8; 12]) -> Self {
        Self(octets)
    }
}

impl From<Ipv6Addr> for Nat64Prefix {
    /// Keeps the upper 96 bits.
    fn from(addr: Ipv6Addr) -> Self {
        let mut octets = [0u8; 12];
        octets.copy_from_slice(&addr.octets()[..12]);
        Self(octets)
    }
}

impl TryFrom<Ipv6Net> for Nat64Prefix {
    type Error = ConfigError;

    fn try_from(net: Ipv6Net) -> Result<Self, Self::Error> {
        if net.prefix_len() != Self::LEN || net.trunc() != net {
            return Err(ConfigError::BadPrefix(format!("{net} is not a /96 prefix")));
        }
        Ok(Self::from(net.network()))
    }
}

impl Display for Nat64Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_prefix())
    }
}

/// One-to-one association of an IPv4 and an IPv6 address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressMapping {
    pub ip4: Ipv4Addr,
    pub ip6: Ipv6Addr,
    /// Index of the prefix used to represent IPv4 peers of `ip6`
    pub prefix_index: usize,
}

impl AddressMapping {
    /// The NAT64 prefix of this mapping, if it exists in `config`.
    #[must_use]
    pub fn prefix<'a>(&self, config: &'a TranslationConfig) -> Option<&'a Nat64Prefix> {
        config.prefixes.get(self.prefix_index)
    }
}

/// Link MTUs on either side of the translator. Zero means unknown.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mtu {
    pub ipv4: u16,
    pub ipv6: u16,
}

impl Default for Mtu {
    fn default() -> Self {
        Self {
            ipv4: 1450,
            ipv6: IPV6_MIN_MTU,
        }
    }
}

impl Mtu {
    fn validate(self) -> Result<Self, ConfigError> {
        let ipv4_ok = self.ipv4 == 0 || self.ipv4 >= IPV4_MIN_MTU;
        let ipv6_ok = self.ipv6 == 0 || self.ipv6 >= IPV6_MIN_MTU;
        if ipv4_ok && ipv6_ok {
            Ok(self)
        } else {
            Err(ConfigError::BadMtu(self))
        }
    }
}

/// Translation knobs which are not address mappings.
#[derive(Builder, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Nat64Params {
    #[builder(default)]
    pub mtu: Mtu,
    /// Drop IPv6 packets from sources outside of every NAT64 prefix
    #[builder(default = true)]
    pub drop_unknown_prefix: bool,
    /// Drop packets whose address has no mapping
    #[builder(default = true)]
    pub drop_unknown_mapping: bool,
}

impl Default for Nat64Params {
    fn default() -> Self {
        Self {
            mtu: Mtu::default(),
            drop_unknown_prefix: true,
            drop_unknown_mapping: true,
        }
    }
}

/// Read-only state the translator works from.
#[derive(Debug, Clone, Default)]
pub struct TranslationConfig {
    mappings: Vec<AddressMapping>,
    prefixes: Vec<Nat64Prefix>,
    v4_to_v6: PrefixMapTrie<Ipv4Prefix, usize>,
    v6_to_v4: PrefixMapTrie<Ipv6Prefix, usize>,
    prefix_lpm: PrefixMapTrie<Ipv6Prefix, usize>,
    params: Nat64Params,
}

impl TranslationConfig {
    #[must_use]
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder::default()
    }

    /// Mapping of an IPv6 address.
    #[must_use]
    pub fn find_v6_to_v4(&self, addr: &Ipv6Addr) -> Option<&AddressMapping> {
        let (_, index) = self.v6_to_v4.lookup(addr)?;
        self.mappings.get(*index)
    }

    /// Mapping of an IPv4 address.
    #[must_use]
    pub fn find_v4_to_v6(&self, addr: &Ipv4Addr) -> Option<&AddressMapping> {
        let (_, index) = self.v4_to_v6.lookup(addr)?;
        self.mappings.get(*index)
    }

    /// NAT64 prefix covering an IPv6 address.
    #[must_use]
    pub fn find_prefix(&self, addr: &Ipv6Addr) -> Option<&Nat64Prefix> {
        let (_, index) = self.prefix_lpm.lookup(addr)?;
        self.prefixes.get(*index)
    }

    #[must_use]
    pub fn mappings(&self) -> &[AddressMapping] {
        &self.mappings
    }

    #[must_use]
    pub fn prefixes(&self) -> &[Nat64Prefix] {
        &self.prefixes
    }

    #[must_use]
    pub fn params(&self) -> &Nat64Params {
        &self.params
    }

    #[must_use]
    pub fn mtu(&self) -> Mtu {
        self.params.mtu
    }
}

/// Builds a [`TranslationConfig`], checking every entry as it is added.
#[derive(Debug, Default)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    /// Register a NAT64 prefix, returning its index.
    pub fn add_prefix(&mut self, prefix: impl Into<Nat64Prefix>) -> Result<usize, ConfigError> {
        let prefix = prefix.into();
        let key = prefix.as_prefix();
        if self.config.prefix_lpm.get(&key).is_some() {
            return Err(ConfigError::BadPrefix(format!("{prefix} is already configured")));
        }
        let index = self.config.prefixes.len();
        self.config.prefixes.push(prefix);
        self.config.prefix_lpm.insert(key, index);
        debug!("Added NAT64 prefix {prefix} at index {index}");
        Ok(index)
    }

    /// Register a mapping between `ip4` and `ip6`, returning its index.
    pub fn add_mapping(
        &mut self,
        ip4: Ipv4Addr,
        ip6: Ipv6Addr,
        prefix_index: usize,
    ) -> Result<usize, ConfigError> {
        if prefix_index >= self.config.prefixes.len() {
            return Err(ConfigError::InvalidPrefixIndex(prefix_index));
        }
        let key4 = Ipv4Prefix::from(ip4);
        let key6 = Ipv6Prefix::from(ip6);
        if self.config.v4_to_v6.get(&key4).is_some() {
            return Err(ConfigError::DuplicateMapping(ip4.to_string()));
        }
        if self.config.v6_to_v4.get(&key6).is_some() {
            return Err(ConfigError::DuplicateMapping(ip6.to_string()));
        }
        let index = self.config.mappings.len();
        self.config.mappings.push(AddressMapping {
            ip4,
            ip6,
            prefix_index,
        });
        self.config.v4_to_v6.insert(key4, index);
        self.config.v6_to_v4.insert(key6, index);
        debug!("Added mapping {ip4} <-> {ip6}");
        Ok(index)
    }

    /// Set the link MTUs.
    pub fn mtu(&mut self, mtu: Mtu) -> Result<&mut Self, ConfigError> {
        self.config.params.mtu = mtu.validate()?;
        Ok(self)
    }

    /// Choose what happens to packets without a mapping (or, for IPv6, outside of every
    /// prefix): drop them, or let them through untranslated.
    pub fn drop_unknown(&mut self, prefix: bool, mapping: bool) -> &mut Self {
        self.config.params.drop_unknown_prefix = prefix;
        self.config.params.drop_unknown_mapping = mapping;
        self
    }

    /// Replace all parameters at once.
    pub fn params(&mut self, params: Nat64Params) -> Result<&mut Self, ConfigError> {
        params.mtu.validate()?;
        self.config.params = params;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> TranslationConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn prefix() -> Nat64Prefix {
        "2001:db8::".parse::<Ipv6Addr>().unwrap().into()
    }

    #[test]
    fn prefix_synthesis() {
        let addr = prefix().synthesize(Ipv4Addr::new(198, 51, 100, 5));
        assert_eq!(addr, "2001:db8::c633:6405".parse::<Ipv6Addr>().unwrap());
        assert_eq!(
            Nat64Prefix::WELL_KNOWN.to_string(),
            "64:ff9b::/96".to_string()
        );
        assert_eq!(
            Nat64Prefix::try_from("64:ff9b::/96".parse::<Ipv6Net>().unwrap()),
            Ok(Nat64Prefix::WELL_KNOWN)
        );
        assert!(matches!(
            Nat64Prefix::try_from("64:ff9b::/64".parse::<Ipv6Net>().unwrap()),
            Err(ConfigError::BadPrefix(_))
        ));
    }

    #[test]
    fn lookups() {
        let mut builder = TranslationConfig::builder();
        let index = builder.add_prefix(prefix()).unwrap();
        let ip4 = Ipv4Addr::new(192, 0, 2, 10);
        let ip6: Ipv6Addr = "2001:db8:1::10".parse().unwrap();
        builder.add_mapping(ip4, ip6, index).unwrap();
        let config = builder.build();

        let by4 = config.find_v4_to_v6(&ip4).unwrap();
        assert_eq!(by4.ip6, ip6);
        assert_eq!(by4.prefix(&config), Some(&prefix()));
        assert_eq!(config.find_v6_to_v4(&ip6).unwrap().ip4, ip4);
        assert!(config.find_v4_to_v6(&Ipv4Addr::new(192, 0, 2, 11)).is_none());

        let synthesized = prefix().synthesize(Ipv4Addr::new(203, 0, 113, 1));
        assert_eq!(config.find_prefix(&synthesized), Some(&prefix()));
        assert!(config.find_prefix(&ip6).is_none());
    }

    #[test]
    fn builder_rejects_bad_input() {
        let mut builder = TranslationConfig::builder();
        let ip4 = Ipv4Addr::new(192, 0, 2, 10);
        let ip6: Ipv6Addr = "2001:db8:1::10".parse().unwrap();
        assert_eq!(
            builder.add_mapping(ip4, ip6, 0),
            Err(ConfigError::InvalidPrefixIndex(0))
        );
        let index = builder.add_prefix(prefix()).unwrap();
        assert!(builder.add_prefix(prefix()).is_err());
        builder.add_mapping(ip4, ip6, index).unwrap();
        assert!(matches!(
            builder.add_mapping(ip4, "2001:db8:1::11".parse().unwrap(), index),
            Err(ConfigError::DuplicateMapping(_))
        ));
        assert!(matches!(
            builder.add_mapping(Ipv4Addr::new(192, 0, 2, 11), ip6, index),
            Err(ConfigError::DuplicateMapping(_))
        ));
        let low = Mtu {
            ipv4: 1500,
            ipv6: 1000,
        };
        assert_eq!(builder.mtu(low).err(), Some(ConfigError::BadMtu(low)));
        let unset = Mtu { ipv4: 0, ipv6: 0 };
        builder.mtu(unset).unwrap().drop_unknown(false, true);
        let config = builder.build();
        assert_eq!(config.mtu(), unset);
        assert!(!config.params().drop_unknown_prefix);
        assert!(config.params().drop_unknown_mapping);
    }

    #[test]
    fn out_of_range_indices_are_misses() {
        let mut config = TranslationConfig::default();
        let ip4 = Ipv4Addr::new(192, 0, 2, 10);
        let ip6: Ipv6Addr = "2001:db8:1::10".parse().unwrap();
        config.v4_to_v6.insert(Ipv4Prefix::from(ip4), 3);
        config.v6_to_v4.insert(Ipv6Prefix::from(ip6), 3);
        config.prefix_lpm.insert(prefix().as_prefix(), 1);
        assert!(config.find_v4_to_v6(&ip4).is_none());
        assert!(config.find_v6_to_v4(&ip6).is_none());
        assert!(config.find_prefix(&prefix().synthesize(ip4)).is_none());

        let mapping = AddressMapping {
            ip4,
            ip6,
            prefix_index: 7,
        };
        assert!(mapping.prefix(&config).is_none());
    }

    #[test]
    fn params_builder_defaults() {
        let params = Nat64ParamsBuilder::default().build().unwrap();
        assert_eq!(params, Nat64Params::default());
        let params = Nat64ParamsBuilder::default()
            .drop_unknown_mapping(false)
            .build()
            .unwrap();
        assert!(params.drop_unknown_prefix);
        assert!(!params.drop_unknown_mapping);
        assert_eq!(params.mtu.ipv4, 1450);
    }
}
