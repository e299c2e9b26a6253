// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 and IPv6 prefixes which can be stored in a longest prefix match trie.

use ipnet::{Ipv4Net, Ipv6Net};
use num_traits::{CheckedShr, PrimInt, Unsigned, Zero};
use std::fmt::{Debug, Display};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    #[error("Invalid Prefix: {0}")]
    Invalid(String),
    #[error("Mask length {0} is invalid")]
    InvalidLength(u8),
}

/// An address which has an unsigned integer representation.
pub trait Representable {
    type Repr: Unsigned + PrimInt + Zero + CheckedShr;

    fn to_bits(&self) -> Self::Repr;
    fn from_bits(repr: Self::Repr) -> Self;
}

impl Representable for Ipv4Addr {
    type Repr = u32;

    fn to_bits(&self) -> u32 {
        Ipv4Addr::to_bits(*self)
    }

    fn from_bits(repr: u32) -> Self {
        Ipv4Addr::from_bits(repr)
    }
}

impl Representable for Ipv6Addr {
    type Repr = u128;

    fn to_bits(&self) -> u128 {
        Ipv6Addr::to_bits(*self)
    }

    fn from_bits(repr: u128) -> Self {
        Ipv6Addr::from_bits(repr)
    }
}

#[allow(clippy::len_without_is_empty)]
pub trait IpPrefix: Debug + Clone + From<Self::Addr> + PartialEq {
    type Repr: Debug + Unsigned + PrimInt + Zero + CheckedShr;
    type Addr: Display + Debug + Clone + Eq + Representable<Repr = Self::Repr>;
    const MAX_LEN: u8;

    const ROOT: Self;

    /// Build a prefix from its network address and length.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is greater than `Self::MAX_LEN` or if `addr` has host bits
    /// set.
    fn new(addr: Self::Addr, len: u8) -> Result<Self, PrefixError>;

    /// Build a prefix, clearing host bits and clamping the length to `Self::MAX_LEN`.
    fn new_masked(addr: Self::Addr, len: u8) -> Self;

    fn network(&self) -> Self::Addr;

    fn len(&self) -> u8;
}

pub trait IpPrefixCovering<Other> {
    fn covers(&self, other: &Other) -> bool;
}

macro_rules! ip_prefix {
    ($prefix:ident, $net:ty, $addr:ty, $repr:ty, $max:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $prefix($net);

        impl Debug for $prefix {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{self}")
            }
        }

        impl Default for $prefix {
            fn default() -> Self {
                $prefix::ROOT
            }
        }

        impl Display for $prefix {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $prefix {
            fn mask(len: u8) -> $repr {
                <$repr>::MAX.unbounded_shl(u32::from($max - len))
            }
        }

        impl IpPrefix for $prefix {
            type Repr = $repr;
            type Addr = $addr;
            const MAX_LEN: u8 = $max;

            const ROOT: $prefix = $prefix(<$net>::new_assert(<$addr>::from_bits(0), 0));

            fn new(addr: $addr, len: u8) -> Result<Self, PrefixError> {
                if len > Self::MAX_LEN {
                    return Err(PrefixError::InvalidLength(len));
                }
                let masked = <$addr>::from_bits(addr.to_bits() & Self::mask(len));
                if masked != addr {
                    return Err(PrefixError::Invalid(format!(
                        "{addr}/{len} has host bits set, {masked}/{len} would be correct"
                    )));
                }
                <$net>::new(addr, len)
                    .map(Self)
                    .map_err(|e| PrefixError::Invalid(e.to_string()))
            }

            fn new_masked(addr: $addr, len: u8) -> Self {
                let len = len.min(Self::MAX_LEN);
                Self(<$net>::new_assert(addr, len).trunc())
            }

            fn network(&self) -> $addr {
                self.0.network()
            }

            fn len(&self) -> u8 {
                self.0.prefix_len()
            }
        }

        impl IpPrefixCovering<$addr> for $prefix {
            fn covers(&self, other: &$addr) -> bool {
                self.0.contains(other)
            }
        }

        impl IpPrefixCovering<$prefix> for $prefix {
            fn covers(&self, other: &$prefix) -> bool {
                self.0.contains(&other.0)
            }
        }

        impl From<$addr> for $prefix {
            fn from(addr: $addr) -> Self {
                Self(<$net>::from(addr))
            }
        }

        impl From<$net> for $prefix {
            /// Host bits set in the address are zeroed as they make no sense for a prefix.
            fn from(value: $net) -> Self {
                Self(value.trunc())
            }
        }

        impl From<$prefix> for $net {
            fn from(value: $prefix) -> Self {
                value.0
            }
        }

        impl FromStr for $prefix {
            type Err = PrefixError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (addr, len) = s
                    .split_once('/')
                    .ok_or(PrefixError::Invalid(s.to_string()))?;
                let addr = addr
                    .parse::<$addr>()
                    .map_err(|_| PrefixError::Invalid(s.to_string()))?;
                let len = len
                    .parse::<u8>()
                    .map_err(|_| PrefixError::Invalid(s.to_string()))?;
                Self::new(addr, len)
            }
        }
    };
}

ip_prefix!(Ipv4Prefix, Ipv4Net, Ipv4Addr, u32, 32);
ip_prefix!(Ipv6Prefix, Ipv6Net, Ipv6Addr, u128, 128);

#[cfg(any(test, feature = "testing"))]
mod contract {
    use crate::prefix::{IpPrefix, Ipv4Prefix, Ipv6Prefix};
    use bolero::{Driver, TypeGenerator};
    use std::net::{Ipv4Addr, Ipv6Addr};

    impl TypeGenerator for Ipv4Prefix {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let addr = Ipv4Addr::from_bits(driver.produce()?);
            let len: u8 = driver.produce()?;
            Some(Ipv4Prefix::new_masked(addr, len % (Ipv4Prefix::MAX_LEN + 1)))
        }
    }

    impl TypeGenerator for Ipv6Prefix {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let addr = Ipv6Addr::from_bits(driver.produce()?);
            let len: u8 = driver.produce()?;
            Some(Ipv6Prefix::new_masked(addr, len % (Ipv6Prefix::MAX_LEN + 1)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_prefix_from_str() {
        let prefix = "192.168.1.0/24".parse::<Ipv4Prefix>().unwrap();
        assert_eq!(prefix.network(), Ipv4Addr::new(192, 168, 1, 0));
        assert!(matches!(
            "192.168.1.1/24".parse::<Ipv4Prefix>(),
            Err(PrefixError::Invalid(_))
        ));
        assert_eq!(
            "192.168.1.0/33".parse::<Ipv4Prefix>(),
            Err(PrefixError::InvalidLength(33))
        );
    }

    #[test]
    fn test_ipv6_prefix_from_str() {
        let prefix = "64:ff9b::/96".parse::<Ipv6Prefix>().unwrap();
        assert_eq!(prefix.network(), Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0, 0));
        assert_eq!(prefix.len(), 96);
        assert!("64:ff9b::1/96".parse::<Ipv6Prefix>().is_err());
    }

    #[test]
    fn test_covers() {
        let prefix = "64:ff9b::/96".parse::<Ipv6Prefix>().unwrap();
        assert!(prefix.covers(&Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0xc000, 0x0201)));
        assert!(!prefix.covers(&Ipv6Addr::new(0x64, 0xff9b, 1, 0, 0, 0, 0, 0)));
        let host = Ipv4Prefix::from(Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(host.len(), 32);
        assert!(host.covers(&Ipv4Addr::new(192, 0, 2, 1)));
        assert!(Ipv4Prefix::ROOT.covers(&host));
        assert!(!host.covers(&Ipv4Prefix::ROOT));
    }

    #[test]
    fn masked_construction_never_fails() {
        let p = Ipv4Prefix::new_masked(Ipv4Addr::new(10, 1, 2, 3), 8);
        assert_eq!(p, "10.0.0.0/8".parse::<Ipv4Prefix>().unwrap());
        let p = Ipv6Prefix::new_masked(Ipv6Addr::LOCALHOST, 200);
        assert_eq!(p.len(), 128);
    }

    fn prefix_contract<P: IpPrefix + IpPrefixCovering<P>>(prefix: &P) {
        assert!(P::ROOT.covers(prefix));
        if prefix.len() > 0 {
            assert!(!prefix.covers(&P::ROOT));
        }
        assert_eq!(P::new(prefix.network(), prefix.len()).unwrap(), *prefix);
        assert_eq!(P::new_masked(prefix.network(), prefix.len()), *prefix);
        let mut parent = prefix.clone();
        for len in prefix.len()..=P::MAX_LEN {
            let child = P::new(prefix.network(), len).unwrap();
            assert!(parent.covers(&child));
            parent = child;
        }
        assert_eq!(parent.len(), P::MAX_LEN);
    }

    #[test]
    fn ipv4_prefix_contract() {
        bolero::check!()
            .with_type::<Ipv4Prefix>()
            .for_each(prefix_contract);
    }

    #[test]
    fn ipv6_prefix_contract() {
        bolero::check!()
            .with_type::<Ipv6Prefix>()
            .for_each(prefix_contract);
    }
}
