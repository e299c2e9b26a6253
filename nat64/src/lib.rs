// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(clippy::missing_errors_doc, clippy::similar_names)]

//! Stateless IPv4/IPv6 translation (SIIT, RFC 7915) for the dataplane
//!
//! This package implements a [`pipeline::NetworkFunction`], [`Nat64`], which rewrites IPv6
//! packets into IPv4 packets and back, in place in their packet buffer. Addresses are
//! translated with a static table of IPv4/IPv6 address pairs, IPv4 hosts being seen from the
//! IPv6 side through a 96-bit NAT64 prefix.
//!
//! # Example
//!
//! ```
//! # use net::packet::test_utils::{ipv4_udp_frame, packet_from_frame};
//! # use pipeline::NetworkFunction;
//! # use std::net::Ipv4Addr;
//! use siit_nat64::{Nat64, TranslationConfig, Nat64Prefix};
//!
//! let mut builder = TranslationConfig::builder();
//! let prefix = builder.add_prefix(Nat64Prefix::WELL_KNOWN).unwrap();
//! builder
//!     .add_mapping(Ipv4Addr::new(192, 0, 2, 5), "2001:db8::5".parse().unwrap(), prefix)
//!     .unwrap();
//!
//! let (mut nat64, mut writer) = Nat64::new();
//! writer.update(builder.build());
//!
//! let frame = ipv4_udp_frame(Ipv4Addr::new(198, 51, 100, 5), Ipv4Addr::new(192, 0, 2, 5), b"hi");
//! let output: Vec<_> = nat64.process([packet_from_frame(&frame)].into_iter()).collect();
//! assert_eq!(output[0].network_header.ty, net::eth::EthType::IPV6);
//! ```
//!
//! # Limitations
//!
//! - Translated packets are never fragmented. Packets too large for the egress link are left
//!   for a later stage to deal with.
//! - ICMP errors which should be sent back to the origin of a dropped packet are not generated.
//! - Packets with IPv4 source route options are dropped.

pub mod config;
pub mod dispatch;
pub mod frag;

mod checksum;
mod error;
mod exthdr;
mod fields;
mod icmp;
mod v4_to_v6;
mod v6_to_v4;


pub use config::{
    AddressMapping, ConfigError, ConfigReader, ConfigWriter, Mtu, Nat64ConfigSpec, Nat64Params,
    Nat64Prefix, TranslationConfig, TranslationConfigBuilder,
};
pub use dispatch::{Batch, Nat64, Verdict, translate, translate_batch};
pub use error::TranslateError;
pub use exthdr::{ExtensionChain, MAX_EXTENSION_HEADERS, walk as walk_extension_headers};
pub use frag::{FragmentDescriptor, FragmentError};
