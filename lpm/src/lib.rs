// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(clippy::similar_names, clippy::missing_errors_doc)]

//! Longest prefix match over IPv4 and IPv6 prefixes.
//!
//! [`prefix`] has the prefix types, masked on construction. [`trie`] has the tables using them
//! as keys.

pub mod prefix;
pub mod trie;
