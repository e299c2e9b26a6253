// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)] // Validation logic should always be strictly safe
#![deny(missing_docs, clippy::all, clippy::pedantic)] // yeah, I'm that guy.  I'm not sorry.
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Do you know where your towel is?

//! A library for working with packet buffers and the headers in them.
//!
//! The crate provides packet buffer traits (with a test implementation), bounds-checked byte
//! access, internet checksum primitives, and the [`packet::PacketView`] type which carries a
//! frame together with the offsets of its network and transport headers.

pub mod buffer;
pub mod checksum;
pub mod eth;
pub mod ip;
pub mod packet;
pub mod parse;
