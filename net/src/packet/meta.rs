// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(missing_docs)]

use std::collections::HashMap;

/// Why a packet stopped being processed.
#[allow(unused)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum DoneReason {
    InternalFailure, /* catch-all for internal issues */
    NotEthernet,     /* could not get eth header */
    NotIp,           /* could not get IP header - maybe it's not ip */
    Filtered,        /* The packet was administratively filtered */
    Unhandled,       /* there exists no support to handle this type of packet */
    Malformed,       /* the packet does not conform / is malformed */
    Delivered,       /* the packet buffer was delivered by the NF - e.g. for xmit */
}

/// Metadata attached to a packet by the stages that process it.
#[derive(Debug, Default)]
pub struct PacketMeta {
    /// Why the packet was marked as done, if it was
    pub done: Option<DoneReason>,
}

/// Per-reason counters of packets marked as done.
#[derive(Default, Debug)]
pub struct PacketDropStats {
    pub name: String,
    reasons: HashMap<DoneReason, u64>,
}

impl PacketDropStats {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            reasons: HashMap::default(),
        }
    }
    pub fn incr(&mut self, reason: DoneReason, value: u64) {
        self.reasons
            .entry(reason)
            .and_modify(|counter| *counter += value)
            .or_insert(value);
    }
    #[must_use]
    pub fn get_stat(&self, reason: DoneReason) -> Option<u64> {
        self.reasons.get(&reason).copied()
    }
    #[must_use]
    pub fn get_stats(&self) -> &HashMap<DoneReason, u64> {
        &self.reasons
    }
}
