// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(clippy::unwrap_used)]

use crate::{DynNetworkFunction, NetworkFunction, nf_dyn};
use crate::sample_nfs::{InspectPacket, Passthrough};
use net::buffer::{PacketBufferMut, TestBuffer};
use net::packet::test_utils::{ipv4_udp_frame, packet_from_frame};
use net::packet::{DoneReason, PacketView};
use std::net::Ipv4Addr;

pub(crate) fn test_packet() -> PacketView<TestBuffer> {
    packet_from_frame(&ipv4_udp_frame(
        Ipv4Addr::new(192, 0, 2, 1),
        Ipv4Addr::new(198, 51, 100, 1),
        b"pipeline",
    ))
}

/// Marks every packet as done with the given reason.
pub(crate) struct MarkDone(pub DoneReason);

impl<Buf: PacketBufferMut> NetworkFunction<Buf> for MarkDone {
    fn process<'a, Input: Iterator<Item = PacketView<Buf>> + 'a>(
        &'a mut self,
        input: Input,
    ) -> impl Iterator<Item = PacketView<Buf>> + 'a {
        let reason = self.0;
        input.map(move |mut packet| {
            packet.done(reason);
            packet
        })
    }
}

/// Yields an endless alternation of sample stages.
pub(crate) struct DynStageGenerator {
    count: usize,
}

impl DynStageGenerator {
    pub(crate) fn new() -> Self {
        Self { count: 0 }
    }
}

impl Iterator for DynStageGenerator {
    type Item = Box<dyn DynNetworkFunction<TestBuffer>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.count += 1;
        if self.count % 2 == 0 {
            Some(nf_dyn(InspectPacket))
        } else {
            Some(nf_dyn(Passthrough))
        }
    }
}
