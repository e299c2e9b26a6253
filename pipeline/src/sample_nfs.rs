// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::NetworkFunction;
use net::buffer::PacketBufferMut;
use net::packet::PacketView;
use tracing::debug;

/// Network function that uses [`debug!`] to print the header cursors of each packet.
pub struct InspectPacket;

impl<Buf: PacketBufferMut> NetworkFunction<Buf> for InspectPacket {
    fn process<'a, Input: Iterator<Item = PacketView<Buf>> + 'a>(
        &'a mut self,
        input: Input,
    ) -> impl Iterator<Item = PacketView<Buf>> + 'a {
        input.inspect(|packet| {
            debug!(
                "len: {len}, network: {net:?}, transport: {transport:?}, done: {done:?}",
                len = packet.len(),
                net = packet.network_header,
                transport = packet.transport_header,
                done = packet.get_done(),
            );
        })
    }
}

/// Network function that passes the packet through unchanged.
pub struct Passthrough;

impl<Buf: PacketBufferMut> NetworkFunction<Buf> for Passthrough {
    fn process<'a, Input: Iterator<Item = PacketView<Buf>> + 'a>(
        &'a mut self,
        input: Input,
    ) -> impl Iterator<Item = PacketView<Buf>> + 'a {
        input
    }
}
