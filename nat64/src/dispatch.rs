// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-packet dispatch to the translators, and the pipeline stage built on it.

use crate::config::{ConfigReader, ConfigWriter, TranslationConfig};
use crate::error::TranslateError;
use crate::{v4_to_v6, v6_to_v4};
use net::buffer::PacketBufferMut;
use net::eth::EthType;
use net::packet::{DoneReason, PacketDropStats, PacketView};
use pipeline::NetworkFunction;
use tracing::{debug, error, warn};

/// Outcome of a successful call to [`translate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The packet now belongs to the other IP version
    Translated,
    /// No mapping applied and the configuration lets such packets through as they are
    PassedThrough,
}

/// Translate a packet in place, IPv4 to IPv6 or IPv6 to IPv4 depending on its network header.
///
/// On error the packet may have been partially rewritten and must be dropped.
///
/// # Errors
///
/// Fails if the packet is not IP, cannot be mapped (and the configuration says to drop it) or
/// cannot be translated.
pub fn translate<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    packet: &mut PacketView<Buf>,
) -> Result<Verdict, TranslateError> {
    match packet.network_header.ty {
        EthType::IPV4 => v4_to_v6::translate(config, packet),
        EthType::IPV6 => v6_to_v4::translate(config, packet),
        ty => {
            debug!("Not translating {ty:?} frame");
            Err(TranslateError::NotIp)
        }
    }
}

/// Packets of a batch, sorted by [`translate_batch`].
#[derive(Debug)]
pub struct Batch<Buf: PacketBufferMut> {
    /// Translated or passed-through packets, in input order
    pub output: Vec<PacketView<Buf>>,
    /// Packets which failed translation, in input order, with the reason why
    pub dropped: Vec<(PacketView<Buf>, TranslateError)>,
}

/// Translate every packet of `input`, splitting them between those to forward and those to
/// drop.
pub fn translate_batch<Buf: PacketBufferMut>(
    config: &TranslationConfig,
    input: impl IntoIterator<Item = PacketView<Buf>>,
) -> Batch<Buf> {
    let mut batch = Batch {
        output: Vec::new(),
        dropped: Vec::new(),
    };
    for mut packet in input {
        match translate(config, &mut packet) {
            Ok(_) => batch.output.push(packet),
            Err(e) => batch.dropped.push((packet, e)),
        }
    }
    batch
}

/// The NAT64 pipeline stage.
///
/// Reads whichever configuration generation is current when a packet is processed.
#[derive(Debug)]
pub struct Nat64 {
    reader: ConfigReader,
    stats: PacketDropStats,
}

impl Nat64 {
    /// Create a stage along with the writer its configuration is published through.
    ///
    /// Until a configuration is published, every packet is dropped.
    #[must_use]
    pub fn new() -> (Self, ConfigWriter) {
        let writer = ConfigWriter::new();
        (Self::with_reader(writer.get_reader()), writer)
    }

    /// Create a stage reading its configuration from `reader`.
    #[must_use]
    pub fn with_reader(reader: ConfigReader) -> Self {
        Self {
            reader,
            stats: PacketDropStats::new("Stats:nat64"),
        }
    }

    /// Counters of the packets this stage dropped, per reason.
    #[must_use]
    pub fn stats(&self) -> &PacketDropStats {
        &self.stats
    }

    fn process_packet<Buf: PacketBufferMut>(&mut self, packet: &mut PacketView<Buf>) {
        let Some(config) = self.reader.enter() else {
            error!("No NAT64 configuration available, dropping");
            packet.done(DoneReason::InternalFailure);
            self.stats.incr(DoneReason::InternalFailure, 1);
            return;
        };
        if let Err(e) = translate(&config, packet) {
            debug!("Dropping packet: {e}");
            let reason = e.done_reason();
            packet.done(reason);
            self.stats.incr(reason, 1);
        }
    }
}

impl<Buf: PacketBufferMut> NetworkFunction<Buf> for Nat64 {
    fn process<'a, Input: Iterator<Item = PacketView<Buf>> + 'a>(
        &'a mut self,
        input: Input,
    ) -> impl Iterator<Item = PacketView<Buf>> + 'a {
        input.filter_map(|mut packet| {
            if packet.is_done() {
                warn!("Packet is done and will not be translated");
            } else {
                self.process_packet(&mut packet);
            }
            packet.enforce()
        })
    }
}
