// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(rustdoc::private_doc_tests)]
#![deny(
    unsafe_code,
    missing_docs,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]

//! # Pipeline Building Blocks
//!
//! This crate provides the building blocks for constructing pipelines of network functions.
//! There are two main methods provided for linking network functions together in sequence:
//!
//! - `StaticChain`: A trait for statically chaining network functions together.
//! - `DynPipeline`: A pipeline that can be dynamically constructed at runtime.
//!
//! ## Network Functions
//!
//! A network function is anything that implements the [`NetworkFunction`] trait.
//! It consumes an iterator of [`net::packet::PacketView`] and yields the packets it lets
//! through. Stages that give up on a packet mark it as done; the packet keeps flowing so that
//! later stages (or the caller) can account for it.
//!
//! ## Static Chaining
//!
//! ```rust
//! use siit_pipeline::{NetworkFunction, StaticChain};
//! use siit_pipeline::sample_nfs::{InspectPacket, Passthrough};
//! use net::packet::PacketView;
//! use net::buffer::TestBuffer;
//!
//! let mut pipeline = InspectPacket.chain(Passthrough);
//! let pkts: Vec<PacketView<TestBuffer>> = vec![];
//! assert_eq!(pipeline.process(pkts.into_iter()).count(), 0);
//! ```
//!
//! <div class="warning">
//!
//! Keep statically linked chains short, ideally less than 8 stages.
//!
//! </div>
//!
//! ## Dynamic Pipeline
//!
//! ```rust
//! use siit_pipeline::DynPipeline;
//! use siit_pipeline::sample_nfs::{InspectPacket, Passthrough};
//! use net::buffer::TestBuffer;
//!
//! let pipeline = DynPipeline::<TestBuffer>::new()
//!     .add_stage(InspectPacket)
//!     .add_stage(Passthrough);
//! assert_eq!(pipeline.len(), 2);
//! ```

mod dyn_nf;
mod pipeline;
/// Sample network functions
pub mod sample_nfs;
mod static_nf;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dyn_nf::{DynNetworkFunction, nf_dyn};
pub use pipeline::{DynPipeline, PipelineError, StageId};
pub use static_nf::{NetworkFunction, StaticChain};

#[cfg(test)]
mod test {
    use crate::sample_nfs::{InspectPacket, Passthrough};
    use crate::test_utils::{MarkDone, test_packet};
    use crate::{DynPipeline, NetworkFunction, StaticChain};
    use net::packet::DoneReason;

    #[test]
    fn mixed_dyn_static_pipeline() {
        let mut pipeline = DynPipeline::new();
        for _ in 0..50 {
            pipeline = pipeline.add_stage(InspectPacket.chain(Passthrough).chain(InspectPacket));
        }
        pipeline = pipeline.add_stage(MarkDone(DoneReason::Unhandled));

        let packets = vec![test_packet()].into_iter();
        let packets_out: Vec<_> = pipeline.process(packets).collect();
        assert_eq!(packets_out.len(), 1);
        assert_eq!(packets_out[0].get_done(), Some(DoneReason::Unhandled));
    }
}
