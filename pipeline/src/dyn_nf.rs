// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::NetworkFunction;
use dyn_iter::{DynIter, IntoDynIterator};
use net::buffer::PacketBufferMut;
use net::packet::PacketView;
use std::any::Any;
use std::marker::PhantomData;

/// Object-safe form of [`NetworkFunction`], for stages whose type is only known at runtime.
///
/// Any [`NetworkFunction`] becomes one through [`nf_dyn`]; there is rarely a reason to
/// implement this trait by hand.
pub trait DynNetworkFunction<Buf: PacketBufferMut>: Any {
    /// Process a type-erased stream of packets.
    ///
    /// A concrete iterator is turned into a [`DynIter`] with [`IntoDynIterator::into_dyn_iter`].
    fn process_dyn<'a>(
        &'a mut self,
        input: DynIter<'a, PacketView<Buf>>,
    ) -> DynIter<'a, PacketView<Buf>>;
}

/// A [`NetworkFunction`] behind the [`DynNetworkFunction`] interface.
pub(crate) struct BoxedStage<Buf, NF> {
    stage: NF,
    _buf: PhantomData<Buf>,
}

impl<Buf, NF> BoxedStage<Buf, NF> {
    /// The wrapped stage
    pub(crate) fn stage(&self) -> &NF {
        &self.stage
    }
}

/// Box a network function so that it can sit in a [`crate::DynPipeline`].
pub fn nf_dyn<Buf, NF>(stage: NF) -> Box<dyn DynNetworkFunction<Buf>>
where
    Buf: PacketBufferMut + 'static,
    NF: NetworkFunction<Buf> + 'static,
{
    Box::new(BoxedStage {
        stage,
        _buf: PhantomData,
    })
}

impl<Buf, NF> DynNetworkFunction<Buf> for BoxedStage<Buf, NF>
where
    Buf: PacketBufferMut + 'static,
    NF: NetworkFunction<Buf> + 'static,
{
    fn process_dyn<'a>(
        &'a mut self,
        input: DynIter<'a, PacketView<Buf>>,
    ) -> DynIter<'a, PacketView<Buf>> {
        self.stage.process(input).into_dyn_iter()
    }
}
