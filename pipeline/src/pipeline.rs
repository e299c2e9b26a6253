// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![allow(clippy::missing_errors_doc)]

use crate::dyn_nf::BoxedStage;
use crate::{DynNetworkFunction, NetworkFunction, nf_dyn};
use dyn_iter::{DynIter, IntoDynIterator};
use net::buffer::PacketBufferMut;
use net::packet::PacketView;
use ordermap::OrderMap;
use std::any::Any;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a stage in a [`DynPipeline`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(u64);

impl StageId {
    /// Generate a fresh, process-wide unique stage id.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stage-{}", self.0)
    }
}

/// A dynamic pipeline that can be updated at runtime.
///
/// # See Also
///
/// [`DynNetworkFunction`]
#[derive(Default)]
pub struct DynPipeline<Buf: PacketBufferMut> {
    nfs: OrderMap<StageId, Box<dyn DynNetworkFunction<Buf>>>,
}

/// Errors when building a [`DynPipeline`]
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage with that id is already in the pipeline
    #[error("Duplicate stage id: {0}")]
    DuplicateStageId(StageId),
}

impl<Buf: PacketBufferMut> DynPipeline<Buf> {
    /// Create a [`DynPipeline`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            nfs: OrderMap::new(),
        }
    }

    /// Add a static network function to the pipeline.
    #[must_use]
    pub fn add_stage<NF: NetworkFunction<Buf> + 'static>(self, nf: NF) -> Self {
        self.add_stage_dyn(nf_dyn(nf))
    }

    /// Add a static network function to the pipeline using a specific stage id.
    pub fn add_stage_with_id<NF: NetworkFunction<Buf> + 'static>(
        &mut self,
        id: StageId,
        nf: NF,
    ) -> Result<&mut Self, PipelineError> {
        self.add_stage_dyn_with_id(id, nf_dyn(nf))
    }

    /// Add a dynamic network function to the pipeline.
    ///
    /// # See Also
    ///
    /// [`nf_dyn`]
    #[must_use]
    pub fn add_stage_dyn(mut self, nf: Box<dyn DynNetworkFunction<Buf>>) -> Self {
        // a fresh id cannot collide
        self.nfs.insert(StageId::new(), nf);
        self
    }

    /// Add a dynamic network function to the pipeline using a specific stage id.
    ///
    /// # See Also
    ///
    /// [`nf_dyn`]
    pub fn add_stage_dyn_with_id(
        &mut self,
        id: StageId,
        nf: Box<dyn DynNetworkFunction<Buf>>,
    ) -> Result<&mut Self, PipelineError> {
        if self.nfs.contains_key(&id) {
            Err(PipelineError::DuplicateStageId(id))
        } else {
            self.nfs.insert(id, nf);
            Ok(self)
        }
    }

    /// Get a static network function from the pipeline by stage id.
    #[must_use]
    pub fn get_stage_by_id<T: NetworkFunction<Buf> + 'static>(&self, id: &StageId) -> Option<&T> {
        self.get_stage_dyn_by_id::<BoxedStage<Buf, T>>(id)
            .map(BoxedStage::stage)
    }

    /// Get a dynamic network function from the pipeline by stage id.
    #[must_use]
    pub fn get_stage_dyn_by_id<T: DynNetworkFunction<Buf>>(&self, id: &StageId) -> Option<&T> {
        self.nfs
            .get(id)
            .and_then(|nf| (&**nf as &dyn Any).downcast_ref::<T>())
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nfs.len()
    }

    /// True if the pipeline has no stage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nfs.is_empty()
    }
}

impl<Buf: PacketBufferMut> DynNetworkFunction<Buf> for DynPipeline<Buf> {
    fn process_dyn<'a>(
        &'a mut self,
        input: DynIter<'a, PacketView<Buf>>,
    ) -> DynIter<'a, PacketView<Buf>> {
        self.nfs
            .values_mut()
            .fold(input, move |input, nf| nf.process_dyn(input))
            .into_dyn_iter()
    }
}

impl<Buf: PacketBufferMut> NetworkFunction<Buf> for DynPipeline<Buf> {
    fn process<'a, Input: Iterator<Item = PacketView<Buf>> + 'a>(
        &'a mut self,
        input: Input,
    ) -> impl Iterator<Item = PacketView<Buf>> + 'a {
        self.process_dyn(input.into_dyn_iter())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod test {
    use dyn_iter::IntoDynIterator;
    use net::buffer::TestBuffer;

    use crate::dyn_nf::BoxedStage;
    use crate::sample_nfs::Passthrough;
    use crate::test_utils::{DynStageGenerator, test_packet};
    use crate::{DynNetworkFunction, DynPipeline, NetworkFunction, StageId};

    #[test]
    fn long_dyn_pipeline() {
        let mut pipeline = DynPipeline::new();
        let mut stages = DynStageGenerator::new();
        for _ in 0..1000 {
            pipeline = pipeline.add_stage_dyn(stages.next().unwrap());
        }
        assert_eq!(pipeline.len(), 1000);

        let original = test_packet();
        let expected = original.data().to_vec();
        let packets_out: Vec<_> = pipeline.process(vec![original].into_iter()).collect();
        assert_eq!(packets_out.len(), 1);
        assert_eq!(packets_out[0].data(), expected.as_slice());
    }

    #[test]
    fn process_dyn() {
        let mut pipeline = DynPipeline::new();
        let mut stages = DynStageGenerator::new();
        for _ in 0..10 {
            pipeline = pipeline.add_stage_dyn(stages.next().unwrap());
        }
        let packets = vec![test_packet(), test_packet()].into_iter().into_dyn_iter();
        assert_eq!(pipeline.process_dyn(packets).count(), 2);
    }

    #[test]
    fn get_stage_by_id() {
        let mut pipeline = DynPipeline::<TestBuffer>::new();
        let mut stages = DynStageGenerator::new();
        let test_stage_id = StageId::new();

        for i in 0..10 {
            if i == 5 {
                pipeline
                    .add_stage_with_id(test_stage_id, Passthrough)
                    .unwrap();
            } else {
                pipeline = pipeline.add_stage_dyn(stages.next().unwrap());
            }
        }

        assert!(pipeline.get_stage_by_id::<Passthrough>(&test_stage_id).is_some());
        assert!(
            pipeline
                .get_stage_dyn_by_id::<BoxedStage<TestBuffer, Passthrough>>(
                    &test_stage_id,
                )
                .is_some()
        );
        assert!(
            pipeline
                .add_stage_with_id(test_stage_id, Passthrough)
                .is_err()
        );
    }
}
