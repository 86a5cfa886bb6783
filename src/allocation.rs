// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Turns allocation requests into live resources.

Two strategies share one contract, [`ResourceAllocator`]:

- [`CommittedAllocator`] gives every resource a heap of its own.
- [`PooledAllocator`] places resources inside shared heaps through a [`Suballocator`].

Both resolve a request the same way (intent to heap/flags/state, then the UMA heap override) and
differ only in where the memory comes from.  [`ConfiguredAllocator`] picks one from an
[`AllocatorConfig`], so call sites never name a strategy.

An [`Allocation`] owns its resource.  The allocator that produced it keeps nothing.

[`Suballocator`]: crate::imp::Suballocator
*/

pub mod committed;
pub mod pooled;

pub use committed::CommittedAllocator;
pub use pooled::PooledAllocator;

use crate::bindings::{AllocationRequest, IntentMapping, ResourceIntent, map_intent, select_heap};
use crate::bittricks::align_up;
use crate::imp::{
    CONSTANT_BUFFER_ALIGNMENT, Device, Error, HeapProperties, ResourceDesc, ResourceStates,
    Suballocator,
};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Where an allocation's memory lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Placement {
    /// An implicit heap created together with the resource.
    Committed,
    /// A range inside a heap owned by a suballocator.
    Placed {
        heap_offset: u64,
        size: u64,
        /// The suballocator gave this resource a heap of its own.
        dedicated: bool,
    },
}

/// One native resource and what it was created with.
pub struct Allocation<R> {
    resource: R,
    intent: ResourceIntent,
    desc: ResourceDesc,
    heap_properties: HeapProperties,
    initial_state: ResourceStates,
    placement: Placement,
    debug_name: String,
    //dropped after `resource`, which returns the range to the pool
    _lease: Option<Box<dyn Any + Send + Sync>>,
}

impl<R> Allocation<R> {
    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn intent(&self) -> ResourceIntent {
        self.intent
    }

    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    pub fn heap_properties(&self) -> &HeapProperties {
        &self.heap_properties
    }

    /// The state the resource was created in.  Barriers after creation are the caller's to
    /// track.
    pub fn initial_state(&self) -> ResourceStates {
        self.initial_state
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }
}

impl<R: Debug> Debug for Allocation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocation")
            .field("debug_name", &self.debug_name)
            .field("resource", &self.resource)
            .field("intent", &self.intent)
            .field("heap_type", &self.heap_properties.heap_type)
            .field("initial_state", &self.initial_state)
            .field("placement", &self.placement)
            .finish()
    }
}

/// Materializes resources for requests.
///
/// Implementations must be callable from several threads at once.
pub trait ResourceAllocator: Send + Sync {
    type Resource: Clone + Debug + Send + Sync;

    fn allocate(&self, request: &AllocationRequest<'_>) -> Result<Allocation<Self::Resource>, Error>;
}

/// A request after intent mapping and heap selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub mapping: IntentMapping,
    pub heap_properties: HeapProperties,
    pub desc: ResourceDesc,
}

/// Shared by both strategies so they place the same request identically.
pub(crate) fn resolve(request: &AllocationRequest<'_>, cache_coherent_uma: bool) -> Resolved {
    let shape = request.shape();
    let mapping = map_intent(request.intent(), shape.dimension());
    let heap_properties = select_heap(mapping.heap_type, cache_coherent_uma);
    let mut desc = shape.describe(mapping.flags);
    if request.intent() == ResourceIntent::Constant {
        //CBVs address whole 256-byte blocks
        desc.width = align_up(desc.width, CONSTANT_BUFFER_ALIGNMENT);
    }
    Resolved {
        mapping,
        heap_properties,
        desc,
    }
}

pub(crate) fn assemble<R>(
    request: &AllocationRequest<'_>,
    resolved: &Resolved,
    resource: R,
    placement: Placement,
    lease: Option<Box<dyn Any + Send + Sync>>,
) -> Allocation<R> {
    Allocation {
        resource,
        intent: request.intent(),
        desc: resolved.desc,
        heap_properties: resolved.heap_properties,
        initial_state: resolved.mapping.initial_state,
        placement,
        debug_name: request.debug_name().to_owned(),
        _lease: lease,
    }
}

/// Which allocator [`ConfiguredAllocator`] builds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum AllocationStrategy {
    /// Every resource in its own heap.
    Committed,
    /// Resources share heaps through a suballocator.
    #[default]
    Pooled,
}

/// Allocator configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AllocatorConfig {
    pub strategy: AllocationStrategy,
    /// Overrides the device's own cache-coherent UMA report when set.
    pub cache_coherent_uma: Option<bool>,
}

impl AllocatorConfig {
    /// The UMA flag this configuration resolves to on `device`.  The device is only asked when
    /// the configuration doesn't say.
    pub fn cache_coherent_uma<D: Device>(&self, device: &D) -> Result<bool, Error> {
        match self.cache_coherent_uma {
            Some(uma) => Ok(uma),
            None => Ok(device.architecture()?.cache_coherent_uma),
        }
    }
}

/// Either allocator, chosen by configuration.
pub enum ConfiguredAllocator<D: Device, S> {
    Committed(CommittedAllocator<D>),
    Pooled(PooledAllocator<S>),
}

impl<D, S> ConfiguredAllocator<D, S>
where
    D: Device,
    S: Suballocator<Resource = D::Resource>,
{
    /// Builds the allocator `config` names.  `suballocator` is unused by the committed strategy.
    pub fn new(device: Arc<D>, suballocator: Arc<S>, config: AllocatorConfig) -> Result<Self, Error> {
        let uma = config.cache_coherent_uma(device.as_ref())?;
        logwise::info_sync!(
            "allocator configured: {strategy} uma={uma}",
            strategy = logwise::privacy::LogIt(&config.strategy),
            uma = logwise::privacy::LogIt(&uma)
        );
        Ok(match config.strategy {
            AllocationStrategy::Committed => ConfiguredAllocator::Committed(CommittedAllocator {
                device,
                cache_coherent_uma: uma,
            }),
            AllocationStrategy::Pooled => {
                ConfiguredAllocator::Pooled(PooledAllocator::new(suballocator, uma))
            }
        })
    }
}

impl<D, S> ResourceAllocator for ConfiguredAllocator<D, S>
where
    D: Device,
    S: Suballocator<Resource = D::Resource>,
{
    type Resource = D::Resource;

    fn allocate(&self, request: &AllocationRequest<'_>) -> Result<Allocation<D::Resource>, Error> {
        match self {
            ConfiguredAllocator::Committed(a) => a.allocate(request),
            ConfiguredAllocator::Pooled(a) => a.allocate(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::ResourceShape;
    use crate::imp::{HeapType, ResourceFlags};
    use crate::pixel_formats::Format;

    #[test]
    fn constant_buffers_round_up() {
        let request = AllocationRequest::new(ResourceIntent::Constant, ResourceShape::buffer(100));
        let resolved = resolve(&request, false);
        assert_eq!(resolved.desc.width, 256);
        assert_eq!(resolved.heap_properties.heap_type, HeapType::Upload);
    }

    #[test]
    fn other_buffers_keep_their_size() {
        let request = AllocationRequest::new(ResourceIntent::Upload, ResourceShape::buffer(100));
        assert_eq!(resolve(&request, false).desc.width, 100);
    }

    #[test]
    fn flags_flow_into_desc() {
        let request = AllocationRequest::new(
            ResourceIntent::ReadWrite,
            ResourceShape::texture_2d(Format::R32Float, 16, 16),
        );
        let resolved = resolve(&request, true);
        assert_eq!(resolved.desc.flags, ResourceFlags::ALLOW_UNORDERED_ACCESS);
        assert_eq!(resolved.heap_properties.heap_type, HeapType::Custom);
    }
}
