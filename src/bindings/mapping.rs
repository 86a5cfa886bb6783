// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Intent to heap policy.

Two pure functions decide where a resource's memory lives:

1. [`map_intent`] turns an intent and a dimensionality into a heap type, resource flags and the
   state the resource starts in.
2. [`select_heap`] turns that heap type into full heap properties, collapsing every heap type to
   one coherent custom heap on cache-coherent UMA hardware.

Upload and readback heaps exist to stage traffic across a PCIe bus.  When the CPU and GPU share
one coherent pool there is nothing to stage across, and a write-back custom heap serves every role
without the write-combined or uncached penalties of the dedicated types.
*/

use crate::bindings::intent::ResourceIntent;
use crate::imp::{
    CpuPageProperty, HeapProperties, HeapType, MemoryPool, ResourceDimension, ResourceFlags,
    ResourceStates,
};

/// Everything an intent decides about a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IntentMapping {
    pub heap_type: HeapType,
    pub flags: ResourceFlags,
    pub initial_state: ResourceStates,
}

/**
Resolves `intent` for a resource of `dimension`.

# Panics

Textures only support [`ResourceIntent::ReadOnly`] and [`ResourceIntent::ReadWrite`].  Asking
for a constant, readback or upload texture is a caller bug and panics.
*/
pub fn map_intent(intent: ResourceIntent, dimension: ResourceDimension) -> IntentMapping {
    let texture = dimension.is_texture();
    let (heap_type, flags, initial_state) = match (intent, texture) {
        (ResourceIntent::Constant, false) => (
            HeapType::Upload,
            ResourceFlags::NONE,
            ResourceStates::GENERIC_READ,
        ),
        (ResourceIntent::ReadOnly, _) => (
            HeapType::Default,
            ResourceFlags::NONE,
            ResourceStates::COMMON,
        ),
        (ResourceIntent::ReadWrite, false) => (
            HeapType::Default,
            ResourceFlags::ALLOW_UNORDERED_ACCESS,
            ResourceStates::COMMON,
        ),
        (ResourceIntent::ReadWrite, true) => (
            HeapType::Default,
            ResourceFlags::ALLOW_UNORDERED_ACCESS,
            ResourceStates::UNORDERED_ACCESS,
        ),
        (ResourceIntent::ReadBack, false) => (
            HeapType::Readback,
            ResourceFlags::NONE,
            ResourceStates::COPY_DEST,
        ),
        (ResourceIntent::Upload, false) => (
            HeapType::Upload,
            ResourceFlags::NONE,
            ResourceStates::GENERIC_READ,
        ),
        (ResourceIntent::Constant | ResourceIntent::ReadBack | ResourceIntent::Upload, true) => {
            panic!("{intent} intent is not supported for {dimension:?} resources")
        }
    };
    IntentMapping {
        heap_type,
        flags,
        initial_state,
    }
}

/// Heap properties for `heap_type` on hardware with or without cache-coherent UMA.
pub fn select_heap(heap_type: HeapType, cache_coherent_uma: bool) -> HeapProperties {
    if cache_coherent_uma {
        HeapProperties {
            heap_type: HeapType::Custom,
            cpu_page_property: CpuPageProperty::WriteBack,
            memory_pool_preference: MemoryPool::L0,
            creation_node_mask: 0,
            visible_node_mask: 0,
        }
    } else {
        HeapProperties::of_type(heap_type)
    }
}
