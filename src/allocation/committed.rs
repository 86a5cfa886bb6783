// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! One heap per resource.

use crate::allocation::{Allocation, Placement, ResourceAllocator, assemble, resolve};
use crate::bindings::{AllocationMode, AllocationRequest};
use crate::imp::{Device, Error, HeapFlags};
use std::fmt::Debug;
use std::sync::Arc;

/// Creates every resource together with its own implicit heap.
///
/// Committed resources never share memory, so nothing is left behind by a previous tenant and
/// nothing fragments.  The cost is a kernel round trip and at least 64 KiB per resource.
pub struct CommittedAllocator<D> {
    pub(super) device: Arc<D>,
    pub(super) cache_coherent_uma: bool,
}

impl<D: Device> CommittedAllocator<D> {
    /// Uses the device's own cache-coherent UMA report, and fails if the device can't give one.
    ///
    /// [`PooledAllocator::new`](super::PooledAllocator::new) has no device to ask, so it takes the
    /// flag as an argument instead.
    pub fn new(device: Arc<D>) -> Result<Self, Error> {
        let cache_coherent_uma = device.architecture()?.cache_coherent_uma;
        Ok(Self {
            device,
            cache_coherent_uma,
        })
    }

    pub fn with_cache_coherent_uma(mut self, cache_coherent_uma: bool) -> Self {
        self.cache_coherent_uma = cache_coherent_uma;
        self
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }
}

/// Heap flags for a committed resource in `mode`.
///
/// Committed heaps are never shared, so `Committed` and `Clear` differ only in name here; only
/// `Default` lets the driver skip zeroing.
pub fn heap_flags(mode: AllocationMode) -> HeapFlags {
    match mode {
        AllocationMode::Default => HeapFlags::CREATE_NOT_ZEROED,
        AllocationMode::Committed | AllocationMode::Clear => HeapFlags::NONE,
    }
}

impl<D: Device> ResourceAllocator for CommittedAllocator<D> {
    type Resource = D::Resource;

    fn allocate(&self, request: &AllocationRequest<'_>) -> Result<Allocation<D::Resource>, Error> {
        let resolved = resolve(request, self.cache_coherent_uma);
        let flags = heap_flags(request.mode());
        let perf = logwise::perfwarn_begin!("CommittedAllocator::allocate");
        let resource = self.device.create_committed_resource(
            &resolved.heap_properties,
            flags,
            &resolved.desc,
            resolved.mapping.initial_state,
            request.clear_value(),
        );
        drop(perf);
        let resource = match resource {
            Ok(r) => r,
            Err(e) => {
                logwise::error_sync!(
                    "committed allocation {name} failed: {err}",
                    name = logwise::privacy::LogIt(request.debug_name()),
                    err = logwise::privacy::LogIt(&e)
                );
                return Err(e);
            }
        };
        logwise::info_sync!(
            "committed {name}: {heap} {flags} {width} bytes",
            name = logwise::privacy::LogIt(request.debug_name()),
            heap = logwise::privacy::LogIt(&resolved.heap_properties.heap_type),
            flags = logwise::privacy::LogIt(&flags),
            width = resolved.desc.width
        );
        Ok(assemble(
            request,
            &resolved,
            resource,
            Placement::Committed,
            None,
        ))
    }
}

impl<D> Debug for CommittedAllocator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommittedAllocator")
            .field("cache_coherent_uma", &self.cache_coherent_uma)
            .finish_non_exhaustive()
    }
}
