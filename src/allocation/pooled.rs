// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Many resources per heap.

use crate::allocation::{Allocation, Placement, ResourceAllocator, assemble, resolve};
use crate::bindings::{AllocationMode, AllocationRequest};
use crate::imp::{Error, SuballocationDesc, SuballocationFlags, Suballocator};
use std::fmt::Debug;
use std::sync::Arc;

/// Places resources inside heaps owned by a [`Suballocator`].
///
/// Resolves requests exactly as [`CommittedAllocator`](super::CommittedAllocator) does.  What
/// differs is that a released range goes back to the pool and its bytes go to the next tenant
/// untouched, which is why [`AllocationMode::Clear`] exists.
pub struct PooledAllocator<S> {
    suballocator: Arc<S>,
    cache_coherent_uma: bool,
}

impl<S: Suballocator> PooledAllocator<S> {
    /// `cache_coherent_uma` should be the device's own report, as
    /// [`AllocatorConfig::cache_coherent_uma`](super::AllocatorConfig::cache_coherent_uma)
    /// resolves it.  A suballocator can't be asked, so the caller passes it along.
    pub fn new(suballocator: Arc<S>, cache_coherent_uma: bool) -> Self {
        Self {
            suballocator,
            cache_coherent_uma,
        }
    }

    pub fn cache_coherent_uma(&self) -> bool {
        self.cache_coherent_uma
    }

    pub fn suballocator(&self) -> &Arc<S> {
        &self.suballocator
    }
}

/// Placement flags for a pooled resource in `mode`.
pub fn suballocation_flags(mode: AllocationMode) -> SuballocationFlags {
    match mode {
        AllocationMode::Default => SuballocationFlags::default(),
        AllocationMode::Committed => SuballocationFlags {
            committed: true,
            zeroed: false,
        },
        AllocationMode::Clear => SuballocationFlags {
            committed: false,
            zeroed: true,
        },
    }
}

impl<S: Suballocator> ResourceAllocator for PooledAllocator<S> {
    type Resource = S::Resource;

    fn allocate(&self, request: &AllocationRequest<'_>) -> Result<Allocation<S::Resource>, Error> {
        let resolved = resolve(request, self.cache_coherent_uma);
        let desc = SuballocationDesc {
            heap_properties: resolved.heap_properties,
            flags: suballocation_flags(request.mode()),
        };
        let suballocation = self
            .suballocator
            .create_resource(
                &desc,
                &resolved.desc,
                resolved.mapping.initial_state,
                request.clear_value(),
            )
            .inspect_err(|e| {
                logwise::error_sync!(
                    "pooled allocation {name} failed: {err}",
                    name = logwise::privacy::LogIt(request.debug_name()),
                    err = logwise::privacy::LogIt(e)
                );
            })?;
        logwise::trace_sync!(
            "pooled {name}: offset {offset} size {size} dedicated={dedicated}",
            name = logwise::privacy::LogIt(request.debug_name()),
            offset = suballocation.heap_offset,
            size = suballocation.size,
            dedicated = logwise::privacy::LogIt(&suballocation.dedicated)
        );
        let placement = Placement::Placed {
            heap_offset: suballocation.heap_offset,
            size: suballocation.size,
            dedicated: suballocation.dedicated,
        };
        Ok(assemble(
            request,
            &resolved,
            suballocation.resource,
            placement,
            suballocation.lease,
        ))
    }
}

impl<S> Debug for PooledAllocator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledAllocator")
            .field("cache_coherent_uma", &self.cache_coherent_uma)
            .finish_non_exhaustive()
    }
}
