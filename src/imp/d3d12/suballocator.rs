// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Pooled placement on the native device, backed by `gpu-allocator`.

`gpu-allocator` owns the shared heaps and hands out `(heap, offset)` ranges; this module places
resources in them with `CreatePlacedResource` and ties each range to the resulting
[`Allocation`](crate::allocation::Allocation) through its lease.

Three kinds of request skip the pool and get an implicit heap from `CreateCommittedResource`:

- requests flagged `committed`;
- requests flagged `zeroed`, since implicit heaps are zeroed on creation and a reused range isn't;
- custom heaps (the cache-coherent UMA override), since the pool only knows the standard heap
  types and would place the resource somewhere else.
*/

use super::convert;
use super::device::{D3d12Device, D3d12Resource};
use crate::imp::{
    ClearValue, Device, Error, HeapFlags, HeapProperties, HeapType, ResourceDesc, ResourceStates,
    Suballocation, SuballocationDesc, SuballocationFlags, Suballocator,
};
use gpu_allocator::MemoryLocation;
use gpu_allocator::d3d12::{
    Allocation, AllocationCreateDesc, Allocator, AllocatorCreateDesc, ID3D12DeviceVersion,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use windows::Win32::Graphics::Direct3D12::*;

/// The pool's view of a heap type.  `None` for heaps the pool can't serve.
fn memory_location(properties: &HeapProperties) -> Option<MemoryLocation> {
    match properties.heap_type {
        HeapType::Default => Some(MemoryLocation::GpuOnly),
        HeapType::Upload => Some(MemoryLocation::CpuToGpu),
        HeapType::Readback => Some(MemoryLocation::GpuToCpu),
        HeapType::Custom => None,
    }
}

/// Whether a request bypasses the pool for an implicit heap.
fn needs_implicit_heap(flags: SuballocationFlags, properties: &HeapProperties) -> bool {
    flags.committed || flags.zeroed || memory_location(properties).is_none()
}

fn lock(allocator: &Mutex<Allocator>) -> MutexGuard<'_, Allocator> {
    //a panic elsewhere doesn't corrupt the allocator's books
    allocator.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frees the range when dropped.
struct Lease {
    allocator: Arc<Mutex<Allocator>>,
    allocation: Option<Allocation>,
}

//safe because the allocator is only touched under its mutex, and D3D12 heaps are free-threaded
unsafe impl Send for Lease {}
unsafe impl Sync for Lease {}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            if let Err(e) = lock(&self.allocator).free(allocation) {
                logwise::error_sync!(
                    "couldn't return a range to the pool: {error}",
                    error = logwise::privacy::LogIt(&e)
                );
            }
        }
    }
}

/// A [`Suballocator`] over a `gpu_allocator::d3d12::Allocator`.
pub struct D3d12Suballocator {
    device: D3d12Device,
    allocator: Arc<Mutex<Allocator>>,
}

//safe because the allocator is only touched under its mutex
unsafe impl Send for D3d12Suballocator {}
unsafe impl Sync for D3d12Suballocator {}

impl D3d12Suballocator {
    pub fn new(device: D3d12Device) -> Result<Self, Error> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            device: ID3D12DeviceVersion::Device(device.native().clone()),
            debug_settings: Default::default(),
            allocation_sizes: Default::default(),
        })
        .map_err(|e| Error::Pool(Box::new(e)))?;
        logwise::info_sync!("gpu-allocator pool ready");
        Ok(Self {
            device,
            allocator: Arc::new(Mutex::new(allocator)),
        })
    }

    pub fn device(&self) -> &D3d12Device {
        &self.device
    }
}

impl std::fmt::Debug for D3d12Suballocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D3d12Suballocator")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl Suballocator for D3d12Suballocator {
    type Resource = D3d12Resource;

    fn create_resource(
        &self,
        desc: &SuballocationDesc,
        resource_desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<Suballocation<D3d12Resource>, Error> {
        let location = match memory_location(&desc.heap_properties) {
            Some(location) if !needs_implicit_heap(desc.flags, &desc.heap_properties) => location,
            _ => {
                //implicit heaps start zeroed without CREATE_NOT_ZEROED
                let resource = self.device.create_committed_resource(
                    &desc.heap_properties,
                    HeapFlags::NONE,
                    resource_desc,
                    initial_state,
                    clear_value,
                )?;
                let size = self.device.resource_allocation_info(resource_desc).size_in_bytes;
                return Ok(Suballocation {
                    resource,
                    heap_offset: 0,
                    size,
                    dedicated: true,
                    lease: None,
                });
            }
        };

        let native_desc = convert::resource_desc(resource_desc);
        let create = AllocationCreateDesc::from_d3d12_resource_desc(
            self.device.native(),
            &native_desc,
            "heapwise",
            location,
        );
        let allocation = lock(&self.allocator).allocate(&create).map_err(|e| match e {
            gpu_allocator::AllocationError::OutOfMemory => Error::OutOfMemory {
                requested: create.size,
                heap: desc.heap_properties.heap_type,
            },
            other => Error::Pool(Box::new(other)),
        })?;
        let (heap_offset, size) = (allocation.offset(), allocation.size());
        //safe because the heap is only used to place a resource inside this allocation's range
        let heap = unsafe { allocation.heap() }.clone();
        //from here on, an early return hands the range back
        let lease = Lease {
            allocator: self.allocator.clone(),
            allocation: Some(allocation),
        };

        let clear = clear_value.map(convert::clear_value);
        let mut resource: Option<ID3D12Resource> = None;
        //safe because the lease outlives the resource, and every pointer refers to a local that
        //outlives the call
        unsafe {
            self.device.native().CreatePlacedResource(
                &heap,
                heap_offset,
                &native_desc,
                convert::states(initial_state),
                clear.as_ref().map(|c| c as *const D3D12_CLEAR_VALUE),
                &mut resource,
            )
        }
        .map_err(|e| convert::device_error("CreatePlacedResource", e))?;
        let resource = resource.map(D3d12Resource::from_native).ok_or(Error::Device {
            operation: "CreatePlacedResource",
            hresult: crate::hresult::HResult::E_POINTER,
        })?;
        logwise::trace_sync!(
            "placed {size} bytes at {offset}",
            size = size,
            offset = heap_offset
        );
        Ok(Suballocation {
            resource,
            heap_offset,
            size,
            dedicated: false,
            lease: Some(Box::new(lease)),
        })
    }
}
