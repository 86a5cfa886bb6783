// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::convert;
use crate::footprint::Footprint;
use crate::imp::{
    Architecture, ClearValue, ConstantBufferViewDesc, Device, Error, HeapFlags, HeapProperties,
    ResourceAllocationInfo, ResourceDesc, ResourceStates, ShaderResourceViewDesc,
    UnorderedAccessViewDesc,
};
use std::ffi::c_void;
use std::fmt::Debug;
use windows::Win32::Graphics::Direct3D12::*;

/// A resource on a [`D3d12Device`].  Clones add a COM reference.
#[derive(Clone, PartialEq, Eq)]
pub struct D3d12Resource(pub(super) ID3D12Resource);

//safe because D3D12 resources are free-threaded
unsafe impl Send for D3d12Resource {}
unsafe impl Sync for D3d12Resource {}

impl D3d12Resource {
    pub fn from_native(resource: ID3D12Resource) -> Self {
        Self(resource)
    }

    pub fn native(&self) -> &ID3D12Resource {
        &self.0
    }

    /// Properties of the heap this resource lives in.
    pub fn heap_properties(&self) -> Result<HeapProperties, Error> {
        let mut properties = D3D12_HEAP_PROPERTIES::default();
        //safe because the out pointer is valid for the call
        unsafe { self.0.GetHeapProperties(Some(&mut properties), None) }
            .map_err(|e| convert::device_error("GetHeapProperties", e))?;
        Ok(convert::from_heap_properties(&properties))
    }
}

impl Debug for D3d12Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D3d12Resource({:?})", self.0)
    }
}

/// A shader-visible CBV/SRV/UAV descriptor heap.
#[derive(Debug)]
pub struct D3d12DescriptorHeap {
    heap: ID3D12DescriptorHeap,
    start: usize,
    increment: usize,
    capacity: u32,
}

//safe because descriptor heaps are free-threaded; writing distinct slots is the caller's business
unsafe impl Send for D3d12DescriptorHeap {}
unsafe impl Sync for D3d12DescriptorHeap {}

impl D3d12DescriptorHeap {
    pub fn native(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn handle(&self, slot: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        assert!(
            slot < self.capacity,
            "descriptor slot {slot} out of range for {} slots",
            self.capacity
        );
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: self.start + slot as usize * self.increment,
        }
    }
}

/// An `ID3D12Device`.
#[derive(Debug, Clone)]
pub struct D3d12Device {
    device: ID3D12Device,
}

//safe because ID3D12Device is free-threaded
unsafe impl Send for D3d12Device {}
unsafe impl Sync for D3d12Device {}

impl D3d12Device {
    pub fn new(device: ID3D12Device) -> Self {
        Self { device }
    }

    pub fn native(&self) -> &ID3D12Device {
        &self.device
    }

    fn map<R>(
        resource: &D3d12Resource,
        read: std::ops::Range<usize>,
        f: impl FnOnce(*mut u8) -> R,
        written: std::ops::Range<usize>,
    ) -> Result<R, Error> {
        let mut ptr: *mut c_void = std::ptr::null_mut();
        let read_range = D3D12_RANGE {
            Begin: read.start,
            End: read.end,
        };
        //safe because the range and out pointer outlive the call
        unsafe { resource.0.Map(0, Some(&read_range), Some(&mut ptr)) }
            .map_err(|e| convert::device_error("Map", e))?;
        let r = f(ptr as *mut u8);
        let written_range = D3D12_RANGE {
            Begin: written.start,
            End: written.end,
        };
        //safe because the resource was mapped above
        unsafe { resource.0.Unmap(0, Some(&written_range)) };
        Ok(r)
    }

    fn check_mappable(resource: &D3d12Resource, offset: u64, len: u64) -> Result<(), Error> {
        let properties = resource.heap_properties()?;
        if !properties.is_cpu_visible() {
            return Err(Error::NotCpuVisible {
                heap: properties.heap_type,
            });
        }
        //safe because GetDesc has no preconditions
        let size = unsafe { resource.0.GetDesc() }.Width;
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(Error::OutOfBounds { offset, len, size }),
        }
    }
}

impl Device for D3d12Device {
    type Resource = D3d12Resource;
    type DescriptorHeap = D3d12DescriptorHeap;

    fn architecture(&self) -> Result<Architecture, Error> {
        let mut data = D3D12_FEATURE_DATA_ARCHITECTURE::default();
        //safe because data is the struct D3D12_FEATURE_ARCHITECTURE expects
        unsafe {
            self.device.CheckFeatureSupport(
                D3D12_FEATURE_ARCHITECTURE,
                &mut data as *mut _ as *mut c_void,
                std::mem::size_of::<D3D12_FEATURE_DATA_ARCHITECTURE>() as u32,
            )
        }
        .map_err(|e| convert::device_error("CheckFeatureSupport", e))?;
        Ok(Architecture {
            tile_based_renderer: data.TileBasedRenderer.as_bool(),
            uma: data.UMA.as_bool(),
            cache_coherent_uma: data.CacheCoherentUMA.as_bool(),
        })
    }

    fn create_committed_resource(
        &self,
        heap_properties: &HeapProperties,
        heap_flags: HeapFlags,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<D3d12Resource, Error> {
        let heap = convert::heap_properties(heap_properties);
        let native_desc = convert::resource_desc(desc);
        let clear = clear_value.map(convert::clear_value);
        let mut resource: Option<ID3D12Resource> = None;
        //safe because every pointer refers to a local that outlives the call
        unsafe {
            self.device.CreateCommittedResource(
                &heap,
                convert::heap_flags(heap_flags),
                &native_desc,
                convert::states(initial_state),
                clear.as_ref().map(|c| c as *const D3D12_CLEAR_VALUE),
                &mut resource,
            )
        }
        .map_err(|e| convert::device_error("CreateCommittedResource", e))?;
        resource.map(D3d12Resource).ok_or(Error::Device {
            operation: "CreateCommittedResource",
            hresult: crate::hresult::HResult::E_POINTER,
        })
    }

    fn resource_desc(&self, resource: &D3d12Resource) -> ResourceDesc {
        //safe because GetDesc has no preconditions
        convert::from_resource_desc(&unsafe { resource.0.GetDesc() })
    }

    fn resource_allocation_info(&self, desc: &ResourceDesc) -> ResourceAllocationInfo {
        let native_desc = convert::resource_desc(desc);
        //safe because the slice outlives the call
        let info = unsafe { self.device.GetResourceAllocationInfo(0, &[native_desc]) };
        ResourceAllocationInfo {
            size_in_bytes: info.SizeInBytes,
            alignment: info.Alignment,
        }
    }

    fn copyable_footprints(
        &self,
        desc: &ResourceDesc,
        subresource: u32,
        base_offset: u64,
    ) -> Footprint {
        let native_desc = convert::resource_desc(desc);
        let mut layout = D3D12_PLACED_SUBRESOURCE_FOOTPRINT::default();
        let mut num_rows = 0u32;
        let mut row_size = 0u64;
        let mut total = 0u64;
        //safe because every out pointer refers to a local sized for one subresource
        unsafe {
            self.device.GetCopyableFootprints(
                &native_desc,
                subresource,
                1,
                base_offset,
                Some(&mut layout),
                Some(&mut num_rows),
                Some(&mut row_size),
                Some(&mut total),
            );
        }
        Footprint {
            placed: convert::from_placed_footprint(&layout),
            num_rows,
            row_size_in_bytes: row_size,
            total_bytes: total,
        }
    }

    fn gpu_virtual_address(&self, resource: &D3d12Resource) -> u64 {
        //safe because GetGPUVirtualAddress has no preconditions
        unsafe { resource.0.GetGPUVirtualAddress() }
    }

    fn create_descriptor_heap(&self, capacity: u32) -> Result<D3d12DescriptorHeap, Error> {
        let desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            NumDescriptors: capacity,
            Flags: D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE,
            NodeMask: 0,
        };
        //safe because desc outlives the call
        let heap: ID3D12DescriptorHeap = unsafe { self.device.CreateDescriptorHeap(&desc) }
            .map_err(|e| convert::device_error("CreateDescriptorHeap", e))?;
        //safe because neither call has preconditions
        let (start, increment) = unsafe {
            (
                heap.GetCPUDescriptorHandleForHeapStart().ptr,
                self.device
                    .GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV)
                    as usize,
            )
        };
        Ok(D3d12DescriptorHeap {
            heap,
            start,
            increment,
            capacity,
        })
    }

    fn create_constant_buffer_view(
        &self,
        desc: &ConstantBufferViewDesc,
        heap: &D3d12DescriptorHeap,
        slot: u32,
    ) {
        let native = convert::cbv(desc);
        //safe because the handle is inside the heap
        unsafe {
            self.device
                .CreateConstantBufferView(Some(&native), heap.handle(slot))
        }
    }

    fn create_shader_resource_view(
        &self,
        resource: &D3d12Resource,
        desc: &ShaderResourceViewDesc,
        heap: &D3d12DescriptorHeap,
        slot: u32,
    ) {
        let native = convert::srv(desc);
        //safe because the handle is inside the heap
        unsafe {
            self.device
                .CreateShaderResourceView(&resource.0, Some(&native), heap.handle(slot))
        }
    }

    fn create_unordered_access_view(
        &self,
        resource: &D3d12Resource,
        desc: &UnorderedAccessViewDesc,
        heap: &D3d12DescriptorHeap,
        slot: u32,
    ) {
        let native = convert::uav(desc);
        //safe because the handle is inside the heap
        unsafe {
            self.device.CreateUnorderedAccessView(
                &resource.0,
                None::<&ID3D12Resource>,
                Some(&native),
                heap.handle(slot),
            )
        }
    }

    fn write_buffer(&self, resource: &D3d12Resource, offset: u64, data: &[u8]) -> Result<(), Error> {
        Self::check_mappable(resource, offset, data.len() as u64)?;
        let start = offset as usize;
        Self::map(
            resource,
            0..0,
            |ptr| {
                //safe because the range was bounds-checked against the mapped buffer
                unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(start), data.len()) }
            },
            start..start + data.len(),
        )
    }

    fn read_buffer(&self, resource: &D3d12Resource, offset: u64, out: &mut [u8]) -> Result<(), Error> {
        Self::check_mappable(resource, offset, out.len() as u64)?;
        let start = offset as usize;
        let len = out.len();
        Self::map(
            resource,
            start..start + len,
            |ptr| {
                //safe because the range was bounds-checked against the mapped buffer
                unsafe { std::ptr::copy_nonoverlapping(ptr.add(start), out.as_mut_ptr(), len) }
            },
            0..0,
        )
    }
}
