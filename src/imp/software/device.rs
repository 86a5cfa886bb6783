// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bittricks::{align_up, mip_extent};
use crate::footprint::{Footprint, linear_footprint};
use crate::hresult::HResult;
use crate::imp::software::command_list::{Command, CopyLocation, SoftwareCommandList};
use crate::imp::software::descriptor_heap::{Descriptor, SoftwareDescriptorHeap};
use crate::imp::software::lock;
use crate::imp::{
    Architecture, Box3, ClearValue, ConstantBufferViewDesc, DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT,
    Device, Error, HeapFlags, HeapProperties, HeapType, ResourceAllocationInfo, ResourceDesc,
    ResourceDimension, ResourceFlags, ResourceStates, ShaderResourceViewDesc,
    UnorderedAccessViewDesc,
};
use crate::pixel_formats::Format;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Configuration for [`SoftwareDevice`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SoftwareDeviceConfig {
    /// Reported as both `UMA` and `CacheCoherentUMA`.
    pub cache_coherent_uma: bool,
    /// Bytes of heap memory the device will hand out before failing with out-of-memory.
    pub memory_budget: u64,
    /// What the architecture query answers.  Anything but `S_OK` fails the query with that status.
    pub architecture_status: HResult,
}

impl Default for SoftwareDeviceConfig {
    fn default() -> Self {
        Self {
            cache_coherent_uma: false,
            memory_budget: 1 << 30,
            architecture_status: HResult::S_OK,
        }
    }
}

#[derive(Debug)]
struct Budget {
    used: AtomicU64,
    limit: u64,
}

impl Budget {
    fn reserve(&self, bytes: u64, heap: HeapType) -> Result<(), Error> {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= self.limit)
            })
            .map(|_| ())
            .map_err(|_| Error::OutOfMemory {
                requested: bytes,
                heap,
            })
    }

    fn release(&self, bytes: u64) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// A block of device memory that resources are created in.
pub struct SoftwareHeap {
    properties: HeapProperties,
    size: u64,
    bytes: Mutex<Vec<u8>>,
    budget: Arc<Budget>,
}

impl SoftwareHeap {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn properties(&self) -> &HeapProperties {
        &self.properties
    }

    /// Zeroes `len` bytes at `offset`.
    pub fn zero(&self, offset: u64, len: u64) {
        let mut bytes = lock(&self.bytes);
        bytes[offset as usize..(offset + len) as usize].fill(0);
    }
}

impl Drop for SoftwareHeap {
    fn drop(&mut self) {
        self.budget.release(self.size);
    }
}

impl Debug for SoftwareHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareHeap")
            .field("properties", &self.properties)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

struct ResourceInner {
    id: u64,
    desc: ResourceDesc,
    heap: Arc<SoftwareHeap>,
    heap_offset: u64,
    len: u64,
    gpu_va: u64,
    state: Mutex<ResourceStates>,
}

/// A resource on a [`SoftwareDevice`].  Clones share the resource.
#[derive(Clone)]
pub struct SoftwareResource(Arc<ResourceInner>);

impl SoftwareResource {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn desc(&self) -> &ResourceDesc {
        &self.0.desc
    }

    pub fn heap_properties(&self) -> &HeapProperties {
        &self.0.heap.properties
    }

    pub fn heap_offset(&self) -> u64 {
        self.0.heap_offset
    }

    /// Bytes of backing memory.
    pub fn len(&self) -> u64 {
        self.0.len
    }

    /// The state the last executed barrier left this resource in.
    pub fn state(&self) -> ResourceStates {
        *lock(&self.0.state)
    }

    /// Whether both resources live in the same heap.
    pub fn shares_heap_with(&self, other: &SoftwareResource) -> bool {
        Arc::ptr_eq(&self.0.heap, &other.0.heap)
    }

    fn with_memory<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut bytes = lock(&self.0.heap.bytes);
        let start = self.0.heap_offset as usize;
        f(&mut bytes[start..start + self.0.len as usize])
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<(), Error> {
        match offset.checked_add(len) {
            Some(end) if end <= self.0.len => Ok(()),
            _ => Err(Error::OutOfBounds {
                offset,
                len,
                size: self.0.len,
            }),
        }
    }
}

impl Debug for SoftwareResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SoftwareResource(#{} {:?} {} bytes)",
            self.0.id, self.0.desc.dimension, self.0.len
        )
    }
}

/// Where one subresource sits in a texture's packed backing memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct SubresourceLayout {
    offset: u64,
    width: u32,
    height: u32,
    depth: u32,
}

fn subresource_bytes(desc: &ResourceDesc, mip: u32) -> u64 {
    mip_extent(desc.width as u32, mip) as u64
        * mip_extent(desc.height, mip) as u64
        * mip_extent(desc.depth(), mip) as u64
        * desc.format.bytes_per_texel() as u64
}

//subresources are packed back to back in D3D order: mips of slice 0, then slice 1, ...
fn subresource_layout(desc: &ResourceDesc, index: u32) -> SubresourceLayout {
    assert!(
        index < desc.subresource_count(),
        "subresource {index} out of range"
    );
    let mips = desc.mip_levels as u32;
    let offset: u64 = (0..index).map(|i| subresource_bytes(desc, i % mips)).sum();
    let mip = index % mips;
    SubresourceLayout {
        offset,
        width: mip_extent(desc.width as u32, mip),
        height: mip_extent(desc.height, mip),
        depth: mip_extent(desc.depth(), mip),
    }
}

fn content_size(desc: &ResourceDesc) -> u64 {
    match desc.dimension {
        ResourceDimension::Buffer => desc.width,
        _ => {
            let mips = desc.mip_levels as u32;
            (0..desc.subresource_count())
                .map(|i| subresource_bytes(desc, i % mips))
                .sum()
        }
    }
}

/// A copy source or destination resolved to byte addressing.
struct Region<'a> {
    resource: &'a SoftwareResource,
    base: u64,
    row_pitch: u64,
    slice_pitch: u64,
    bytes_per_texel: u32,
    extent: (u32, u32, u32),
}

impl<'a> Region<'a> {
    fn of(location: &'a CopyLocation) -> Self {
        match location {
            CopyLocation::Subresource { resource, index } => {
                let desc = resource.desc();
                let l = subresource_layout(desc, *index);
                let bytes_per_texel = desc.format.bytes_per_texel();
                let row_pitch = l.width as u64 * bytes_per_texel as u64;
                Region {
                    resource,
                    base: l.offset,
                    row_pitch,
                    slice_pitch: row_pitch * l.height as u64,
                    bytes_per_texel,
                    extent: (l.width, l.height, l.depth),
                }
            }
            CopyLocation::Footprint {
                resource,
                footprint,
            } => {
                let f = &footprint.footprint;
                Region {
                    resource,
                    base: footprint.offset,
                    row_pitch: f.row_pitch as u64,
                    slice_pitch: f.row_pitch as u64 * f.height as u64,
                    bytes_per_texel: f.format.bytes_per_texel(),
                    extent: (f.width, f.height, f.depth),
                }
            }
        }
    }

    fn offset(&self, x: u32, y: u32, z: u32) -> usize {
        (self.base
            + z as u64 * self.slice_pitch
            + y as u64 * self.row_pitch
            + x as u64 * self.bytes_per_texel as u64) as usize
    }

    fn assert_contains(&self, b: &Box3, what: &str) {
        let (w, h, d) = self.extent;
        assert!(
            b.left <= b.right && b.top <= b.bottom && b.front <= b.back,
            "{what} box {b:?} is inverted"
        );
        assert!(
            b.right <= w && b.bottom <= h && b.back <= d,
            "{what} box {b:?} exceeds extent {w}x{h}x{d}"
        );
    }
}

/**
An in-memory device.

Heaps are byte vectors; commands run on the CPU when a list is passed to
[`execute`](Self::execute).  Creation enforces the same heap/state rules D3D12 does, so a request
this device accepts is one the driver would accept too.
*/
pub struct SoftwareDevice {
    config: SoftwareDeviceConfig,
    budget: Arc<Budget>,
    next_id: AtomicU64,
    next_va: AtomicU64,
    root_constants: Mutex<HashMap<u32, Vec<u32>>>,
}

impl SoftwareDevice {
    pub fn new(config: SoftwareDeviceConfig) -> Self {
        logwise::info_sync!(
            "SoftwareDevice: budget {budget} uma={uma}",
            budget = config.memory_budget,
            uma = logwise::privacy::LogIt(&config.cache_coherent_uma)
        );
        Self {
            config,
            budget: Arc::new(Budget {
                used: AtomicU64::new(0),
                limit: config.memory_budget,
            }),
            next_id: AtomicU64::new(1),
            next_va: AtomicU64::new(0x1_0000_0000),
            root_constants: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SoftwareDeviceConfig {
        &self.config
    }

    /// Bytes of heap memory currently alive.
    pub fn memory_in_use(&self) -> u64 {
        self.budget.used.load(Ordering::Acquire)
    }

    /// `CreateHeap`.
    pub fn create_heap(
        &self,
        size: u64,
        properties: HeapProperties,
    ) -> Result<Arc<SoftwareHeap>, Error> {
        self.budget.reserve(size, properties.heap_type)?;
        let Ok(len) = usize::try_from(size) else {
            self.budget.release(size);
            return Err(Error::OutOfMemory {
                requested: size,
                heap: properties.heap_type,
            });
        };
        Ok(Arc::new(SoftwareHeap {
            properties,
            size,
            bytes: Mutex::new(vec![0; len]),
            budget: self.budget.clone(),
        }))
    }

    /// `CreatePlacedResource`.
    pub fn create_placed_resource(
        &self,
        heap: &Arc<SoftwareHeap>,
        heap_offset: u64,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        _clear_value: Option<&ClearValue>,
    ) -> Result<SoftwareResource, Error> {
        const OP: &str = "CreatePlacedResource";
        validate(OP, &heap.properties, desc, initial_state)?;
        let info = self.resource_allocation_info(desc);
        if heap_offset % info.alignment != 0 || heap_offset + info.size_in_bytes > heap.size {
            return Err(invalid(OP));
        }
        Ok(self.make_resource(heap.clone(), heap_offset, desc, initial_state, info))
    }

    fn make_resource(
        &self,
        heap: Arc<SoftwareHeap>,
        heap_offset: u64,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        info: ResourceAllocationInfo,
    ) -> SoftwareResource {
        let gpu_va = self
            .next_va
            .fetch_add(info.size_in_bytes, Ordering::Relaxed);
        SoftwareResource(Arc::new(ResourceInner {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            desc: *desc,
            heap,
            heap_offset,
            len: content_size(desc),
            gpu_va,
            state: Mutex::new(initial_state),
        }))
    }

    /// Values bound to root parameter `index` by executed lists.
    pub fn root_constants(&self, index: u32) -> Vec<u32> {
        lock(&self.root_constants)
            .get(&index)
            .cloned()
            .unwrap_or_default()
    }

    /// Runs every command recorded in `list`, then empties it.
    ///
    /// # Panics
    ///
    /// On copies that leave either resource's bounds, which the debug layer would also reject.
    pub fn execute(&self, list: &mut SoftwareCommandList) {
        for command in list.take() {
            match command {
                Command::Barrier {
                    resource,
                    before,
                    after,
                    ..
                } => {
                    let mut state = lock(&resource.0.state);
                    if *state != before {
                        logwise::warn_sync!(
                            "barrier on {resource}: before is {before} but resource is in {state}",
                            resource = logwise::privacy::LogIt(&resource),
                            before = logwise::privacy::LogIt(&before),
                            state = logwise::privacy::LogIt(&*state)
                        );
                    }
                    *state = after;
                }
                Command::CopyTextureRegion {
                    dst,
                    dst_x,
                    dst_y,
                    dst_z,
                    src,
                    src_box,
                } => copy_region(&dst, (dst_x, dst_y, dst_z), &src, src_box),
                Command::CopyBufferRegion {
                    dst,
                    dst_offset,
                    src,
                    src_offset,
                    num_bytes,
                } => {
                    let (s, d, n) = (src_offset as usize, dst_offset as usize, num_bytes as usize);
                    let staging = src.with_memory(|bytes| {
                        assert!(s + n <= bytes.len(), "buffer copy reads past {src:?}");
                        bytes[s..s + n].to_vec()
                    });
                    dst.with_memory(|bytes| {
                        assert!(d + n <= bytes.len(), "buffer copy writes past {dst:?}");
                        bytes[d..d + n].copy_from_slice(&staging);
                    });
                }
                Command::SetComputeRoot32BitConstants {
                    root_parameter_index,
                    values,
                    dest_offset,
                } => {
                    let mut constants = lock(&self.root_constants);
                    let slot = constants.entry(root_parameter_index).or_default();
                    let start = dest_offset as usize;
                    if slot.len() < start + values.len() {
                        slot.resize(start + values.len(), 0);
                    }
                    slot[start..start + values.len()].copy_from_slice(&values);
                }
            }
        }
    }
}

fn copy_region(dst: &CopyLocation, at: (u32, u32, u32), src: &CopyLocation, src_box: Option<Box3>) {
    let src_region = Region::of(src);
    let dst_region = Region::of(dst);
    assert_eq!(
        src_region.bytes_per_texel, dst_region.bytes_per_texel,
        "copy between formats of different sizes"
    );
    let (w, h, d) = src_region.extent;
    let b = src_box.unwrap_or(Box3 {
        left: 0,
        top: 0,
        front: 0,
        right: w,
        bottom: h,
        back: d,
    });
    src_region.assert_contains(&b, "source");
    let dst_box = Box3 {
        left: at.0,
        top: at.1,
        front: at.2,
        right: at.0 + b.width(),
        bottom: at.1 + b.height(),
        back: at.2 + b.depth(),
    };
    dst_region.assert_contains(&dst_box, "destination");
    let row = b.width() as usize * src_region.bytes_per_texel as usize;
    let staging = src_region.resource.with_memory(|bytes| {
        let mut staging = Vec::with_capacity(row * (b.height() * b.depth()) as usize);
        for z in b.front..b.back {
            for y in b.top..b.bottom {
                let start = src_region.offset(b.left, y, z);
                staging.extend_from_slice(&bytes[start..start + row]);
            }
        }
        staging
    });
    dst_region.resource.with_memory(|bytes| {
        let mut rows = staging.chunks_exact(row.max(1));
        for z in dst_box.front..dst_box.back {
            for y in dst_box.top..dst_box.bottom {
                let start = dst_region.offset(dst_box.left, y, z);
                if let Some(chunk) = rows.next() {
                    bytes[start..start + row].copy_from_slice(chunk);
                }
            }
        }
    });
}

fn invalid(operation: &'static str) -> Error {
    Error::Device {
        operation,
        hresult: HResult::E_INVALIDARG,
    }
}

/// The creation rules the D3D12 runtime enforces.
fn validate(
    operation: &'static str,
    heap: &HeapProperties,
    desc: &ResourceDesc,
    initial_state: ResourceStates,
) -> Result<(), Error> {
    let empty = desc.width == 0
        || desc.height == 0
        || desc.depth_or_array_size == 0
        || desc.mip_levels == 0;
    let texture = desc.dimension.is_texture();
    let bad_heap = match heap.heap_type {
        HeapType::Upload => texture || initial_state != ResourceStates::GENERIC_READ,
        HeapType::Readback => texture || initial_state != ResourceStates::COPY_DEST,
        HeapType::Default | HeapType::Custom => false,
    };
    let bad_format = texture
        && (desc.format == Format::Unknown
            || (desc.flags.contains(ResourceFlags::ALLOW_UNORDERED_ACCESS)
                && !desc.format.supports_typed_uav()));
    if empty || bad_heap || bad_format {
        logwise::error_sync!(
            "{operation} rejected {desc} in {heap} starting {state}",
            operation = operation,
            desc = logwise::privacy::LogIt(desc),
            heap = logwise::privacy::LogIt(heap),
            state = logwise::privacy::LogIt(&initial_state)
        );
        return Err(invalid(operation));
    }
    Ok(())
}

impl Device for SoftwareDevice {
    type Resource = SoftwareResource;
    type DescriptorHeap = SoftwareDescriptorHeap;

    fn architecture(&self) -> Result<Architecture, Error> {
        self.config
            .architecture_status
            .ok()
            .map_err(|hresult| Error::Device {
                operation: "CheckFeatureSupport",
                hresult,
            })?;
        Ok(Architecture {
            tile_based_renderer: false,
            uma: self.config.cache_coherent_uma,
            cache_coherent_uma: self.config.cache_coherent_uma,
        })
    }

    fn create_committed_resource(
        &self,
        heap_properties: &HeapProperties,
        heap_flags: HeapFlags,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        _clear_value: Option<&ClearValue>,
    ) -> Result<SoftwareResource, Error> {
        validate("CreateCommittedResource", heap_properties, desc, initial_state)?;
        let info = self.resource_allocation_info(desc);
        //fresh heaps are always zero here, so CREATE_NOT_ZEROED changes nothing observable
        let heap = self.create_heap(info.size_in_bytes, *heap_properties)?;
        let resource = self.make_resource(heap, 0, desc, initial_state, info);
        logwise::trace_sync!(
            "CreateCommittedResource {resource} flags {flags}",
            resource = logwise::privacy::LogIt(&resource),
            flags = logwise::privacy::LogIt(&heap_flags)
        );
        Ok(resource)
    }

    fn resource_desc(&self, resource: &SoftwareResource) -> ResourceDesc {
        *resource.desc()
    }

    fn resource_allocation_info(&self, desc: &ResourceDesc) -> ResourceAllocationInfo {
        ResourceAllocationInfo {
            size_in_bytes: align_up(content_size(desc).max(1), DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT),
            alignment: DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT,
        }
    }

    fn copyable_footprints(
        &self,
        desc: &ResourceDesc,
        subresource: u32,
        base_offset: u64,
    ) -> Footprint {
        linear_footprint(desc, subresource, base_offset)
    }

    fn gpu_virtual_address(&self, resource: &SoftwareResource) -> u64 {
        //only buffers have one
        match resource.desc().dimension {
            ResourceDimension::Buffer => resource.0.gpu_va,
            _ => 0,
        }
    }

    fn create_descriptor_heap(&self, capacity: u32) -> Result<SoftwareDescriptorHeap, Error> {
        Ok(SoftwareDescriptorHeap::new(capacity))
    }

    fn create_constant_buffer_view(
        &self,
        desc: &ConstantBufferViewDesc,
        heap: &SoftwareDescriptorHeap,
        slot: u32,
    ) {
        heap.put(slot, Descriptor::ConstantBuffer(*desc));
    }

    fn create_shader_resource_view(
        &self,
        resource: &SoftwareResource,
        desc: &ShaderResourceViewDesc,
        heap: &SoftwareDescriptorHeap,
        slot: u32,
    ) {
        heap.put(
            slot,
            Descriptor::ShaderResource {
                resource: resource.clone(),
                desc: *desc,
            },
        );
    }

    fn create_unordered_access_view(
        &self,
        resource: &SoftwareResource,
        desc: &UnorderedAccessViewDesc,
        heap: &SoftwareDescriptorHeap,
        slot: u32,
    ) {
        heap.put(
            slot,
            Descriptor::UnorderedAccess {
                resource: resource.clone(),
                desc: *desc,
            },
        );
    }

    fn write_buffer(&self, resource: &SoftwareResource, offset: u64, data: &[u8]) -> Result<(), Error> {
        if !resource.heap_properties().is_cpu_visible() {
            return Err(Error::NotCpuVisible {
                heap: resource.heap_properties().heap_type,
            });
        }
        resource.check_range(offset, data.len() as u64)?;
        resource.with_memory(|bytes| {
            bytes[offset as usize..offset as usize + data.len()].copy_from_slice(data);
        });
        Ok(())
    }

    fn read_buffer(&self, resource: &SoftwareResource, offset: u64, out: &mut [u8]) -> Result<(), Error> {
        if !resource.heap_properties().is_cpu_visible() {
            return Err(Error::NotCpuVisible {
                heap: resource.heap_properties().heap_type,
            });
        }
        resource.check_range(offset, out.len() as u64)?;
        resource.with_memory(|bytes| {
            out.copy_from_slice(&bytes[offset as usize..offset as usize + out.len()]);
        });
        Ok(())
    }
}

impl Debug for SoftwareDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareDevice")
            .field("config", &self.config)
            .field("memory_in_use", &self.memory_in_use())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::{CpuPageProperty, MemoryPool};

    fn device() -> SoftwareDevice {
        SoftwareDevice::new(SoftwareDeviceConfig::default())
    }

    #[test]
    fn mips_pack_back_to_back() {
        let mut desc = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8Unorm,
            8,
            8,
            2,
            ResourceFlags::NONE,
        );
        desc.mip_levels = 2;
        assert_eq!(subresource_layout(&desc, 1).offset, 64);
        assert_eq!(subresource_layout(&desc, 2).offset, 64 + 16);
        assert_eq!(content_size(&desc), 2 * (64 + 16));
    }

    #[test]
    fn upload_heap_rules() {
        let d = device();
        let heap = HeapProperties::of_type(HeapType::Upload);
        let buffer = ResourceDesc::buffer(64, ResourceFlags::NONE);
        let err = d
            .create_committed_resource(&heap, HeapFlags::NONE, &buffer, ResourceStates::COMMON, None)
            .unwrap_err();
        assert_eq!(err.hresult(), HResult::E_INVALIDARG);
        assert!(
            d.create_committed_resource(
                &heap,
                HeapFlags::NONE,
                &buffer,
                ResourceStates::GENERIC_READ,
                None
            )
            .is_ok()
        );
    }

    #[test]
    fn srgb_cannot_be_unordered() {
        let d = device();
        let desc = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8G8B8A8UnormSrgb,
            4,
            4,
            1,
            ResourceFlags::ALLOW_UNORDERED_ACCESS,
        );
        let err = d
            .create_committed_resource(
                &HeapProperties::of_type(HeapType::Default),
                HeapFlags::NONE,
                &desc,
                ResourceStates::UNORDERED_ACCESS,
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Device {
                operation: "CreateCommittedResource",
                ..
            }
        ));
    }

    #[test]
    fn budget_is_enforced_and_returned() {
        let d = SoftwareDevice::new(SoftwareDeviceConfig {
            memory_budget: 128 * 1024,
            ..Default::default()
        });
        let heap = HeapProperties::of_type(HeapType::Default);
        let desc = ResourceDesc::buffer(100 * 1024, ResourceFlags::NONE);
        let r = d
            .create_committed_resource(&heap, HeapFlags::NONE, &desc, ResourceStates::COMMON, None)
            .unwrap();
        assert_eq!(d.memory_in_use(), 128 * 1024);
        let err = d
            .create_committed_resource(&heap, HeapFlags::NONE, &desc, ResourceStates::COMMON, None)
            .unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));
        drop(r);
        assert_eq!(d.memory_in_use(), 0);
    }

    #[test]
    fn default_heap_is_not_mappable() {
        let d = device();
        let r = d
            .create_committed_resource(
                &HeapProperties::of_type(HeapType::Default),
                HeapFlags::NONE,
                &ResourceDesc::buffer(16, ResourceFlags::NONE),
                ResourceStates::COMMON,
                None,
            )
            .unwrap();
        assert!(matches!(
            d.write_buffer(&r, 0, &[1]),
            Err(Error::NotCpuVisible {
                heap: HeapType::Default
            })
        ));
    }

    #[test]
    fn coherent_custom_heap_is_mappable() {
        let d = device();
        let heap = HeapProperties {
            heap_type: HeapType::Custom,
            cpu_page_property: CpuPageProperty::WriteBack,
            memory_pool_preference: MemoryPool::L0,
            creation_node_mask: 0,
            visible_node_mask: 0,
        };
        let r = d
            .create_committed_resource(
                &heap,
                HeapFlags::NONE,
                &ResourceDesc::buffer(16, ResourceFlags::NONE),
                ResourceStates::COMMON,
                None,
            )
            .unwrap();
        d.write_buffer(&r, 4, &[1, 2, 3]).unwrap();
        let mut out = [0u8; 8];
        d.read_buffer(&r, 0, &mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 0, 1, 2, 3, 0]);
        assert!(matches!(
            d.read_buffer(&r, 10, &mut out),
            Err(Error::OutOfBounds { .. })
        ));
    }
}
