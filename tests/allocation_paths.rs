#![cfg(feature = "backend_software")]
/*!
End-to-end allocation through both strategies on the in-memory device.
*/

use heapwise::allocation::{
    AllocationStrategy, AllocatorConfig, CommittedAllocator, ConfiguredAllocator, Placement,
    PooledAllocator, ResourceAllocator,
};
use heapwise::bindings::{AllocationMode, AllocationRequest, ResourceIntent, ResourceShape};
use heapwise::imp::software::{
    Descriptor, SoftwareDevice, SoftwareDeviceConfig, SoftwareSuballocator, SuballocatorConfig,
};
use heapwise::imp::{
    CpuPageProperty, Device, HeapType, MemoryPool, ResourceFlags, ResourceStates, SrvDimension,
    UavDimension,
};
use heapwise::pixel_formats::Format;
use heapwise::views::ViewFactory;
use heapwise::{Error, HResult};
use std::sync::Arc;

fn device(uma: bool) -> Arc<SoftwareDevice> {
    Arc::new(SoftwareDevice::new(SoftwareDeviceConfig {
        cache_coherent_uma: uma,
        ..Default::default()
    }))
}

fn pool(device: &Arc<SoftwareDevice>) -> Arc<SoftwareSuballocator> {
    Arc::new(SoftwareSuballocator::new(
        device.clone(),
        SuballocatorConfig { block_size: 1 << 20 },
    ))
}

#[test]
fn read_write_texture_on_discrete_hardware() {
    let device = device(false);
    let allocator = CommittedAllocator::new(device.clone()).unwrap();
    let request = AllocationRequest::new(
        ResourceIntent::ReadWrite,
        ResourceShape::texture_2d(Format::R32Float, 64, 64),
    )
    .with_debug_name("field");
    let a = allocator.allocate(&request).unwrap();
    assert_eq!(a.heap_properties().heap_type, HeapType::Default);
    assert!(a.desc().flags.contains(ResourceFlags::ALLOW_UNORDERED_ACCESS));
    assert_eq!(a.initial_state(), ResourceStates::UNORDERED_ACCESS);
    assert_eq!(a.resource().state(), ResourceStates::UNORDERED_ACCESS);
    assert_eq!(a.placement(), Placement::Committed);
    assert_eq!(a.debug_name(), "field");
}

#[test]
fn upload_buffer_on_coherent_uma_uses_custom_heap() {
    let device = device(true);
    let allocator =
        ConfiguredAllocator::new(device.clone(), pool(&device), AllocatorConfig::default())
            .unwrap();
    let request = AllocationRequest::new(ResourceIntent::Upload, ResourceShape::buffer(4096));
    let a = allocator.allocate(&request).unwrap();
    let heap = a.heap_properties();
    assert_eq!(heap.heap_type, HeapType::Custom);
    assert_eq!(heap.cpu_page_property, CpuPageProperty::WriteBack);
    assert_eq!(heap.memory_pool_preference, MemoryPool::L0);
    assert_eq!(a.initial_state(), ResourceStates::GENERIC_READ);
    device.write_buffer(a.resource(), 0, &[9; 32]).unwrap();
}

#[test]
fn config_can_override_the_architecture_report() {
    let device = device(true);
    let config = AllocatorConfig {
        strategy: AllocationStrategy::Committed,
        cache_coherent_uma: Some(false),
    };
    let allocator = ConfiguredAllocator::new(device.clone(), pool(&device), config).unwrap();
    let a = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::ReadBack,
            ResourceShape::buffer(64),
        ))
        .unwrap();
    assert_eq!(a.heap_properties().heap_type, HeapType::Readback);
    assert_eq!(a.initial_state(), ResourceStates::COPY_DEST);
    assert_eq!(a.placement(), Placement::Committed);
}

#[test]
fn failed_architecture_query_is_not_guessed_around() {
    let device = Arc::new(SoftwareDevice::new(SoftwareDeviceConfig {
        cache_coherent_uma: true,
        architecture_status: HResult::DXGI_ERROR_UNSUPPORTED,
        ..Default::default()
    }));
    let err = CommittedAllocator::new(device.clone()).unwrap_err();
    assert!(matches!(
        err,
        Error::Device {
            operation: "CheckFeatureSupport",
            hresult: HResult::DXGI_ERROR_UNSUPPORTED,
        }
    ));
    let err = AllocatorConfig::default()
        .cache_coherent_uma(device.as_ref())
        .unwrap_err();
    assert_eq!(err.hresult(), HResult::DXGI_ERROR_UNSUPPORTED);
    let configured =
        ConfiguredAllocator::new(device.clone(), pool(&device), AllocatorConfig::default());
    assert!(configured.is_err());

    //an explicit override never asks the device
    let config = AllocatorConfig {
        strategy: AllocationStrategy::Committed,
        cache_coherent_uma: Some(true),
    };
    let allocator = ConfiguredAllocator::new(device.clone(), pool(&device), config).unwrap();
    let a = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::Upload,
            ResourceShape::buffer(64),
        ))
        .unwrap();
    assert_eq!(a.heap_properties().heap_type, HeapType::Custom);
}

#[test]
fn both_strategies_place_a_request_on_the_same_heap() {
    let device = device(true);
    let uma = AllocatorConfig::default()
        .cache_coherent_uma(device.as_ref())
        .unwrap();
    assert!(uma);
    let committed = CommittedAllocator::new(device.clone()).unwrap();
    let pooled = PooledAllocator::new(pool(&device), uma);
    let request = AllocationRequest::new(ResourceIntent::ReadBack, ResourceShape::buffer(256));
    let a = committed.allocate(&request).unwrap();
    let b = pooled.allocate(&request).unwrap();
    assert_eq!(a.heap_properties(), b.heap_properties());
    assert_eq!(b.heap_properties().heap_type, HeapType::Custom);
}

#[test]
fn default_heap_on_uma_is_cpu_visible() {
    let device = device(true);
    let allocator = CommittedAllocator::new(device.clone()).unwrap();
    let a = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::ReadOnly,
            ResourceShape::buffer(64),
        ))
        .unwrap();
    device.write_buffer(a.resource(), 0, &[1, 2, 3]).unwrap();

    let discrete = self::device(false);
    let allocator = CommittedAllocator::new(discrete.clone()).unwrap();
    let b = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::ReadOnly,
            ResourceShape::buffer(64),
        ))
        .unwrap();
    assert!(matches!(
        discrete.write_buffer(b.resource(), 0, &[1]),
        Err(Error::NotCpuVisible { .. })
    ));
}

#[test]
fn pooled_memory_is_stale_unless_cleared() {
    let device = device(false);
    let allocator = PooledAllocator::new(pool(&device), false);
    let request = AllocationRequest::new(ResourceIntent::Upload, ResourceShape::buffer(512));

    let first = allocator.allocate(&request).unwrap();
    device.write_buffer(first.resource(), 0, &[0x5A; 64]).unwrap();
    let first_placement = first.placement();
    drop(first);

    let second = allocator.allocate(&request).unwrap();
    assert_eq!(second.placement(), first_placement);
    let mut out = [0u8; 64];
    device.read_buffer(second.resource(), 0, &mut out).unwrap();
    assert_eq!(out, [0x5A; 64]);
    drop(second);

    let cleared = allocator
        .allocate(&request.with_mode(AllocationMode::Clear))
        .unwrap();
    assert_eq!(cleared.placement(), first_placement);
    device.read_buffer(cleared.resource(), 0, &mut out).unwrap();
    assert_eq!(out, [0; 64]);
}

#[test]
fn pooled_neighbours_share_a_heap() {
    let device = device(false);
    let allocator = PooledAllocator::new(pool(&device), false);
    let request = AllocationRequest::new(ResourceIntent::ReadOnly, ResourceShape::buffer(256));
    let a = allocator.allocate(&request).unwrap();
    let b = allocator.allocate(&request).unwrap();
    assert!(a.resource().shares_heap_with(b.resource()));
    let (Placement::Placed { heap_offset: oa, .. }, Placement::Placed { heap_offset: ob, .. }) =
        (a.placement(), b.placement())
    else {
        panic!("pooled allocations should be placed");
    };
    assert_ne!(oa, ob);

    let isolated = allocator
        .allocate(&request.with_mode(AllocationMode::Committed))
        .unwrap();
    assert!(matches!(
        isolated.placement(),
        Placement::Placed {
            dedicated: true,
            ..
        }
    ));
    assert!(!isolated.resource().shares_heap_with(a.resource()));
}

#[test]
fn device_rejections_come_back_verbatim() {
    let device = Arc::new(SoftwareDevice::new(SoftwareDeviceConfig {
        memory_budget: 64 * 1024,
        ..Default::default()
    }));
    let allocator = CommittedAllocator::new(device.clone()).unwrap();
    let big = AllocationRequest::new(ResourceIntent::ReadOnly, ResourceShape::buffer(1 << 20));
    let err = allocator.allocate(&big).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }));
    assert_eq!(err.hresult(), HResult::E_OUTOFMEMORY);

    let srgb_uav = AllocationRequest::new(
        ResourceIntent::ReadWrite,
        ResourceShape::texture_2d(Format::R8G8B8A8UnormSrgb, 4, 4),
    );
    let err = allocator.allocate(&srgb_uav).unwrap_err();
    assert_eq!(err.hresult(), HResult::E_INVALIDARG);
    assert_eq!(device.memory_in_use(), 0);
}

#[test]
#[should_panic(expected = "upload intent is not supported")]
fn texture_upload_is_a_contract_violation() {
    let device = device(false);
    let allocator = CommittedAllocator::new(device).unwrap();
    let request = AllocationRequest::new(
        ResourceIntent::Upload,
        ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 4, 4),
    );
    let _ = allocator.allocate(&request);
}

#[test]
fn views_land_in_their_slots() {
    let device = device(false);
    let allocator = CommittedAllocator::new(device.clone()).unwrap();
    let table = device.create_descriptor_heap(4).unwrap();
    let views = ViewFactory::new(device.as_ref());

    let constants = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::Constant,
            ResourceShape::buffer(100),
        ))
        .unwrap();
    views.constant_buffer(&constants, &table, 0);
    let Some(Descriptor::ConstantBuffer(cbv)) = table.get(0) else {
        panic!("slot 0 should hold a CBV");
    };
    assert_eq!(cbv.size_in_bytes, 256);
    assert_eq!(
        cbv.buffer_location,
        device.gpu_virtual_address(constants.resource())
    );

    let structured = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::ReadWrite,
            ResourceShape::buffer(160),
        ))
        .unwrap();
    views.shader_resource(&structured, 16, &table, 1);
    views.unordered_access(&structured, 16, &table, 2);
    let Some(Descriptor::ShaderResource { desc, .. }) = table.get(1) else {
        panic!("slot 1 should hold an SRV");
    };
    assert_eq!(desc.format, Format::Unknown);
    assert!(matches!(
        desc.dimension,
        SrvDimension::Buffer {
            num_elements: 10,
            structure_byte_stride: 16,
            ..
        }
    ));
    assert!(matches!(
        table.get(2),
        Some(Descriptor::UnorderedAccess { .. })
    ));

    let volume = allocator
        .allocate(&AllocationRequest::new(
            ResourceIntent::ReadWrite,
            ResourceShape::Texture3D {
                format: Format::R32Float,
                width: 8,
                height: 8,
                depth: 4,
            },
        ))
        .unwrap();
    views.unordered_access(&volume, 0, &table, 3);
    let Some(Descriptor::UnorderedAccess { desc, .. }) = table.get(3) else {
        panic!("slot 3 should hold a UAV");
    };
    assert_eq!(desc.format, Format::R32Float);
    assert_eq!(
        desc.dimension,
        UavDimension::Texture3D {
            mip_slice: 0,
            first_w_slice: 0,
            w_size: u32::MAX
        }
    );
}
