#![cfg(feature = "backend_software")]
/*!
Texture/buffer copies recorded through the command recorder and executed on the in-memory device.
*/

use heapwise::allocation::{Allocation, CommittedAllocator, ResourceAllocator};
use heapwise::bindings::{AllocationRequest, ResourceIntent, ResourceShape};
use heapwise::commands::{CommandRecorder, Extent, Texel};
use heapwise::footprint::{Footprint, read_texels, write_texels};
use heapwise::imp::software::{Command, SoftwareCommandList, SoftwareDevice, SoftwareResource};
use heapwise::imp::{Box3, Device, ResourceFlags, ResourceStates};
use heapwise::pixel_formats::{Float4, Format, RGBA8UNorm, RGBA32Float, Unorm4};
use std::sync::Arc;

struct Rig {
    device: Arc<SoftwareDevice>,
    allocator: CommittedAllocator<SoftwareDevice>,
}

impl Rig {
    fn new() -> Self {
        let device = Arc::new(SoftwareDevice::new(Default::default()));
        Rig {
            allocator: CommittedAllocator::new(device.clone()).unwrap(),
            device,
        }
    }

    fn alloc(&self, intent: ResourceIntent, shape: ResourceShape, name: &str) -> Allocation<SoftwareResource> {
        self.allocator
            .allocate(&AllocationRequest::new(intent, shape).with_debug_name(name))
            .unwrap()
    }

    fn buffer_for(&self, intent: ResourceIntent, footprint: &Footprint) -> Allocation<SoftwareResource> {
        self.alloc(
            intent,
            ResourceShape::buffer(footprint.required_buffer_size()),
            "staging",
        )
    }
}

/// Texel (x, y) of an RGBA8 test image: four distinct bytes per texel.
fn texel(x: u32, y: u32) -> Unorm4 {
    Unorm4 {
        r: x as u8,
        g: y as u8,
        b: (x * 7 + y) as u8,
        a: 0xFF,
    }
}

/// Stages the test image into `buffer` laid out per `footprint`.
fn fill(rig: &Rig, buffer: &Allocation<SoftwareResource>, footprint: &Footprint) {
    let f = &footprint.placed.footprint;
    let image: Vec<Unorm4> = (0..f.height)
        .flat_map(|y| (0..f.width).map(move |x| texel(x, y)))
        .collect();
    write_texels::<RGBA8UNorm, _>(rig.device.as_ref(), buffer, footprint, &image).unwrap();
}

fn read_image(rig: &Rig, buffer: &Allocation<SoftwareResource>, footprint: &Footprint) -> Vec<Unorm4> {
    read_texels::<RGBA8UNorm, _>(rig.device.as_ref(), buffer, footprint).unwrap()
}

fn texture_copy_boxes(list: &SoftwareCommandList) -> Vec<Option<Box3>> {
    list.commands()
        .iter()
        .filter_map(|c| match c {
            Command::CopyTextureRegion { src_box, .. } => Some(*src_box),
            _ => None,
        })
        .collect()
}

#[test]
fn whole_texture_round_trip_uses_no_box() {
    let rig = Rig::new();
    //100 texels * 4 bytes = 400, so every row is padded to 512
    let texture = rig.alloc(
        ResourceIntent::ReadOnly,
        ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 100, 3),
        "image",
    );
    let footprint = Footprint::of(rig.device.as_ref(), &texture, 0);
    assert_eq!(footprint.row_pitch(), 512);
    let upload = rig.buffer_for(ResourceIntent::Upload, &footprint);
    let readback = rig.buffer_for(ResourceIntent::ReadBack, &footprint);
    fill(&rig, &upload, &footprint);

    let full = Extent::new(100, 3, 1);
    let mut list = SoftwareCommandList::new();
    {
        let mut r = CommandRecorder::new(&mut list);
        r.barrier(&texture, ResourceStates::COMMON, ResourceStates::COPY_DEST);
        r.copy_buffer_to_texture(&upload, &footprint, Texel::ORIGIN, full, &texture, Texel::ORIGIN);
        r.barrier(&texture, ResourceStates::COPY_DEST, ResourceStates::COPY_SOURCE);
        r.copy_texture_to_buffer(&texture, Texel::ORIGIN, full, &readback, &footprint);
    }
    assert_eq!(texture_copy_boxes(&list), vec![None, None]);
    rig.device.execute(&mut list);
    assert!(list.commands().is_empty());

    assert_eq!(texture.resource().state(), ResourceStates::COPY_SOURCE);
    let image = read_image(&rig, &readback, &footprint);
    for y in 0..3 {
        let expected: Vec<Unorm4> = (0..100).map(|x| texel(x, y)).collect();
        assert_eq!(image[y as usize * 100..][..100], expected[..], "row {y}");
    }
    //row 1 starts one pitch in, not right after row 0's texels
    let mut raw = [0u8; 4];
    rig.device.read_buffer(readback.resource(), footprint.placed.offset + 512, &mut raw).unwrap();
    assert_eq!(raw, [0, 1, 1, 0xFF]);
}

#[test]
fn sub_region_uses_an_explicit_box() {
    let rig = Rig::new();
    let texture = rig.alloc(
        ResourceIntent::ReadOnly,
        ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 8, 8),
        "image",
    );
    let footprint = Footprint::of(rig.device.as_ref(), &texture, 0);
    let upload = rig.buffer_for(ResourceIntent::Upload, &footprint);
    fill(&rig, &upload, &footprint);

    //footprint for a 3x2 region
    let region_desc = ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 3, 2)
        .describe(ResourceFlags::NONE);
    let region = Footprint::query(rig.device.as_ref(), &region_desc, 0);
    let readback = rig.buffer_for(ResourceIntent::ReadBack, &region);

    let mut list = SoftwareCommandList::new();
    {
        let mut r = CommandRecorder::new(&mut list);
        r.copy_buffer_to_texture(
            &upload,
            &footprint,
            Texel::ORIGIN,
            Extent::new(8, 8, 1),
            &texture,
            Texel::ORIGIN,
        );
        r.copy_texture_to_buffer(&texture, Texel::new(2, 5, 0), Extent::new(3, 2, 1), &readback, &region);
    }
    assert_eq!(
        texture_copy_boxes(&list),
        vec![
            None,
            Some(Box3 {
                left: 2,
                top: 5,
                front: 0,
                right: 5,
                bottom: 7,
                back: 1
            })
        ]
    );
    rig.device.execute(&mut list);

    let expected: Vec<Unorm4> = (5..7)
        .flat_map(|y| (2..5).map(move |x| texel(x, y)))
        .collect();
    assert_eq!(read_image(&rig, &readback, &region), expected);
}

#[test]
fn offset_upload_into_a_corner() {
    let rig = Rig::new();
    let texture = rig.alloc(
        ResourceIntent::ReadWrite,
        ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 4, 4),
        "target",
    );
    let patch_desc = ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 2, 2)
        .describe(ResourceFlags::NONE);
    let patch = Footprint::query(rig.device.as_ref(), &patch_desc, 0);
    let upload = rig.buffer_for(ResourceIntent::Upload, &patch);
    fill(&rig, &upload, &patch);

    let whole = Footprint::of(rig.device.as_ref(), &texture, 0);
    let readback = rig.buffer_for(ResourceIntent::ReadBack, &whole);

    let mut list = SoftwareCommandList::new();
    {
        let mut r = CommandRecorder::new(&mut list);
        //whole 2x2 source into the bottom-right corner: still no box
        r.copy_buffer_to_texture(&upload, &patch, Texel::ORIGIN, Extent::new(2, 2, 1), &texture, Texel::new(2, 2, 0));
        r.copy_texture_to_buffer(&texture, Texel::ORIGIN, Extent::new(4, 4, 1), &readback, &whole);
    }
    assert_eq!(texture_copy_boxes(&list), vec![None, None]);
    rig.device.execute(&mut list);

    let image = read_image(&rig, &readback, &whole);
    let expected: Vec<Unorm4> = (0..4)
        .flat_map(|y| {
            (0..4).map(move |x| match (x, y) {
                (2.., 2..) => texel(x - 2, y - 2),
                _ => Unorm4::default(),
            })
        })
        .collect();
    assert_eq!(image, expected);
}

#[test]
fn buffer_copy_and_root_constants() {
    let rig = Rig::new();
    let src = rig.alloc(ResourceIntent::Upload, ResourceShape::buffer(64), "src");
    let dst = rig.alloc(ResourceIntent::ReadBack, ResourceShape::buffer(64), "dst");
    rig.device.write_buffer(src.resource(), 0, &(0..64).collect::<Vec<u8>>()).unwrap();

    let mut list = SoftwareCommandList::new();
    {
        let mut r = CommandRecorder::new(&mut list);
        r.copy_buffer(&src, 8, &dst, 32, 16);
        r.set_root_constants(&[7, 8, 9]);
    }
    assert!(matches!(
        list.commands()[1],
        Command::SetComputeRoot32BitConstants {
            root_parameter_index: 0,
            dest_offset: 0,
            ..
        }
    ));
    rig.device.execute(&mut list);

    let mut out = [0u8; 16];
    rig.device.read_buffer(dst.resource(), 32, &mut out).unwrap();
    assert_eq!(out.to_vec(), (8..24).collect::<Vec<u8>>());
    assert_eq!(rig.device.root_constants(0), vec![7, 8, 9]);
}

#[test]
fn barriers_are_recorded_one_per_call() {
    let rig = Rig::new();
    let a = rig.alloc(ResourceIntent::ReadOnly, ResourceShape::buffer(16), "a");
    let mut list = SoftwareCommandList::new();
    {
        let mut r = CommandRecorder::new(&mut list);
        r.barrier(&a, ResourceStates::COMMON, ResourceStates::COPY_DEST);
        //redundant, and still recorded
        r.barrier(&a, ResourceStates::COPY_DEST, ResourceStates::COPY_DEST);
    }
    assert_eq!(list.commands().len(), 2);
    for c in list.commands() {
        assert!(matches!(
            c,
            Command::Barrier {
                subresource: u32::MAX,
                ..
            }
        ));
    }
}

#[test]
#[should_panic(expected = "texel type doesn't match the footprint's format")]
fn staging_texels_of_another_format_is_refused() {
    let rig = Rig::new();
    let desc = ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 2, 1).describe(ResourceFlags::NONE);
    let footprint = Footprint::query(rig.device.as_ref(), &desc, 0);
    let upload = rig.buffer_for(ResourceIntent::Upload, &footprint);
    let texels = vec![Float4::default(); 2];
    let _ = write_texels::<RGBA32Float, _>(rig.device.as_ref(), &upload, &footprint, &texels);
}

#[test]
#[should_panic(expected = "texel count doesn't match the footprint's extent")]
fn staging_a_short_image_is_refused() {
    let rig = Rig::new();
    let desc = ResourceShape::texture_2d(Format::R8G8B8A8Unorm, 4, 4).describe(ResourceFlags::NONE);
    let footprint = Footprint::query(rig.device.as_ref(), &desc, 0);
    let upload = rig.buffer_for(ResourceIntent::Upload, &footprint);
    let _ = write_texels::<RGBA8UNorm, _>(rig.device.as_ref(), &upload, &footprint, &[texel(0, 0)]);
}
