#![cfg(feature = "backend_software")]
/*!
Read a texture back through the command recorder and export it as a PNG through the stream shim.
*/

use heapwise::allocation::{Allocation, CommittedAllocator, ResourceAllocator};
use heapwise::bindings::{AllocationRequest, ResourceIntent, ResourceShape};
use heapwise::commands::{CommandRecorder, Extent, Texel};
use heapwise::footprint::Footprint;
use heapwise::imp::software::{SoftwareCommandList, SoftwareDevice, SoftwareResource};
use heapwise::imp::{Device, ResourceStates};
use heapwise::pixel_formats::{Format, encode_png};
use heapwise::stream::ComStream;
use heapwise::Error;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

const WIDTH: u32 = 37;
const HEIGHT: u32 = 5;

fn pixel(x: u32, y: u32) -> [u8; 4] {
    [(x * 6) as u8, (y * 50) as u8, (x ^ y) as u8, 200]
}

/// Uploads the test image into a fresh texture of `format` and copies it back into a read-back
/// buffer.  Returns the padded buffer contents and its footprint.
fn round_trip(format: Format) -> (Vec<u8>, Footprint) {
    let device = Arc::new(SoftwareDevice::new(Default::default()));
    let allocator = CommittedAllocator::new(device.clone()).unwrap();
    let alloc = |intent, shape| -> Allocation<SoftwareResource> {
        allocator
            .allocate(&AllocationRequest::new(intent, shape))
            .unwrap()
    };
    let texture = alloc(
        ResourceIntent::ReadOnly,
        ResourceShape::texture_2d(format, WIDTH, HEIGHT),
    );
    let footprint = Footprint::of(device.as_ref(), &texture, 0);
    let size = footprint.required_buffer_size();
    let upload = alloc(ResourceIntent::Upload, ResourceShape::buffer(size));
    let readback = alloc(ResourceIntent::ReadBack, ResourceShape::buffer(size));

    for y in 0..HEIGHT {
        let row: Vec<u8> = (0..WIDTH).flat_map(|x| pixel(x, y)).collect();
        let offset = footprint.placed.offset + y as u64 * footprint.row_pitch() as u64;
        device.write_buffer(upload.resource(), offset, &row).unwrap();
    }

    let whole = Extent::new(WIDTH, HEIGHT, 1);
    let mut list = SoftwareCommandList::new();
    {
        let mut r = CommandRecorder::new(&mut list);
        r.barrier(&texture, ResourceStates::COMMON, ResourceStates::COPY_DEST);
        r.copy_buffer_to_texture(&upload, &footprint, Texel::ORIGIN, whole, &texture, Texel::ORIGIN);
        r.barrier(&texture, ResourceStates::COPY_DEST, ResourceStates::COPY_SOURCE);
        r.copy_texture_to_buffer(&texture, Texel::ORIGIN, whole, &readback, &footprint);
    }
    device.execute(&mut list);

    let mut data = vec![0u8; size as usize];
    device.read_buffer(readback.resource(), 0, &mut data).unwrap();
    //the footprint may place the first row past offset 0
    (data.split_off(footprint.placed.offset as usize), footprint)
}

fn decode(bytes: Vec<u8>) -> (png::OutputInfo, Vec<u8>) {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; (WIDTH * HEIGHT * 4) as usize];
    let info = reader.next_frame(&mut buf).unwrap();
    (info, buf)
}

#[test]
fn readback_exports_through_a_com_stream() {
    let (data, footprint) = round_trip(Format::R8G8B8A8Unorm);
    assert!(footprint.row_pitch() > WIDTH * 4);

    let mut stream = ComStream::bidirectional(Cursor::new(Vec::new()));
    encode_png(
        stream.clone(),
        WIDTH,
        HEIGHT,
        Format::R8G8B8A8Unorm,
        footprint.row_pitch(),
        &data,
    )
    .unwrap();
    assert!(stream.stat().unwrap().size > 0);

    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut encoded = Vec::new();
    stream.read_to_end(&mut encoded).unwrap();
    assert_eq!(&encoded[..8], b"\x89PNG\r\n\x1a\n");

    let (info, pixels) = decode(encoded);
    assert_eq!((info.width, info.height), (WIDTH, HEIGHT));
    assert_eq!(info.color_type, png::ColorType::Rgba);
    let expected: Vec<u8> = (0..HEIGHT)
        .flat_map(|y| (0..WIDTH).flat_map(move |x| pixel(x, y)))
        .collect();
    assert_eq!(pixels, expected);
}

#[test]
fn bgra_textures_export_as_rgba() {
    let (data, footprint) = round_trip(Format::B8G8R8A8Unorm);
    let mut out = Vec::new();
    encode_png(
        &mut out,
        WIDTH,
        HEIGHT,
        Format::B8G8R8A8Unorm,
        footprint.row_pitch(),
        &data,
    )
    .unwrap();
    let (_, pixels) = decode(out);
    let [b, g, r, a] = pixel(3, 2);
    let at = ((2 * WIDTH + 3) * 4) as usize;
    assert_eq!(&pixels[at..at + 4], &[r, g, b, a]);
}

#[test]
fn write_only_streams_are_enough_for_export() {
    let (data, footprint) = round_trip(Format::R8G8B8A8Unorm);
    let shared = Arc::new(std::sync::Mutex::new(Vec::new()));
    struct Shared(Arc<std::sync::Mutex<Vec<u8>>>);
    impl std::io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    let stream = ComStream::write_only(Shared(shared.clone()));
    encode_png(
        stream,
        WIDTH,
        HEIGHT,
        Format::R8G8B8A8Unorm,
        footprint.row_pitch(),
        &data,
    )
    .unwrap();
    let encoded = shared.lock().unwrap().clone();
    let (info, _) = decode(encoded);
    assert_eq!(info.width, WIDTH);
}

#[test]
fn float_textures_are_not_exportable() {
    let (data, footprint) = round_trip(Format::R8G8B8A8Unorm);
    let err = encode_png(
        Vec::new(),
        WIDTH,
        HEIGHT,
        Format::R32Float,
        footprint.row_pitch(),
        &data,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedFormat {
            format: Format::R32Float,
            ..
        }
    ));
}
