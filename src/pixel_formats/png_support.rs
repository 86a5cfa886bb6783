// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! PNG export of read-back texture data.
//!
//! Read-back buffers are laid out per their [`Footprint`](crate::footprint::Footprint): each row
//! starts on a `row_pitch` boundary, which is usually wider than the texel data.  The encoder
//! strips the padding and hands tight rows to `png`.

use crate::imp::Error;
use crate::pixel_formats::Format;
use png::{BitDepth, ColorType};
use std::io::Write;

struct PngLayout {
    color: ColorType,
    depth: BitDepth,
    swizzle_bgra: bool,
    //16-bit channels are little-endian on the GPU, PNG wants big-endian
    swap_16: bool,
}

fn png_layout(format: Format) -> Option<PngLayout> {
    let plain = |color, depth| PngLayout {
        color,
        depth,
        swizzle_bgra: false,
        swap_16: false,
    };
    match format {
        Format::R8Unorm => Some(plain(ColorType::Grayscale, BitDepth::Eight)),
        Format::R8G8B8A8Unorm | Format::R8G8B8A8UnormSrgb => {
            Some(plain(ColorType::Rgba, BitDepth::Eight))
        }
        Format::B8G8R8A8Unorm | Format::B8G8R8A8UnormSrgb => Some(PngLayout {
            swizzle_bgra: true,
            ..plain(ColorType::Rgba, BitDepth::Eight)
        }),
        Format::R16G16B16A16Unorm => Some(PngLayout {
            swap_16: true,
            ..plain(ColorType::Rgba, BitDepth::Sixteen)
        }),
        _ => None,
    }
}

/**
Encodes `width`×`height` texels of `format` from `data` into `sink` as a PNG.

`row_pitch` is the distance in bytes between the starts of consecutive rows in `data`, as
reported by the footprint the data was copied with.
*/
pub fn encode_png<W: Write>(
    sink: W,
    width: u32,
    height: u32,
    format: Format,
    row_pitch: u32,
    data: &[u8],
) -> Result<(), Error> {
    let layout = png_layout(format).ok_or(Error::UnsupportedFormat {
        format,
        usage: "png export",
    })?;
    let row_bytes = width as usize * format.bytes_per_texel() as usize;
    assert!(
        row_pitch as usize >= row_bytes,
        "row pitch {row_pitch} is narrower than a row of {row_bytes} bytes"
    );
    let needed = if height == 0 {
        0
    } else {
        row_pitch as usize * (height as usize - 1) + row_bytes
    };
    if data.len() < needed {
        return Err(Error::OutOfBounds {
            offset: 0,
            len: needed as u64,
            size: data.len() as u64,
        });
    }

    let mut tight = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let row = &data[y * row_pitch as usize..y * row_pitch as usize + row_bytes];
        tight.extend_from_slice(row);
    }
    if layout.swizzle_bgra {
        for px in tight.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
    }
    if layout.swap_16 {
        for channel in tight.chunks_exact_mut(2) {
            channel.swap(0, 1);
        }
    }

    let perf = logwise::perfwarn_begin!("png_support::encode_png");
    let mut encoder = png::Encoder::new(sink, width, height);
    encoder.set_color(layout.color);
    encoder.set_depth(layout.depth);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&tight)?;
    writer.finish()?;
    drop(perf);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_row_padding() {
        //2x2 RGBA8 with a 256-byte pitch
        let mut data = vec![0xEE_u8; 256 + 8];
        data[0..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let mut out = Vec::new();
        encode_png(&mut out, 2, 2, Format::R8G8B8A8Unorm, 256, &data).unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(out));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; 16];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(buf, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn bgra_is_swizzled() {
        let data = [30_u8, 20, 10, 255];
        let mut out = Vec::new();
        encode_png(&mut out, 1, 1, Format::B8G8R8A8Unorm, 4, &data).unwrap();
        let decoder = png::Decoder::new(std::io::Cursor::new(out));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; 4];
        reader.next_frame(&mut buf).unwrap();
        assert_eq!(buf, [10, 20, 30, 255]);
    }

    #[test]
    fn float_formats_are_refused() {
        let err = encode_png(Vec::new(), 1, 1, Format::R32Float, 4, &[0; 4]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn short_data_is_refused() {
        let err = encode_png(Vec::new(), 2, 2, Format::R8Unorm, 256, &[0; 200]).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
    }
}
