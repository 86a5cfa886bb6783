// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Texture layout in linear memory.

A texture's own memory layout is opaque; to move texels through a buffer the device has to say
how they'll be arranged there: how far apart rows are, how many rows there are, and where the
subresource starts.  That answer is a [`Footprint`].

Footprints are cheap to ask for and depend only on the description, so they're recomputed for
every copy rather than cached.
*/

use crate::allocation::Allocation;
use crate::bittricks::{align_up, align_up_u32, mip_extent};
use crate::imp::{
    Device, Error, PlacedFootprint, ResourceDesc, ResourceDimension, SubresourceFootprint,
    TEXTURE_DATA_PITCH_ALIGNMENT, TEXTURE_DATA_PLACEMENT_ALIGNMENT,
};
use crate::pixel_formats::{Format, PixelFormat, pixel_as_bytes, pixel_as_bytes_mut};

/// The result of `GetCopyableFootprints` for one subresource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub placed: PlacedFootprint,
    /// Rows per depth slice.
    pub num_rows: u32,
    /// Bytes of texel data in one row, without pitch padding.
    pub row_size_in_bytes: u64,
    /// Bytes from `placed.offset` to the end of the last row.
    pub total_bytes: u64,
}

impl Footprint {
    /// Asks `device` for the footprint of subresource `subresource` of `desc`.
    pub fn query<D: Device>(device: &D, desc: &ResourceDesc, subresource: u32) -> Footprint {
        device.copyable_footprints(desc, subresource, 0)
    }

    /// Footprint of subresource `subresource` of a live allocation.
    pub fn of<D: Device>(device: &D, allocation: &Allocation<D::Resource>, subresource: u32) -> Footprint {
        let desc = device.resource_desc(allocation.resource());
        Self::query(device, &desc, subresource)
    }

    pub fn row_pitch(&self) -> u32 {
        self.placed.footprint.row_pitch
    }

    /// Smallest buffer that can hold this footprint.
    pub fn required_buffer_size(&self) -> u64 {
        self.placed.offset + self.total_bytes
    }

    /// Texels covered by this footprint.
    pub fn texel_count(&self) -> usize {
        let f = &self.placed.footprint;
        f.width as usize * f.height as usize * f.depth as usize
    }

    /// `(y, z)` of every texel row, slice by slice.
    fn rows(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let (height, depth) = (self.placed.footprint.height, self.placed.footprint.depth);
        (0..depth).flat_map(move |z| (0..height).map(move |y| (y, z)))
    }

    /// Buffer offset of row `y` in depth slice `z`.
    fn row_offset(&self, y: u32, z: u32) -> u64 {
        let rows_before = z as u64 * self.num_rows as u64 + y as u64;
        self.placed.offset + rows_before * self.row_pitch() as u64
    }

    fn check_texels<F: PixelFormat>(&self, len: usize) {
        assert_eq!(
            F::FORMAT,
            self.placed.footprint.format,
            "texel type doesn't match the footprint's format"
        );
        assert_eq!(
            len,
            self.texel_count(),
            "texel count doesn't match the footprint's extent"
        );
    }
}

/**
Writes tightly packed `texels` into the CPU-visible `buffer`, row by row, at the pitch and offset
`footprint` gives.  This is how texture data gets staged for
[`copy_buffer_to_texture`](crate::commands::CommandRecorder::copy_buffer_to_texture).

# Panics

If `F` isn't the footprint's format, or `texels` isn't exactly one footprint's worth.
*/
pub fn write_texels<F: PixelFormat, D: Device>(
    device: &D,
    buffer: &Allocation<D::Resource>,
    footprint: &Footprint,
    texels: &[F::CPixel],
) -> Result<(), Error> {
    footprint.check_texels::<F>(texels.len());
    let rows = texels.chunks_exact(footprint.placed.footprint.width.max(1) as usize);
    for ((y, z), row) in footprint.rows().zip(rows) {
        device.write_buffer(buffer.resource(), footprint.row_offset(y, z), pixel_as_bytes(row))?;
    }
    Ok(())
}

/// Reads one footprint's worth of texels out of the CPU-visible `buffer`, dropping the row
/// padding.  The inverse of [`write_texels`].
pub fn read_texels<F: PixelFormat, D: Device>(
    device: &D,
    buffer: &Allocation<D::Resource>,
    footprint: &Footprint,
) -> Result<Vec<F::CPixel>, Error>
where
    F::CPixel: Default,
{
    let mut texels = vec![F::CPixel::default(); footprint.texel_count()];
    footprint.check_texels::<F>(texels.len());
    let width = footprint.placed.footprint.width.max(1) as usize;
    for ((y, z), row) in footprint.rows().zip(texels.chunks_exact_mut(width)) {
        let offset = footprint.row_offset(y, z);
        device.read_buffer(buffer.resource(), offset, pixel_as_bytes_mut(row))?;
    }
    Ok(texels)
}

/**
Computes a footprint with the D3D12 layout rules: rows pitched to 256 bytes, subresources placed
on 512-byte boundaries.

Backends without a driver to ask use this directly.
*/
pub fn linear_footprint(desc: &ResourceDesc, subresource: u32, base_offset: u64) -> Footprint {
    if desc.dimension == ResourceDimension::Buffer {
        let width = desc.width;
        return Footprint {
            placed: PlacedFootprint {
                offset: base_offset,
                footprint: SubresourceFootprint {
                    format: Format::Unknown,
                    width: width as u32,
                    height: 1,
                    depth: 1,
                    row_pitch: align_up(width, TEXTURE_DATA_PITCH_ALIGNMENT as u64) as u32,
                },
            },
            num_rows: 1,
            row_size_in_bytes: width,
            total_bytes: width,
        };
    }
    assert!(
        subresource < desc.subresource_count(),
        "subresource {subresource} out of range for {} subresources",
        desc.subresource_count()
    );
    let mip = subresource % desc.mip_levels as u32;
    let width = mip_extent(desc.width as u32, mip);
    let height = mip_extent(desc.height, mip);
    let depth = mip_extent(desc.depth(), mip);
    let num_rows = match desc.dimension {
        ResourceDimension::Texture1D => 1,
        _ => height,
    };
    let row_size = width as u64 * desc.format.bytes_per_texel() as u64;
    let row_pitch = align_up_u32(row_size as u32, TEXTURE_DATA_PITCH_ALIGNMENT);
    let total_bytes = row_pitch as u64 * (num_rows as u64 * depth as u64 - 1) + row_size;
    Footprint {
        placed: PlacedFootprint {
            offset: align_up(base_offset, TEXTURE_DATA_PLACEMENT_ALIGNMENT),
            footprint: SubresourceFootprint {
                format: desc.format,
                width,
                height: num_rows,
                depth,
                row_pitch,
            },
        },
        num_rows,
        row_size_in_bytes: row_size,
        total_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::ResourceFlags;

    #[test]
    fn pitch_is_padded() {
        //100 texels * 4 bytes = 400, padded to 512
        let desc = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8G8B8A8Unorm,
            100,
            3,
            1,
            ResourceFlags::NONE,
        );
        let f = linear_footprint(&desc, 0, 0);
        assert_eq!(f.row_pitch(), 512);
        assert_eq!(f.row_size_in_bytes, 400);
        assert_eq!(f.num_rows, 3);
        assert_eq!(f.total_bytes, 512 * 2 + 400);
    }

    #[test]
    fn aligned_width_has_no_padding() {
        let desc = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8G8B8A8Unorm,
            64,
            2,
            1,
            ResourceFlags::NONE,
        );
        let f = linear_footprint(&desc, 0, 0);
        assert_eq!(f.row_pitch(), 256);
        assert_eq!(f.total_bytes, 512);
    }

    #[test]
    fn volume_counts_every_slice() {
        let desc = ResourceDesc::texture(
            ResourceDimension::Texture3D,
            Format::R32Float,
            8,
            4,
            3,
            ResourceFlags::NONE,
        );
        let f = linear_footprint(&desc, 0, 0);
        assert_eq!(f.placed.footprint.depth, 3);
        assert_eq!(f.total_bytes, 256 * (4 * 3 - 1) + 32);
    }

    #[test]
    fn offset_is_placement_aligned() {
        let desc = ResourceDesc::texture(
            ResourceDimension::Texture1D,
            Format::R8Unorm,
            16,
            1,
            1,
            ResourceFlags::NONE,
        );
        let f = linear_footprint(&desc, 0, 100);
        assert_eq!(f.placed.offset, 512);
        assert_eq!(f.num_rows, 1);
        assert_eq!(f.required_buffer_size(), 512 + 16);
    }

    #[test]
    fn mips_shrink() {
        let mut desc = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8Unorm,
            16,
            16,
            2,
            ResourceFlags::NONE,
        );
        desc.mip_levels = 3;
        //subresource 4 = slice 1, mip 1
        let f = linear_footprint(&desc, 4, 0);
        assert_eq!(f.placed.footprint.width, 8);
        assert_eq!(f.num_rows, 8);
    }

    #[test]
    fn buffers_are_one_row() {
        let desc = ResourceDesc::buffer(1000, ResourceFlags::NONE);
        let f = linear_footprint(&desc, 0, 0);
        assert_eq!(f.num_rows, 1);
        assert_eq!(f.total_bytes, 1000);
        assert_eq!(f.placed.footprint.width, 1000);
    }

    #[test]
    fn recomputed_per_extent() {
        let a = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8Unorm,
            16,
            16,
            1,
            ResourceFlags::NONE,
        );
        let mut b = a;
        b.width = 300;
        assert_ne!(linear_footprint(&a, 0, 0), linear_footprint(&b, 0, 0));
    }
}
