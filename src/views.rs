// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Shader-visible views.

A view tells a shader how to read a resource: as an opaque constant block, as a structured buffer
of fixed-stride elements, or as a typed texture.  [`ViewFactory`] writes views into descriptor
table slots the caller owns; it keeps nothing.

Stride is the size of one element in bytes and only matters for buffers.  Textures take their
element layout from their format.
*/

use crate::allocation::Allocation;
use crate::bittricks::align_up;
use crate::imp::{
    ALL_MIPS, CONSTANT_BUFFER_ALIGNMENT, ConstantBufferViewDesc, DEFAULT_SHADER_4_COMPONENT_MAPPING,
    Device, ResourceDesc, ResourceDimension, ResourceFlags, ShaderResourceViewDesc, SrvDimension,
    UavDimension, UnorderedAccessViewDesc,
};
use crate::pixel_formats::Format;

/// Writes views for one device.
#[derive(Debug)]
pub struct ViewFactory<'a, D> {
    device: &'a D,
}

impl<'a, D: Device> ViewFactory<'a, D> {
    pub fn new(device: &'a D) -> Self {
        Self { device }
    }

    /// Writes a constant-buffer view of all of `allocation` into `slot`.
    ///
    /// # Panics
    ///
    /// If `allocation` is not a buffer.
    pub fn constant_buffer(
        &self,
        allocation: &Allocation<D::Resource>,
        heap: &D::DescriptorHeap,
        slot: u32,
    ) {
        let desc = cbv_desc(
            allocation.desc(),
            self.device.gpu_virtual_address(allocation.resource()),
        );
        logwise::trace_sync!(
            "CBV {name} -> slot {slot} ({size} bytes)",
            name = logwise::privacy::LogIt(allocation.debug_name()),
            slot = slot,
            size = desc.size_in_bytes
        );
        self.device.create_constant_buffer_view(&desc, heap, slot);
    }

    /// Writes a read-only view of `allocation` into `slot`.
    ///
    /// Buffers become structured buffers of `stride`-byte elements.  Textures become typed views
    /// over every mip.
    ///
    /// # Panics
    ///
    /// If `allocation` is a buffer and `stride` is 0.
    pub fn shader_resource(
        &self,
        allocation: &Allocation<D::Resource>,
        stride: u32,
        heap: &D::DescriptorHeap,
        slot: u32,
    ) {
        let desc = srv_desc(allocation.desc(), stride);
        logwise::trace_sync!(
            "SRV {name} -> slot {slot}",
            name = logwise::privacy::LogIt(allocation.debug_name()),
            slot = slot
        );
        self.device
            .create_shader_resource_view(allocation.resource(), &desc, heap, slot);
    }

    /// Writes a read-write view of `allocation` into `slot`.
    ///
    /// # Panics
    ///
    /// If `allocation` was not created for unordered access, or is a buffer and `stride` is 0.
    pub fn unordered_access(
        &self,
        allocation: &Allocation<D::Resource>,
        stride: u32,
        heap: &D::DescriptorHeap,
        slot: u32,
    ) {
        let desc = uav_desc(allocation.desc(), stride);
        logwise::trace_sync!(
            "UAV {name} -> slot {slot}",
            name = logwise::privacy::LogIt(allocation.debug_name()),
            slot = slot
        );
        self.device
            .create_unordered_access_view(allocation.resource(), &desc, heap, slot);
    }
}

pub fn cbv_desc(desc: &ResourceDesc, buffer_location: u64) -> ConstantBufferViewDesc {
    assert_eq!(
        desc.dimension,
        ResourceDimension::Buffer,
        "constant-buffer views need a buffer"
    );
    let size = align_up(desc.width, CONSTANT_BUFFER_ALIGNMENT);
    ConstantBufferViewDesc {
        buffer_location,
        size_in_bytes: u32::try_from(size).expect("constant buffer larger than 4 GiB"),
    }
}

fn element_count(desc: &ResourceDesc, stride: u32) -> u32 {
    assert!(stride > 0, "buffer views need a nonzero element stride");
    u32::try_from(desc.width / stride as u64).expect("buffer view has more than u32::MAX elements")
}

pub fn srv_desc(desc: &ResourceDesc, stride: u32) -> ShaderResourceViewDesc {
    let (format, dimension) = match desc.dimension {
        ResourceDimension::Buffer => (
            Format::Unknown,
            SrvDimension::Buffer {
                first_element: 0,
                num_elements: element_count(desc, stride),
                structure_byte_stride: stride,
            },
        ),
        ResourceDimension::Texture1D => (
            desc.format,
            SrvDimension::Texture1D {
                most_detailed_mip: 0,
                mip_levels: ALL_MIPS,
            },
        ),
        ResourceDimension::Texture2D => (
            desc.format,
            SrvDimension::Texture2D {
                most_detailed_mip: 0,
                mip_levels: ALL_MIPS,
                plane_slice: 0,
            },
        ),
        ResourceDimension::Texture3D => (
            desc.format,
            SrvDimension::Texture3D {
                most_detailed_mip: 0,
                mip_levels: ALL_MIPS,
            },
        ),
    };
    ShaderResourceViewDesc {
        format,
        shader_4_component_mapping: DEFAULT_SHADER_4_COMPONENT_MAPPING,
        dimension,
    }
}

pub fn uav_desc(desc: &ResourceDesc, stride: u32) -> UnorderedAccessViewDesc {
    assert!(
        desc.flags.contains(ResourceFlags::ALLOW_UNORDERED_ACCESS),
        "unordered-access views need a resource created with ALLOW_UNORDERED_ACCESS"
    );
    let (format, dimension) = match desc.dimension {
        ResourceDimension::Buffer => (
            Format::Unknown,
            UavDimension::Buffer {
                first_element: 0,
                num_elements: element_count(desc, stride),
                structure_byte_stride: stride,
            },
        ),
        ResourceDimension::Texture1D => (desc.format, UavDimension::Texture1D { mip_slice: 0 }),
        ResourceDimension::Texture2D => (
            desc.format,
            UavDimension::Texture2D {
                mip_slice: 0,
                plane_slice: 0,
            },
        ),
        //-1 selects every slice from first_w_slice on
        ResourceDimension::Texture3D => (
            desc.format,
            UavDimension::Texture3D {
                mip_slice: 0,
                first_w_slice: 0,
                w_size: u32::MAX,
            },
        ),
    };
    UnorderedAccessViewDesc { format, dimension }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbv_rounds_size() {
        let d = cbv_desc(&ResourceDesc::buffer(300, ResourceFlags::NONE), 0x1000);
        assert_eq!(d.size_in_bytes, 512);
        assert_eq!(d.buffer_location, 0x1000);
    }

    #[test]
    #[should_panic(expected = "constant-buffer views need a buffer")]
    fn cbv_of_texture_panics() {
        let t = ResourceDesc::texture(
            ResourceDimension::Texture2D,
            Format::R8Unorm,
            4,
            4,
            1,
            ResourceFlags::NONE,
        );
        cbv_desc(&t, 0);
    }

    #[test]
    fn structured_srv() {
        let d = srv_desc(&ResourceDesc::buffer(1024, ResourceFlags::NONE), 16);
        assert_eq!(d.format, Format::Unknown);
        assert_eq!(
            d.dimension,
            SrvDimension::Buffer {
                first_element: 0,
                num_elements: 64,
                structure_byte_stride: 16
            }
        );
        assert_eq!(d.shader_4_component_mapping, 0x1688);
    }

    #[test]
    fn texture_srv_covers_all_mips() {
        let t = ResourceDesc::texture(
            ResourceDimension::Texture3D,
            Format::R16Float,
            4,
            4,
            4,
            ResourceFlags::NONE,
        );
        let d = srv_desc(&t, 0);
        assert_eq!(d.format, Format::R16Float);
        assert_eq!(
            d.dimension,
            SrvDimension::Texture3D {
                most_detailed_mip: 0,
                mip_levels: u32::MAX
            }
        );
    }

    #[test]
    fn volume_uav_covers_full_depth() {
        let t = ResourceDesc::texture(
            ResourceDimension::Texture3D,
            Format::R32Float,
            8,
            8,
            8,
            ResourceFlags::ALLOW_UNORDERED_ACCESS,
        );
        let d = uav_desc(&t, 0);
        assert_eq!(
            d.dimension,
            UavDimension::Texture3D {
                mip_slice: 0,
                first_w_slice: 0,
                w_size: u32::MAX
            }
        );
    }

    #[test]
    #[should_panic(expected = "ALLOW_UNORDERED_ACCESS")]
    fn uav_needs_flag() {
        uav_desc(&ResourceDesc::buffer(64, ResourceFlags::NONE), 4);
    }

    #[test]
    #[should_panic(expected = "nonzero element stride")]
    fn zero_stride_panics() {
        srv_desc(&ResourceDesc::buffer(64, ResourceFlags::NONE), 0);
    }
}
