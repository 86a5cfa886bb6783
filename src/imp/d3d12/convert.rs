// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Translation between this crate's descriptions and the SDK structures.
//!
//! Discriminants and bit values already match, so most of this is newtype wrapping.

use crate::hresult::HResult;
use crate::imp::{
    Box3, ClearValue, ConstantBufferViewDesc, CpuPageProperty, Error, HeapFlags, HeapProperties,
    HeapType, MemoryPool, PlacedFootprint, ResourceDesc, ResourceDimension, ResourceFlags,
    ResourceStates, ShaderResourceViewDesc, SrvDimension, SubresourceFootprint, TextureLayout,
    UavDimension, UnorderedAccessViewDesc,
};
use crate::pixel_formats::Format;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};

pub(super) fn device_error(operation: &'static str, e: windows::core::Error) -> Error {
    Error::Device {
        operation,
        hresult: HResult(e.code().0),
    }
}

pub(super) fn format(f: Format) -> DXGI_FORMAT {
    DXGI_FORMAT(f.dxgi() as i32)
}

pub(super) fn heap_properties(p: &HeapProperties) -> D3D12_HEAP_PROPERTIES {
    D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE(p.heap_type as i32),
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY(p.cpu_page_property as i32),
        MemoryPoolPreference: D3D12_MEMORY_POOL(p.memory_pool_preference as i32),
        CreationNodeMask: p.creation_node_mask,
        VisibleNodeMask: p.visible_node_mask,
    }
}

pub(super) fn heap_flags(f: HeapFlags) -> D3D12_HEAP_FLAGS {
    D3D12_HEAP_FLAGS(f.bits() as i32)
}

pub(super) fn states(s: ResourceStates) -> D3D12_RESOURCE_STATES {
    D3D12_RESOURCE_STATES(s.bits() as i32)
}

pub(super) fn resource_desc(d: &ResourceDesc) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION(d.dimension as i32),
        Alignment: d.alignment,
        Width: d.width,
        Height: d.height,
        DepthOrArraySize: d.depth_or_array_size,
        MipLevels: d.mip_levels,
        Format: format(d.format),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: d.sample_count,
            Quality: d.sample_quality,
        },
        Layout: D3D12_TEXTURE_LAYOUT(d.layout as i32),
        Flags: D3D12_RESOURCE_FLAGS(d.flags.bits() as i32),
    }
}

pub(super) fn from_resource_desc(d: &D3D12_RESOURCE_DESC) -> ResourceDesc {
    let dimension = match d.Dimension {
        D3D12_RESOURCE_DIMENSION_TEXTURE1D => ResourceDimension::Texture1D,
        D3D12_RESOURCE_DIMENSION_TEXTURE2D => ResourceDimension::Texture2D,
        D3D12_RESOURCE_DIMENSION_TEXTURE3D => ResourceDimension::Texture3D,
        _ => ResourceDimension::Buffer,
    };
    ResourceDesc {
        dimension,
        alignment: d.Alignment,
        width: d.Width,
        height: d.Height,
        depth_or_array_size: d.DepthOrArraySize,
        mip_levels: d.MipLevels,
        format: Format::from_dxgi(d.Format.0 as u32),
        sample_count: d.SampleDesc.Count,
        sample_quality: d.SampleDesc.Quality,
        layout: if d.Layout == D3D12_TEXTURE_LAYOUT_ROW_MAJOR {
            TextureLayout::RowMajor
        } else {
            TextureLayout::Unknown
        },
        flags: ResourceFlags(d.Flags.0 as u32),
    }
}

pub(super) fn clear_value(c: &ClearValue) -> D3D12_CLEAR_VALUE {
    D3D12_CLEAR_VALUE {
        Format: format(c.format),
        Anonymous: D3D12_CLEAR_VALUE_0 { Color: c.color },
    }
}

pub(super) fn placed_footprint(p: &PlacedFootprint) -> D3D12_PLACED_SUBRESOURCE_FOOTPRINT {
    D3D12_PLACED_SUBRESOURCE_FOOTPRINT {
        Offset: p.offset,
        Footprint: D3D12_SUBRESOURCE_FOOTPRINT {
            Format: format(p.footprint.format),
            Width: p.footprint.width,
            Height: p.footprint.height,
            Depth: p.footprint.depth,
            RowPitch: p.footprint.row_pitch,
        },
    }
}

pub(super) fn from_placed_footprint(p: &D3D12_PLACED_SUBRESOURCE_FOOTPRINT) -> PlacedFootprint {
    PlacedFootprint {
        offset: p.Offset,
        footprint: SubresourceFootprint {
            format: Format::from_dxgi(p.Footprint.Format.0 as u32),
            width: p.Footprint.Width,
            height: p.Footprint.Height,
            depth: p.Footprint.Depth,
            row_pitch: p.Footprint.RowPitch,
        },
    }
}

pub(super) fn copy_box(b: &Box3) -> D3D12_BOX {
    D3D12_BOX {
        left: b.left,
        top: b.top,
        front: b.front,
        right: b.right,
        bottom: b.bottom,
        back: b.back,
    }
}

pub(super) fn cbv(d: &ConstantBufferViewDesc) -> D3D12_CONSTANT_BUFFER_VIEW_DESC {
    D3D12_CONSTANT_BUFFER_VIEW_DESC {
        BufferLocation: d.buffer_location,
        SizeInBytes: d.size_in_bytes,
    }
}

pub(super) fn srv(d: &ShaderResourceViewDesc) -> D3D12_SHADER_RESOURCE_VIEW_DESC {
    let (view_dimension, anonymous) = match d.dimension {
        SrvDimension::Buffer {
            first_element,
            num_elements,
            structure_byte_stride,
        } => (
            D3D12_SRV_DIMENSION_BUFFER,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Buffer: D3D12_BUFFER_SRV {
                    FirstElement: first_element,
                    NumElements: num_elements,
                    StructureByteStride: structure_byte_stride,
                    Flags: D3D12_BUFFER_SRV_FLAG_NONE,
                },
            },
        ),
        SrvDimension::Texture1D {
            most_detailed_mip,
            mip_levels,
        } => (
            D3D12_SRV_DIMENSION_TEXTURE1D,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture1D: D3D12_TEX1D_SRV {
                    MostDetailedMip: most_detailed_mip,
                    MipLevels: mip_levels,
                    ResourceMinLODClamp: 0.0,
                },
            },
        ),
        SrvDimension::Texture2D {
            most_detailed_mip,
            mip_levels,
            plane_slice,
        } => (
            D3D12_SRV_DIMENSION_TEXTURE2D,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_SRV {
                    MostDetailedMip: most_detailed_mip,
                    MipLevels: mip_levels,
                    PlaneSlice: plane_slice,
                    ResourceMinLODClamp: 0.0,
                },
            },
        ),
        SrvDimension::Texture3D {
            most_detailed_mip,
            mip_levels,
        } => (
            D3D12_SRV_DIMENSION_TEXTURE3D,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture3D: D3D12_TEX3D_SRV {
                    MostDetailedMip: most_detailed_mip,
                    MipLevels: mip_levels,
                    ResourceMinLODClamp: 0.0,
                },
            },
        ),
    };
    D3D12_SHADER_RESOURCE_VIEW_DESC {
        Format: format(d.format),
        ViewDimension: view_dimension,
        Shader4ComponentMapping: d.shader_4_component_mapping,
        Anonymous: anonymous,
    }
}

pub(super) fn uav(d: &UnorderedAccessViewDesc) -> D3D12_UNORDERED_ACCESS_VIEW_DESC {
    let (view_dimension, anonymous) = match d.dimension {
        UavDimension::Buffer {
            first_element,
            num_elements,
            structure_byte_stride,
        } => (
            D3D12_UAV_DIMENSION_BUFFER,
            D3D12_UNORDERED_ACCESS_VIEW_DESC_0 {
                Buffer: D3D12_BUFFER_UAV {
                    FirstElement: first_element,
                    NumElements: num_elements,
                    StructureByteStride: structure_byte_stride,
                    CounterOffsetInBytes: 0,
                    Flags: D3D12_BUFFER_UAV_FLAG_NONE,
                },
            },
        ),
        UavDimension::Texture1D { mip_slice } => (
            D3D12_UAV_DIMENSION_TEXTURE1D,
            D3D12_UNORDERED_ACCESS_VIEW_DESC_0 {
                Texture1D: D3D12_TEX1D_UAV {
                    MipSlice: mip_slice,
                },
            },
        ),
        UavDimension::Texture2D {
            mip_slice,
            plane_slice,
        } => (
            D3D12_UAV_DIMENSION_TEXTURE2D,
            D3D12_UNORDERED_ACCESS_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_UAV {
                    MipSlice: mip_slice,
                    PlaneSlice: plane_slice,
                },
            },
        ),
        UavDimension::Texture3D {
            mip_slice,
            first_w_slice,
            w_size,
        } => (
            D3D12_UAV_DIMENSION_TEXTURE3D,
            D3D12_UNORDERED_ACCESS_VIEW_DESC_0 {
                Texture3D: D3D12_TEX3D_UAV {
                    MipSlice: mip_slice,
                    FirstWSlice: first_w_slice,
                    WSize: w_size,
                },
            },
        ),
    };
    D3D12_UNORDERED_ACCESS_VIEW_DESC {
        Format: format(d.format),
        ViewDimension: view_dimension,
        Anonymous: anonymous,
    }
}

/// Custom heap properties round-trip through `GetHeapProperties`, so they get a reverse too.
pub(super) fn from_heap_properties(p: &D3D12_HEAP_PROPERTIES) -> HeapProperties {
    let heap_type = match p.Type {
        D3D12_HEAP_TYPE_UPLOAD => HeapType::Upload,
        D3D12_HEAP_TYPE_READBACK => HeapType::Readback,
        D3D12_HEAP_TYPE_CUSTOM => HeapType::Custom,
        _ => HeapType::Default,
    };
    let cpu_page_property = match p.CPUPageProperty {
        D3D12_CPU_PAGE_PROPERTY_NOT_AVAILABLE => CpuPageProperty::NotAvailable,
        D3D12_CPU_PAGE_PROPERTY_WRITE_COMBINE => CpuPageProperty::WriteCombine,
        D3D12_CPU_PAGE_PROPERTY_WRITE_BACK => CpuPageProperty::WriteBack,
        _ => CpuPageProperty::Unknown,
    };
    let memory_pool_preference = match p.MemoryPoolPreference {
        D3D12_MEMORY_POOL_L0 => MemoryPool::L0,
        D3D12_MEMORY_POOL_L1 => MemoryPool::L1,
        _ => MemoryPool::Unknown,
    };
    HeapProperties {
        heap_type,
        cpu_page_property,
        memory_pool_preference,
        creation_node_mask: p.CreationNodeMask,
        visible_node_mask: p.VisibleNodeMask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_properties_round_trip() {
        let p = HeapProperties {
            heap_type: HeapType::Custom,
            cpu_page_property: CpuPageProperty::WriteBack,
            memory_pool_preference: MemoryPool::L0,
            creation_node_mask: 0,
            visible_node_mask: 0,
        };
        assert_eq!(from_heap_properties(&heap_properties(&p)), p);
    }

    #[test]
    fn state_bits_pass_through() {
        assert_eq!(
            states(ResourceStates::GENERIC_READ),
            D3D12_RESOURCE_STATE_GENERIC_READ
        );
        assert_eq!(
            heap_flags(HeapFlags::CREATE_NOT_ZEROED),
            D3D12_HEAP_FLAG_CREATE_NOT_ZEROED
        );
    }
}
