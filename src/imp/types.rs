// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Descriptions exchanged with the native layer.

These mirror the D3D12 structures field for field (heap properties, resource descriptions,
footprints, copy locations, view descriptions), with discriminants and bit values equal to the
SDK's, so a backend can translate them with plain casts.
*/

use crate::pixel_formats::Format;
use std::ops::{BitOr, BitOrAssign};

/// `D3D12_HEAP_TYPE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum HeapType {
    Default = 1,
    Upload = 2,
    Readback = 3,
    Custom = 4,
}

/// `D3D12_CPU_PAGE_PROPERTY`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CpuPageProperty {
    Unknown = 0,
    NotAvailable = 1,
    WriteCombine = 2,
    WriteBack = 3,
}

/// `D3D12_MEMORY_POOL`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MemoryPool {
    Unknown = 0,
    /// System memory, or the only pool on UMA hardware.
    L0 = 1,
    /// Discrete video memory.
    L1 = 2,
}

/// `D3D12_HEAP_PROPERTIES`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeapProperties {
    pub heap_type: HeapType,
    pub cpu_page_property: CpuPageProperty,
    pub memory_pool_preference: MemoryPool,
    pub creation_node_mask: u32,
    pub visible_node_mask: u32,
}

impl HeapProperties {
    /// Properties for one of the non-custom heap types.
    pub const fn of_type(heap_type: HeapType) -> Self {
        Self {
            heap_type,
            cpu_page_property: CpuPageProperty::Unknown,
            memory_pool_preference: MemoryPool::Unknown,
            creation_node_mask: 0,
            visible_node_mask: 0,
        }
    }

    /// Whether the CPU can map resources placed in a heap with these properties.
    pub fn is_cpu_visible(&self) -> bool {
        match self.heap_type {
            HeapType::Upload | HeapType::Readback => true,
            HeapType::Default => false,
            HeapType::Custom => !matches!(
                self.cpu_page_property,
                CpuPageProperty::NotAvailable | CpuPageProperty::Unknown
            ),
        }
    }
}

macro_rules! bitflags_newtype {
    ($(#[$meta:meta])* $name:ident : $repr:ty { $($(#[$fmeta:meta])* $flag:ident = $value:expr,)* }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub $repr);

        impl $name {
            $($(#[$fmeta])* pub const $flag: $name = $name($value);)*

            pub const fn bits(self) -> $repr {
                self.0
            }
            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut names = Vec::new();
                $(if $value != 0 && self.contains($name::$flag) {
                    names.push(stringify!($flag));
                })*
                if names.is_empty() {
                    write!(f, "{}(0x{:X})", stringify!($name), self.0)
                } else {
                    write!(f, "{}({})", stringify!($name), names.join(" | "))
                }
            }
        }
    };
}

bitflags_newtype! {
    /// `D3D12_HEAP_FLAGS`.
    HeapFlags: u32 {
        NONE = 0,
        SHARED = 0x1,
        DENY_BUFFERS = 0x4,
        ALLOW_DISPLAY = 0x8,
        DENY_RT_DS_TEXTURES = 0x40,
        DENY_NON_RT_DS_TEXTURES = 0x80,
        /// The heap's contents are not zeroed on creation.
        CREATE_NOT_ZEROED = 0x1000,
    }
}

bitflags_newtype! {
    /// `D3D12_RESOURCE_FLAGS`.
    ResourceFlags: u32 {
        NONE = 0,
        ALLOW_RENDER_TARGET = 0x1,
        ALLOW_DEPTH_STENCIL = 0x2,
        ALLOW_UNORDERED_ACCESS = 0x4,
        DENY_SHADER_RESOURCE = 0x8,
    }
}

bitflags_newtype! {
    /// `D3D12_RESOURCE_STATES`.
    ResourceStates: u32 {
        COMMON = 0,
        VERTEX_AND_CONSTANT_BUFFER = 0x1,
        INDEX_BUFFER = 0x2,
        UNORDERED_ACCESS = 0x8,
        NON_PIXEL_SHADER_RESOURCE = 0x40,
        PIXEL_SHADER_RESOURCE = 0x80,
        INDIRECT_ARGUMENT = 0x200,
        COPY_DEST = 0x400,
        COPY_SOURCE = 0x800,
        /// The union of read states an upload heap resource must start in.
        GENERIC_READ = 0x1 | 0x2 | 0x40 | 0x80 | 0x200 | 0x800,
    }
}

/// `D3D12_RESOURCE_DIMENSION`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResourceDimension {
    Buffer = 1,
    Texture1D = 2,
    Texture2D = 3,
    Texture3D = 4,
}

impl ResourceDimension {
    pub const fn is_texture(self) -> bool {
        !matches!(self, ResourceDimension::Buffer)
    }
}

/// `D3D12_TEXTURE_LAYOUT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TextureLayout {
    Unknown = 0,
    RowMajor = 1,
}

/// `D3D12_RESOURCE_DESC`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDesc {
    pub dimension: ResourceDimension,
    pub alignment: u64,
    /// Bytes for a buffer, texels for a texture.
    pub width: u64,
    pub height: u32,
    pub depth_or_array_size: u16,
    pub mip_levels: u16,
    pub format: Format,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub layout: TextureLayout,
    pub flags: ResourceFlags,
}

impl ResourceDesc {
    pub fn buffer(size: u64, flags: ResourceFlags) -> Self {
        Self {
            dimension: ResourceDimension::Buffer,
            alignment: 0,
            width: size,
            height: 1,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: Format::Unknown,
            sample_count: 1,
            sample_quality: 0,
            layout: TextureLayout::RowMajor,
            flags,
        }
    }

    pub fn texture(
        dimension: ResourceDimension,
        format: Format,
        width: u32,
        height: u32,
        depth_or_array_size: u16,
        flags: ResourceFlags,
    ) -> Self {
        assert!(
            dimension.is_texture(),
            "ResourceDesc::texture called with {dimension:?}"
        );
        Self {
            dimension,
            alignment: 0,
            width: width as u64,
            height,
            depth_or_array_size,
            mip_levels: 1,
            format,
            sample_count: 1,
            sample_quality: 0,
            layout: TextureLayout::Unknown,
            flags,
        }
    }

    /// Array slices of a 1D/2D texture.  3D textures have one.
    pub fn array_size(&self) -> u32 {
        match self.dimension {
            ResourceDimension::Texture3D | ResourceDimension::Buffer => 1,
            _ => self.depth_or_array_size as u32,
        }
    }

    /// Depth of mip 0.  Only 3D textures are deeper than one texel.
    pub fn depth(&self) -> u32 {
        match self.dimension {
            ResourceDimension::Texture3D => self.depth_or_array_size as u32,
            _ => 1,
        }
    }

    pub fn subresource_count(&self) -> u32 {
        self.mip_levels as u32 * self.array_size()
    }
}

/// `D3D12_SUBRESOURCE_FOOTPRINT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubresourceFootprint {
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub row_pitch: u32,
}

/// `D3D12_PLACED_SUBRESOURCE_FOOTPRINT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PlacedFootprint {
    pub offset: u64,
    pub footprint: SubresourceFootprint,
}

/// `D3D12_BOX`.  Right, bottom and back are exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Box3 {
    pub left: u32,
    pub top: u32,
    pub front: u32,
    pub right: u32,
    pub bottom: u32,
    pub back: u32,
}

impl Box3 {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
    pub fn depth(&self) -> u32 {
        self.back - self.front
    }
}

/// `D3D12_TEXTURE_COPY_LOCATION`.
#[derive(Debug)]
pub enum TextureCopyLocation<'a, R> {
    /// A subresource of a texture.
    Subresource { resource: &'a R, index: u32 },
    /// A region of a buffer laid out as a texture.
    Footprint {
        resource: &'a R,
        footprint: PlacedFootprint,
    },
}

impl<R> TextureCopyLocation<'_, R> {
    pub fn resource(&self) -> &R {
        match self {
            TextureCopyLocation::Subresource { resource, .. } => resource,
            TextureCopyLocation::Footprint { resource, .. } => resource,
        }
    }
}

/// Every subresource, for barriers.
pub const ALL_SUBRESOURCES: u32 = 0xFFFF_FFFF;

/// `D3D12_RESOURCE_TRANSITION_BARRIER`.
#[derive(Debug)]
pub struct TransitionBarrier<'a, R> {
    pub resource: &'a R,
    pub subresource: u32,
    pub before: ResourceStates,
    pub after: ResourceStates,
}

/// `D3D12_CLEAR_VALUE`, for render-target and depth-stencil resources.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearValue {
    pub format: Format,
    pub color: [f32; 4],
}

/// `D3D12_CPU_DESCRIPTOR_HANDLE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CpuDescriptorHandle {
    pub ptr: usize,
}

/// `D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING`.
pub const DEFAULT_SHADER_4_COMPONENT_MAPPING: u32 = 0x1688;
/// Passed as a mip count to select every mip from the most detailed one down.
pub const ALL_MIPS: u32 = u32::MAX;
/// `D3D12_CONSTANT_BUFFER_DATA_PLACEMENT_ALIGNMENT`.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;
/// `D3D12_TEXTURE_DATA_PITCH_ALIGNMENT`.
pub const TEXTURE_DATA_PITCH_ALIGNMENT: u32 = 256;
/// `D3D12_TEXTURE_DATA_PLACEMENT_ALIGNMENT`.
pub const TEXTURE_DATA_PLACEMENT_ALIGNMENT: u64 = 512;
/// `D3D12_DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT`.
pub const DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT: u64 = 64 * 1024;

/// `D3D12_CONSTANT_BUFFER_VIEW_DESC`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConstantBufferViewDesc {
    pub buffer_location: u64,
    pub size_in_bytes: u32,
}

/// The view dimension of an SRV, with its dimension-specific fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SrvDimension {
    Buffer {
        first_element: u64,
        num_elements: u32,
        structure_byte_stride: u32,
    },
    Texture1D {
        most_detailed_mip: u32,
        mip_levels: u32,
    },
    Texture2D {
        most_detailed_mip: u32,
        mip_levels: u32,
        plane_slice: u32,
    },
    Texture3D {
        most_detailed_mip: u32,
        mip_levels: u32,
    },
}

/// `D3D12_SHADER_RESOURCE_VIEW_DESC`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShaderResourceViewDesc {
    pub format: Format,
    pub shader_4_component_mapping: u32,
    pub dimension: SrvDimension,
}

/// The view dimension of a UAV, with its dimension-specific fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UavDimension {
    Buffer {
        first_element: u64,
        num_elements: u32,
        structure_byte_stride: u32,
    },
    Texture1D {
        mip_slice: u32,
    },
    Texture2D {
        mip_slice: u32,
        plane_slice: u32,
    },
    Texture3D {
        mip_slice: u32,
        first_w_slice: u32,
        w_size: u32,
    },
}

/// `D3D12_UNORDERED_ACCESS_VIEW_DESC`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UnorderedAccessViewDesc {
    pub format: Format,
    pub dimension: UavDimension,
}

/// `D3D12_FEATURE_DATA_ARCHITECTURE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Architecture {
    pub tile_based_renderer: bool,
    pub uma: bool,
    pub cache_coherent_uma: bool,
}

/// `D3D12_RESOURCE_ALLOCATION_INFO`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceAllocationInfo {
    pub size_in_bytes: u64,
    pub alignment: u64,
}
