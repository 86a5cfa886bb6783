// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Resource dimensionality and extents.

use crate::imp::{ResourceDesc, ResourceDimension, ResourceFlags};
use crate::pixel_formats::Format;

/// What a resource looks like: a byte buffer, or a texture of some format and extent.
///
/// Extents are in texels for textures and bytes for buffers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceShape {
    Buffer {
        size: u64,
    },
    Texture1D {
        format: Format,
        width: u32,
    },
    Texture2D {
        format: Format,
        width: u32,
        height: u32,
    },
    Texture3D {
        format: Format,
        width: u32,
        height: u32,
        depth: u16,
    },
}

impl ResourceShape {
    pub const fn buffer(size: u64) -> Self {
        ResourceShape::Buffer { size }
    }

    pub const fn texture_2d(format: Format, width: u32, height: u32) -> Self {
        ResourceShape::Texture2D {
            format,
            width,
            height,
        }
    }

    pub const fn dimension(&self) -> ResourceDimension {
        match self {
            ResourceShape::Buffer { .. } => ResourceDimension::Buffer,
            ResourceShape::Texture1D { .. } => ResourceDimension::Texture1D,
            ResourceShape::Texture2D { .. } => ResourceDimension::Texture2D,
            ResourceShape::Texture3D { .. } => ResourceDimension::Texture3D,
        }
    }

    pub const fn format(&self) -> Format {
        match self {
            ResourceShape::Buffer { .. } => Format::Unknown,
            ResourceShape::Texture1D { format, .. }
            | ResourceShape::Texture2D { format, .. }
            | ResourceShape::Texture3D { format, .. } => *format,
        }
    }

    /// `(width, height, depth)` in texels; buffers report `(size, 1, 1)`.
    pub fn extent(&self) -> (u64, u32, u32) {
        match *self {
            ResourceShape::Buffer { size } => (size, 1, 1),
            ResourceShape::Texture1D { width, .. } => (width as u64, 1, 1),
            ResourceShape::Texture2D { width, height, .. } => (width as u64, height, 1),
            ResourceShape::Texture3D {
                width,
                height,
                depth,
                ..
            } => (width as u64, height, depth as u32),
        }
    }

    /// Builds the native description for this shape.
    pub fn describe(&self, flags: ResourceFlags) -> ResourceDesc {
        match *self {
            ResourceShape::Buffer { size } => ResourceDesc::buffer(size, flags),
            ResourceShape::Texture1D { format, width } => {
                ResourceDesc::texture(ResourceDimension::Texture1D, format, width, 1, 1, flags)
            }
            ResourceShape::Texture2D {
                format,
                width,
                height,
            } => ResourceDesc::texture(
                ResourceDimension::Texture2D,
                format,
                width,
                height,
                1,
                flags,
            ),
            ResourceShape::Texture3D {
                format,
                width,
                height,
                depth,
            } => ResourceDesc::texture(
                ResourceDimension::Texture3D,
                format,
                width,
                height,
                depth,
                flags,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_volume() {
        let shape = ResourceShape::Texture3D {
            format: Format::R32Float,
            width: 8,
            height: 4,
            depth: 2,
        };
        let desc = shape.describe(ResourceFlags::ALLOW_UNORDERED_ACCESS);
        assert_eq!(desc.dimension, ResourceDimension::Texture3D);
        assert_eq!(desc.depth(), 2);
        assert_eq!(desc.flags, ResourceFlags::ALLOW_UNORDERED_ACCESS);
        assert_eq!(shape.extent(), (8, 4, 2));
    }

    #[test]
    fn buffers_have_no_format() {
        let shape = ResourceShape::buffer(100);
        assert_eq!(shape.format(), Format::Unknown);
        assert_eq!(shape.describe(ResourceFlags::NONE).width, 100);
    }
}
