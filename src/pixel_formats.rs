// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texel formats for GPU resources.
//!
//! Two layers live here:
//!
//! - [`Format`] is the runtime format carried by a [`ResourceDesc`](crate::imp::ResourceDesc).
//!   Its discriminants are the `DXGI_FORMAT` values, so it crosses into the native layer
//!   unchanged.
//! - Zero-sized marker types ([`R8UNorm`], [`RGBA8UNorm`], ...) implement the sealed
//!   [`PixelFormat`](sealed::PixelFormat) trait, tying a [`Format`] to the C-layout pixel type
//!   used to fill or read back texture data on the CPU.
//!
//! # Examples
//!
//! ```
//! use heapwise::pixel_formats::{Format, RGBA8UNorm, Unorm4, PixelFormat};
//!
//! assert_eq!(RGBA8UNorm::FORMAT, Format::R8G8B8A8Unorm);
//! assert_eq!(Format::R8G8B8A8Unorm.bytes_per_texel(), 4);
//! let red = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
//! # let _ = red;
//! ```

/*
Quick note on type design.  Resource descriptions need the format at runtime (it's a field of
D3D12_RESOURCE_DESC), so the enum is the source of truth.  The marker types exist so CPU-side
texel data can be typechecked against the texture it's headed for.
 */
pub(crate) mod png_support;

use crate::pixel_formats::sealed::ReprC;

pub use half::f16;
pub use png_support::encode_png;
pub use sealed::PixelFormat;

/// A texel format.  Discriminants are `DXGI_FORMAT` values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Format {
    /// Used for buffers and structured views.
    Unknown = 0,
    R32G32B32A32Float = 2,
    R16G16B16A16Unorm = 11,
    R32G32Float = 16,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    R32Float = 41,
    R32Uint = 42,
    R32Sint = 43,
    R16Float = 54,
    R8Unorm = 61,
    B8G8R8A8Unorm = 87,
    B8G8R8A8UnormSrgb = 91,
}

impl Format {
    /// Bytes occupied by a single texel, or 0 for [`Format::Unknown`].
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            Format::Unknown => 0,
            Format::R8Unorm => 1,
            Format::R16Float => 2,
            Format::R32Float
            | Format::R32Uint
            | Format::R32Sint
            | Format::R8G8B8A8Unorm
            | Format::R8G8B8A8UnormSrgb
            | Format::B8G8R8A8Unorm
            | Format::B8G8R8A8UnormSrgb => 4,
            Format::R32G32Float | Format::R16G16B16A16Unorm => 8,
            Format::R32G32B32A32Float => 16,
        }
    }

    pub const fn is_srgb(self) -> bool {
        matches!(self, Format::R8G8B8A8UnormSrgb | Format::B8G8R8A8UnormSrgb)
    }

    /// Whether every D3D12 device can load and store this format through a typed UAV.
    ///
    /// sRGB formats can never be bound for unordered access.
    pub const fn supports_typed_uav(self) -> bool {
        !self.is_srgb() && !matches!(self, Format::Unknown)
    }

    pub const fn dxgi(self) -> u32 {
        self as u32
    }

    /// The format for a `DXGI_FORMAT` value.  Formats this crate doesn't model come back as
    /// [`Format::Unknown`].
    pub const fn from_dxgi(value: u32) -> Format {
        match value {
            2 => Format::R32G32B32A32Float,
            11 => Format::R16G16B16A16Unorm,
            16 => Format::R32G32Float,
            28 => Format::R8G8B8A8Unorm,
            29 => Format::R8G8B8A8UnormSrgb,
            41 => Format::R32Float,
            42 => Format::R32Uint,
            43 => Format::R32Sint,
            54 => Format::R16Float,
            61 => Format::R8Unorm,
            87 => Format::B8G8R8A8Unorm,
            91 => Format::B8G8R8A8UnormSrgb,
            _ => Format::Unknown,
        }
    }
}

/// Sealed traits for pixel format type safety.
///
/// Only the pixel formats defined in this crate can be used with the typed texel APIs.
pub(crate) mod sealed {
    use std::fmt::Debug;

    /// Core trait for pixel format types.
    ///
    /// This trait is sealed and cannot be implemented outside this crate.
    pub trait PixelFormat: Debug + Send + Sync + 'static {
        /// The runtime format this marker stands for.
        const FORMAT: super::Format;

        /// The concrete pixel type with guaranteed C-compatible memory layout.
        type CPixel: Clone + Debug + Send + ReprC;
    }

    /// Marker trait indicating C-compatible memory layout.
    ///
    /// # Safety
    ///
    /// Implementors must have no padding, and every bit pattern must be a valid value, since
    /// values are viewed (and filled) as raw byte slices.
    pub unsafe trait ReprC {}
}

/// Convert a slice of C-compatible pixels to raw bytes.
pub fn pixel_as_bytes<T: ReprC>(t: &[T]) -> &[u8] {
    //safe because we know that T is repr(C)
    //(we offloaded the safety check to the ReprC trait)
    unsafe { std::slice::from_raw_parts(t.as_ptr() as *const u8, std::mem::size_of_val(t)) }
}

/// Views a slice of C-compatible pixels as bytes to be filled in, as read-back does.
pub fn pixel_as_bytes_mut<T: ReprC>(t: &mut [T]) -> &mut [u8] {
    let len = std::mem::size_of_val(t);
    //safe because ReprC types have no padding and accept any bit pattern
    unsafe { std::slice::from_raw_parts_mut(t.as_mut_ptr() as *mut u8, len) }
}

/// 8-bit normalized unsigned integer format with a single red channel.
#[derive(Debug, Clone)]
pub struct R8UNorm;
impl PixelFormat for R8UNorm {
    const FORMAT: Format = Format::R8Unorm;
    type CPixel = u8;
}
unsafe impl ReprC for u8 {}

/// 16-bit half-precision float, single channel.
#[derive(Debug, Clone)]
pub struct R16Float;
impl PixelFormat for R16Float {
    const FORMAT: Format = Format::R16Float;
    type CPixel = f16;
}
unsafe impl ReprC for f16 {}

#[derive(Debug, Clone)]
pub struct R32Float;
impl PixelFormat for R32Float {
    const FORMAT: Format = Format::R32Float;
    type CPixel = f32;
}
unsafe impl ReprC for f32 {}

#[derive(Debug, Clone)]
pub struct R32UInt;
impl PixelFormat for R32UInt {
    const FORMAT: Format = Format::R32Uint;
    type CPixel = u32;
}
unsafe impl ReprC for u32 {}

/// 32-bit signed integer format with a single red channel.
///
/// Values are not normalized.
#[derive(Debug, Clone)]
pub struct R32SInt;
impl PixelFormat for R32SInt {
    const FORMAT: Format = Format::R32Sint;
    type CPixel = i32;
}
unsafe impl ReprC for i32 {}

/// Two-channel 32-bit floating point format.
#[derive(Debug, Clone)]
pub struct RGFloat;
impl PixelFormat for RGFloat {
    const FORMAT: Format = Format::R32G32Float;
    type CPixel = RGFloatPixel;
}

/// Pixel type for [`RGFloat`].
#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RGFloatPixel {
    pub r: f32,
    pub g: f32,
}
unsafe impl ReprC for RGFloatPixel {}

/// 16-bit normalized unsigned integer format with RGBA channels.
#[derive(Debug, Clone)]
pub struct RGBA16Unorm;
impl PixelFormat for RGBA16Unorm {
    const FORMAT: Format = Format::R16G16B16A16Unorm;
    type CPixel = RGBA16Pixel;
}

/// Pixel type for [`RGBA16Unorm`].  Values range from 0-65535.
#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RGBA16Pixel {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}
unsafe impl ReprC for RGBA16Pixel {}

#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unorm4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
unsafe impl ReprC for Unorm4 {}

#[derive(Debug, Clone)]
pub struct RGBA8UNorm;
impl PixelFormat for RGBA8UNorm {
    const FORMAT: Format = Format::R8G8B8A8Unorm;
    type CPixel = Unorm4;
}

/// 4-channel 8-bit normalized with sRGB encoding.
///
/// sRGB textures can be sampled and copied but never bound for unordered access.
#[derive(Debug, Clone)]
pub struct RGBA8UnormSRGB;
impl PixelFormat for RGBA8UnormSRGB {
    const FORMAT: Format = Format::R8G8B8A8UnormSrgb;
    type CPixel = Unorm4;
}

#[derive(Debug, Copy, Clone)]
pub struct BGRA8UNormSRGB;
impl PixelFormat for BGRA8UNormSRGB {
    const FORMAT: Format = Format::B8G8R8A8UnormSrgb;
    type CPixel = BGRA8UnormPixelSRGB;
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct BGRA8UnormPixelSRGB {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}
unsafe impl ReprC for BGRA8UnormPixelSRGB {}

#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Float4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}
unsafe impl ReprC for Float4 {}

#[derive(Debug, Clone)]
pub struct RGBA32Float;
impl PixelFormat for RGBA32Float {
    const FORMAT: Format = Format::R32G32B32A32Float;
    type CPixel = Float4;
}
