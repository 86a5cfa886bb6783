// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::hresult::HResult;
use crate::imp::HeapType;
use crate::pixel_formats::Format;

/// Failures surfaced by the native layer.
///
/// These are requests the device (or the pool in front of it) turned down.  Nothing here is
/// retried by this crate; callers decide whether to try again.  Programming errors, such as an
/// intent a texture can't have, panic instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{operation} failed: {hresult}")]
    Device {
        operation: &'static str,
        hresult: HResult,
    },
    #[error("out of memory allocating {requested} bytes in a {heap:?} heap")]
    OutOfMemory { requested: u64, heap: HeapType },
    #[error("{format:?} is not supported for {usage}")]
    UnsupportedFormat { format: Format, usage: &'static str },
    #[error("a {heap:?} heap is not visible to the CPU")]
    NotCpuVisible { heap: HeapType },
    #[error("range {offset}..{offset}+{len} exceeds resource of {size} bytes")]
    OutOfBounds { offset: u64, len: u64, size: u64 },
    #[error(transparent)]
    Encoding(#[from] png::EncodingError),
    /// The pool in front of the device refused a request for a reason other than running out
    /// of memory.
    #[error("pool allocation failed: {0}")]
    Pool(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// The status code a native caller would have seen for this failure.
    pub fn hresult(&self) -> HResult {
        match self {
            Error::Device { hresult, .. } => *hresult,
            Error::OutOfMemory { .. } => HResult::E_OUTOFMEMORY,
            Error::UnsupportedFormat { .. } => HResult::DXGI_ERROR_UNSUPPORTED,
            Error::NotCpuVisible { .. } | Error::OutOfBounds { .. } => HResult::E_INVALIDARG,
            Error::Encoding(_) => HResult::E_FAIL,
            Error::Pool(_) => HResult::E_FAIL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = Error::Device {
            operation: "CreateCommittedResource",
            hresult: HResult::E_OUTOFMEMORY,
        };
        assert_eq!(
            e.to_string(),
            "CreateCommittedResource failed: E_OUTOFMEMORY (0x8007000E)"
        );
        assert_eq!(e.hresult(), HResult::E_OUTOFMEMORY);
        let e = Error::OutOfBounds {
            offset: 8,
            len: 16,
            size: 12,
        };
        assert_eq!(e.to_string(), "range 8..8+16 exceeds resource of 12 bytes");
        let e = Error::Pool("no compatible heap".into());
        assert_eq!(e.to_string(), "pool allocation failed: no compatible heap");
        assert_eq!(e.hresult(), HResult::E_FAIL);
    }
}
