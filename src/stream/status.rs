// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Translating failures at the interop boundary.

use crate::hresult::HResult;
use std::io;

/// The status a native caller sees for `error`.
pub fn from_io(error: &io::Error) -> HResult {
    if let Some(hr) = error.get_ref().and_then(|inner| inner.downcast_ref::<HResult>()) {
        return *hr;
    }
    #[cfg(windows)]
    if let Some(code) = error.raw_os_error() {
        return HResult::from_win32(code as u32);
    }
    match error.kind() {
        io::ErrorKind::NotFound => HResult::STG_E_FILENOTFOUND,
        io::ErrorKind::PermissionDenied => HResult::STG_E_ACCESSDENIED,
        io::ErrorKind::OutOfMemory => HResult::E_OUTOFMEMORY,
        io::ErrorKind::InvalidInput => HResult::E_INVALIDARG,
        io::ErrorKind::StorageFull | io::ErrorKind::WriteZero => HResult::STG_E_MEDIUMFULL,
        io::ErrorKind::Unsupported => HResult::STG_E_INVALIDFUNCTION,
        io::ErrorKind::UnexpectedEof => HResult::STG_E_READFAULT,
        _ => HResult::E_FAIL,
    }
}

/// The inverse, for Rust code driving a native stream.
pub fn to_io(hr: HResult) -> io::Error {
    let kind = match hr {
        HResult::STG_E_FILENOTFOUND => io::ErrorKind::NotFound,
        HResult::STG_E_ACCESSDENIED => io::ErrorKind::PermissionDenied,
        HResult::E_OUTOFMEMORY => io::ErrorKind::OutOfMemory,
        HResult::E_INVALIDARG => io::ErrorKind::InvalidInput,
        HResult::STG_E_MEDIUMFULL => io::ErrorKind::StorageFull,
        HResult::STG_E_INVALIDFUNCTION | HResult::E_NOTIMPL => io::ErrorKind::Unsupported,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, hr)
}
