// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Windows status codes.
//!
//! Both the device layer and the stream shim speak `HRESULT`.  Values here are bit-exact with
//! the Windows SDK headers, since the stream shim hands them to closed-source native callers.

use std::fmt::{Debug, Display, Formatter};

/// A Windows `HRESULT`.
///
/// Negative values are failures.  The representation is a plain `i32` so the type can appear
/// directly in `extern "system"` signatures.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HResult(pub i32);

impl HResult {
    pub const S_OK: HResult = HResult(0);
    pub const S_FALSE: HResult = HResult(1);
    pub const E_NOTIMPL: HResult = HResult(0x8000_4001_u32 as i32);
    pub const E_NOINTERFACE: HResult = HResult(0x8000_4002_u32 as i32);
    pub const E_POINTER: HResult = HResult(0x8000_4003_u32 as i32);
    pub const E_FAIL: HResult = HResult(0x8000_4005_u32 as i32);
    pub const E_UNEXPECTED: HResult = HResult(0x8000_FFFF_u32 as i32);
    pub const E_OUTOFMEMORY: HResult = HResult(0x8007_000E_u32 as i32);
    pub const E_INVALIDARG: HResult = HResult(0x8007_0057_u32 as i32);
    pub const STG_E_INVALIDFUNCTION: HResult = HResult(0x8003_0001_u32 as i32);
    pub const STG_E_FILENOTFOUND: HResult = HResult(0x8003_0002_u32 as i32);
    pub const STG_E_ACCESSDENIED: HResult = HResult(0x8003_0005_u32 as i32);
    pub const STG_E_INVALIDPOINTER: HResult = HResult(0x8003_0009_u32 as i32);
    pub const STG_E_WRITEFAULT: HResult = HResult(0x8003_001D_u32 as i32);
    pub const STG_E_READFAULT: HResult = HResult(0x8003_001E_u32 as i32);
    pub const STG_E_MEDIUMFULL: HResult = HResult(0x8003_0070_u32 as i32);
    /// `DXGI_ERROR_UNSUPPORTED`, what D3D12 reports for an unsupported format/flag pairing.
    pub const DXGI_ERROR_UNSUPPORTED: HResult = HResult(0x887A_0004_u32 as i32);

    pub const fn is_ok(self) -> bool {
        self.0 >= 0
    }

    pub const fn is_err(self) -> bool {
        self.0 < 0
    }

    /// `HRESULT_FROM_WIN32`.
    pub const fn from_win32(code: u32) -> HResult {
        if code as i32 <= 0 {
            HResult(code as i32)
        } else {
            HResult(((code & 0x0000_FFFF) | (7 << 16) | 0x8000_0000) as i32)
        }
    }

    /// Converts to a `Result`, keeping the failure code as the error.
    pub fn ok(self) -> Result<(), HResult> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            HResult::S_OK => "S_OK",
            HResult::S_FALSE => "S_FALSE",
            HResult::E_NOTIMPL => "E_NOTIMPL",
            HResult::E_NOINTERFACE => "E_NOINTERFACE",
            HResult::E_POINTER => "E_POINTER",
            HResult::E_FAIL => "E_FAIL",
            HResult::E_UNEXPECTED => "E_UNEXPECTED",
            HResult::E_OUTOFMEMORY => "E_OUTOFMEMORY",
            HResult::E_INVALIDARG => "E_INVALIDARG",
            HResult::STG_E_INVALIDFUNCTION => "STG_E_INVALIDFUNCTION",
            HResult::STG_E_FILENOTFOUND => "STG_E_FILENOTFOUND",
            HResult::STG_E_ACCESSDENIED => "STG_E_ACCESSDENIED",
            HResult::STG_E_INVALIDPOINTER => "STG_E_INVALIDPOINTER",
            HResult::STG_E_WRITEFAULT => "STG_E_WRITEFAULT",
            HResult::STG_E_READFAULT => "STG_E_READFAULT",
            HResult::STG_E_MEDIUMFULL => "STG_E_MEDIUMFULL",
            HResult::DXGI_ERROR_UNSUPPORTED => "DXGI_ERROR_UNSUPPORTED",
            _ => return None,
        })
    }
}

impl Display for HResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0 as u32),
            None => write!(f, "0x{:08X}", self.0 as u32),
        }
    }
}

impl Debug for HResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HResult({self})")
    }
}

impl std::error::Error for HResult {}
