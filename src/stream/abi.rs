// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! `IStream` binary layout.
//!
//! Field order, widths and constants match `objidlbase.h`.

use crate::hresult::HResult;
use std::ffi::c_void;

/// A COM interface identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

/// `{00000000-0000-0000-C000-000000000046}`
pub const IID_IUNKNOWN: Guid = Guid::new(
    0x0000_0000,
    0x0000,
    0x0000,
    [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
);
/// `{0C733A30-2A1C-11CE-ADE5-00AA0044773D}`
pub const IID_ISEQUENTIALSTREAM: Guid = Guid::new(
    0x0C73_3A30,
    0x2A1C,
    0x11CE,
    [0xAD, 0xE5, 0x00, 0xAA, 0x00, 0x44, 0x77, 0x3D],
);
/// `{0000000C-0000-0000-C000-000000000046}`
pub const IID_ISTREAM: Guid = Guid::new(
    0x0000_000C,
    0x0000,
    0x0000,
    [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
);

pub const STREAM_SEEK_SET: u32 = 0;
pub const STREAM_SEEK_CUR: u32 = 1;
pub const STREAM_SEEK_END: u32 = 2;

pub const STGM_READ: u32 = 0x0;
pub const STGM_WRITE: u32 = 0x1;
pub const STGM_READWRITE: u32 = 0x2;

pub const STGTY_STREAM: u32 = 2;

pub const STATFLAG_DEFAULT: u32 = 0;
pub const STATFLAG_NONAME: u32 = 1;

/// `FILETIME`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(C)]
pub struct FileTime {
    pub low_date_time: u32,
    pub high_date_time: u32,
}

/// `STATSTG`.  80 bytes on 64-bit targets.
#[derive(Debug)]
#[repr(C)]
pub struct StatStg {
    /// Allocated by the callee with the caller's allocator; the caller frees it.
    pub pwcs_name: *mut u16,
    pub kind: u32,
    pub cb_size: u64,
    pub mtime: FileTime,
    pub ctime: FileTime,
    pub atime: FileTime,
    pub grf_mode: u32,
    pub grf_locks_supported: u32,
    pub clsid: Guid,
    pub grf_state_bits: u32,
    pub reserved: u32,
}

impl Default for StatStg {
    fn default() -> Self {
        Self {
            pwcs_name: std::ptr::null_mut(),
            kind: 0,
            cb_size: 0,
            mtime: FileTime::default(),
            ctime: FileTime::default(),
            atime: FileTime::default(),
            grf_mode: 0,
            grf_locks_supported: 0,
            clsid: Guid::default(),
            grf_state_bits: 0,
            reserved: 0,
        }
    }
}

/// Allocates `bytes` bytes for a name returned from `Stat`, `CoTaskMemAlloc`-style.  Returns
/// null on failure.
pub type NameAllocator = unsafe extern "system" fn(bytes: usize) -> *mut c_void;

/// The `IStream` vtable: `IUnknown`, then `ISequentialStream`, then `IStream`.
#[repr(C)]
pub struct IStreamVtbl {
    pub query_interface: unsafe extern "system" fn(
        this: *mut c_void,
        riid: *const Guid,
        ppv: *mut *mut c_void,
    ) -> HResult,
    pub add_ref: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub release: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub read: unsafe extern "system" fn(
        this: *mut c_void,
        pv: *mut c_void,
        cb: u32,
        pcb_read: *mut u32,
    ) -> HResult,
    pub write: unsafe extern "system" fn(
        this: *mut c_void,
        pv: *const c_void,
        cb: u32,
        pcb_written: *mut u32,
    ) -> HResult,
    pub seek: unsafe extern "system" fn(
        this: *mut c_void,
        dlib_move: i64,
        dw_origin: u32,
        plib_new_position: *mut u64,
    ) -> HResult,
    pub set_size: unsafe extern "system" fn(this: *mut c_void, lib_new_size: u64) -> HResult,
    pub copy_to: unsafe extern "system" fn(
        this: *mut c_void,
        pstm: *mut c_void,
        cb: u64,
        pcb_read: *mut u64,
        pcb_written: *mut u64,
    ) -> HResult,
    pub commit: unsafe extern "system" fn(this: *mut c_void, grf_commit_flags: u32) -> HResult,
    pub revert: unsafe extern "system" fn(this: *mut c_void) -> HResult,
    pub lock_region: unsafe extern "system" fn(
        this: *mut c_void,
        lib_offset: u64,
        cb: u64,
        dw_lock_type: u32,
    ) -> HResult,
    pub unlock_region: unsafe extern "system" fn(
        this: *mut c_void,
        lib_offset: u64,
        cb: u64,
        dw_lock_type: u32,
    ) -> HResult,
    pub stat: unsafe extern "system" fn(
        this: *mut c_void,
        pstatstg: *mut StatStg,
        grf_stat_flag: u32,
    ) -> HResult,
    pub clone: unsafe extern "system" fn(this: *mut c_void, ppstm: *mut *mut c_void) -> HResult,
}

/// The first field of every COM object.
#[repr(C)]
pub struct RawStream {
    pub vtbl: *const IStreamVtbl,
}
