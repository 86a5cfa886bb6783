// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! An owned reference to any `IStream`.

use crate::hresult::HResult;
use crate::stream::abi::{
    Guid, IID_ISTREAM, IStreamVtbl, RawStream, STATFLAG_NONAME, STREAM_SEEK_CUR, STREAM_SEEK_END,
    STREAM_SEEK_SET, StatStg,
};
use crate::stream::status;
use std::ffi::c_void;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ptr::{self, NonNull};

/**
One reference to a COM `IStream`, ours or anyone's.

Cloning calls `AddRef`; dropping calls `Release`.  [`into_raw`](Self::into_raw) hands the
reference to native code without touching the count, and [`from_raw`](Self::from_raw) takes one
back.

`StreamRef` implements [`Read`], [`Write`] and [`Seek`] by calling through the vtable, so Rust
encoders can write into any native stream.
*/
pub struct StreamRef {
    raw: NonNull<RawStream>,
}

//the streams this crate creates are free-threaded; foreign ones are assumed agile
unsafe impl Send for StreamRef {}
unsafe impl Sync for StreamRef {}

/// The parts of `STATSTG` a stream reports about itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Stat {
    pub kind: u32,
    pub size: u64,
    pub mode: u32,
}

impl StreamRef {
    /// Takes ownership of one reference.
    ///
    /// # Safety
    ///
    /// `ptr` is null or a live `IStream` whose reference the caller is giving up.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr.cast()).map(|raw| Self { raw })
    }

    /// Adds a reference to a stream the caller keeps.
    ///
    /// # Safety
    ///
    /// `ptr` is null or a live `IStream`.
    pub unsafe fn from_borrowed(ptr: *mut c_void) -> Option<Self> {
        let raw = NonNull::new(ptr.cast::<RawStream>())?;
        let s = Self { raw };
        //safe because ptr is live per the contract
        unsafe { (s.vtbl().add_ref)(s.as_raw()) };
        Some(s)
    }

    pub(crate) unsafe fn from_non_null(raw: NonNull<RawStream>) -> Self {
        Self { raw }
    }

    /// Gives the reference to the caller without releasing it.
    pub fn into_raw(self) -> *mut c_void {
        let p = self.as_raw();
        std::mem::forget(self);
        p
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.raw.as_ptr().cast()
    }

    pub fn vtbl(&self) -> &IStreamVtbl {
        //safe because a live COM object starts with its vtable pointer
        unsafe { &*self.raw.as_ref().vtbl }
    }

    /// `QueryInterface` for `iid`.  Succeeds with a new reference for any stream interface.
    pub fn query_interface(&self, iid: &Guid) -> Result<StreamRef, HResult> {
        let mut out = ptr::null_mut();
        //safe because self is live and out is writable
        let hr = unsafe { (self.vtbl().query_interface)(self.as_raw(), iid, &mut out) };
        hr.ok()?;
        //safe because a successful QueryInterface returned an owned reference
        unsafe { StreamRef::from_raw(out) }.ok_or(HResult::E_POINTER)
    }

    /// Whether the object answers to `IStream`.
    pub fn is_stream(&self) -> bool {
        self.query_interface(&IID_ISTREAM).is_ok()
    }

    pub fn stat(&self) -> Result<Stat, HResult> {
        let mut out = StatStg::default();
        //safe because self is live and out is writable
        unsafe { (self.vtbl().stat)(self.as_raw(), &mut out, STATFLAG_NONAME) }.ok()?;
        Ok(Stat {
            kind: out.kind,
            size: out.cb_size,
            mode: out.grf_mode,
        })
    }

    pub fn set_size(&self, size: u64) -> Result<(), HResult> {
        //safe because self is live
        unsafe { (self.vtbl().set_size)(self.as_raw(), size) }.ok()
    }

    pub fn commit(&self) -> Result<(), HResult> {
        //safe because self is live
        unsafe { (self.vtbl().commit)(self.as_raw(), 0) }.ok()
    }

    /// Copies up to `len` bytes from this stream's position into `target`.  Returns
    /// `(read, written)`.
    pub fn copy_to(&self, target: &StreamRef, len: u64) -> Result<(u64, u64), HResult> {
        let (mut read, mut written) = (0, 0);
        //safe because both streams are live and the counters are writable
        unsafe {
            (self.vtbl().copy_to)(self.as_raw(), target.as_raw(), len, &mut read, &mut written)
        }
        .ok()?;
        Ok((read, written))
    }
}

impl Clone for StreamRef {
    fn clone(&self) -> Self {
        //safe because self holds a reference
        unsafe { (self.vtbl().add_ref)(self.as_raw()) };
        Self { raw: self.raw }
    }
}

impl Drop for StreamRef {
    fn drop(&mut self) {
        //safe because self owns exactly one reference
        unsafe { (self.vtbl().release)(self.as_raw()) };
    }
}

impl std::fmt::Debug for StreamRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StreamRef").field(&self.raw).finish()
    }
}

impl Write for StreamRef {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let cb = buf.len().min(i32::MAX as usize) as u32;
        let mut written = 0;
        //safe because buf holds cb readable bytes
        let hr = unsafe { (self.vtbl().write)(self.as_raw(), buf.as_ptr().cast(), cb, &mut written) };
        hr.ok().map_err(status::to_io)?;
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit().map_err(status::to_io)
    }
}

impl Read for StreamRef {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let cb = buf.len().min(u32::MAX as usize) as u32;
        let mut read = 0;
        //safe because buf holds cb writable bytes
        let hr = unsafe { (self.vtbl().read)(self.as_raw(), buf.as_mut_ptr().cast(), cb, &mut read) };
        hr.ok().map_err(status::to_io)?;
        Ok(read as usize)
    }
}

impl Seek for StreamRef {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, origin) = match pos {
            SeekFrom::Start(o) => (
                i64::try_from(o).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?,
                STREAM_SEEK_SET,
            ),
            SeekFrom::Current(o) => (o, STREAM_SEEK_CUR),
            SeekFrom::End(o) => (o, STREAM_SEEK_END),
        };
        let mut position = 0;
        //safe because self is live and position is writable
        let hr = unsafe { (self.vtbl().seek)(self.as_raw(), offset, origin, &mut position) };
        hr.ok().map_err(status::to_io)?;
        Ok(position)
    }
}
