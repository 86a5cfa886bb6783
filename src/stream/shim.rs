// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The native-shaped stream object and its two vtables.

use crate::hresult::HResult;
use crate::stream::abi::{
    Guid, IID_ISEQUENTIALSTREAM, IID_ISTREAM, IID_IUNKNOWN, IStreamVtbl, NameAllocator, RawStream,
    STATFLAG_NONAME, STGM_READ, STGM_READWRITE, STGM_WRITE, STGTY_STREAM, STREAM_SEEK_CUR,
    STREAM_SEEK_END, STREAM_SEEK_SET, StatStg,
};
use crate::stream::handle::StreamRef;
use crate::stream::registry::{self, Sink};
use crate::stream::sink::StreamSink;
use crate::stream::status;
use std::ffi::c_void;
use std::io::{ErrorKind, SeekFrom, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU32, Ordering, fence};

/// Bytes moved per round trip in `CopyTo`.
const COPY_CHUNK: usize = 64 * 1024;

/**
A COM `IStream` implemented over a Rust byte sink.

The layout is what every COM caller expects: a vtable pointer first, followed by state the
caller never looks at.  Instances are only ever reached through a pointer; create them with
[`ComStream::write_only`] or [`ComStream::bidirectional`], which return the first reference as a
[`StreamRef`].

The count starts at 1 and the object is destroyed, along with its sink, by the release that takes
it to 0.
*/
#[repr(C)]
pub struct ComStream {
    vtbl: *const IStreamVtbl,
    ref_count: AtomicU32,
    key: u64,
}

impl ComStream {
    /// Wraps an append-only sink.  Only `Write`, `Commit` and `Stat` do anything.
    pub fn write_only<W: Write + Send + 'static>(sink: W) -> StreamRef {
        Self::create(&WRITE_ONLY_VTBL, Sink::WriteOnly(Box::new(sink)))
    }

    /// Wraps a seekable sink.
    pub fn bidirectional<S: StreamSink + 'static>(sink: S) -> StreamRef {
        Self::create(
            &BIDIRECTIONAL_VTBL,
            Sink::Bidirectional {
                inner: Box::new(sink),
                name_allocator: None,
            },
        )
    }

    /// Wraps a seekable sink whose `Stat` returns names allocated with `allocator`.  The caller
    /// of `Stat` frees them with the allocator's matching free function.
    pub fn bidirectional_with_names<S: StreamSink + 'static>(
        sink: S,
        allocator: NameAllocator,
    ) -> StreamRef {
        Self::create(
            &BIDIRECTIONAL_VTBL,
            Sink::Bidirectional {
                inner: Box::new(sink),
                name_allocator: Some(allocator),
            },
        )
    }

    fn create(vtbl: &'static IStreamVtbl, sink: Sink) -> StreamRef {
        let key = registry::insert(sink);
        let object = Box::new(ComStream {
            vtbl,
            ref_count: AtomicU32::new(1),
            key,
        });
        let raw = NonNull::from(Box::leak(object)).cast::<RawStream>();
        logwise::trace_sync!("ComStream {key} created", key = key);
        //safe because the object was just leaked and carries the one reference
        unsafe { StreamRef::from_non_null(raw) }
    }
}

unsafe fn object<'a>(this: *mut c_void) -> &'a ComStream {
    //safe because every vtable entry is only reachable through a live ComStream
    unsafe { &*(this as *const ComStream) }
}

/// Runs `f`, converting a panic into `E_UNEXPECTED`.
fn boundary(entry: &'static str, f: impl FnOnce() -> HResult) -> HResult {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(hr) => hr,
        Err(_) => {
            logwise::error_sync!("ComStream::{entry} panicked", entry = entry);
            HResult::E_UNEXPECTED
        }
    }
}

unsafe fn store<T>(out: *mut T, value: T) {
    if !out.is_null() {
        //safe because non-null out pointers are caller-owned and writable per the contract
        unsafe { out.write(value) };
    }
}

fn with_sink(this: &ComStream, f: impl FnOnce(&mut Sink) -> HResult) -> HResult {
    registry::with_sink(this.key, f).unwrap_or(HResult::E_UNEXPECTED)
}

fn with_bidirectional(
    this: &ComStream,
    f: impl FnOnce(&mut dyn StreamSink, Option<NameAllocator>) -> HResult,
) -> HResult {
    with_sink(this, |sink| match sink {
        Sink::Bidirectional {
            inner,
            name_allocator,
        } => f(inner.as_mut(), *name_allocator),
        Sink::WriteOnly(_) => HResult::STG_E_INVALIDFUNCTION,
    })
}

//IUnknown

unsafe extern "system" fn query_interface(
    this: *mut c_void,
    riid: *const Guid,
    ppv: *mut *mut c_void,
) -> HResult {
    boundary("QueryInterface", || {
        if ppv.is_null() {
            return HResult::E_POINTER;
        }
        //safe because ppv was checked for null
        unsafe { ppv.write(ptr::null_mut()) };
        if riid.is_null() {
            return HResult::E_POINTER;
        }
        //safe because riid was checked for null
        let iid = unsafe { *riid };
        if iid == IID_IUNKNOWN || iid == IID_ISEQUENTIALSTREAM || iid == IID_ISTREAM {
            //safe because this is live for the duration of the call
            unsafe {
                add_ref(this);
                ppv.write(this);
            }
            HResult::S_OK
        } else {
            HResult::E_NOINTERFACE
        }
    })
}

unsafe extern "system" fn add_ref(this: *mut c_void) -> u32 {
    //safe because the caller holds a reference
    let object = unsafe { object(this) };
    object.ref_count.fetch_add(1, Ordering::Relaxed) + 1
}

unsafe extern "system" fn release(this: *mut c_void) -> u32 {
    //safe because the caller holds the reference it is giving up
    let object = unsafe { object(this) };
    let previous = object.ref_count.fetch_sub(1, Ordering::Release);
    if previous != 1 {
        return previous - 1;
    }
    fence(Ordering::Acquire);
    let key = object.key;
    //safe because the count reached zero, so no other reference exists
    let object = unsafe { Box::from_raw(this as *mut ComStream) };
    drop(object);
    //the sink's drop may run user code; keep it out of the caller's frame
    let sink = registry::remove(key);
    if catch_unwind(AssertUnwindSafe(move || drop(sink))).is_err() {
        logwise::error_sync!("ComStream {key} sink panicked on drop", key = key);
    }
    logwise::trace_sync!("ComStream {key} destroyed", key = key);
    0
}

//ISequentialStream

unsafe extern "system" fn write(
    this: *mut c_void,
    pv: *const c_void,
    cb: u32,
    pcb_written: *mut u32,
) -> HResult {
    boundary("Write", || {
        //safe because pcb_written is null or writable
        unsafe { store(pcb_written, 0) };
        if cb > i32::MAX as u32 {
            return HResult::E_INVALIDARG;
        }
        if pv.is_null() && cb != 0 {
            return HResult::E_POINTER;
        }
        let data: &[u8] = if cb == 0 {
            &[]
        } else {
            //safe because pv points at cb readable bytes per the contract
            unsafe { std::slice::from_raw_parts(pv as *const u8, cb as usize) }
        };
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        with_sink(object, |sink| match sink.writer().write_all(data) {
            Ok(()) => {
                //safe because pcb_written is null or writable
                unsafe { store(pcb_written, cb) };
                HResult::S_OK
            }
            Err(e) => status::from_io(&e),
        })
    })
}

unsafe extern "system" fn read(
    this: *mut c_void,
    pv: *mut c_void,
    cb: u32,
    pcb_read: *mut u32,
) -> HResult {
    boundary("Read", || {
        //safe because pcb_read is null or writable
        unsafe { store(pcb_read, 0) };
        if pv.is_null() && cb != 0 {
            return HResult::E_POINTER;
        }
        let buf: &mut [u8] = if cb == 0 {
            &mut []
        } else {
            //safe because pv points at cb writable bytes per the contract
            unsafe { std::slice::from_raw_parts_mut(pv as *mut u8, cb as usize) }
        };
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        with_bidirectional(object, |sink, _| {
            let mut filled = 0;
            while filled < buf.len() {
                match sink.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        //safe because pcb_read is null or writable
                        unsafe { store(pcb_read, filled as u32) };
                        return status::from_io(&e);
                    }
                }
            }
            //safe because pcb_read is null or writable
            unsafe { store(pcb_read, filled as u32) };
            HResult::S_OK
        })
    })
}

//IStream

unsafe extern "system" fn seek(
    this: *mut c_void,
    dlib_move: i64,
    dw_origin: u32,
    plib_new_position: *mut u64,
) -> HResult {
    boundary("Seek", || {
        let to = match dw_origin {
            STREAM_SEEK_SET => match u64::try_from(dlib_move) {
                Ok(offset) => SeekFrom::Start(offset),
                Err(_) => return HResult::STG_E_INVALIDFUNCTION,
            },
            STREAM_SEEK_CUR => SeekFrom::Current(dlib_move),
            STREAM_SEEK_END => SeekFrom::End(dlib_move),
            _ => return HResult::STG_E_INVALIDFUNCTION,
        };
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        with_bidirectional(object, |sink, _| match sink.seek(to) {
            Ok(position) => {
                //safe because plib_new_position is null or writable
                unsafe { store(plib_new_position, position) };
                HResult::S_OK
            }
            Err(e) => status::from_io(&e),
        })
    })
}

unsafe extern "system" fn set_size(this: *mut c_void, lib_new_size: u64) -> HResult {
    boundary("SetSize", || {
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        with_bidirectional(object, |sink, _| match sink.set_len(lib_new_size) {
            Ok(()) => HResult::S_OK,
            Err(e) => status::from_io(&e),
        })
    })
}

unsafe extern "system" fn copy_to(
    this: *mut c_void,
    pstm: *mut c_void,
    cb: u64,
    pcb_read: *mut u64,
    pcb_written: *mut u64,
) -> HResult {
    boundary("CopyTo", || {
        //safe because both out pointers are null or writable
        unsafe {
            store(pcb_read, 0);
            store(pcb_written, 0);
        }
        let Some(target) = NonNull::new(pstm) else {
            return HResult::STG_E_INVALIDPOINTER;
        };
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        let mut chunk = vec![0u8; COPY_CHUNK];
        let mut total_read = 0u64;
        let mut total_written = 0u64;
        while total_read < cb {
            let want = (cb - total_read).min(COPY_CHUNK as u64) as usize;
            //the sink lock is released before calling out, since the target may be this stream
            let mut got = 0;
            let hr = with_bidirectional(object, |sink, _| loop {
                match sink.read(&mut chunk[..want]) {
                    Ok(n) => {
                        got = n;
                        return HResult::S_OK;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return status::from_io(&e),
                }
            });
            if hr.is_err() {
                return hr;
            }
            if got == 0 {
                break;
            }
            total_read += got as u64;
            let mut written = 0u32;
            //safe because target is a live IStream per the contract
            let hr = unsafe {
                let vtbl = &*(*(target.as_ptr() as *const *const IStreamVtbl));
                (vtbl.write)(
                    target.as_ptr(),
                    chunk.as_ptr().cast(),
                    got as u32,
                    &mut written,
                )
            };
            total_written += written as u64;
            //safe because both out pointers are null or writable
            unsafe {
                store(pcb_read, total_read);
                store(pcb_written, total_written);
            }
            if hr.is_err() {
                return hr;
            }
        }
        HResult::S_OK
    })
}

unsafe extern "system" fn commit(this: *mut c_void, _grf_commit_flags: u32) -> HResult {
    boundary("Commit", || {
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        with_sink(object, |sink| match sink.writer().flush() {
            Ok(()) => HResult::S_OK,
            Err(e) => status::from_io(&e),
        })
    })
}

unsafe extern "system" fn stat(
    this: *mut c_void,
    pstatstg: *mut StatStg,
    grf_stat_flag: u32,
) -> HResult {
    boundary("Stat", || {
        if pstatstg.is_null() {
            return HResult::STG_E_INVALIDPOINTER;
        }
        //safe because pstatstg was checked for null
        unsafe { pstatstg.write(StatStg::default()) };
        //safe because this is live for the duration of the call
        let object = unsafe { object(this) };
        with_sink(object, |sink| {
            let mut out = StatStg {
                kind: STGTY_STREAM,
                ..StatStg::default()
            };
            match sink {
                Sink::WriteOnly(_) => out.grf_mode = STGM_WRITE,
                Sink::Bidirectional {
                    inner,
                    name_allocator,
                } => {
                    let caps = inner.capabilities();
                    out.grf_mode = match (caps.read, caps.write) {
                        (true, true) => STGM_READWRITE,
                        (false, true) => STGM_WRITE,
                        _ => STGM_READ,
                    };
                    out.cb_size = match inner.len() {
                        Ok(len) => len,
                        Err(e) => return status::from_io(&e),
                    };
                    if grf_stat_flag & STATFLAG_NONAME == 0 {
                        if let (Some(name), Some(allocator)) = (inner.name(), *name_allocator) {
                            match allocate_name(name, allocator) {
                                Some(p) => out.pwcs_name = p,
                                None => return HResult::E_OUTOFMEMORY,
                            }
                        }
                    }
                }
            }
            //safe because pstatstg was checked for null
            unsafe { pstatstg.write(out) };
            HResult::S_OK
        })
    })
}

fn allocate_name(name: &str, allocator: NameAllocator) -> Option<*mut u16> {
    let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    //safe because the allocator contract is CoTaskMemAlloc's
    let p = unsafe { allocator(wide.len() * size_of::<u16>()) } as *mut u16;
    if p.is_null() {
        return None;
    }
    //safe because p holds wide.len() u16s
    unsafe { ptr::copy_nonoverlapping(wide.as_ptr(), p, wide.len()) };
    Some(p)
}

unsafe extern "system" fn clone_not_implemented(
    _this: *mut c_void,
    ppstm: *mut *mut c_void,
) -> HResult {
    //safe because ppstm is null or writable
    unsafe { store(ppstm, ptr::null_mut()) };
    HResult::E_NOTIMPL
}

unsafe extern "system" fn revert_not_implemented(_this: *mut c_void) -> HResult {
    HResult::E_NOTIMPL
}

//unsupported operations

unsafe extern "system" fn read_unsupported(
    _this: *mut c_void,
    _pv: *mut c_void,
    _cb: u32,
    pcb_read: *mut u32,
) -> HResult {
    //safe because pcb_read is null or writable
    unsafe { store(pcb_read, 0) };
    HResult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn seek_unsupported(
    _this: *mut c_void,
    _dlib_move: i64,
    _dw_origin: u32,
    _plib_new_position: *mut u64,
) -> HResult {
    HResult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn set_size_unsupported(_this: *mut c_void, _size: u64) -> HResult {
    HResult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn copy_to_unsupported(
    _this: *mut c_void,
    _pstm: *mut c_void,
    _cb: u64,
    _pcb_read: *mut u64,
    _pcb_written: *mut u64,
) -> HResult {
    HResult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn revert_unsupported(_this: *mut c_void) -> HResult {
    HResult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn region_unsupported(
    _this: *mut c_void,
    _lib_offset: u64,
    _cb: u64,
    _dw_lock_type: u32,
) -> HResult {
    HResult::STG_E_INVALIDFUNCTION
}

unsafe extern "system" fn clone_unsupported(
    _this: *mut c_void,
    ppstm: *mut *mut c_void,
) -> HResult {
    //safe because ppstm is null or writable
    unsafe { store(ppstm, ptr::null_mut()) };
    HResult::STG_E_INVALIDFUNCTION
}

static WRITE_ONLY_VTBL: IStreamVtbl = IStreamVtbl {
    query_interface,
    add_ref,
    release,
    read: read_unsupported,
    write,
    seek: seek_unsupported,
    set_size: set_size_unsupported,
    copy_to: copy_to_unsupported,
    commit,
    revert: revert_unsupported,
    lock_region: region_unsupported,
    unlock_region: region_unsupported,
    stat,
    clone: clone_unsupported,
};

static BIDIRECTIONAL_VTBL: IStreamVtbl = IStreamVtbl {
    query_interface,
    add_ref,
    release,
    read,
    write,
    seek,
    set_size,
    copy_to,
    commit,
    revert: revert_not_implemented,
    lock_region: region_unsupported,
    unlock_region: region_unsupported,
    stat,
    clone: clone_not_implemented,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn object_layout_starts_with_vtable() {
        assert_eq!(std::mem::offset_of!(ComStream, vtbl), 0);
    }

    #[test]
    fn write_only_refuses_reads() {
        let stream = ComStream::write_only(Vec::new());
        let mut buf = [0u8; 4];
        let mut n = 7u32;
        let hr = unsafe { (stream.vtbl().read)(stream.as_raw(), buf.as_mut_ptr().cast(), 4, &mut n) };
        assert_eq!(hr, HResult::STG_E_INVALIDFUNCTION);
        assert_eq!(n, 0);
    }

    #[test]
    fn oversized_write_is_invalid() {
        let stream = ComStream::bidirectional(Cursor::new(Vec::new()));
        let byte = 0u8;
        let hr = unsafe {
            (stream.vtbl().write)(
                stream.as_raw(),
                (&byte as *const u8).cast(),
                i32::MAX as u32 + 1,
                ptr::null_mut(),
            )
        };
        assert_eq!(hr, HResult::E_INVALIDARG);
    }

    #[test]
    fn null_buffer_is_a_pointer_error() {
        let stream = ComStream::bidirectional(Cursor::new(Vec::new()));
        let hr = unsafe { (stream.vtbl().write)(stream.as_raw(), ptr::null(), 4, ptr::null_mut()) };
        assert_eq!(hr, HResult::E_POINTER);
        let hr = unsafe { (stream.vtbl().write)(stream.as_raw(), ptr::null(), 0, ptr::null_mut()) };
        assert_eq!(hr, HResult::S_OK);
    }

    #[test]
    fn bad_seek_origin() {
        let stream = ComStream::bidirectional(Cursor::new(vec![0u8; 8]));
        let hr = unsafe { (stream.vtbl().seek)(stream.as_raw(), 0, 3, ptr::null_mut()) };
        assert_eq!(hr, HResult::STG_E_INVALIDFUNCTION);
        let hr = unsafe { (stream.vtbl().seek)(stream.as_raw(), -1, STREAM_SEEK_SET, ptr::null_mut()) };
        assert_eq!(hr, HResult::STG_E_INVALIDFUNCTION);
    }

    struct Exploding;
    impl std::io::Write for Exploding {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            panic!("sink exploded")
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn panics_stay_on_this_side() {
        let stream = ComStream::write_only(Exploding);
        let byte = 1u8;
        let hr = unsafe {
            (stream.vtbl().write)(stream.as_raw(), (&byte as *const u8).cast(), 1, ptr::null_mut())
        };
        assert_eq!(hr, HResult::E_UNEXPECTED);
        //still usable afterwards
        let hr = unsafe { (stream.vtbl().commit)(stream.as_raw(), 0) };
        assert_eq!(hr, HResult::S_OK);
    }
}
