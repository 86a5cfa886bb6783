// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Byte sinks a stream can wrap.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Which directions a sink supports, reported by `Stat`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub read: bool,
    pub write: bool,
}

impl Capabilities {
    pub const READ_WRITE: Capabilities = Capabilities {
        read: true,
        write: true,
    };
}

/// A seekable, resizable byte stream.
pub trait StreamSink: Read + Write + Seek + Send {
    /// Truncates or zero-extends the stream to `len` bytes.  The position is unchanged.
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ_WRITE
    }

    /// A name to report from `Stat`, when the sink has one.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Current length, without moving the position.
    fn len(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if position != end {
            self.seek(SeekFrom::Start(position))?;
        }
        Ok(end)
    }
}

impl StreamSink for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }

    fn len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

impl StreamSink for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// Attaches a name to a sink.
#[derive(Debug)]
pub struct Named<S> {
    pub inner: S,
    pub name: String,
}

impl<S> Named<S> {
    pub fn new(inner: S, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }
}

impl<S: Read> Read for Named<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<S: Write> Write for Named<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for Named<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<S: StreamSink> StreamSink for Named<S> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.inner.set_len(len)
    }
    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
    fn len(&mut self) -> io::Result<u64> {
        self.inner.len()
    }
}
