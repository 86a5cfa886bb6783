// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
COM stream interop.

Native image encoders write to an `IStream`.  This module builds one over a Rust byte sink:

- [`ComStream::write_only`] wraps anything that implements [`Write`](std::io::Write).  Reads,
  seeks and resizing answer `STG_E_INVALIDFUNCTION`.
- [`ComStream::bidirectional`] wraps a [`StreamSink`], which can also read, seek and resize.

Either way the caller gets a [`StreamRef`], which owns one reference.  Pass it across the
boundary with [`StreamRef::into_raw`].  The sink is dropped when the last reference is released,
from whichever side that happens on.

No Rust panic crosses the boundary: every entry point catches unwinding and answers
`E_UNEXPECTED`, and I/O errors become the closest matching `HRESULT`.

```
use heapwise::stream::ComStream;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

let mut stream = ComStream::bidirectional(Cursor::new(Vec::new()));
stream.write_all(b"IHDR").unwrap();
stream.seek(SeekFrom::Start(0)).unwrap();
let mut back = [0u8; 4];
stream.read_exact(&mut back).unwrap();
assert_eq!(&back, b"IHDR");
```
*/

pub mod abi;
mod handle;
mod registry;
mod shim;
pub mod sink;
pub mod status;

pub use handle::{Stat, StreamRef};
pub use registry::live_sinks;
pub use shim::ComStream;
pub use sink::{Capabilities, Named, StreamSink};
