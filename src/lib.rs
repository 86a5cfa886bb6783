// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! heapwise is the resource-placement and command-recording layer of a GPU compute framework.

Callers say what a resource is *for*; heapwise works out where it has to live, how it starts, and
how bytes get in and out of it.

| Layer              | Module                   | Input                         | Output                                   |
|--------------------|--------------------------|-------------------------------|------------------------------------------|
| Intent mapping     | [`bindings`]             | intent + dimension            | heap type, resource flags, initial state |
| Heap selection     | [`bindings`]             | heap type + UMA report        | heap properties                          |
| Allocation         | [`allocation`]           | an [`AllocationRequest`](bindings::AllocationRequest) | an [`Allocation`](allocation::Allocation) |
| Views              | [`views`]                | an allocation + a slot        | CBV / SRV / UAV in a descriptor table    |
| Commands           | [`commands`]             | allocations + regions         | barriers, copies, root constants         |
| Layout             | [`footprint`]            | a resource description        | row pitch, rows, placement               |
| Stream interop     | [`stream`]               | a Rust byte sink              | a native `IStream`                        |

# Intents

There are five of them, and each fixes the heap, flags and starting state of its resource:

| Intent     | Heap     | Flags                  | Starts in                              |
|------------|----------|------------------------|----------------------------------------|
| Constant   | Upload   |                        | generic read                           |
| ReadOnly   | Default  |                        | common                                 |
| ReadWrite  | Default  | allow unordered access | common (buffers), unordered access (textures) |
| ReadBack   | Readback |                        | copy dest                              |
| Upload     | Upload   |                        | generic read                           |

Textures can't be Constant, ReadBack or Upload.  Asking for one is a bug in the caller and panics.

On cache-coherent UMA hardware every heap becomes a custom write-back heap in the L0 pool, so the
CPU can reach all of it.

# Allocation

Two strategies share one contract ([`ResourceAllocator`](allocation::ResourceAllocator)):

* Committed: every resource gets an implicit heap of its own.
* Pooled: resources are placed inside shared blocks by a [`Suballocator`](imp::Suballocator).
  Pooled memory is handed out as the last tenant left it unless the request asks for
  [`AllocationMode::Clear`](bindings::AllocationMode::Clear).

Device rejections come back as [`Error`] and are never retried here.

# Backends

The native layer is three traits in [`imp`].  Two backends implement them:

* `backend_software` (default) is an in-memory device that executes recorded command lists on the
  CPU.  It exists so placement and copy behavior can be checked byte for byte.
* `backend_d3d12` (Windows) forwards to `ID3D12Device` and `ID3D12GraphicsCommandList`.

# Example

```
# #[cfg(feature = "backend_software")] {
use heapwise::allocation::{AllocatorConfig, ConfiguredAllocator, ResourceAllocator};
use heapwise::bindings::{AllocationRequest, ResourceIntent, ResourceShape};
use heapwise::imp::software::{SoftwareDevice, SoftwareSuballocator};
use heapwise::imp::{Device, HeapType};
use std::sync::Arc;

let device = Arc::new(SoftwareDevice::new(Default::default()));
let pool = Arc::new(SoftwareSuballocator::new(device.clone(), Default::default()));
let allocator = ConfiguredAllocator::new(device.clone(), pool, AllocatorConfig::default()).unwrap();

let request = AllocationRequest::new(ResourceIntent::Upload, ResourceShape::buffer(1024))
    .with_debug_name("staging");
let staging = allocator.allocate(&request).unwrap();
assert_eq!(staging.heap_properties().heap_type, HeapType::Upload);
device.write_buffer(staging.resource(), 0, &[1, 2, 3, 4]).unwrap();
# }
```
*/

pub mod allocation;
pub mod bindings;
mod bittricks;
pub mod commands;
pub mod footprint;
pub mod hresult;
pub mod imp;
pub mod pixel_formats;
pub mod stream;
pub mod views;

pub use hresult::HResult;
pub use imp::Error;
