// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The native backend.

Thin wrappers over `ID3D12Device` and `ID3D12GraphicsCommandList`.  The host creates the device
and command lists (and owns queue submission and fences); this module only translates.

Pooled allocation goes through [`D3d12Suballocator`], which places resources in heaps managed by
`gpu-allocator`.  Hosts that already run their own pool can implement
[`Suballocator`](crate::imp::Suballocator) over it instead.
*/

mod command_list;
mod convert;
mod device;
mod suballocator;

pub use command_list::D3d12CommandList;
pub use device::{D3d12DescriptorHeap, D3d12Device, D3d12Resource};
pub use suballocator::D3d12Suballocator;
