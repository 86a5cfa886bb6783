// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The native layer.

Everything above this module speaks in intents and shapes; everything below it speaks the
driver's language.  The seams are three traits:

- [`Device`] creates committed resources, answers layout questions and writes views.
- [`CommandList`] records barriers, copies and root constants.
- [`Suballocator`] places resources inside shared heaps.

Two backends implement them.  `software` (the default feature) is an in-memory device that
executes recorded commands on the CPU, and is what the tests run against.  `d3d12` (Windows,
`backend_d3d12` feature) forwards to `ID3D12Device` / `ID3D12GraphicsCommandList`.
*/

mod error;
mod types;

#[cfg(feature = "backend_software")]
pub mod software;

#[cfg(all(windows, feature = "backend_d3d12"))]
pub mod d3d12;

pub use error::Error;
pub use types::*;

use crate::footprint::Footprint;
use std::any::Any;
use std::fmt::Debug;

/// A device that owns GPU memory.
///
/// Implementations are expected to be internally synchronized; every method takes `&self` and
/// may be called from several threads at once.
pub trait Device: Send + Sync {
    /// A reference-counted handle to one native resource.  Cloning adds a reference.
    type Resource: Clone + Debug + Send + Sync;
    /// A shader-visible descriptor table views are written into.
    type DescriptorHeap: Send + Sync;

    /// Memory architecture of the adapter.  A failed query is an error, never a guess.
    fn architecture(&self) -> Result<Architecture, Error>;

    /// Creates a resource together with its own implicit heap.
    fn create_committed_resource(
        &self,
        heap_properties: &HeapProperties,
        heap_flags: HeapFlags,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<Self::Resource, Error>;

    /// The live description of `resource`.
    fn resource_desc(&self, resource: &Self::Resource) -> ResourceDesc;

    fn resource_allocation_info(&self, desc: &ResourceDesc) -> ResourceAllocationInfo;

    /// How subresource `subresource` of `desc` lays out in a buffer starting at `base_offset`.
    fn copyable_footprints(&self, desc: &ResourceDesc, subresource: u32, base_offset: u64)
    -> Footprint;

    fn gpu_virtual_address(&self, resource: &Self::Resource) -> u64;

    fn create_descriptor_heap(&self, capacity: u32) -> Result<Self::DescriptorHeap, Error>;

    fn create_constant_buffer_view(
        &self,
        desc: &ConstantBufferViewDesc,
        heap: &Self::DescriptorHeap,
        slot: u32,
    );

    fn create_shader_resource_view(
        &self,
        resource: &Self::Resource,
        desc: &ShaderResourceViewDesc,
        heap: &Self::DescriptorHeap,
        slot: u32,
    );

    fn create_unordered_access_view(
        &self,
        resource: &Self::Resource,
        desc: &UnorderedAccessViewDesc,
        heap: &Self::DescriptorHeap,
        slot: u32,
    );

    /// Maps a CPU-visible buffer and copies `data` in at `offset`.
    fn write_buffer(&self, resource: &Self::Resource, offset: u64, data: &[u8])
    -> Result<(), Error>;

    /// Maps a CPU-visible buffer and copies `out.len()` bytes out from `offset`.
    fn read_buffer(&self, resource: &Self::Resource, offset: u64, out: &mut [u8])
    -> Result<(), Error>;
}

/// An open command list.
///
/// Recording is single-threaded: every method takes `&mut self`.
pub trait CommandList {
    type Resource;

    fn resource_barrier(&mut self, barriers: &[TransitionBarrier<'_, Self::Resource>]);

    /// Copies `src` into `dst` at `(dst_x, dst_y, dst_z)`.  A `None` box copies all of `src`.
    fn copy_texture_region(
        &mut self,
        dst: &TextureCopyLocation<'_, Self::Resource>,
        dst_x: u32,
        dst_y: u32,
        dst_z: u32,
        src: &TextureCopyLocation<'_, Self::Resource>,
        src_box: Option<&Box3>,
    );

    fn copy_buffer_region(
        &mut self,
        dst: &Self::Resource,
        dst_offset: u64,
        src: &Self::Resource,
        src_offset: u64,
        num_bytes: u64,
    );

    fn set_compute_root_32bit_constants(
        &mut self,
        root_parameter_index: u32,
        values: &[u32],
        dest_offset_in_32bit_values: u32,
    );
}

/// Placement flags passed to a [`Suballocator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SuballocationFlags {
    /// Give this resource a heap of its own instead of a slice of a shared block.
    pub committed: bool,
    /// Zero the memory before handing it out.  Pooled memory otherwise keeps whatever the
    /// previous tenant left there.
    pub zeroed: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SuballocationDesc {
    pub heap_properties: HeapProperties,
    pub flags: SuballocationFlags,
}

/// A resource placed by a [`Suballocator`].
pub struct Suballocation<R> {
    pub resource: R,
    /// Offset of the resource inside its heap.  0 for dedicated heaps.
    pub heap_offset: u64,
    pub size: u64,
    pub dedicated: bool,
    /// Returns the range to the pool when dropped.
    pub lease: Option<Box<dyn Any + Send + Sync>>,
}

impl<R: Debug> Debug for Suballocation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suballocation")
            .field("resource", &self.resource)
            .field("heap_offset", &self.heap_offset)
            .field("size", &self.size)
            .field("dedicated", &self.dedicated)
            .finish()
    }
}

/// A block-suballocation service: places many resources inside few heaps.
pub trait Suballocator: Send + Sync {
    type Resource: Clone + Debug + Send + Sync;

    fn create_resource(
        &self,
        desc: &SuballocationDesc,
        resource_desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<Suballocation<Self::Resource>, Error>;
}
