// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Command recording.

[`CommandRecorder`] borrows an open command list mutably and records three kinds of work into it:

- state transitions, one barrier per call;
- copies between textures and linear buffers, and between buffers;
- root constants, bound straight into the root signature.

Nothing is batched or elided.  Redundant barriers are the caller's to avoid.

# Whole-resource copies

A texture copy names an optional source box.  Passing no box tells the driver the entire source
is copied, which lets it skip per-region bookkeeping.  The recorder passes no box whenever the
requested region starts at the origin and spans the source's full extent, and an explicit box
otherwise.
*/

use crate::allocation::Allocation;
use crate::footprint::Footprint;
use crate::imp::{
    ALL_SUBRESOURCES, Box3, CommandList, ResourceDimension, ResourceStates, TextureCopyLocation,
    TransitionBarrier,
};

/// A texel position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Texel {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Texel {
    pub const ORIGIN: Texel = Texel { x: 0, y: 0, z: 0 };

    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// A region size in texels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

/// One axis of a copy region: `origin + len`, which must not pass `limit`.
fn region_end(axis: &str, origin: u32, len: u32, limit: u32) -> u32 {
    match origin.checked_add(len) {
        Some(end) if end <= limit => end,
        _ => panic!("copy region {axis} {origin}+{len} runs past the source extent {limit}"),
    }
}

/// The box for copying `extent` texels at `origin` out of a source whose whole extent is
/// `full`, or `None` when that is the whole source.
///
/// # Panics
///
/// If the region doesn't fit inside `full`.
pub fn copy_box(origin: Texel, extent: Extent, full: Extent) -> Option<Box3> {
    let right = region_end("x", origin.x, extent.width, full.width);
    let bottom = region_end("y", origin.y, extent.height, full.height);
    let back = region_end("z", origin.z, extent.depth, full.depth);
    if origin == Texel::ORIGIN && extent == full {
        None
    } else {
        Some(Box3 {
            left: origin.x,
            top: origin.y,
            front: origin.z,
            right,
            bottom,
            back,
        })
    }
}

/// Mip 0 extent of a texture description.
fn texture_extent<R>(allocation: &Allocation<R>) -> Extent {
    let desc = allocation.desc();
    assert!(
        desc.dimension.is_texture(),
        "{name} is a buffer, not a texture",
        name = allocation.debug_name()
    );
    Extent::new(desc.width as u32, desc.height, desc.depth())
}

fn footprint_extent(footprint: &Footprint) -> Extent {
    let f = &footprint.placed.footprint;
    Extent::new(f.width, f.height, f.depth)
}

fn assert_buffer<R>(allocation: &Allocation<R>) {
    assert_eq!(
        allocation.desc().dimension,
        ResourceDimension::Buffer,
        "{name} is not a buffer",
        name = allocation.debug_name()
    );
}

/// Records into one command list.
///
/// Holding the list by `&mut` keeps recording single-threaded.
#[derive(Debug)]
pub struct CommandRecorder<'a, L> {
    list: &'a mut L,
}

impl<'a, L: CommandList> CommandRecorder<'a, L> {
    pub fn new(list: &'a mut L) -> Self {
        Self { list }
    }

    pub fn list(&mut self) -> &mut L {
        self.list
    }

    /// Transitions every subresource of `allocation` from `before` to `after`.
    pub fn barrier(
        &mut self,
        allocation: &Allocation<L::Resource>,
        before: ResourceStates,
        after: ResourceStates,
    ) {
        logwise::trace_sync!(
            "barrier {name}: {before} -> {after}",
            name = logwise::privacy::LogIt(allocation.debug_name()),
            before = logwise::privacy::LogIt(&before),
            after = logwise::privacy::LogIt(&after)
        );
        self.list.resource_barrier(&[TransitionBarrier {
            resource: allocation.resource(),
            subresource: ALL_SUBRESOURCES,
            before,
            after,
        }]);
    }

    /**
    Copies `extent` texels at `src_origin` in subresource 0 of `src` into the buffer `dst`, laid
    out per `dst_footprint`.

    `dst_footprint` should come from [`Footprint::query`] for a texture of `extent`'s size.
    */
    pub fn copy_texture_to_buffer(
        &mut self,
        src: &Allocation<L::Resource>,
        src_origin: Texel,
        extent: Extent,
        dst: &Allocation<L::Resource>,
        dst_footprint: &Footprint,
    ) {
        assert_buffer(dst);
        let src_box = copy_box(src_origin, extent, texture_extent(src));
        let dst_location = TextureCopyLocation::Footprint {
            resource: dst.resource(),
            footprint: dst_footprint.placed,
        };
        let src_location = TextureCopyLocation::Subresource {
            resource: src.resource(),
            index: 0,
        };
        logwise::trace_sync!(
            "copy texture {src} -> buffer {dst} box={b}",
            src = logwise::privacy::LogIt(src.debug_name()),
            dst = logwise::privacy::LogIt(dst.debug_name()),
            b = logwise::privacy::LogIt(&src_box)
        );
        self.list
            .copy_texture_region(&dst_location, 0, 0, 0, &src_location, src_box.as_ref());
    }

    /**
    Copies `extent` texels at `src_origin` out of the buffer `src`, laid out per `src_footprint`,
    into subresource 0 of `dst` at `dst_origin`.
    */
    pub fn copy_buffer_to_texture(
        &mut self,
        src: &Allocation<L::Resource>,
        src_footprint: &Footprint,
        src_origin: Texel,
        extent: Extent,
        dst: &Allocation<L::Resource>,
        dst_origin: Texel,
    ) {
        assert_buffer(src);
        let src_box = copy_box(src_origin, extent, footprint_extent(src_footprint));
        let dst_location = TextureCopyLocation::Subresource {
            resource: dst.resource(),
            index: 0,
        };
        let src_location = TextureCopyLocation::Footprint {
            resource: src.resource(),
            footprint: src_footprint.placed,
        };
        logwise::trace_sync!(
            "copy buffer {src} -> texture {dst} box={b}",
            src = logwise::privacy::LogIt(src.debug_name()),
            dst = logwise::privacy::LogIt(dst.debug_name()),
            b = logwise::privacy::LogIt(&src_box)
        );
        self.list.copy_texture_region(
            &dst_location,
            dst_origin.x,
            dst_origin.y,
            dst_origin.z,
            &src_location,
            src_box.as_ref(),
        );
    }

    /// Copies `len` bytes between two buffers.
    pub fn copy_buffer(
        &mut self,
        src: &Allocation<L::Resource>,
        src_offset: u64,
        dst: &Allocation<L::Resource>,
        dst_offset: u64,
        len: u64,
    ) {
        assert_buffer(src);
        assert_buffer(dst);
        self.list
            .copy_buffer_region(dst.resource(), dst_offset, src.resource(), src_offset, len);
    }

    /// Binds `values` into root parameter 0.
    pub fn set_root_constants<const N: usize>(&mut self, values: &[u32; N]) {
        self.list.set_compute_root_32bit_constants(0, values, 0);
    }
}
