// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::convert;
use super::device::D3d12Resource;
use crate::imp::{Box3, CommandList, TextureCopyLocation, TransitionBarrier};
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use windows::Win32::Graphics::Direct3D12::*;

/// An open `ID3D12GraphicsCommandList`.
#[derive(Debug)]
pub struct D3d12CommandList {
    list: ID3D12GraphicsCommandList,
}

impl D3d12CommandList {
    pub fn new(list: ID3D12GraphicsCommandList) -> Self {
        Self { list }
    }

    pub fn native(&self) -> &ID3D12GraphicsCommandList {
        &self.list
    }
}

//the returned struct borrows `resource` without adding a reference; it must not outlive it
fn borrowed(resource: &D3d12Resource) -> ManuallyDrop<Option<ID3D12Resource>> {
    //safe because Option<ID3D12Resource> has the layout of a single interface pointer
    unsafe { std::mem::transmute_copy(&resource.0) }
}

fn location(l: &TextureCopyLocation<'_, D3d12Resource>) -> D3D12_TEXTURE_COPY_LOCATION {
    match l {
        TextureCopyLocation::Subresource { resource, index } => D3D12_TEXTURE_COPY_LOCATION {
            pResource: borrowed(resource),
            Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                SubresourceIndex: *index,
            },
        },
        TextureCopyLocation::Footprint {
            resource,
            footprint,
        } => D3D12_TEXTURE_COPY_LOCATION {
            pResource: borrowed(resource),
            Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                PlacedFootprint: convert::placed_footprint(footprint),
            },
        },
    }
}

impl CommandList for D3d12CommandList {
    type Resource = D3d12Resource;

    fn resource_barrier(&mut self, barriers: &[TransitionBarrier<'_, D3d12Resource>]) {
        let native: Vec<D3D12_RESOURCE_BARRIER> = barriers
            .iter()
            .map(|b| D3D12_RESOURCE_BARRIER {
                Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
                Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
                Anonymous: D3D12_RESOURCE_BARRIER_0 {
                    Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                        pResource: borrowed(b.resource),
                        Subresource: b.subresource,
                        StateBefore: convert::states(b.before),
                        StateAfter: convert::states(b.after),
                    }),
                },
            })
            .collect();
        //safe because every borrowed resource outlives the call
        unsafe { self.list.ResourceBarrier(&native) }
    }

    fn copy_texture_region(
        &mut self,
        dst: &TextureCopyLocation<'_, D3d12Resource>,
        dst_x: u32,
        dst_y: u32,
        dst_z: u32,
        src: &TextureCopyLocation<'_, D3d12Resource>,
        src_box: Option<&Box3>,
    ) {
        let dst = location(dst);
        let src = location(src);
        let native_box = src_box.map(convert::copy_box);
        //safe because both locations and the box outlive the call
        unsafe {
            self.list.CopyTextureRegion(
                &dst,
                dst_x,
                dst_y,
                dst_z,
                &src,
                native_box.as_ref().map(|b| b as *const D3D12_BOX),
            )
        }
    }

    fn copy_buffer_region(
        &mut self,
        dst: &D3d12Resource,
        dst_offset: u64,
        src: &D3d12Resource,
        src_offset: u64,
        num_bytes: u64,
    ) {
        //safe because both resources outlive the call
        unsafe {
            self.list
                .CopyBufferRegion(&dst.0, dst_offset, &src.0, src_offset, num_bytes)
        }
    }

    fn set_compute_root_32bit_constants(
        &mut self,
        root_parameter_index: u32,
        values: &[u32],
        dest_offset_in_32bit_values: u32,
    ) {
        //safe because values is read during the call only
        unsafe {
            self.list.SetComputeRoot32BitConstants(
                root_parameter_index,
                values.len() as u32,
                values.as_ptr() as *const c_void,
                dest_offset_in_32bit_values,
            )
        }
    }
}
