// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Recording.

use crate::imp::software::SoftwareResource;
use crate::imp::{Box3, CommandList, PlacedFootprint, ResourceStates, TextureCopyLocation, TransitionBarrier};

/// A copy location that keeps its resource alive until execution.
#[derive(Debug, Clone)]
pub enum CopyLocation {
    Subresource {
        resource: SoftwareResource,
        index: u32,
    },
    Footprint {
        resource: SoftwareResource,
        footprint: PlacedFootprint,
    },
}

impl CopyLocation {
    fn record(location: &TextureCopyLocation<'_, SoftwareResource>) -> Self {
        match location {
            TextureCopyLocation::Subresource { resource, index } => CopyLocation::Subresource {
                resource: (*resource).clone(),
                index: *index,
            },
            TextureCopyLocation::Footprint {
                resource,
                footprint,
            } => CopyLocation::Footprint {
                resource: (*resource).clone(),
                footprint: *footprint,
            },
        }
    }

    pub fn resource(&self) -> &SoftwareResource {
        match self {
            CopyLocation::Subresource { resource, .. } | CopyLocation::Footprint { resource, .. } => {
                resource
            }
        }
    }
}

/// One recorded command.
#[derive(Debug, Clone)]
pub enum Command {
    Barrier {
        resource: SoftwareResource,
        subresource: u32,
        before: ResourceStates,
        after: ResourceStates,
    },
    CopyTextureRegion {
        dst: CopyLocation,
        dst_x: u32,
        dst_y: u32,
        dst_z: u32,
        src: CopyLocation,
        src_box: Option<Box3>,
    },
    CopyBufferRegion {
        dst: SoftwareResource,
        dst_offset: u64,
        src: SoftwareResource,
        src_offset: u64,
        num_bytes: u64,
    },
    SetComputeRoot32BitConstants {
        root_parameter_index: u32,
        values: Vec<u32>,
        dest_offset: u32,
    },
}

/// A command list that records into memory.  Run it with
/// [`SoftwareDevice::execute`](super::SoftwareDevice::execute).
#[derive(Debug, Default)]
pub struct SoftwareCommandList {
    commands: Vec<Command>,
}

impl SoftwareCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded since the last execute.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl CommandList for SoftwareCommandList {
    type Resource = SoftwareResource;

    fn resource_barrier(&mut self, barriers: &[TransitionBarrier<'_, SoftwareResource>]) {
        for b in barriers {
            self.commands.push(Command::Barrier {
                resource: b.resource.clone(),
                subresource: b.subresource,
                before: b.before,
                after: b.after,
            });
        }
    }

    fn copy_texture_region(
        &mut self,
        dst: &TextureCopyLocation<'_, SoftwareResource>,
        dst_x: u32,
        dst_y: u32,
        dst_z: u32,
        src: &TextureCopyLocation<'_, SoftwareResource>,
        src_box: Option<&Box3>,
    ) {
        self.commands.push(Command::CopyTextureRegion {
            dst: CopyLocation::record(dst),
            dst_x,
            dst_y,
            dst_z,
            src: CopyLocation::record(src),
            src_box: src_box.copied(),
        });
    }

    fn copy_buffer_region(
        &mut self,
        dst: &SoftwareResource,
        dst_offset: u64,
        src: &SoftwareResource,
        src_offset: u64,
        num_bytes: u64,
    ) {
        self.commands.push(Command::CopyBufferRegion {
            dst: dst.clone(),
            dst_offset,
            src: src.clone(),
            src_offset,
            num_bytes,
        });
    }

    fn set_compute_root_32bit_constants(
        &mut self,
        root_parameter_index: u32,
        values: &[u32],
        dest_offset_in_32bit_values: u32,
    ) {
        self.commands.push(Command::SetComputeRoot32BitConstants {
            root_parameter_index,
            values: values.to_vec(),
            dest_offset: dest_offset_in_32bit_values,
        });
    }
}
