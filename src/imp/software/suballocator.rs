// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! A block suballocator over [`SoftwareDevice`] heaps.

use crate::imp::software::device::{SoftwareDevice, SoftwareHeap};
use crate::imp::software::{SoftwareResource, lock};
use crate::imp::{
    ClearValue, Device, Error, HeapProperties, ResourceDesc, ResourceStates, Suballocation,
    SuballocationDesc, Suballocator,
};
use crate::bittricks::align_up;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex};

/// Configuration for [`SoftwareSuballocator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SuballocatorConfig {
    /// Size of each shared heap.  Requests larger than this get a heap of their own.
    pub block_size: u64,
}

impl Default for SuballocatorConfig {
    fn default() -> Self {
        Self {
            block_size: 64 * 1024 * 1024,
        }
    }
}

/// Free ranges of one block, sorted and coalesced.
#[derive(Debug)]
struct FreeList {
    ranges: Vec<Range<u64>>,
}

impl FreeList {
    fn new(size: u64) -> Self {
        Self {
            ranges: vec![0..size],
        }
    }

    /// First fit.
    fn take(&mut self, size: u64, alignment: u64) -> Option<u64> {
        let (i, start) = self.ranges.iter().enumerate().find_map(|(i, r)| {
            let start = align_up(r.start, alignment);
            (start + size <= r.end).then_some((i, start))
        })?;
        let r = self.ranges.remove(i);
        if start + size < r.end {
            self.ranges.insert(i, start + size..r.end);
        }
        if r.start < start {
            self.ranges.insert(i, r.start..start);
        }
        Some(start)
    }

    fn give_back(&mut self, range: Range<u64>) {
        let at = self.ranges.partition_point(|r| r.start < range.start);
        self.ranges.insert(at, range);
        let mut merged: Vec<Range<u64>> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if last.end == r.start => last.end = r.end,
                _ => merged.push(r),
            }
        }
        self.ranges = merged;
    }

    fn is_whole(&self, size: u64) -> bool {
        self.ranges.len() == 1 && self.ranges[0] == (0..size)
    }
}

#[derive(Debug)]
struct Block {
    heap: Arc<SoftwareHeap>,
    free: Arc<Mutex<FreeList>>,
}

/// Returns its range to the block when dropped.
#[derive(Debug)]
struct Lease {
    free: Arc<Mutex<FreeList>>,
    range: Range<u64>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        lock(&self.free).give_back(self.range.clone());
    }
}

/**
Places resources in shared heaps.

Each distinct set of heap properties gets its own list of blocks; a request takes the first free
range that fits, and a new block is created when none does.  Released ranges are reused as they
are, without clearing, unless the next tenant asks for zeroed memory.
*/
#[derive(Debug)]
pub struct SoftwareSuballocator {
    device: Arc<SoftwareDevice>,
    config: SuballocatorConfig,
    blocks: Mutex<HashMap<HeapProperties, Vec<Block>>>,
}

impl SoftwareSuballocator {
    pub fn new(device: Arc<SoftwareDevice>, config: SuballocatorConfig) -> Self {
        Self {
            device,
            config,
            blocks: Mutex::new(HashMap::new()),
        }
    }

    /// Shared heaps created so far with `properties`.
    pub fn block_count(&self, properties: &HeapProperties) -> usize {
        lock(&self.blocks).get(properties).map_or(0, Vec::len)
    }

    /// Drops shared heaps with nothing placed in them.
    pub fn trim(&self) {
        let block_size = self.config.block_size;
        for blocks in lock(&self.blocks).values_mut() {
            blocks.retain(|b| !lock(&b.free).is_whole(block_size));
        }
    }

    fn place(
        &self,
        properties: HeapProperties,
        size: u64,
        alignment: u64,
    ) -> Result<(Arc<SoftwareHeap>, Lease), Error> {
        let mut blocks = lock(&self.blocks);
        let list = blocks.entry(properties).or_default();
        for block in list.iter() {
            if let Some(offset) = lock(&block.free).take(size, alignment) {
                return Ok((
                    block.heap.clone(),
                    Lease {
                        free: block.free.clone(),
                        range: offset..offset + size,
                    },
                ));
            }
        }
        logwise::info_sync!(
            "new {size} byte block for {heap}",
            size = self.config.block_size,
            heap = logwise::privacy::LogIt(&properties.heap_type)
        );
        let heap = self.device.create_heap(self.config.block_size, properties)?;
        let mut free = FreeList::new(self.config.block_size);
        let offset = free
            .take(size, alignment)
            .ok_or(Error::OutOfMemory {
                requested: size,
                heap: properties.heap_type,
            })?;
        let free = Arc::new(Mutex::new(free));
        list.push(Block {
            heap: heap.clone(),
            free: free.clone(),
        });
        Ok((
            heap,
            Lease {
                free,
                range: offset..offset + size,
            },
        ))
    }
}

impl Suballocator for SoftwareSuballocator {
    type Resource = SoftwareResource;

    fn create_resource(
        &self,
        desc: &SuballocationDesc,
        resource_desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> Result<Suballocation<SoftwareResource>, Error> {
        let info = self.device.resource_allocation_info(resource_desc);
        let size = info.size_in_bytes;
        if desc.flags.committed || size > self.config.block_size {
            let heap = self.device.create_heap(size, desc.heap_properties)?;
            let resource =
                self.device
                    .create_placed_resource(&heap, 0, resource_desc, initial_state, clear_value)?;
            return Ok(Suballocation {
                resource,
                heap_offset: 0,
                size,
                dedicated: true,
                lease: None,
            });
        }
        let (heap, lease) = self.place(desc.heap_properties, size, info.alignment)?;
        let offset = lease.range.start;
        if desc.flags.zeroed {
            heap.zero(offset, size);
        }
        let resource = self.device.create_placed_resource(
            &heap,
            offset,
            resource_desc,
            initial_state,
            clear_value,
        )?;
        Ok(Suballocation {
            resource,
            heap_offset: offset,
            size,
            dedicated: false,
            lease: Some(Box::new(lease)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::{HeapType, ResourceFlags, SuballocationFlags};

    #[test]
    fn first_fit_with_alignment() {
        let mut f = FreeList::new(1024);
        assert_eq!(f.take(100, 1), Some(0));
        assert_eq!(f.take(100, 256), Some(256));
        assert_eq!(f.ranges, vec![100..256, 356..1024]);
        assert_eq!(f.take(156, 1), Some(100));
        assert_eq!(f.take(2000, 1), None);
    }

    #[test]
    fn freed_ranges_coalesce() {
        let mut f = FreeList::new(300);
        let a = f.take(100, 1).unwrap();
        let b = f.take(100, 1).unwrap();
        let c = f.take(100, 1).unwrap();
        f.give_back(a..a + 100);
        f.give_back(c..c + 100);
        assert_eq!(f.ranges.len(), 2);
        f.give_back(b..b + 100);
        assert!(f.is_whole(300));
    }

    fn upload(flags: SuballocationFlags) -> SuballocationDesc {
        SuballocationDesc {
            heap_properties: HeapProperties::of_type(HeapType::Upload),
            flags,
        }
    }

    fn allocate(
        s: &SoftwareSuballocator,
        flags: SuballocationFlags,
    ) -> Suballocation<SoftwareResource> {
        s.create_resource(
            &upload(flags),
            &ResourceDesc::buffer(256, ResourceFlags::NONE),
            ResourceStates::GENERIC_READ,
            None,
        )
        .unwrap()
    }

    #[test]
    fn reused_range_keeps_stale_bytes_unless_zeroed() {
        let device = Arc::new(SoftwareDevice::new(Default::default()));
        let s = SoftwareSuballocator::new(device.clone(), SuballocatorConfig { block_size: 1 << 20 });
        let first = allocate(&s, SuballocationFlags::default());
        device.write_buffer(&first.resource, 0, &[0xAB; 16]).unwrap();
        let offset = first.heap_offset;
        drop(first);

        let second = allocate(&s, SuballocationFlags::default());
        assert_eq!(second.heap_offset, offset);
        let mut out = [0u8; 16];
        device.read_buffer(&second.resource, 0, &mut out).unwrap();
        assert_eq!(out, [0xAB; 16]);
        drop(second);

        let third = allocate(
            &s,
            SuballocationFlags {
                committed: false,
                zeroed: true,
            },
        );
        assert_eq!(third.heap_offset, offset);
        device.read_buffer(&third.resource, 0, &mut out).unwrap();
        assert_eq!(out, [0; 16]);
    }

    #[test]
    fn neighbours_share_a_block() {
        let device = Arc::new(SoftwareDevice::new(Default::default()));
        let s = SoftwareSuballocator::new(device.clone(), SuballocatorConfig { block_size: 1 << 20 });
        let a = allocate(&s, SuballocationFlags::default());
        let b = allocate(&s, SuballocationFlags::default());
        assert!(a.resource.shares_heap_with(&b.resource));
        assert_ne!(a.heap_offset, b.heap_offset);
        assert_eq!(b.heap_offset % 65536, 0);
        assert_eq!(s.block_count(&upload(SuballocationFlags::default()).heap_properties), 1);

        let dedicated = allocate(
            &s,
            SuballocationFlags {
                committed: true,
                zeroed: false,
            },
        );
        assert!(dedicated.dedicated);
        assert!(!dedicated.resource.shares_heap_with(&a.resource));

        drop((a, b, dedicated));
        s.trim();
        assert_eq!(device.memory_in_use(), 0);
    }
}
