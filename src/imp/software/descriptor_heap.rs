// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::software::{SoftwareResource, lock};
use crate::imp::{ConstantBufferViewDesc, ShaderResourceViewDesc, UnorderedAccessViewDesc};
use std::sync::Mutex;

/// A view written into a descriptor slot.
#[derive(Debug, Clone)]
pub enum Descriptor {
    ConstantBuffer(ConstantBufferViewDesc),
    ShaderResource {
        resource: SoftwareResource,
        desc: ShaderResourceViewDesc,
    },
    UnorderedAccess {
        resource: SoftwareResource,
        desc: UnorderedAccessViewDesc,
    },
}

/// A fixed-size table of descriptor slots.
#[derive(Debug)]
pub struct SoftwareDescriptorHeap {
    slots: Mutex<Vec<Option<Descriptor>>>,
}

impl SoftwareDescriptorHeap {
    pub(crate) fn new(capacity: u32) -> Self {
        Self {
            slots: Mutex::new(vec![None; capacity as usize]),
        }
    }

    pub fn capacity(&self) -> u32 {
        lock(&self.slots).len() as u32
    }

    /// What `slot` currently holds.
    pub fn get(&self, slot: u32) -> Option<Descriptor> {
        lock(&self.slots)
            .get(slot as usize)
            .cloned()
            .flatten()
    }

    pub(crate) fn put(&self, slot: u32, descriptor: Descriptor) {
        let mut slots = lock(&self.slots);
        let capacity = slots.len();
        let entry = slots
            .get_mut(slot as usize)
            .unwrap_or_else(|| panic!("descriptor slot {slot} out of range for {capacity} slots"));
        *entry = Some(descriptor);
    }
}
