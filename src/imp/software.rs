// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
An in-memory device.

Everything the native layer promises, implemented on the CPU: heaps are byte vectors, command
lists record into a `Vec`, and [`SoftwareDevice::execute`] replays them.  The point is to make
allocation, placement and copy behavior observable byte for byte without a GPU.

Resource states are tracked as barriers execute, and a barrier whose `before` disagrees with the
tracked state is logged as a warning.  The debug layer would flag the same thing.
*/

mod command_list;
mod descriptor_heap;
mod device;
mod suballocator;

pub use command_list::{Command, CopyLocation, SoftwareCommandList};
pub use descriptor_heap::{Descriptor, SoftwareDescriptorHeap};
pub use device::{SoftwareDevice, SoftwareDeviceConfig, SoftwareHeap, SoftwareResource};
pub use suballocator::{SoftwareSuballocator, SuballocatorConfig};

use std::sync::{Mutex, MutexGuard, PoisonError};

//a panicking test thread shouldn't take the device down with it
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
