// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Resource intent and allocation mode declarations.
//!
//! This module provides the two enums a caller uses to describe a resource before it exists:
//!
//! - [`ResourceIntent`] - how the GPU and CPU will use the resource over its lifetime
//! - [`AllocationMode`] - how the memory behind this one allocation should be obtained
//!
//! The intent is the caller's only say in where memory goes.  It's mapped to a heap type,
//! resource flags and an initial state by [`map_intent`](crate::bindings::mapping::map_intent);
//! the caller never picks those directly.
//!
//! # Examples
//!
//! ```
//! use heapwise::bindings::intent::{AllocationMode, ResourceIntent};
//!
//! // A buffer compute shaders write into
//! let intent = ResourceIntent::ReadWrite;
//! // Placed in a shared heap, zeroed first
//! let mode = AllocationMode::Clear;
//! # let _ = (intent, mode);
//! ```

use std::fmt::Display;

/// Describes how a resource will be used for its entire lifetime.
///
/// Chosen once at creation.  Buffers may use every intent; textures may only be
/// [`ReadOnly`](ResourceIntent::ReadOnly) or [`ReadWrite`](ResourceIntent::ReadWrite).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResourceIntent {
    /// Small, frequently rewritten shader constants.
    ///
    /// Lives in CPU-writable memory and starts readable by every shader stage.
    Constant = 0,

    /// Data the GPU only reads once it has been filled by a copy.
    ReadOnly = 1,

    /// Data shaders both read and write through unordered access.
    ReadWrite = 2,

    /// A destination for GPU results the CPU will read.
    ReadBack = 3,

    /// A staging source the CPU fills and the GPU copies from.
    Upload = 4,
}

impl ResourceIntent {
    pub const ALL: [ResourceIntent; 5] = [
        ResourceIntent::Constant,
        ResourceIntent::ReadOnly,
        ResourceIntent::ReadWrite,
        ResourceIntent::ReadBack,
        ResourceIntent::Upload,
    ];

    /// Converts a raw value from across an API boundary.
    ///
    /// # Panics
    ///
    /// An unknown value is a caller bug and aborts the request immediately.
    pub fn from_raw(raw: u32) -> Self {
        match Self::try_from(raw) {
            Ok(intent) => intent,
            Err(e) => panic!("{e}"),
        }
    }

    /// Whether a texture may be created with this intent.
    pub const fn allowed_for_textures(self) -> bool {
        matches!(self, ResourceIntent::ReadOnly | ResourceIntent::ReadWrite)
    }
}

/// A raw intent value that names no [`ResourceIntent`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource intent {0}")]
pub struct UnknownIntent(pub u32);

impl TryFrom<u32> for ResourceIntent {
    type Error = UnknownIntent;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => ResourceIntent::Constant,
            1 => ResourceIntent::ReadOnly,
            2 => ResourceIntent::ReadWrite,
            3 => ResourceIntent::ReadBack,
            4 => ResourceIntent::Upload,
            other => return Err(UnknownIntent(other)),
        })
    }
}

impl Display for ResourceIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceIntent::Constant => "constant",
            ResourceIntent::ReadOnly => "read-only",
            ResourceIntent::ReadWrite => "read-write",
            ResourceIntent::ReadBack => "read-back",
            ResourceIntent::Upload => "upload",
        };
        f.write_str(s)
    }
}

/// Describes how memory for one allocation is obtained.
///
/// # Performance Considerations
///
/// - `Default`: fastest to allocate and cheapest in memory, but contents are whatever the
///   previous tenant of the range left behind.
/// - `Clear`: as `Default`, then zeroed.
/// - `Committed`: a heap of its own.  Slower to create, never fragments a shared block; best for
///   very large or short-lived resources.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum AllocationMode {
    /// Placed in a shared heap, contents undefined.
    #[default]
    Default,
    /// Isolated in a dedicated heap.
    Committed,
    /// Placed in a shared heap and zero-initialized.
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        for intent in ResourceIntent::ALL {
            assert_eq!(ResourceIntent::from_raw(intent as u32), intent);
        }
        assert_eq!(ResourceIntent::try_from(9), Err(UnknownIntent(9)));
    }

    #[test]
    #[should_panic(expected = "unknown resource intent 7")]
    fn unknown_raw_fails_fast() {
        ResourceIntent::from_raw(7);
    }

    #[test]
    fn texture_intents() {
        let allowed: Vec<_> = ResourceIntent::ALL
            .into_iter()
            .filter(|i| i.allowed_for_textures())
            .collect();
        assert_eq!(
            allowed,
            vec![ResourceIntent::ReadOnly, ResourceIntent::ReadWrite]
        );
    }
}
