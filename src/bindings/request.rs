// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Builder for allocation requests.

use crate::bindings::intent::{AllocationMode, ResourceIntent};
use crate::bindings::shape::ResourceShape;
use crate::imp::ClearValue;

/// Everything an allocator needs to materialize one resource.
///
/// Both allocators take the same request, so call sites don't change when the
/// placement strategy does.
///
/// ```
/// use heapwise::bindings::{AllocationMode, AllocationRequest, ResourceIntent, ResourceShape};
///
/// let request = AllocationRequest::new(ResourceIntent::ReadBack, ResourceShape::buffer(4096))
///     .with_mode(AllocationMode::Committed)
///     .with_debug_name("readback");
/// assert_eq!(request.mode(), AllocationMode::Committed);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest<'a> {
    intent: ResourceIntent,
    shape: ResourceShape,
    mode: AllocationMode,
    debug_name: &'a str,
    clear_value: Option<ClearValue>,
}

impl<'a> AllocationRequest<'a> {
    /// Create a request with the default allocation mode.
    pub fn new(intent: ResourceIntent, shape: ResourceShape) -> Self {
        Self {
            intent,
            shape,
            mode: AllocationMode::Default,
            debug_name: "",
            clear_value: None,
        }
    }

    pub fn with_mode(mut self, mode: AllocationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Name reported in logs and, on backends that support it, debug layers.
    pub fn with_debug_name(mut self, debug_name: &'a str) -> Self {
        self.debug_name = debug_name;
        self
    }

    /// Optimized clear value, for render-target textures.
    pub fn with_clear_value(mut self, clear_value: ClearValue) -> Self {
        self.clear_value = Some(clear_value);
        self
    }

    pub fn intent(&self) -> ResourceIntent {
        self.intent
    }

    pub fn shape(&self) -> &ResourceShape {
        &self.shape
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    pub fn debug_name(&self) -> &'a str {
        self.debug_name
    }

    pub fn clear_value(&self) -> Option<&ClearValue> {
        self.clear_value.as_ref()
    }
}
