// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines how callers describe resources, and how those descriptions map to heaps. */

pub mod intent;
pub mod mapping;
pub mod request;
pub mod shape;

pub use intent::{AllocationMode, ResourceIntent};
pub use mapping::{IntentMapping, map_intent, select_heap};
pub use request::AllocationRequest;
pub use shape::ResourceShape;
