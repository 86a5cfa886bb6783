// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Owned sinks, keyed by the streams wrapping them.
//!
//! A native object can't hold a Rust trait object directly without pinning its layout to ours,
//! so each stream holds a `u64` and the sink lives here until the stream's last release.

use crate::stream::abi::NameAllocator;
use crate::stream::sink::StreamSink;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

pub(crate) enum Sink {
    WriteOnly(Box<dyn Write + Send>),
    Bidirectional {
        inner: Box<dyn StreamSink>,
        name_allocator: Option<NameAllocator>,
    },
}

impl Sink {
    pub(crate) fn writer(&mut self) -> &mut dyn Write {
        match self {
            Sink::WriteOnly(w) => w.as_mut(),
            Sink::Bidirectional { inner, .. } => inner.as_mut(),
        }
    }
}

pub(crate) type SharedSink = Arc<Mutex<Sink>>;

static SINKS: LazyLock<Mutex<HashMap<u64, SharedSink>>> = LazyLock::new(Mutex::default);
static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

//a panic caught mid-call poisons the lock; the sink itself is still usable
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn insert(sink: Sink) -> u64 {
    let key = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
    lock(&SINKS).insert(key, Arc::new(Mutex::new(sink)));
    key
}

pub(crate) fn get(key: u64) -> Option<SharedSink> {
    lock(&SINKS).get(&key).cloned()
}

pub(crate) fn remove(key: u64) -> Option<SharedSink> {
    lock(&SINKS).remove(&key)
}

/// Runs `f` on the sink for `key`.  The registry itself is not locked while `f` runs.
pub(crate) fn with_sink<R>(key: u64, f: impl FnOnce(&mut Sink) -> R) -> Option<R> {
    let shared = get(key)?;
    let mut sink = lock(&shared);
    Some(f(&mut sink))
}

/// Number of sinks kept alive by streams.
pub fn live_sinks() -> usize {
    lock(&SINKS).len()
}
