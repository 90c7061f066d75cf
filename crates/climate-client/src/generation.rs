//! Monotonic request generations; results from superseded loads are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counter. Clones observe the same generation.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load and return its generation.
    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Whether a result stamped with `generation` is still wanted.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}
