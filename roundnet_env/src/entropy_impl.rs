//! Production implementation of ExperimentContext using OS time and entropy.

use crate::ExperimentContext;
use rand::Rng;
use std::sync::Arc;
use std::time::SystemTime;

/// Production context backed by the system clock and `thread_rng`.
///
/// This is the "real" implementation used when participants arrive from a
/// live transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropyContext;

impl EntropyContext {
    /// Creates a new EntropyContext.
    pub fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped context for sharing across engines.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ExperimentContext for EntropyContext {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
