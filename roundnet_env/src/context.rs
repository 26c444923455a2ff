//! Core environment context trait for round engines.

use std::time::SystemTime;

/// The central interface for Environment Interaction.
///
/// # Implementations
///
/// - **Production**: `EntropyContext` - wraps `SystemTime::now`, `thread_rng`
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Every source of non-determinism the engine touches goes through this
/// trait, so a seeded implementation makes a whole run reproducible.
pub trait ExperimentContext: Send + Sync + 'static {
    /// Returns the wall-clock time used to stamp new arrivals.
    ///
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;

    /// Draws an index uniformly from `0..len`.
    ///
    /// Every index must be equally likely. Callers never pass `len == 0`.
    fn pick_index(&self, len: usize) -> usize;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
