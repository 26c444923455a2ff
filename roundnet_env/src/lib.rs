//! roundnet Environment Abstraction Layer
//!
//! The round engine never reaches for a global clock or a global random
//! generator. Everything non-deterministic it needs is requested from an
//! [`ExperimentContext`]:
//! - Time (`system_time()`) for stamping arrivals
//! - Randomness (`pick_index()`) for drawing a free position
//!
//! Production code uses [`EntropyContext`]; the simulation harness plugs in a
//! seeded context so that any run can be replayed from its seed.
//!
//! # Example
//!
//! ```ignore
//! use roundnet_env::{EntropyContext, ExperimentContext};
//!
//! let ctx = EntropyContext::shared();
//! let slot = ctx.pick_index(6);
//! assert!(slot < 6);
//! ```

mod context;
mod entropy_impl;
mod types;

pub use context::ExperimentContext;
pub use entropy_impl::EntropyContext;
pub use types::ParticipantId;
