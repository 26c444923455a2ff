//! roundnet Deterministic Simulation Testing (DST) Harness
//!
//! Drives a [`RoundEngine`](roundnet_core::RoundEngine) through scripted
//! lobby traffic with every source of non-determinism controlled:
//! - **Time**: arrivals are stamped from a virtual clock
//! - **Randomness**: position draws, arrival gaps and departures all derive
//!   from a single 64-bit seed
//!
//! Any failing run can be replayed from its seed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                       │
//! │  ┌────────────────┐        ┌─────────────────────────┐   │
//! │  │ ArrivalGenerator│──────►│ RoundEngine<SimContext> │   │
//! │  └────────────────┘ joins/ └────────────┬────────────┘   │
//! │                     leaves              │ RoundRecord    │
//! │                                ┌────────▼────────┐       │
//! │                                │   invariants    │       │
//! │                                └─────────────────┘       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use roundnet_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 6).run(ScenarioId::Backfill);
//! assert!(result.passed);
//! ```

pub mod arrivals;
pub mod context;
pub mod exporter;
pub mod invariants;
pub mod runner;
pub mod scenarios;

pub use arrivals::ArrivalGenerator;
pub use context::SimContext;
pub use exporter::RunExport;
pub use invariants::Violation;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
