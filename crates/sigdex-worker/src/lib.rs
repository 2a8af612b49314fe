//! Worker internals: the ingestion cycle orchestrator and the health
//! surface. The binary in `main.rs` wires these to the scheduler loop.

pub mod health;
pub mod orchestrator;

pub use health::{Health, HealthSnapshot};
pub use orchestrator::{CollectorFactory, CycleSummary, Orchestrator};
