//! Triage orchestration (C7): owns the per-alert state machine, its
//! configuration, and the fallback path, and exposes the health/metrics
//! surface the binary entry point serves alongside the NATS consumer
//! loop.

pub mod config;
pub mod fallback;
pub mod health;
pub mod pipeline;

pub use config::Config;
pub use fallback::fallback_result;
pub use health::{AppState, Metrics};
pub use pipeline::{Coordinator, Outcome};
