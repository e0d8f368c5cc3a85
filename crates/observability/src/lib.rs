//! Process-wide observability wiring.

pub mod tracing;

pub use crate::tracing::init;
