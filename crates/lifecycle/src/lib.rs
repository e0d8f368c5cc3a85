//! Module lifecycle engine.
//!
//! Tracks, per tenant, which modules are installed, at what version, and
//! whether they are enabled; enforces dependency ordering across
//! install/enable operations; drives schema upgrades through the migration
//! collaborator; and backs the request gate that makes disabled modules
//! invisible.
//!
//! Invariants maintained after every successful operation:
//! - `enabled` implies `installed`
//! - every direct dependency of an enabled module is enabled
//! - every direct dependency of an installed module is installed
//! - `installed_version` is set iff installed, and never exceeds the
//!   manifest's packaged version (nor decreases over time)

pub mod engine;
pub mod error;
pub mod gate;
mod locks;
pub mod runner;
pub mod state;
pub mod store;

pub use engine::LifecycleEngine;
pub use error::{LifecycleError, LifecycleResult};
pub use gate::ModuleGate;
pub use runner::{MigrationRunner, SeedReport, SeedRunner};
pub use state::{ModuleStatus, TenantModuleState};
pub use store::{InMemoryModuleStateStore, StoreError, TenantModuleStore};
