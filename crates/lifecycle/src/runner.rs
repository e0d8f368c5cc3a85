//! Collaborator traits invoked by the engine.
//!
//! Implementations live in the infra layer; the engine only cares about
//! success or failure and never partially applies its own state on failure.

use async_trait::async_trait;
use serde::Serialize;

use modulith_core::{ModuleKey, ModuleVersion, TenantId};

/// Applies schema changes for a module up to its packaged version.
///
/// Invoked by `upgrade` only, never by install/enable. May block for an
/// extended duration; callers treat upgrade as long-running and
/// non-cancelable. A failure may leave the collaborator's schema partially
/// migrated, but the engine's `installed_version` stays at the pre-upgrade
/// value.
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    async fn migrate_to_head(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
        from: Option<&ModuleVersion>,
        to: &ModuleVersion,
    ) -> anyhow::Result<()>;
}

/// Outcome of a seed routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub seeder: String,
    /// Records created by this run; zero when the routine had already been
    /// applied.
    pub created: u64,
}

/// Executes a named data-seeding routine for a module.
///
/// Routines must be idempotent: re-running a seed for the same tenant/module
/// must not duplicate data. This is a contract the engine assumes of the
/// collaborator, not something it enforces.
#[async_trait]
pub trait SeedRunner: Send + Sync {
    async fn run_seed(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
        seeder: &str,
    ) -> anyhow::Result<SeedReport>;
}
