//! Migration runner adapter.
//!
//! The real schema mechanics ("run migrations to head") live with each
//! module's deployment tooling; the engine only needs a collaborator that
//! reports success or failure. This adapter is the dev/standalone stand-in:
//! it records the request in the log and succeeds.

use async_trait::async_trait;

use modulith_core::{ModuleKey, ModuleVersion, TenantId};
use modulith_lifecycle::MigrationRunner;

#[derive(Debug, Default, Clone)]
pub struct LoggingMigrationRunner;

impl LoggingMigrationRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MigrationRunner for LoggingMigrationRunner {
    async fn migrate_to_head(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
        from: Option<&ModuleVersion>,
        to: &ModuleVersion,
    ) -> anyhow::Result<()> {
        tracing::info!(
            tenant = %tenant_id,
            module = %module_key,
            from = from.map(|v| v.as_str().to_string()).unwrap_or_else(|| "none".to_string()),
            to = %to,
            "applying schema migrations to head"
        );
        Ok(())
    }
}
