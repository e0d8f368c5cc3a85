//! Postgres-backed tenant module state store.
//!
//! One row per (tenant_id, module_key); upserts replace the whole row inside
//! a single statement, so readers never observe a torn state. SQLx errors are
//! mapped to `StoreError::Backend`; pool exhaustion/closure to
//! `StoreError::Unavailable`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use modulith_core::{ModuleKey, ModuleVersion, TenantId};
use modulith_lifecycle::{StoreError, TenantModuleState, TenantModuleStore};

#[derive(Debug, Clone)]
pub struct PostgresModuleStateStore {
    pool: PgPool,
}

impl PostgresModuleStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenant_modules (
                tenant_id TEXT NOT NULL,
                module_key TEXT NOT NULL,
                installed BOOLEAN NOT NULL DEFAULT FALSE,
                installed_version TEXT,
                enabled BOOLEAN NOT NULL DEFAULT FALSE,
                installed_at TIMESTAMPTZ,
                upgraded_at TIMESTAMPTZ,
                enabled_at TIMESTAMPTZ,
                PRIMARY KEY (tenant_id, module_key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

fn row_to_state(row: sqlx::postgres::PgRow) -> Result<TenantModuleState, StoreError> {
    let tenant_id: String = row.try_get("tenant_id").map_err(map_sqlx_error)?;
    let module_key: String = row.try_get("module_key").map_err(map_sqlx_error)?;
    let installed: bool = row.try_get("installed").map_err(map_sqlx_error)?;
    let installed_version: Option<String> =
        row.try_get("installed_version").map_err(map_sqlx_error)?;
    let enabled: bool = row.try_get("enabled").map_err(map_sqlx_error)?;
    let installed_at: Option<DateTime<Utc>> =
        row.try_get("installed_at").map_err(map_sqlx_error)?;
    let upgraded_at: Option<DateTime<Utc>> =
        row.try_get("upgraded_at").map_err(map_sqlx_error)?;
    let enabled_at: Option<DateTime<Utc>> =
        row.try_get("enabled_at").map_err(map_sqlx_error)?;

    let installed_version = installed_version
        .map(|v| {
            ModuleVersion::parse(&v)
                .map_err(|e| StoreError::Backend(format!("corrupt installed_version: {e}")))
        })
        .transpose()?;

    Ok(TenantModuleState {
        tenant_id: TenantId::from(tenant_id),
        module_key: ModuleKey::from(module_key),
        installed,
        installed_version,
        enabled,
        installed_at,
        upgraded_at,
        enabled_at,
    })
}

#[async_trait]
impl TenantModuleStore for PostgresModuleStateStore {
    #[instrument(skip(self), fields(tenant = %tenant_id, module = %module_key))]
    async fn get(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
    ) -> Result<Option<TenantModuleState>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, module_key, installed, installed_version,
                   enabled, installed_at, upgraded_at, enabled_at
            FROM tenant_modules
            WHERE tenant_id = $1 AND module_key = $2
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(module_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(row_to_state).transpose()
    }

    #[instrument(skip(self, state), fields(tenant = %state.tenant_id, module = %state.module_key))]
    async fn upsert(&self, state: TenantModuleState) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tenant_modules (
                tenant_id, module_key, installed, installed_version,
                enabled, installed_at, upgraded_at, enabled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (tenant_id, module_key) DO UPDATE SET
                installed = EXCLUDED.installed,
                installed_version = EXCLUDED.installed_version,
                enabled = EXCLUDED.enabled,
                installed_at = EXCLUDED.installed_at,
                upgraded_at = EXCLUDED.upgraded_at,
                enabled_at = EXCLUDED.enabled_at
            "#,
        )
        .bind(state.tenant_id.as_str())
        .bind(state.module_key.as_str())
        .bind(state.installed)
        .bind(state.installed_version.as_ref().map(|v| v.as_str().to_string()))
        .bind(state.enabled)
        .bind(state.installed_at)
        .bind(state.upgraded_at)
        .bind(state.enabled_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self), fields(tenant = %tenant_id))]
    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TenantModuleState>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, module_key, installed, installed_version,
                   enabled, installed_at, upgraded_at, enabled_at
            FROM tenant_modules
            WHERE tenant_id = $1
            ORDER BY module_key ASC
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(row_to_state).collect()
    }
}
