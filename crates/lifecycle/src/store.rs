//! Tenant module state store abstraction.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use modulith_core::{ModuleKey, TenantId};

use crate::state::TenantModuleState;

/// Persistence failure. Treated as fatal to the request; retry policy, if
/// any, belongs to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("state store backend failure: {0}")]
    Backend(String),
}

/// Flat keyed store: (tenant_id, module_key) -> state row.
///
/// Whole-row reads and writes are atomic; a read racing a write observes
/// either the old or the new row, never a torn one.
#[async_trait]
pub trait TenantModuleStore: Send + Sync {
    async fn get(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
    ) -> Result<Option<TenantModuleState>, StoreError>;

    async fn upsert(&self, state: TenantModuleState) -> Result<(), StoreError>;

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TenantModuleState>, StoreError>;
}

/// In-memory store for dev/test deployments.
#[derive(Debug, Default)]
pub struct InMemoryModuleStateStore {
    inner: RwLock<HashMap<(TenantId, ModuleKey), TenantModuleState>>,
}

impl InMemoryModuleStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantModuleStore for InMemoryModuleStateStore {
    async fn get(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
    ) -> Result<Option<TenantModuleState>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))?;
        Ok(map.get(&(tenant_id.clone(), module_key.clone())).cloned())
    }

    async fn upsert(&self, state: TenantModuleState) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))?;
        map.insert(
            (state.tenant_id.clone(), state.module_key.clone()),
            state,
        );
        Ok(())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<TenantModuleState>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))?;
        let mut rows: Vec<TenantModuleState> = map
            .iter()
            .filter_map(|((t, _), v)| (t == tenant_id).then(|| v.clone()))
            .collect();
        rows.sort_by(|a, b| a.module_key.cmp(&b.module_key));
        Ok(rows)
    }
}
