//! Request gate: (tenant, module) -> visible.

use std::sync::Arc;

use modulith_core::{ModuleKey, TenantId};

use crate::store::{StoreError, TenantModuleStore};

/// Read-only visibility lookup consulted by every business-module request.
///
/// A module is visible iff its tenant state has `enabled = true`; an absent
/// row means the tenant never touched the module and it is invisible. Reads
/// go straight to the store and never contend with lifecycle operation locks.
#[derive(Clone)]
pub struct ModuleGate {
    store: Arc<dyn TenantModuleStore>,
}

impl ModuleGate {
    pub fn new(store: Arc<dyn TenantModuleStore>) -> Self {
        Self { store }
    }

    pub async fn is_enabled(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
    ) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(tenant_id, module_key)
            .await?
            .map(|state| state.enabled)
            .unwrap_or(false))
    }
}
