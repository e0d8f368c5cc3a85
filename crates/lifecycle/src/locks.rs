//! Per-(tenant, module) operation serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

use modulith_core::{ModuleKey, TenantId};

/// Mutual-exclusion scope for mutating lifecycle operations.
///
/// Tenants are fully independent; locks are keyed per (tenant, module) so no
/// cross-tenant coordination ever happens. Gate reads never touch these.
#[derive(Debug, Default)]
pub(crate) struct OperationLocks {
    inner: StdMutex<HashMap<(TenantId, ModuleKey), Arc<Mutex<()>>>>,
}

impl OperationLocks {
    pub(crate) async fn acquire(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
    ) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry((tenant_id.clone(), module_key.clone()))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
