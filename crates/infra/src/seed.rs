//! Seed runner adapter.
//!
//! Seed routines are idempotent data bootstraps scoped to a module. This
//! in-memory implementation tracks which (tenant, module, seeder) triples have
//! already been applied, so a re-run reports zero created records instead of
//! duplicating data. Registered routines carry the record count they would
//! create on first application.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;

use modulith_core::{ModuleKey, TenantId};
use modulith_lifecycle::{SeedReport, SeedRunner};

#[derive(Debug, Default)]
pub struct InMemorySeedRunner {
    routines: HashMap<(ModuleKey, String), u64>,
    applied: Mutex<HashSet<(TenantId, ModuleKey, String)>>,
}

impl InMemorySeedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine and the number of records its first run creates.
    pub fn with_routine(mut self, module: &str, seeder: &str, creates: u64) -> Self {
        self.routines
            .insert((ModuleKey::from(module), seeder.to_string()), creates);
        self
    }

    /// The demo routines shipped with the built-in catalog.
    pub fn demo() -> Self {
        Self::new()
            // RECV, STAGE, PACK, SHIP, QA_HOLD
            .with_routine("wms", "default_locations", 5)
            // minimal org hierarchy + uom + item class + item + two parties
            .with_routine("mdm", "demo_bootstrap", 9)
    }
}

#[async_trait]
impl SeedRunner for InMemorySeedRunner {
    async fn run_seed(
        &self,
        tenant_id: &TenantId,
        module_key: &ModuleKey,
        seeder: &str,
    ) -> anyhow::Result<SeedReport> {
        let Some(&creates) = self
            .routines
            .get(&(module_key.clone(), seeder.to_string()))
        else {
            bail!("no seed routine registered for {module_key}/{seeder}");
        };

        let mut applied = self
            .applied
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let freshly_applied = applied.insert((
            tenant_id.clone(),
            module_key.clone(),
            seeder.to_string(),
        ));

        Ok(SeedReport {
            seeder: seeder.to_string(),
            created: if freshly_applied { creates } else { 0 },
        })
    }
}
