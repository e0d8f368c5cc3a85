//! Lifecycle operations: install / enable / disable / upgrade / seed / list.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use modulith_catalog::{ManifestCatalog, ModuleManifest};
use modulith_core::{ModuleKey, TenantId};

use crate::error::{LifecycleError, LifecycleResult};
use crate::locks::OperationLocks;
use crate::runner::{MigrationRunner, SeedReport, SeedRunner};
use crate::state::{ModuleStatus, TenantModuleState};
use crate::store::TenantModuleStore;

/// The lifecycle engine.
///
/// All operations are scoped to a single (tenant, module) pair. Mutating
/// operations are serialized through a per-(tenant, module) lock so that
/// concurrent calls converge on the same final state; all validation happens
/// before the single store write, so no operation is ever partially applied.
pub struct LifecycleEngine {
    catalog: Arc<ManifestCatalog>,
    store: Arc<dyn TenantModuleStore>,
    migrations: Arc<dyn MigrationRunner>,
    seeds: Arc<dyn SeedRunner>,
    locks: OperationLocks,
}

impl LifecycleEngine {
    pub fn new(
        catalog: Arc<ManifestCatalog>,
        store: Arc<dyn TenantModuleStore>,
        migrations: Arc<dyn MigrationRunner>,
        seeds: Arc<dyn SeedRunner>,
    ) -> Self {
        Self {
            catalog,
            store,
            migrations,
            seeds,
            locks: OperationLocks::default(),
        }
    }

    pub fn catalog(&self) -> &ManifestCatalog {
        &self.catalog
    }

    fn manifest(&self, key: &ModuleKey) -> LifecycleResult<&ModuleManifest> {
        self.catalog
            .get(key)
            .ok_or_else(|| LifecycleError::UnknownModule(key.clone()))
    }

    async fn state_or_untouched(
        &self,
        tenant_id: &TenantId,
        key: &ModuleKey,
    ) -> LifecycleResult<TenantModuleState> {
        Ok(self
            .store
            .get(tenant_id, key)
            .await?
            .unwrap_or_else(|| TenantModuleState::untouched(tenant_id.clone(), key.clone())))
    }

    /// Mark a module installed for a tenant at the manifest's packaged
    /// version. Does not touch `enabled` and does not run migrations.
    pub async fn install(
        &self,
        tenant_id: &TenantId,
        key: &ModuleKey,
    ) -> LifecycleResult<ModuleStatus> {
        let manifest = self.manifest(key)?;
        if !manifest.installable {
            return Err(LifecycleError::NotInstallable(key.clone()));
        }

        let _guard = self.locks.acquire(tenant_id, key).await;
        let mut state = self.state_or_untouched(tenant_id, key).await?;
        if state.installed {
            return Ok(ModuleStatus::merge(manifest, &state));
        }

        let mut missing = Vec::new();
        for dep in &manifest.dependencies {
            let dep_state = self.store.get(tenant_id, dep).await?;
            if !dep_state.map(|s| s.installed).unwrap_or(false) {
                missing.push(dep.clone());
            }
        }
        if !missing.is_empty() {
            return Err(LifecycleError::DependencyNotInstalled {
                module: key.clone(),
                missing,
            });
        }

        state.installed = true;
        state.installed_version = Some(manifest.version.clone());
        state.installed_at = Some(Utc::now());
        self.store.upsert(state.clone()).await?;

        tracing::info!(
            tenant = %tenant_id,
            module = %key,
            version = %manifest.version,
            "module installed"
        );
        Ok(ModuleStatus::merge(manifest, &state))
    }

    /// Enable an installed module. Every direct dependency must already be
    /// enabled; the recursive invariant makes the transitive closure hold.
    pub async fn enable(
        &self,
        tenant_id: &TenantId,
        key: &ModuleKey,
    ) -> LifecycleResult<ModuleStatus> {
        let manifest = self.manifest(key)?;

        let _guard = self.locks.acquire(tenant_id, key).await;
        let mut state = self.state_or_untouched(tenant_id, key).await?;
        if !state.installed {
            return Err(LifecycleError::NotInstalled(key.clone()));
        }
        if state.enabled {
            return Ok(ModuleStatus::merge(manifest, &state));
        }

        let mut missing = Vec::new();
        for dep in &manifest.dependencies {
            let dep_state = self.store.get(tenant_id, dep).await?;
            if !dep_state.map(|s| s.enabled).unwrap_or(false) {
                missing.push(dep.clone());
            }
        }
        if !missing.is_empty() {
            return Err(LifecycleError::DependencyNotEnabled {
                module: key.clone(),
                missing,
            });
        }

        state.enabled = true;
        state.enabled_at = Some(Utc::now());
        self.store.upsert(state.clone()).await?;

        tracing::info!(tenant = %tenant_id, module = %key, "module enabled");
        Ok(ModuleStatus::merge(manifest, &state))
    }

    /// Disable a module. Permissive policy: dependents stay enabled and the
    /// gate keeps serving them; the dangling edge is logged for operators.
    pub async fn disable(
        &self,
        tenant_id: &TenantId,
        key: &ModuleKey,
    ) -> LifecycleResult<ModuleStatus> {
        let manifest = self.manifest(key)?;

        let _guard = self.locks.acquire(tenant_id, key).await;
        let mut state = self.state_or_untouched(tenant_id, key).await?;
        if !state.enabled {
            return Ok(ModuleStatus::merge(manifest, &state));
        }

        state.enabled = false;
        state.enabled_at = Some(Utc::now());
        self.store.upsert(state.clone()).await?;

        let mut enabled_dependents = Vec::new();
        for dependent in self.catalog.dependents_of(key) {
            if let Some(dep_state) = self.store.get(tenant_id, &dependent.key).await? {
                if dep_state.enabled {
                    enabled_dependents.push(dependent.key.clone());
                }
            }
        }
        if !enabled_dependents.is_empty() {
            tracing::warn!(
                tenant = %tenant_id,
                module = %key,
                dependents = ?enabled_dependents.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
                "module disabled while dependents remain enabled"
            );
        }

        tracing::info!(tenant = %tenant_id, module = %key, "module disabled");
        Ok(ModuleStatus::merge(manifest, &state))
    }

    /// Bring the tenant's installed version up to the manifest's packaged
    /// version. Migration success gates the version bump; on failure the
    /// engine's state is untouched.
    pub async fn upgrade(
        &self,
        tenant_id: &TenantId,
        key: &ModuleKey,
    ) -> LifecycleResult<ModuleStatus> {
        let manifest = self.manifest(key)?;

        let _guard = self.locks.acquire(tenant_id, key).await;
        let mut state = self.state_or_untouched(tenant_id, key).await?;
        if !state.installed {
            return Err(LifecycleError::NotInstalled(key.clone()));
        }
        if state.installed_version.as_ref() == Some(&manifest.version) {
            return Ok(ModuleStatus::merge(manifest, &state));
        }

        self.migrations
            .migrate_to_head(
                tenant_id,
                key,
                state.installed_version.as_ref(),
                &manifest.version,
            )
            .await
            .map_err(|e| {
                tracing::warn!(tenant = %tenant_id, module = %key, error = %format!("{e:#}"), "migration failed");
                LifecycleError::MigrationFailed {
                    module: key.clone(),
                    message: format!("{e:#}"),
                }
            })?;

        state.installed_version = Some(manifest.version.clone());
        state.upgraded_at = Some(Utc::now());
        self.store.upsert(state.clone()).await?;

        tracing::info!(
            tenant = %tenant_id,
            module = %key,
            version = %manifest.version,
            "module upgraded"
        );
        Ok(ModuleStatus::merge(manifest, &state))
    }

    /// Run a declared seed routine for an installed and enabled module.
    /// Seed outcome is never recorded in tenant module state.
    pub async fn seed(
        &self,
        tenant_id: &TenantId,
        key: &ModuleKey,
        seeder: &str,
    ) -> LifecycleResult<SeedReport> {
        let manifest = self.manifest(key)?;
        if !manifest.has_seeder(seeder) {
            return Err(LifecycleError::UnknownSeeder {
                module: key.clone(),
                seeder: seeder.to_string(),
            });
        }

        let state = self.state_or_untouched(tenant_id, key).await?;
        if !(state.installed && state.enabled) {
            return Err(LifecycleError::NotEnabled(key.clone()));
        }

        let report = self
            .seeds
            .run_seed(tenant_id, key, seeder)
            .await
            .map_err(|e| LifecycleError::SeedFailed {
                module: key.clone(),
                seeder: seeder.to_string(),
                message: format!("{e:#}"),
            })?;

        tracing::info!(
            tenant = %tenant_id,
            module = %key,
            seeder = %seeder,
            created = report.created,
            "seed routine completed"
        );
        Ok(report)
    }

    /// Merged manifest + tenant state view for every cataloged module.
    /// Modules the tenant never touched report not installed, not enabled.
    pub async fn list(&self, tenant_id: &TenantId) -> LifecycleResult<Vec<ModuleStatus>> {
        let rows = self.store.list_for_tenant(tenant_id).await?;
        let mut by_key: HashMap<ModuleKey, TenantModuleState> = rows
            .into_iter()
            .map(|row| (row.module_key.clone(), row))
            .collect();

        Ok(self
            .catalog
            .iter()
            .map(|manifest| {
                let state = by_key.remove(&manifest.key).unwrap_or_else(|| {
                    TenantModuleState::untouched(tenant_id.clone(), manifest.key.clone())
                });
                ModuleStatus::merge(manifest, &state)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryModuleStateStore;
    use anyhow::bail;
    use async_trait::async_trait;
    use modulith_core::ModuleVersion;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Default)]
    struct RecordingMigrationRunner {
        calls: StdMutex<Vec<(TenantId, ModuleKey, Option<ModuleVersion>, ModuleVersion)>>,
        fail_with: Option<String>,
    }

    impl RecordingMigrationRunner {
        fn failing(message: &str) -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MigrationRunner for RecordingMigrationRunner {
        async fn migrate_to_head(
            &self,
            tenant_id: &TenantId,
            module_key: &ModuleKey,
            from: Option<&ModuleVersion>,
            to: &ModuleVersion,
        ) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push((
                tenant_id.clone(),
                module_key.clone(),
                from.cloned(),
                to.clone(),
            ));
            if let Some(msg) = &self.fail_with {
                bail!("{msg}");
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct RecordingSeedRunner {
        calls: StdMutex<Vec<(TenantId, ModuleKey, String)>>,
        fail: bool,
    }

    impl RecordingSeedRunner {
        fn failing() -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SeedRunner for RecordingSeedRunner {
        async fn run_seed(
            &self,
            tenant_id: &TenantId,
            module_key: &ModuleKey,
            seeder: &str,
        ) -> anyhow::Result<SeedReport> {
            self.calls.lock().unwrap().push((
                tenant_id.clone(),
                module_key.clone(),
                seeder.to_string(),
            ));
            if self.fail {
                bail!("seed backend exploded");
            }
            Ok(SeedReport {
                seeder: seeder.to_string(),
                created: 5,
            })
        }
    }

    fn manifest(
        key: &str,
        version: &str,
        deps: &[&str],
        seeders: &[&str],
        installable: bool,
    ) -> modulith_catalog::ModuleManifest {
        modulith_catalog::ModuleManifest {
            key: ModuleKey::from(key),
            name: key.to_uppercase(),
            version: ModuleVersion::parse(version).unwrap(),
            description: String::new(),
            dependencies: deps.iter().map(|d| ModuleKey::from(*d)).collect(),
            seeders: seeders.iter().map(|s| s.to_string()).collect(),
            installable,
        }
    }

    fn test_catalog() -> ManifestCatalog {
        ManifestCatalog::new(vec![
            manifest("inventory", "1.4.0", &[], &[], true),
            manifest("wms", "0.9.0", &["inventory"], &["default_locations"], true),
            manifest("mes", "0.8.0", &["inventory"], &[], true),
            manifest("ecommerce", "0.2.0", &[], &[], false),
        ])
        .unwrap()
    }

    /// Same module set with inventory bumped, as after a new deployment.
    fn test_catalog_v2() -> ManifestCatalog {
        ManifestCatalog::new(vec![
            manifest("inventory", "2.0.0", &[], &[], true),
            manifest("wms", "0.9.0", &["inventory"], &["default_locations"], true),
            manifest("mes", "0.8.0", &["inventory"], &[], true),
            manifest("ecommerce", "0.2.0", &[], &[], false),
        ])
        .unwrap()
    }

    struct Harness {
        engine: LifecycleEngine,
        store: Arc<InMemoryModuleStateStore>,
        migrations: Arc<RecordingMigrationRunner>,
        seeds: Arc<RecordingSeedRunner>,
    }

    fn harness() -> Harness {
        harness_with(test_catalog(), RecordingMigrationRunner::default(), RecordingSeedRunner::default())
    }

    fn harness_with(
        catalog: ManifestCatalog,
        migrations: RecordingMigrationRunner,
        seeds: RecordingSeedRunner,
    ) -> Harness {
        let store = Arc::new(InMemoryModuleStateStore::new());
        let migrations = Arc::new(migrations);
        let seeds = Arc::new(seeds);
        let engine = LifecycleEngine::new(
            Arc::new(catalog),
            store.clone(),
            migrations.clone(),
            seeds.clone(),
        );
        Harness {
            engine,
            store,
            migrations,
            seeds,
        }
    }

    fn tenant() -> TenantId {
        TenantId::from("acme")
    }

    fn key(s: &str) -> ModuleKey {
        ModuleKey::from(s)
    }

    #[tokio::test]
    async fn install_unknown_module_fails() {
        let h = harness();
        let err = h.engine.install(&tenant(), &key("nope")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownModule(k) if k.as_str() == "nope"));
    }

    #[tokio::test]
    async fn install_not_installable_fails() {
        let h = harness();
        let err = h
            .engine
            .install(&tenant(), &key("ecommerce"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotInstallable(_)));
    }

    #[tokio::test]
    async fn install_before_dependency_lists_missing_keys() {
        let h = harness();
        let err = h.engine.install(&tenant(), &key("wms")).await.unwrap_err();
        match err {
            LifecycleError::DependencyNotInstalled { module, missing } => {
                assert_eq!(module.as_str(), "wms");
                assert_eq!(missing, vec![key("inventory")]);
            }
            other => panic!("expected DependencyNotInstalled, got {other:?}"),
        }

        // Nothing was written.
        assert!(h.store.get(&tenant(), &key("wms")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn install_sets_version_but_not_enabled() {
        let h = harness();
        let status = h.engine.install(&tenant(), &key("inventory")).await.unwrap();

        assert!(status.installed);
        assert!(!status.enabled);
        assert_eq!(
            status.installed_version,
            Some(ModuleVersion::parse("1.4.0").unwrap())
        );
        assert!(status.installed_at.is_some());
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        let h = harness();
        let first = h.engine.install(&tenant(), &key("inventory")).await.unwrap();
        let second = h.engine.install(&tenant(), &key("inventory")).await.unwrap();

        assert_eq!(first.installed_at, second.installed_at, "state unchanged");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn enable_requires_install_first() {
        let h = harness();
        let err = h
            .engine
            .enable(&tenant(), &key("inventory"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotInstalled(_)));
    }

    #[tokio::test]
    async fn enable_before_dependency_enabled_lists_missing_keys() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.install(&t, &key("wms")).await.unwrap();

        let err = h.engine.enable(&t, &key("wms")).await.unwrap_err();
        match err {
            LifecycleError::DependencyNotEnabled { module, missing } => {
                assert_eq!(module.as_str(), "wms");
                assert_eq!(missing, vec![key("inventory")]);
            }
            other => panic!("expected DependencyNotEnabled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_install_enable_sequence_succeeds() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();
        h.engine.install(&t, &key("wms")).await.unwrap();
        let status = h.engine.enable(&t, &key("wms")).await.unwrap();

        assert!(status.installed && status.enabled);
    }

    #[tokio::test]
    async fn enable_and_disable_are_idempotent() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();

        let once = h.engine.enable(&t, &key("inventory")).await.unwrap();
        let twice = h.engine.enable(&t, &key("inventory")).await.unwrap();
        assert_eq!(once, twice);

        let off = h.engine.disable(&t, &key("inventory")).await.unwrap();
        assert!(!off.enabled);
        let off_again = h.engine.disable(&t, &key("inventory")).await.unwrap();
        assert_eq!(off, off_again);
    }

    #[tokio::test]
    async fn disable_never_installed_is_noop() {
        let h = harness();
        let status = h.engine.disable(&tenant(), &key("inventory")).await.unwrap();
        assert!(!status.installed && !status.enabled);
    }

    #[tokio::test]
    async fn disable_with_enabled_dependents_succeeds_without_cascade() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();
        h.engine.install(&t, &key("wms")).await.unwrap();
        h.engine.enable(&t, &key("wms")).await.unwrap();

        let status = h.engine.disable(&t, &key("inventory")).await.unwrap();
        assert!(!status.enabled);

        // wms keeps its own enabled flag; the gate only consults that.
        let wms = h.store.get(&t, &key("wms")).await.unwrap().unwrap();
        assert!(wms.enabled);
    }

    #[tokio::test]
    async fn upgrade_requires_install() {
        let h = harness();
        let err = h
            .engine
            .upgrade(&tenant(), &key("inventory"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotInstalled(_)));
    }

    #[tokio::test]
    async fn upgrade_at_head_is_noop_and_skips_migrations() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();

        let status = h.engine.upgrade(&t, &key("inventory")).await.unwrap();
        assert_eq!(
            status.installed_version,
            Some(ModuleVersion::parse("1.4.0").unwrap())
        );
        assert_eq!(h.migrations.call_count(), 0, "migration runner not invoked");
    }

    #[tokio::test]
    async fn upgrade_bumps_version_after_successful_migration() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();

        // New deployment ships inventory 2.0.0; same store.
        let migrations = Arc::new(RecordingMigrationRunner::default());
        let engine = LifecycleEngine::new(
            Arc::new(test_catalog_v2()),
            h.store.clone(),
            migrations.clone(),
            Arc::new(RecordingSeedRunner::default()),
        );

        let status = engine.upgrade(&t, &key("inventory")).await.unwrap();
        assert_eq!(
            status.installed_version,
            Some(ModuleVersion::parse("2.0.0").unwrap())
        );
        assert!(status.enabled, "enabled state preserved across upgrade");
        assert!(status.upgraded_at.is_some());

        let calls = migrations.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (_, module, from, to) = &calls[0];
        assert_eq!(module.as_str(), "inventory");
        assert_eq!(from.as_ref().unwrap().as_str(), "1.4.0");
        assert_eq!(to.as_str(), "2.0.0");
    }

    #[tokio::test]
    async fn failed_migration_leaves_version_unchanged() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();

        let engine = LifecycleEngine::new(
            Arc::new(test_catalog_v2()),
            h.store.clone(),
            Arc::new(RecordingMigrationRunner::failing("alembic upgrade failed")),
            Arc::new(RecordingSeedRunner::default()),
        );

        let err = engine.upgrade(&t, &key("inventory")).await.unwrap_err();
        match err {
            LifecycleError::MigrationFailed { module, message } => {
                assert_eq!(module.as_str(), "inventory");
                assert!(message.contains("alembic upgrade failed"));
            }
            other => panic!("expected MigrationFailed, got {other:?}"),
        }

        let row = h.store.get(&t, &key("inventory")).await.unwrap().unwrap();
        assert_eq!(row.installed_version.unwrap().as_str(), "1.4.0");
        assert!(row.upgraded_at.is_none());
    }

    #[tokio::test]
    async fn seed_unknown_seeder_fails() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();

        let err = h
            .engine
            .seed(&t, &key("inventory"), "default_locations")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownSeeder { .. }));

        let err = h.engine.seed(&t, &key("nope"), "x").await.unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownModule(_)));
    }

    #[tokio::test]
    async fn seed_requires_enabled_module() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();
        h.engine.install(&t, &key("wms")).await.unwrap();

        let err = h
            .engine
            .seed(&t, &key("wms"), "default_locations")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotEnabled(k) if k.as_str() == "wms"));
        assert!(h.seeds.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_delegates_to_runner() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();
        h.engine.install(&t, &key("wms")).await.unwrap();
        h.engine.enable(&t, &key("wms")).await.unwrap();

        let report = h
            .engine
            .seed(&t, &key("wms"), "default_locations")
            .await
            .unwrap();
        assert_eq!(report.created, 5);

        let calls = h.seeds.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "default_locations");
    }

    #[tokio::test]
    async fn seed_runner_failure_maps_to_seed_failed() {
        let h = harness_with(
            test_catalog(),
            RecordingMigrationRunner::default(),
            RecordingSeedRunner::failing(),
        );
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();
        h.engine.enable(&t, &key("inventory")).await.unwrap();
        h.engine.install(&t, &key("wms")).await.unwrap();
        h.engine.enable(&t, &key("wms")).await.unwrap();

        let err = h
            .engine
            .seed(&t, &key("wms"), "default_locations")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::SeedFailed { .. }));

        // Seed failure never mutates tenant module state.
        let row = h.store.get(&t, &key("wms")).await.unwrap().unwrap();
        assert!(row.installed && row.enabled);
    }

    #[tokio::test]
    async fn list_reports_untouched_modules_as_absent() {
        let h = harness();
        let t = tenant();
        h.engine.install(&t, &key("inventory")).await.unwrap();

        let statuses = h.engine.list(&t).await.unwrap();
        assert_eq!(statuses.len(), 4);

        let inventory = statuses
            .iter()
            .find(|s| s.module_key.as_str() == "inventory")
            .unwrap();
        assert!(inventory.installed);

        let mes = statuses
            .iter()
            .find(|s| s.module_key.as_str() == "mes")
            .unwrap();
        assert!(!mes.installed && !mes.enabled);
        assert!(mes.installed_version.is_none());
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let h = harness();
        let a = TenantId::from("acme");
        let b = TenantId::from("globex");

        h.engine.install(&a, &key("inventory")).await.unwrap();
        h.engine.enable(&a, &key("inventory")).await.unwrap();

        let b_view = h.engine.list(&b).await.unwrap();
        assert!(b_view.iter().all(|s| !s.installed && !s.enabled));

        // b still has to install its own dependency chain.
        let err = h.engine.install(&b, &key("wms")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::DependencyNotInstalled { .. }));
    }

    #[tokio::test]
    async fn concurrent_installs_converge() {
        let h = harness_with(
            test_catalog(),
            RecordingMigrationRunner::default(),
            RecordingSeedRunner::default(),
        );
        let engine = Arc::new(h.engine);
        let t = tenant();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let t = t.clone();
            handles.push(tokio::spawn(async move {
                engine.install(&t, &ModuleKey::from("inventory")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let row = h.store.get(&t, &key("inventory")).await.unwrap().unwrap();
        assert!(row.installed);
        assert_eq!(row.installed_version.unwrap().as_str(), "1.4.0");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        const MODULES: [&str; 3] = ["inventory", "wms", "mes"];

        async fn assert_invariants(
            store: &InMemoryModuleStateStore,
            catalog: &ManifestCatalog,
            tenant: &TenantId,
            max_seen: &mut HashMap<ModuleKey, ModuleVersion>,
        ) {
            let rows = store.list_for_tenant(tenant).await.unwrap();
            let by_key: HashMap<ModuleKey, TenantModuleState> = rows
                .into_iter()
                .map(|r| (r.module_key.clone(), r))
                .collect();

            for (k, row) in &by_key {
                let manifest = catalog.get(k).unwrap();

                // enabled implies installed
                assert!(!row.enabled || row.installed);
                // installed_version set iff installed, bounded by packaged version
                assert_eq!(row.installed_version.is_some(), row.installed);
                if let Some(v) = &row.installed_version {
                    assert!(v <= &manifest.version);

                    // version non-regression across the whole run
                    if let Some(prev) = max_seen.get(k) {
                        assert!(v >= prev, "installed_version regressed for {k}");
                    }
                    max_seen.insert(k.clone(), v.clone());
                }

                for dep in &manifest.dependencies {
                    let dep_row = by_key.get(dep);
                    if row.installed {
                        assert!(
                            dep_row.map(|d| d.installed).unwrap_or(false),
                            "installed module {k} has uninstalled dependency {dep}"
                        );
                    }
                    if row.enabled {
                        assert!(
                            dep_row.map(|d| d.enabled).unwrap_or(false),
                            "enabled module {k} has disabled dependency {dep}"
                        );
                    }
                }
            }
        }

        async fn run_ops(
            engine: &LifecycleEngine,
            store: &InMemoryModuleStateStore,
            catalog: &ManifestCatalog,
            tenant: &TenantId,
            ops: &[(usize, usize)],
            max_seen: &mut HashMap<ModuleKey, ModuleVersion>,
        ) {
            for &(op, module) in ops {
                let k = ModuleKey::from(MODULES[module % MODULES.len()]);
                let result = match op % 4 {
                    0 => engine.install(tenant, &k).await.map(|_| ()),
                    1 => engine.enable(tenant, &k).await.map(|_| ()),
                    2 => engine.disable(tenant, &k).await.map(|_| ()),
                    _ => engine.upgrade(tenant, &k).await.map(|_| ()),
                };
                // Failures are fine; invariants must hold either way.
                let _ = result;
                assert_invariants(store, catalog, tenant, max_seen).await;
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Any sequence of lifecycle operations, including a catalog
            /// version bump halfway through, preserves the state invariants
            /// and never regresses an installed version.
            #[test]
            fn random_operation_sequences_preserve_invariants(
                first in prop::collection::vec((0..4usize, 0..3usize), 0..30),
                second in prop::collection::vec((0..4usize, 0..3usize), 0..30),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let store = Arc::new(InMemoryModuleStateStore::new());
                    let tenant = TenantId::from("prop");
                    let mut max_seen = HashMap::new();

                    let catalog_v1 = test_catalog();
                    let engine_v1 = LifecycleEngine::new(
                        Arc::new(catalog_v1.clone()),
                        store.clone(),
                        Arc::new(RecordingMigrationRunner::default()),
                        Arc::new(RecordingSeedRunner::default()),
                    );
                    run_ops(&engine_v1, &store, &catalog_v1, &tenant, &first, &mut max_seen).await;

                    // Redeploy with a bumped inventory package; same store.
                    let catalog_v2 = test_catalog_v2();
                    let engine_v2 = LifecycleEngine::new(
                        Arc::new(catalog_v2.clone()),
                        store.clone(),
                        Arc::new(RecordingMigrationRunner::default()),
                        Arc::new(RecordingSeedRunner::default()),
                    );
                    run_ops(&engine_v2, &store, &catalog_v2, &tenant, &second, &mut max_seen).await;
                });
            }
        }
    }
}
