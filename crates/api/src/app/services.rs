//! Infrastructure wiring for the API process.

use std::sync::Arc;

use modulith_catalog::ManifestCatalog;
use modulith_infra::{InMemorySeedRunner, LoggingMigrationRunner};
use modulith_lifecycle::{
    InMemoryModuleStateStore, LifecycleEngine, ModuleGate, TenantModuleStore,
};

/// Shared services handed to every handler via `Extension`.
pub struct AppServices {
    pub engine: Arc<LifecycleEngine>,
    pub gate: ModuleGate,
}

fn build_in_memory_services(catalog: Arc<ManifestCatalog>) -> AppServices {
    // In-memory wiring (dev/test): state store + stand-in collaborators.
    let store: Arc<dyn TenantModuleStore> = Arc::new(InMemoryModuleStateStore::new());
    build_with_store(catalog, store)
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(catalog: Arc<ManifestCatalog>) -> AppServices {
    use modulith_infra::PostgresModuleStateStore;

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    let store = PostgresModuleStateStore::new(pool);
    store
        .ensure_schema()
        .await
        .expect("Failed to ensure tenant_modules schema");

    let store: Arc<dyn TenantModuleStore> = Arc::new(store);
    build_with_store(catalog, store)
}

fn build_with_store(
    catalog: Arc<ManifestCatalog>,
    store: Arc<dyn TenantModuleStore>,
) -> AppServices {
    let migrations = Arc::new(LoggingMigrationRunner::new());
    let seeds = Arc::new(InMemorySeedRunner::demo());

    let engine = Arc::new(LifecycleEngine::new(
        catalog,
        store.clone(),
        migrations,
        seeds,
    ));
    let gate = ModuleGate::new(store);

    AppServices { engine, gate }
}

pub async fn build_services(catalog: Arc<ManifestCatalog>) -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services(catalog).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
        }
    }

    build_in_memory_services(catalog)
}
