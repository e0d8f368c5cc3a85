//! Lifecycle error taxonomy.

use thiserror::Error;

use modulith_core::ModuleKey;

use crate::store::StoreError;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

fn join_keys(keys: &[ModuleKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deterministic lifecycle failures plus wrapped collaborator/store errors.
///
/// All validation happens before any store mutation; no variant here implies
/// a partially applied operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("unknown module '{0}'")]
    UnknownModule(ModuleKey),

    #[error("module '{0}' is not installable in this build")]
    NotInstallable(ModuleKey),

    #[error("module '{module}' is missing installed dependencies: {}", join_keys(.missing))]
    DependencyNotInstalled {
        module: ModuleKey,
        missing: Vec<ModuleKey>,
    },

    #[error("dependencies of module '{module}' must be enabled first: {}", join_keys(.missing))]
    DependencyNotEnabled {
        module: ModuleKey,
        missing: Vec<ModuleKey>,
    },

    #[error("module '{0}' must be installed first")]
    NotInstalled(ModuleKey),

    #[error("module '{0}' must be enabled first")]
    NotEnabled(ModuleKey),

    #[error("module '{module}' has no seeder '{seeder}'")]
    UnknownSeeder { module: ModuleKey, seeder: String },

    #[error("migration failed for module '{module}': {message}")]
    MigrationFailed { module: ModuleKey, message: String },

    #[error("seeder '{seeder}' failed for module '{module}': {message}")]
    SeedFailed {
        module: ModuleKey,
        seeder: String,
        message: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
