//! Per-tenant module state and the merged catalog+state view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use modulith_catalog::ModuleManifest;
use modulith_core::{ModuleKey, ModuleVersion, TenantId};

/// One row per (tenant, module).
///
/// Rows are created lazily the first time a tenant touches a module and are
/// never deleted; disabling is the only reversible action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantModuleState {
    pub tenant_id: TenantId,
    pub module_key: ModuleKey,
    pub installed: bool,
    /// Version captured at install/upgrade time; `Some` iff `installed`.
    pub installed_version: Option<ModuleVersion>,
    pub enabled: bool,
    pub installed_at: Option<DateTime<Utc>>,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub enabled_at: Option<DateTime<Utc>>,
}

impl TenantModuleState {
    /// The implicit "never touched" row: not installed, not enabled.
    pub fn untouched(tenant_id: TenantId, module_key: ModuleKey) -> Self {
        Self {
            tenant_id,
            module_key,
            installed: false,
            installed_version: None,
            enabled: false,
            installed_at: None,
            upgraded_at: None,
            enabled_at: None,
        }
    }
}

/// Merged manifest + tenant state record, as returned by every lifecycle
/// operation and by `GET /admin/modules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    #[serde(rename = "key")]
    pub module_key: ModuleKey,
    pub name: String,
    pub version: ModuleVersion,
    pub description: String,
    pub dependencies: Vec<ModuleKey>,
    pub seeders: Vec<String>,
    pub installable: bool,
    pub installed: bool,
    pub installed_version: Option<ModuleVersion>,
    pub enabled: bool,
    pub installed_at: Option<DateTime<Utc>>,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub enabled_at: Option<DateTime<Utc>>,
}

impl ModuleStatus {
    pub fn merge(manifest: &ModuleManifest, state: &TenantModuleState) -> Self {
        Self {
            module_key: manifest.key.clone(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            dependencies: manifest.dependencies.clone(),
            seeders: manifest.seeders.clone(),
            installable: manifest.installable,
            installed: state.installed,
            installed_version: state.installed_version.clone(),
            enabled: state.enabled,
            installed_at: state.installed_at,
            upgraded_at: state.upgraded_at,
            enabled_at: state.enabled_at,
        }
    }
}
