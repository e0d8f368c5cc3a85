//! Static module manifest model.

use serde::{Deserialize, Serialize};

use modulith_core::{ModuleKey, ModuleVersion};

/// Immutable descriptor of a feature module, as shipped in a
/// `<key>.manifest.json` file alongside the module package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Unique stable identifier.
    pub key: ModuleKey,

    /// Display name shown by dashboards.
    pub name: String,

    /// Current packaged version; increases monotonically across releases.
    pub version: ModuleVersion,

    /// Free-text description for dashboards.
    #[serde(default)]
    pub description: String,

    /// Keys of modules this module requires.
    #[serde(default, rename = "depends_on")]
    pub dependencies: Vec<ModuleKey>,

    /// Named idempotent data-seeding routines this module ships.
    #[serde(default)]
    pub seeders: Vec<String>,

    /// Whether install is currently permitted (feature-flagged-off packages
    /// are listed but not installable).
    #[serde(default = "default_installable")]
    pub installable: bool,
}

fn default_installable() -> bool {
    true
}

impl ModuleManifest {
    pub fn has_seeder(&self, seeder: &str) -> bool {
        self.seeders.iter().any(|s| s == seeder)
    }

    pub fn depends_on(&self, key: &ModuleKey) -> bool {
        self.dependencies.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_manifest_json_with_defaults() {
        let json = r#"{
            "key": "wms",
            "name": "Warehouse Management",
            "version": "0.9.0",
            "depends_on": ["inventory"],
            "seeders": ["default_locations"]
        }"#;

        let m: ModuleManifest = serde_json::from_str(json).unwrap();
        assert_eq!(m.key.as_str(), "wms");
        assert!(m.installable, "installable defaults to true");
        assert!(m.description.is_empty());
        assert!(m.has_seeder("default_locations"));
        assert!(m.depends_on(&ModuleKey::from("inventory")));
    }

    #[test]
    fn installable_false_is_honored() {
        let json = r#"{
            "key": "ecommerce",
            "name": "E-Commerce",
            "version": "0.1.0",
            "installable": false
        }"#;

        let m: ModuleManifest = serde_json::from_str(json).unwrap();
        assert!(!m.installable);
        assert!(m.dependencies.is_empty());
    }
}
