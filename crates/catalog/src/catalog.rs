//! Read-only manifest registry with dependency validation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use thiserror::Error;

use modulith_core::ModuleKey;

use crate::manifest::ModuleManifest;

/// Catalog construction/loading failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate module key '{0}'")]
    DuplicateModule(ModuleKey),

    #[error("module '{module}' has blank key or name")]
    InvalidManifest { module: ModuleKey },

    #[error("module '{module}' depends on unknown module '{dependency}'")]
    UnknownDependency {
        module: ModuleKey,
        dependency: ModuleKey,
    },

    #[error("module '{0}' depends on itself")]
    SelfDependency(ModuleKey),

    #[error("dependency cycle: {}", .0.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(" -> "))]
    DependencyCycle(Vec<ModuleKey>),

    #[error("failed to read manifest directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest file '{file}': {source}")]
    Parse {
        file: String,
        source: serde_json::Error,
    },
}

/// Read-only registry of every module known to this deployment.
///
/// Construction validates that keys are unique, every dependency refers to a
/// cataloged module, and the dependency relation is a DAG. Iteration order is
/// deterministic (sorted by key).
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    modules: BTreeMap<ModuleKey, ModuleManifest>,
}

impl ManifestCatalog {
    pub fn new(manifests: Vec<ModuleManifest>) -> Result<Self, CatalogError> {
        let mut modules = BTreeMap::new();
        for manifest in manifests {
            if manifest.key.as_str().trim().is_empty() || manifest.name.trim().is_empty() {
                return Err(CatalogError::InvalidManifest {
                    module: manifest.key,
                });
            }
            if modules.contains_key(&manifest.key) {
                return Err(CatalogError::DuplicateModule(manifest.key));
            }
            modules.insert(manifest.key.clone(), manifest);
        }

        let catalog = Self { modules };
        catalog.validate_dependencies()?;
        Ok(catalog)
    }

    /// Load every `*.manifest.json` file in `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let mut manifests = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".manifest.json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)?;
            let manifest =
                serde_json::from_str::<ModuleManifest>(&contents).map_err(|source| {
                    CatalogError::Parse {
                        file: file_name.to_string(),
                        source,
                    }
                })?;
            manifests.push(manifest);
        }

        tracing::info!(count = manifests.len(), dir = %dir.as_ref().display(), "loaded module manifests");
        Self::new(manifests)
    }

    pub fn get(&self, key: &ModuleKey) -> Option<&ModuleManifest> {
        self.modules.get(key)
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.modules.contains_key(key)
    }

    /// All manifests, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleManifest> {
        self.modules.values()
    }

    pub fn dependencies_of(&self, key: &ModuleKey) -> Option<&[ModuleKey]> {
        self.modules.get(key).map(|m| m.dependencies.as_slice())
    }

    /// Cataloged modules that declare `key` as a direct dependency.
    pub fn dependents_of<'a>(&'a self, key: &'a ModuleKey) -> impl Iterator<Item = &'a ModuleManifest> {
        self.modules.values().filter(move |m| m.depends_on(key))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn validate_dependencies(&self) -> Result<(), CatalogError> {
        for manifest in self.modules.values() {
            for dep in &manifest.dependencies {
                if dep == &manifest.key {
                    return Err(CatalogError::SelfDependency(manifest.key.clone()));
                }
                if !self.modules.contains_key(dep) {
                    return Err(CatalogError::UnknownDependency {
                        module: manifest.key.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        self.check_acyclic()
    }

    /// Depth-first cycle detection over the dependency relation.
    fn check_acyclic(&self) -> Result<(), CatalogError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&ModuleKey, Mark> = HashMap::new();

        fn visit<'a>(
            catalog: &'a ManifestCatalog,
            key: &'a ModuleKey,
            marks: &mut HashMap<&'a ModuleKey, Mark>,
            path: &mut Vec<ModuleKey>,
        ) -> Result<(), CatalogError> {
            match marks.get(key) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let mut cycle: Vec<ModuleKey> = path
                        .iter()
                        .skip_while(|k| *k != key)
                        .cloned()
                        .collect();
                    cycle.push(key.clone());
                    return Err(CatalogError::DependencyCycle(cycle));
                }
                None => {}
            }

            marks.insert(key, Mark::Visiting);
            path.push(key.clone());
            if let Some(manifest) = catalog.modules.get(key) {
                for dep in &manifest.dependencies {
                    visit(catalog, dep, marks, path)?;
                }
            }
            path.pop();
            marks.insert(key, Mark::Done);
            Ok(())
        }

        for key in self.modules.keys() {
            visit(self, key, &mut marks, &mut Vec::new())?;
        }
        Ok(())
    }
}
