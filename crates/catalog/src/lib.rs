//! Module manifest catalog.
//!
//! The catalog is the static description of every module known to the system:
//! key, display name, packaged version, declared dependencies, seeders, and
//! whether the package may currently be installed. It is loaded once per
//! process lifetime and never mutated at runtime; shipping a new module or
//! version means shipping a new deployment.

pub mod builtin;
pub mod catalog;
pub mod manifest;

pub use catalog::{CatalogError, ManifestCatalog};
pub use manifest::ModuleManifest;
