//! Built-in demo catalog.
//!
//! Used by dev/standalone deployments when no manifest directory is
//! configured. Mirrors the packaged module set of the product: master data at
//! the root, execution modules layered on top.

use modulith_core::{ModuleKey, ModuleVersion};

use crate::catalog::ManifestCatalog;
use crate::manifest::ModuleManifest;

fn module(
    key: &str,
    name: &str,
    version: &str,
    description: &str,
    deps: &[&str],
    seeders: &[&str],
    installable: bool,
) -> ModuleManifest {
    ModuleManifest {
        key: ModuleKey::from(key),
        name: name.to_string(),
        version: ModuleVersion::parse(version).expect("built-in version must parse"),
        description: description.to_string(),
        dependencies: deps.iter().map(|d| ModuleKey::from(*d)).collect(),
        seeders: seeders.iter().map(|s| s.to_string()).collect(),
        installable,
    }
}

impl ManifestCatalog {
    /// The packaged demo catalog.
    pub fn builtin() -> Self {
        Self::new(vec![
            module(
                "mdm",
                "Master Data Management",
                "1.2.0",
                "Org units, items, units of measure, parties.",
                &[],
                &["demo_bootstrap"],
                true,
            ),
            module(
                "inventory",
                "Inventory",
                "1.4.0",
                "Stock balances and movements.",
                &["mdm"],
                &[],
                true,
            ),
            module(
                "wms",
                "Warehouse Management",
                "0.9.0",
                "Locations, waves, picking and putaway.",
                &["inventory"],
                &["default_locations"],
                true,
            ),
            module(
                "mes",
                "Manufacturing Execution",
                "0.8.0",
                "Work orders and shop-floor scans.",
                &["inventory"],
                &[],
                true,
            ),
            module(
                "qms",
                "Quality Management",
                "0.7.0",
                "Inspections, holds and NCRs.",
                &["mes"],
                &[],
                true,
            ),
            module(
                "sales",
                "Sales",
                "1.1.0",
                "Quotes and sales orders.",
                &["mdm"],
                &[],
                true,
            ),
            module(
                "crm",
                "CRM",
                "0.6.0",
                "Leads, opportunities and activities.",
                &["sales"],
                &[],
                true,
            ),
            module(
                "planning",
                "Planning",
                "0.5.0",
                "Demand and supply planning.",
                &["inventory", "sales"],
                &[],
                true,
            ),
            module(
                "accounting",
                "Accounting",
                "1.0.0",
                "Journals and postings.",
                &["sales"],
                &[],
                true,
            ),
            // Packaged but feature-flagged off in this build.
            module(
                "ecommerce",
                "E-Commerce",
                "0.2.0",
                "Storefront order intake.",
                &["sales", "inventory"],
                &[],
                false,
            ),
        ])
        .expect("built-in catalog must be a valid DAG")
    }
}
