//! Strongly-typed identifiers used across the domain.
//!
//! Tenants and modules are identified by externally assigned string slugs
//! (request headers, manifest files), so these are validated string newtypes
//! rather than generated ids.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a tenant (multi-tenant isolation boundary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

/// Stable identifier of a feature module (manifest `key`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

/// Well-known tenant used by single-tenant deployments when no tenant header
/// is present.
pub const DEFAULT_TENANT: &str = "default";

impl TenantId {
    /// The single well-known tenant for standalone deployments.
    pub fn default_tenant() -> Self {
        Self(DEFAULT_TENANT.to_string())
    }
}

macro_rules! impl_slug_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw slug. Prefer `FromStr` at trust boundaries, which
            /// rejects blank input.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, " cannot be blank")));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_slug_newtype!(TenantId, "TenantId");
impl_slug_newtype!(ModuleKey, "ModuleKey");
