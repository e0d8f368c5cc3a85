//! Ordered module versions.
//!
//! Packaged module versions are dotted-numeric strings ("1.4.0") that increase
//! monotonically across releases. Ordering is segment-wise numeric comparison
//! with implicit zero padding, so "1.2" and "1.2.0" compare equal.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A packaged module version.
///
/// Keeps the original string form for display/storage and the parsed numeric
/// segments for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleVersion {
    raw: String,
    segments: Vec<u64>,
}

impl ModuleVersion {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(DomainError::invalid_version("version cannot be blank"));
        }
        let segments = raw
            .split('.')
            .map(|seg| {
                seg.parse::<u64>()
                    .map_err(|_| DomainError::invalid_version(format!("'{raw}' is not a dotted-numeric version")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn significant_segments(&self) -> &[u64] {
        // Trailing zeros don't affect ordering or equality.
        let end = self
            .segments
            .iter()
            .rposition(|&s| s != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.segments[..end]
    }
}

impl PartialEq for ModuleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ModuleVersion {}

impl Hash for ModuleVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_segments().hash(state);
    }
}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let longest = self.segments.len().max(other.segments.len());
        for i in 0..longest {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl core::fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.raw, f)
    }
}

impl FromStr for ModuleVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleVersion {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModuleVersion> for String {
    fn from(value: ModuleVersion) -> Self {
        value.raw
    }
}
