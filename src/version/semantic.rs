//! Dot-separated numeric versions used as folder names
//!
//! A `SemanticVersion` is any non-empty tuple of unsigned integers joined by
//! dots (`"1"`, `"2.4"`, `"10.0.0"`, `"1.2.3.4"`). Components compare
//! numerically, and a shorter tuple is padded with zeros, so `"1.2"` and
//! `"1.2.0"` are equal while `"10.0.0"` sorts after `"3.0.0"`.

use crate::error::FsError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric version tuple parsed from a folder name
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    components: Vec<u64>,
}

impl SemanticVersion {
    /// Build a version from its components
    ///
    /// Returns `None` for an empty component list.
    #[must_use]
    pub fn from_components(components: Vec<u64>) -> Option<Self> {
        if components.is_empty() {
            None
        } else {
            Some(Self { components })
        }
    }

    /// Numeric components, most significant first
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Number of dot-separated segments
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.components.len()
    }

    /// Parse a name strictly: digits and dots only
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::MalformedVersionName)` when any segment is empty,
    /// contains a non-digit, or overflows `u64`.
    pub fn parse_strict(name: &str) -> Result<Self, FsError> {
        let malformed = || FsError::MalformedVersionName {
            name: name.to_string(),
        };

        let components = name
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                segment.parse::<u64>().map_err(|_| malformed())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_components(components).ok_or_else(malformed)
    }

    /// Parse a name leniently
    ///
    /// Accepts an optional `v`/`V` prefix and drops a pre-release or build
    /// suffix introduced by `-` or `+` (`"v2.1.0-rc1"` parses as `2.1.0`).
    /// The remaining text must still be a strict version.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::MalformedVersionName)` carrying the original name
    /// when the cleaned-up text is not a strict version.
    pub fn parse_lenient(name: &str) -> Result<Self, FsError> {
        let trimmed = name.trim();
        let without_prefix = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let core = without_prefix
            .split(['-', '+'])
            .next()
            .unwrap_or(without_prefix);

        Self::parse_strict(core).map_err(|_| FsError::MalformedVersionName {
            name: name.to_string(),
        })
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for SemanticVersion {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s)
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}
