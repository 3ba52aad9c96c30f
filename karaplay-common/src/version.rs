//! Media engine version parsing
//!
//! Engines report their version as free text, e.g. `"3.0.11.1 Vetinari"`.
//! Only the leading dotted number is kept.

use crate::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Dotted numeric version (any number of components)
#[derive(Debug, Clone, Eq, Serialize)]
pub struct EngineVersion {
    components: Vec<u32>,
}

impl EngineVersion {
    /// Parse the version from an engine version string
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw
            .split_whitespace()
            .next()
            .ok_or_else(|| Error::InvalidVersion(raw.to_string()))?;

        let components = token
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidVersion(raw.to_string()))?;

        Ok(Self { components })
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Component at `index`, missing trailing components count as zero
    fn component(&self, index: usize) -> u32 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for EngineVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for EngineVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}
