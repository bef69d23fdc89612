//! The expected-variable contract for a working directory.
//!
//! A working directory is valid only if it contains exactly one raster per
//! recognized variable name, matched case-insensitively on filename stem,
//! with no extras and no omissions. This contract is checked before any
//! geometric validation runs.

use crate::{RasterError, RasterResult};

/// Variable stems every working set must contain exactly once.
///
/// Canopy metrics from the LiDAR extractor plus the spectral bands the
/// downstream biomass model consumes.
pub const EXPECTED_VARIABLES: [&str; 13] = [
    "agb", "int", "ele", "_p75", "_p99", "_std", "_kur", "_ske", "red", "green", "blue", "nir",
    "_dns",
];

/// Fixed, ordered set of recognized variable names.
#[derive(Debug, Clone)]
pub struct ExpectedVariableSet {
    names: Vec<String>,
}

impl Default for ExpectedVariableSet {
    fn default() -> Self {
        Self::new(EXPECTED_VARIABLES.iter().map(|s| s.to_string()))
    }
}

impl ExpectedVariableSet {
    /// Build a set from arbitrary names; stored lowercased.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// The expected names in their defined order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Check a directory's variable stems against the expected set.
    ///
    /// Stems are compared case-insensitively. Any difference fails with
    /// `VariableSetMismatch` reporting both the missing and the extra
    /// names, sorted for stable messages.
    pub fn check(&self, stems: &[String]) -> RasterResult<()> {
        let found: Vec<String> = stems.iter().map(|s| s.to_lowercase()).collect();

        let mut missing: Vec<String> = self
            .names
            .iter()
            .filter(|n| !found.contains(n))
            .cloned()
            .collect();
        let mut extra: Vec<String> = found
            .iter()
            .filter(|n| !self.names.contains(n))
            .cloned()
            .collect();

        // Duplicate stems are extras too: the contract is exactly-once.
        let mut seen = Vec::new();
        for stem in &found {
            if seen.contains(stem) && !extra.contains(stem) {
                extra.push(stem.clone());
            }
            seen.push(stem.clone());
        }

        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }

        missing.sort();
        extra.sort();
        extra.dedup();
        Err(RasterError::VariableSetMismatch { missing, extra })
    }
}
