//! Conformance schema load, persist, and the one-time resolution learn.
//!
//! The schema is read once at pipeline start. Its `spatial_resolution` may
//! be overwritten a single time from a reference raster's own resolution
//! and persisted back, before any per-file processing begins; after that
//! point the in-memory value is treated as immutable for the run.

use crate::{CrsCode, RasterError, RasterResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Band-count limits for a conformant raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandLimits {
    /// Maximum number of bands; fewer is acceptable.
    pub max: usize,
}

/// Target properties every raster in the working set must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceSchema {
    /// Target CRS as an EPSG code.
    pub coordinate_reference_system: u32,
    /// Target pixel size `(x, y)` in target-CRS units.
    pub spatial_resolution: (f64, f64),
    /// Band-count limits.
    pub number_of_bands: BandLimits,
    /// CRS assigned to source rasters that declare none.
    pub default_crs: u32,
}

impl ConformanceSchema {
    /// Load the schema from a JSON file.
    pub fn load(path: &Path) -> RasterResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RasterError::Schema(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| RasterError::Schema(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Persist the schema back to a JSON file.
    pub fn persist(&self, path: &Path) -> RasterResult<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| RasterError::Schema(format!("cannot serialize schema: {}", e)))?;
        std::fs::write(path, raw)
            .map_err(|e| RasterError::Schema(format!("cannot write {}: {}", path.display(), e)))
    }

    /// Copy of this schema with a resolution learned from a reference raster.
    pub fn with_resolution(&self, resolution: (f64, f64)) -> Self {
        Self {
            spatial_resolution: resolution,
            ..self.clone()
        }
    }

    /// The target CRS as a supported code.
    pub fn target_crs(&self) -> RasterResult<CrsCode> {
        Ok(CrsCode::from_epsg(self.coordinate_reference_system)?)
    }

    /// The bootstrap CRS assigned to rasters lacking one.
    pub fn bootstrap_crs(&self) -> RasterResult<CrsCode> {
        Ok(CrsCode::from_epsg(self.default_crs)?)
    }
}
