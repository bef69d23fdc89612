//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes supported by the conformance pipeline.
///
/// Raster files carry their CRS as an EPSG code (or none at all, in which
/// case the pipeline bootstraps them with the schema's default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// British National Grid (transverse Mercator, meters)
    Epsg27700,
}

impl CrsCode {
    /// Resolve a numeric EPSG code to a supported CRS.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            3857 | 900913 => Ok(CrsCode::Epsg3857),
            27700 => Ok(CrsCode::Epsg27700),
            _ => Err(CrsParseError::UnsupportedEpsg(code)),
        }
    }

    /// The numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg27700 => 27700,
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    ///
    /// Projected CRSs use planar meters, which matters for resampling
    /// scale factors.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: EPSG:{0}")]
    UnsupportedEpsg(u32),
}
