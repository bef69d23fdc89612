//! Raster metadata snapshots.

use crate::{BoundingBox, CrsCode, GeoTransform};
use std::path::PathBuf;

/// Metadata describing one raster file.
///
/// Derived on demand by opening the backing file; never persisted
/// independently. A descriptor is stale the instant the file is rewritten
/// and must be re-derived before the next check.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDescriptor {
    /// Path of the backing file.
    pub path: PathBuf,
    /// Pixel columns. Always > 0.
    pub width: usize,
    /// Pixel rows. Always > 0.
    pub height: usize,
    /// Number of bands. Always > 0.
    pub band_count: usize,
    /// CRS, if the file declares one.
    pub crs: Option<CrsCode>,
    /// Pixel-to-world affine transform.
    pub transform: GeoTransform,
    /// Nodata sentinel, if declared.
    pub nodata: Option<f64>,
}

impl RasterDescriptor {
    /// Absolute pixel size `(x, y)` in CRS units. Both components > 0.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    /// Geographic extent of the raster.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }
}
