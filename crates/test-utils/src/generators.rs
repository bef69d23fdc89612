//! Raster generators for tests.

use geotiff::RasterDataset;
use raster_common::{CrsCode, GeoTransform};
use std::path::Path;

/// Row-major grid where each cell encodes its own position as
/// `col * 1000 + row`, so tests can assert exact values anywhere.
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = vec![0.0; width * height];
    for row in 0..height {
        for col in 0..width {
            data[row * width + col] = (col * 1000 + row) as f32;
        }
    }
    data
}

/// Everything needed to write one test raster file.
///
/// Defaults describe a small single-band EPSG:4326 tile near the UK;
/// tests override the fields they care about.
#[derive(Debug, Clone)]
pub struct RasterSpec {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub crs: Option<CrsCode>,
    pub origin: (f64, f64),
    pub resolution: (f64, f64),
    pub nodata: Option<f64>,
}

impl Default for RasterSpec {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            band_count: 1,
            crs: Some(CrsCode::Epsg4326),
            origin: (-2.0, 54.0),
            resolution: (0.01, 0.01),
            nodata: None,
        }
    }
}

/// Temporary directory pre-populated with one raster per `(name, spec)`
/// pair. Dropping the returned guard deletes everything.
pub fn temp_raster_dir(rasters: &[(&str, RasterSpec)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp raster dir");
    for (name, spec) in rasters {
        write_test_raster(&dir.path().join(name), spec);
    }
    dir
}

/// Write a raster described by `spec` to `path`, filling every band
/// with the positional test grid.
pub fn write_test_raster(path: &Path, spec: &RasterSpec) {
    let band = create_test_grid(spec.width, spec.height);
    let transform = GeoTransform::from_origin(
        spec.origin.0,
        spec.origin.1,
        spec.resolution.0,
        spec.resolution.1,
    );
    RasterDataset::new(
        spec.width,
        spec.height,
        vec![band; spec.band_count],
        transform,
        spec.crs,
        spec.nodata,
    )
    .unwrap()
    .write_to(path)
    .unwrap();
}
