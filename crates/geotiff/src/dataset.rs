//! Owned raster dataset handles.

use crate::{decoder, encoder};
use raster_common::{CrsCode, GeoTransform, RasterDescriptor, RasterError, RasterResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A fully decoded raster, exclusively owned for one operation.
///
/// Opening reads the whole file and releases the OS handle immediately,
/// so a dataset never holds a lock on its backing file; rewriting the
/// same path while a dataset is alive is safe. Dropping the dataset
/// releases all pixel memory.
#[derive(Debug)]
pub struct RasterDataset {
    path: PathBuf,
    width: usize,
    height: usize,
    crs: Option<CrsCode>,
    transform: GeoTransform,
    nodata: Option<f64>,
    bands: Vec<Vec<f32>>,
}

impl RasterDataset {
    /// Open and fully decode a raster file.
    pub fn open(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| RasterError::raster_io(path, format!("cannot read file: {}", e)))?;
        let decoded = decoder::decode(path, &bytes, true)?;
        let bands = decoded
            .bands
            .ok_or_else(|| RasterError::raster_io(path, "decoder returned no pixel data"))?;

        debug!(
            path = %path.display(),
            width = decoded.width,
            height = decoded.height,
            bands = decoded.band_count,
            "opened raster"
        );

        Ok(Self {
            path: path.to_path_buf(),
            width: decoded.width,
            height: decoded.height,
            crs: decoded.crs,
            transform: decoded.transform,
            nodata: decoded.nodata,
            bands,
        })
    }

    /// Build an in-memory raster, e.g. a merge or reprojection output.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Vec<f32>>,
        transform: GeoTransform,
        crs: Option<CrsCode>,
        nodata: Option<f64>,
    ) -> RasterResult<Self> {
        if width == 0 || height == 0 || bands.is_empty() {
            return Err(RasterError::raster_io(
                "<memory>",
                format!("invalid raster shape {}x{}x{}", width, height, bands.len()),
            ));
        }
        for (i, band) in bands.iter().enumerate() {
            if band.len() != width * height {
                return Err(RasterError::raster_io(
                    "<memory>",
                    format!("band {} has {} samples, expected {}", i, band.len(), width * height),
                ));
            }
        }
        Ok(Self {
            path: PathBuf::new(),
            width,
            height,
            crs,
            transform,
            nodata,
            bands,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn crs(&self) -> Option<CrsCode> {
        self.crs
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Assign a CRS, used by the bootstrap step for files that lack one.
    pub fn set_crs(&mut self, crs: CrsCode) {
        self.crs = Some(crs);
    }

    /// Metadata snapshot of this dataset.
    pub fn descriptor(&self) -> RasterDescriptor {
        RasterDescriptor {
            path: self.path.clone(),
            width: self.width,
            height: self.height,
            band_count: self.bands.len(),
            crs: self.crs,
            transform: self.transform,
            nodata: self.nodata,
        }
    }

    /// Row-major pixel data for one band.
    pub fn band(&self, index: usize) -> &[f32] {
        &self.bands[index]
    }

    /// Pixel value at `(col, row)` in one band.
    pub fn value(&self, band: usize, col: usize, row: usize) -> f32 {
        self.bands[band][row * self.width + col]
    }

    /// Whether a sample counts as missing: NaN always does, and the
    /// declared nodata sentinel does when one exists.
    pub fn is_nodata(&self, value: f32) -> bool {
        if value.is_nan() {
            return true;
        }
        match self.nodata {
            Some(nodata) => value == nodata as f32,
            None => false,
        }
    }

    /// Encode and write this raster to `path`.
    ///
    /// The encoding goes through a sibling temp file and an atomic
    /// rename, so the destination is either the complete raster or the
    /// previous file; a failed write never leaves a partial raster.
    pub fn write_to(&self, path: impl AsRef<Path>) -> RasterResult<()> {
        let path = path.as_ref();
        let bytes = encoder::encode(
            path,
            self.width,
            self.height,
            &self.bands,
            &self.transform,
            self.crs,
            self.nodata,
        )?;

        let tmp = path.with_extension("tif.partial");
        if let Err(e) = std::fs::write(&tmp, &bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(RasterError::raster_io(path, format!("cannot write temp file: {}", e)));
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(RasterError::raster_io(path, format!("cannot move into place: {}", e)));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "wrote raster");
        Ok(())
    }
}

/// Derive a raster's descriptor without materializing pixel data.
pub fn read_descriptor(path: impl AsRef<Path>) -> RasterResult<RasterDescriptor> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| RasterError::raster_io(path, format!("cannot read file: {}", e)))?;
    let decoded = decoder::decode(path, &bytes, false)?;
    Ok(RasterDescriptor {
        path: path.to_path_buf(),
        width: decoded.width,
        height: decoded.height,
        band_count: decoded.band_count,
        crs: decoded.crs,
        transform: decoded.transform,
        nodata: decoded.nodata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize, offset: f32) -> Vec<f32> {
        (0..width * height).map(|i| i as f32 + offset).collect()
    }

    #[test]
    fn test_roundtrip_single_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ele.tif");

        let transform = GeoTransform::from_origin(350000.0, 520000.0, 10.0, 10.0);
        let raster = RasterDataset::new(
            8,
            5,
            vec![gradient(8, 5, 0.0)],
            transform,
            Some(CrsCode::Epsg27700),
            Some(-9999.0),
        )
        .unwrap();
        raster.write_to(&path).unwrap();

        let reopened = RasterDataset::open(&path).unwrap();
        assert_eq!(reopened.width(), 8);
        assert_eq!(reopened.height(), 5);
        assert_eq!(reopened.band_count(), 1);
        assert_eq!(reopened.crs(), Some(CrsCode::Epsg27700));
        assert_eq!(reopened.nodata(), Some(-9999.0));
        assert_eq!(reopened.transform(), transform);
        assert_eq!(reopened.band(0), gradient(8, 5, 0.0).as_slice());
    }

    #[test]
    fn test_roundtrip_multi_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.tif");

        let bands = vec![
            gradient(4, 3, 0.0),
            gradient(4, 3, 100.0),
            gradient(4, 3, 200.0),
        ];
        let raster = RasterDataset::new(
            4,
            3,
            bands.clone(),
            GeoTransform::from_origin(0.0, 3.0, 1.0, 1.0),
            Some(CrsCode::Epsg4326),
            None,
        )
        .unwrap();
        raster.write_to(&path).unwrap();

        let reopened = RasterDataset::open(&path).unwrap();
        assert_eq!(reopened.band_count(), 3);
        for (i, band) in bands.iter().enumerate() {
            assert_eq!(reopened.band(i), band.as_slice());
        }
        assert_eq!(reopened.value(1, 2, 1), 106.0);
    }

    #[test]
    fn test_missing_crs_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nocrs.tif");

        let raster = RasterDataset::new(
            2,
            2,
            vec![vec![1.0, 2.0, 3.0, 4.0]],
            GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0),
            None,
            None,
        )
        .unwrap();
        raster.write_to(&path).unwrap();

        let desc = read_descriptor(&path).unwrap();
        assert_eq!(desc.crs, None);
        assert_eq!(desc.nodata, None);
    }

    #[test]
    fn test_descriptor_without_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agb.tif");

        RasterDataset::new(
            16,
            9,
            vec![gradient(16, 9, 0.0); 2],
            GeoTransform::from_origin(-2.0, 54.0, 0.001, 0.001),
            Some(CrsCode::Epsg4326),
            Some(f64::NAN),
        )
        .unwrap()
        .write_to(&path)
        .unwrap();

        let desc = read_descriptor(&path).unwrap();
        assert_eq!(desc.width, 16);
        assert_eq!(desc.height, 9);
        assert_eq!(desc.band_count, 2);
        assert_eq!(desc.resolution(), (0.001, 0.001));
        assert!(desc.nodata.unwrap().is_nan());
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.tif");
        std::fs::write(&path, b"this is not a tiff at all").unwrap();

        let err = RasterDataset::open(&path).unwrap_err();
        assert!(matches!(err, RasterError::RasterIo { .. }));
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = read_descriptor(Path::new("/no/such/raster.tif")).unwrap_err();
        assert!(matches!(err, RasterError::RasterIo { .. }));
    }

    #[test]
    fn test_failed_temp_write_reports_error_without_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tif");
        // A directory squatting on the temp name forces the staged write to fail.
        std::fs::create_dir(path.with_extension("tif.partial")).unwrap();

        let raster = RasterDataset::new(
            2,
            2,
            vec![vec![1.0, 2.0, 3.0, 4.0]],
            GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0),
            None,
            None,
        )
        .unwrap();
        let err = raster.write_to(&path).unwrap_err();
        assert!(matches!(err, RasterError::RasterIo { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_move_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tif");
        // A directory at the destination makes the final rename fail.
        std::fs::create_dir(&path).unwrap();

        let raster = RasterDataset::new(
            2,
            2,
            vec![vec![1.0, 2.0, 3.0, 4.0]],
            GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0),
            None,
            None,
        )
        .unwrap();
        let err = raster.write_to(&path).unwrap_err();
        assert!(matches!(err, RasterError::RasterIo { .. }));
        assert!(!path.with_extension("tif.partial").exists());
    }

    #[test]
    fn test_nodata_sentinel_detection() {
        let raster = RasterDataset::new(
            1,
            2,
            vec![vec![-9999.0, 5.0]],
            GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0),
            None,
            Some(-9999.0),
        )
        .unwrap();
        assert!(raster.is_nodata(-9999.0));
        assert!(raster.is_nodata(f32::NAN));
        assert!(!raster.is_nodata(5.0));
    }
}
