//! Geometry corrections applied in place to raster files.
//!
//! Both operations check their own precondition and skip when the file
//! already conforms, returning `Ok(false)` without touching the file.
//! The pipeline can therefore request both corrections unconditionally
//! and only the needed ones run.

use crate::sampling::bilinear_sample;
use geotiff::RasterDataset;
use projection::{transform_bounds, transform_point, ProjectionError};
use raster_common::{CrsCode, GeoTransform, RasterError, RasterResult};
use std::path::Path;
use tracing::{debug, info};

fn projection_failure(path: &Path, err: ProjectionError) -> RasterError {
    match err {
        ProjectionError::DegenerateBounds { .. } => {
            RasterError::transform_computation(path, err.to_string())
        }
        other => RasterError::Projection(other.to_string()),
    }
}

/// One band with nodata sentinels replaced by NaN so interpolation
/// cannot blend real values with the sentinel.
fn masked_band(dataset: &RasterDataset, index: usize) -> Vec<f32> {
    dataset
        .band(index)
        .iter()
        .map(|&v| if dataset.is_nodata(v) { f32::NAN } else { v })
        .collect()
}

/// Replace NaN with the declared sentinel on the way back out.
fn restore_nodata(band: &mut [f32], nodata: Option<f64>) {
    if let Some(nodata) = nodata {
        let sentinel = nodata as f32;
        if !sentinel.is_nan() {
            for v in band.iter_mut() {
                if v.is_nan() {
                    *v = sentinel;
                }
            }
        }
    }
}

/// Reproject a raster file to `target`, rewriting it in place.
///
/// Returns `Ok(false)` without modifying the file when the source is
/// already in the target CRS. A source with no CRS at all cannot be
/// reprojected and is an error; callers resolve that case beforehand
/// by bootstrapping a default CRS.
///
/// The output grid covers the reprojected source bounds at the source's
/// pixel counts, so the target resolution is derived, not requested;
/// a resolution correction runs separately if still needed. Values are
/// inverse-warped with bilinear interpolation.
pub fn reproject(path: impl AsRef<Path>, target: CrsCode) -> RasterResult<bool> {
    let path = path.as_ref();
    let dataset = RasterDataset::open(path)?;

    let source = dataset.crs().ok_or_else(|| {
        RasterError::transform_computation(path, "source raster has no CRS to reproject from")
    })?;
    if source == target {
        debug!(path = %path.display(), crs = %target, "already in target CRS, skipping");
        return Ok(false);
    }

    let src_bounds = dataset.descriptor().bounds();
    let dst_bounds =
        transform_bounds(source, target, &src_bounds).map_err(|e| projection_failure(path, e))?;

    let width = dataset.width();
    let height = dataset.height();
    let xres = dst_bounds.width() / width as f64;
    let yres = dst_bounds.height() / height as f64;
    if !xres.is_finite() || !yres.is_finite() || xres <= 0.0 || yres <= 0.0 {
        return Err(RasterError::transform_computation(
            path,
            format!("degenerate target grid {}x{} over {:?}", width, height, dst_bounds),
        ));
    }
    let dst_transform = GeoTransform::from_origin(dst_bounds.min_x, dst_bounds.max_y, xres, yres);

    let src_transform = dataset.transform();
    let sources: Vec<Vec<f32>> = (0..dataset.band_count())
        .map(|i| masked_band(&dataset, i))
        .collect();

    let mut bands = vec![vec![f32::NAN; width * height]; sources.len()];
    for row in 0..height {
        for col in 0..width {
            let (x, y) = dst_transform.pixel_center(col, row);
            let (sx, sy) = match transform_point(target, source, x, y) {
                Ok(p) => p,
                // Dest cells outside the source CRS domain stay nodata.
                Err(ProjectionError::OutOfDomain { .. }) => continue,
                Err(e) => return Err(projection_failure(path, e)),
            };
            let (fc, fr) = match src_transform.world_to_pixel(sx, sy) {
                Some(p) => p,
                None => continue,
            };
            // Pixel-center coordinates, half a pixel in from the corner grid.
            let (fc, fr) = (fc - 0.5, fr - 0.5);
            if fc < -0.5 || fr < -0.5 || fc > width as f64 - 0.5 || fr > height as f64 - 0.5 {
                continue;
            }
            let idx = row * width + col;
            for (band, source) in bands.iter_mut().zip(&sources) {
                band[idx] = bilinear_sample(source, width, height, fc, fr);
            }
        }
    }

    let nodata = dataset.nodata();
    for band in &mut bands {
        restore_nodata(band, nodata);
    }

    RasterDataset::new(width, height, bands, dst_transform, Some(target), nodata)?
        .write_to(path)?;
    info!(
        path = %path.display(),
        from = %source,
        to = %target,
        "reprojected raster"
    );
    Ok(true)
}

/// Resample a raster file to `target_res`, rewriting it in place.
///
/// Returns `Ok(false)` without modifying the file when both axes are
/// already within `tolerance` of the target. The output transform
/// carries the target resolution exactly, so a follow-up validation at
/// zero tolerance passes.
pub fn resample(
    path: impl AsRef<Path>,
    target_res: (f64, f64),
    tolerance: f64,
) -> RasterResult<bool> {
    let path = path.as_ref();
    let dataset = RasterDataset::open(path)?;

    let (src_x, src_y) = dataset.transform().resolution();
    let (tgt_x, tgt_y) = target_res;
    if (src_x - tgt_x).abs() <= tolerance && (src_y - tgt_y).abs() <= tolerance {
        debug!(path = %path.display(), "resolution already matches, skipping");
        return Ok(false);
    }
    if !tgt_x.is_finite() || !tgt_y.is_finite() || tgt_x <= 0.0 || tgt_y <= 0.0 {
        return Err(RasterError::transform_computation(
            path,
            format!("invalid target resolution ({}, {})", tgt_x, tgt_y),
        ));
    }

    let scale_x = src_x / tgt_x;
    let scale_y = src_y / tgt_y;
    let src_width = dataset.width();
    let src_height = dataset.height();
    let width = ((src_width as f64 * scale_x).floor() as usize).max(1);
    let height = ((src_height as f64 * scale_y).floor() as usize).max(1);

    let (origin_x, origin_y) = dataset.transform().origin();
    let transform = GeoTransform::from_origin(origin_x, origin_y, tgt_x, tgt_y);

    let sources: Vec<Vec<f32>> = (0..dataset.band_count())
        .map(|i| masked_band(&dataset, i))
        .collect();

    let mut bands = vec![vec![f32::NAN; width * height]; sources.len()];
    for row in 0..height {
        let sy = (row as f64 + 0.5) / scale_y - 0.5;
        for col in 0..width {
            let sx = (col as f64 + 0.5) / scale_x - 0.5;
            let idx = row * width + col;
            for (band, source) in bands.iter_mut().zip(&sources) {
                band[idx] = bilinear_sample(source, src_width, src_height, sx, sy);
            }
        }
    }

    let nodata = dataset.nodata();
    for band in &mut bands {
        restore_nodata(band, nodata);
    }

    RasterDataset::new(width, height, bands, transform, dataset.crs(), nodata)?.write_to(path)?;
    info!(
        path = %path.display(),
        from = ?(src_x, src_y),
        to = ?(tgt_x, tgt_y),
        width,
        height,
        "resampled raster"
    );
    Ok(true)
}
