//! First-valid-pixel-wins merging of same-variable fragments.

use geotiff::RasterDataset;
use raster_common::{GeoTransform, RasterError, RasterResult};
use std::path::PathBuf;
use tracing::debug;

/// Merge an ordered list of fragments into one in-memory raster.
///
/// The output grid is the union of all fragment bounding boxes at the
/// finest per-axis resolution among the inputs. Where fragments
/// overlap, the value comes from whichever fragment first supplies a
/// valid (non-nodata) sample at that location, in input order. All
/// fragments must agree on band count and CRS; the output inherits the
/// first fragment's nodata.
pub fn merge_fragments(paths: &[PathBuf]) -> RasterResult<RasterDataset> {
    if paths.is_empty() {
        return Err(RasterError::raster_io("<empty>", "no fragments to merge"));
    }

    let mut fragments = Vec::with_capacity(paths.len());
    for path in paths {
        fragments.push(RasterDataset::open(path)?);
    }

    let first = &fragments[0];
    let band_count = first.band_count();
    let crs = first.crs();
    let nodata = first.nodata();

    for (path, fragment) in paths.iter().zip(&fragments).skip(1) {
        if fragment.band_count() != band_count {
            return Err(RasterError::raster_io(
                path,
                format!(
                    "band count {} differs from first fragment's {}",
                    fragment.band_count(),
                    band_count
                ),
            ));
        }
        if fragment.crs() != crs {
            return Err(RasterError::raster_io(
                path,
                format!(
                    "CRS {:?} differs from first fragment's {:?}",
                    fragment.crs(),
                    crs
                ),
            ));
        }
    }

    // Union extent at the finest per-axis resolution.
    let mut bounds = first.descriptor().bounds();
    let (mut xres, mut yres) = first.transform().resolution();
    for fragment in &fragments[1..] {
        bounds = bounds.union(&fragment.descriptor().bounds());
        let (fx, fy) = fragment.transform().resolution();
        xres = xres.min(fx);
        yres = yres.min(fy);
    }

    let width = ((bounds.width() / xres).round() as usize).max(1);
    let height = ((bounds.height() / yres).round() as usize).max(1);
    let transform = GeoTransform::from_origin(bounds.min_x, bounds.max_y, xres, yres);

    let fill = nodata.map(|v| v as f32).unwrap_or(f32::NAN);
    let mut bands = vec![vec![fill; width * height]; band_count];
    let mut filled = vec![vec![false; width * height]; band_count];

    for fragment in &fragments {
        paint_fragment(fragment, &transform, width, height, &mut bands, &mut filled);
    }

    debug!(
        width,
        height,
        bands = band_count,
        fragments = fragments.len(),
        "merged fragments"
    );

    RasterDataset::new(width, height, bands, transform, crs, nodata)
}

/// Copy one fragment's valid pixels into every destination cell it
/// covers that has not been claimed by an earlier fragment.
fn paint_fragment(
    fragment: &RasterDataset,
    dest_transform: &GeoTransform,
    dest_width: usize,
    dest_height: usize,
    bands: &mut [Vec<f32>],
    filled: &mut [Vec<bool>],
) {
    let frag_bounds = fragment.descriptor().bounds();
    let frag_transform = fragment.transform();

    // Restrict the scan to the destination window covering this fragment.
    let (col_min, row_min) = match dest_transform.world_to_pixel(frag_bounds.min_x, frag_bounds.max_y)
    {
        Some((c, r)) => (c.floor().max(0.0) as usize, r.floor().max(0.0) as usize),
        None => return,
    };
    let (col_max, row_max) = match dest_transform.world_to_pixel(frag_bounds.max_x, frag_bounds.min_y)
    {
        Some((c, r)) => (
            (c.ceil() as usize).min(dest_width),
            (r.ceil() as usize).min(dest_height),
        ),
        None => return,
    };

    for row in row_min..row_max {
        for col in col_min..col_max {
            let (x, y) = dest_transform.pixel_center(col, row);
            let (fc, fr) = match frag_transform.world_to_pixel(x, y) {
                Some(pos) => pos,
                None => continue,
            };
            let (fc, fr) = (fc.floor(), fr.floor());
            if fc < 0.0
                || fr < 0.0
                || fc >= fragment.width() as f64
                || fr >= fragment.height() as f64
            {
                continue;
            }
            let (fc, fr) = (fc as usize, fr as usize);

            let idx = row * dest_width + col;
            for band in 0..bands.len() {
                if filled[band][idx] {
                    continue;
                }
                let value = fragment.value(band, fc, fr);
                if fragment.is_nodata(value) {
                    continue;
                }
                bands[band][idx] = value;
                filled[band][idx] = true;
            }
        }
    }
}
