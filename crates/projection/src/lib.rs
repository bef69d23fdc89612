//! Coordinate transforms between the supported CRSs.
//!
//! Implements the map projection math from scratch without external
//! dependencies. All transforms route through WGS84 geographic
//! coordinates: each projected CRS provides a forward (lon/lat to planar)
//! and inverse (planar to lon/lat) mapping, and arbitrary pairs compose
//! the two.

pub mod mercator;
pub mod osgb;

use raster_common::{BoundingBox, CrsCode};

/// Errors from coordinate transformation.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("point ({x}, {y}) is outside the valid domain of {crs}")]
    OutOfDomain { x: f64, y: f64, crs: CrsCode },

    #[error("transformed bounds from {src} to {dst} are degenerate")]
    DegenerateBounds { src: CrsCode, dst: CrsCode },
}

/// Transform a single point from `src` to `dst`.
///
/// Coordinates are `(x, y)`: lon/lat degrees for EPSG:4326, easting and
/// northing in meters for the projected CRSs.
pub fn transform_point(
    src: CrsCode,
    dst: CrsCode,
    x: f64,
    y: f64,
) -> Result<(f64, f64), ProjectionError> {
    if src == dst {
        return Ok((x, y));
    }

    let (lon, lat) = to_geographic(src, x, y)?;
    from_geographic(dst, lon, lat)
}

/// Transform a bounding box by sampling its corners and edges.
///
/// Projected edges are curved in the target CRS, so corners alone can
/// under-estimate the extent; each edge is sampled at regular intervals
/// and the enclosing box of all samples is returned.
pub fn transform_bounds(
    src: CrsCode,
    dst: CrsCode,
    bbox: &BoundingBox,
) -> Result<BoundingBox, ProjectionError> {
    if src == dst {
        return Ok(*bbox);
    }

    const EDGE_SAMPLES: usize = 21;

    let mut out = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for t in 0..EDGE_SAMPLES {
        let frac = t as f64 / (EDGE_SAMPLES - 1) as f64;
        let x = bbox.min_x + frac * bbox.width();
        let y = bbox.min_y + frac * bbox.height();

        let samples = [
            (x, bbox.min_y),
            (x, bbox.max_y),
            (bbox.min_x, y),
            (bbox.max_x, y),
        ];
        for (sx, sy) in samples {
            let (tx, ty) = transform_point(src, dst, sx, sy)?;
            out.min_x = out.min_x.min(tx);
            out.min_y = out.min_y.min(ty);
            out.max_x = out.max_x.max(tx);
            out.max_y = out.max_y.max(ty);
        }
    }

    if !out.is_valid() {
        return Err(ProjectionError::DegenerateBounds { src, dst });
    }
    Ok(out)
}

/// Convert a point in `crs` to WGS84 lon/lat degrees.
fn to_geographic(crs: CrsCode, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
    match crs {
        CrsCode::Epsg4326 => Ok((x, y)),
        CrsCode::Epsg3857 => mercator::to_lonlat(x, y),
        CrsCode::Epsg27700 => osgb::to_lonlat(x, y),
    }
}

/// Convert WGS84 lon/lat degrees to a point in `crs`.
fn from_geographic(crs: CrsCode, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
    match crs {
        CrsCode::Epsg4326 => Ok((lon, lat)),
        CrsCode::Epsg3857 => mercator::from_lonlat(lon, lat),
        CrsCode::Epsg27700 => osgb::from_lonlat(lon, lat),
    }
}
