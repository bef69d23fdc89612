//! Web Mercator (EPSG:3857).
//!
//! Spherical Mercator on the WGS84 semi-major axis, as used by web
//! mapping tiles. Latitudes are limited to roughly ±85.05° where the
//! projection diverges.

use crate::ProjectionError;
use raster_common::CrsCode;
use std::f64::consts::PI;

/// WGS84 semi-major axis (meters).
const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the square Mercator world edge sits.
const MAX_LATITUDE: f64 = 85.06;

/// Project lon/lat degrees to Web Mercator meters.
pub fn from_lonlat(lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() >= MAX_LATITUDE {
        return Err(ProjectionError::OutOfDomain {
            x: lon,
            y: lat,
            crs: CrsCode::Epsg3857,
        });
    }

    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * ((PI / 4.0) + (lat.to_radians() / 2.0)).tan().ln();
    Ok((x, y))
}

/// Unproject Web Mercator meters to lon/lat degrees.
pub fn to_lonlat(x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(ProjectionError::OutOfDomain {
            x,
            y,
            crs: CrsCode::Epsg3857,
        });
    }

    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Ok((lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = from_lonlat(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_known_point() {
        // One degree east at the equator.
        let (x, _) = from_lonlat(1.0, 0.0).unwrap();
        assert!((x - 111319.4908).abs() < 0.001);
    }

    #[test]
    fn test_roundtrip() {
        let (x, y) = from_lonlat(-0.1276, 51.5072).unwrap();
        let (lon, lat) = to_lonlat(x, y).unwrap();
        assert!((lon - -0.1276).abs() < 1e-9);
        assert!((lat - 51.5072).abs() < 1e-9);
    }

    #[test]
    fn test_pole_rejected() {
        assert!(from_lonlat(0.0, 89.0).is_err());
        assert!(from_lonlat(0.0, -90.0).is_err());
    }
}
