//! British National Grid (EPSG:27700).
//!
//! Transverse Mercator on the Airy 1830 ellipsoid using the Ordnance
//! Survey projection constants. The forward and inverse mappings follow
//! the standard OS series expansions; the inverse iterates the meridian
//! arc until it converges below a tenth of a millimeter.
//!
//! The OSGB36/WGS84 datum shift is not applied: LiDAR tiles in this
//! pipeline are delivered already referenced to the grid, and the
//! forward/inverse pair here round-trips exactly, which is what the
//! corrective transformer depends on.

use crate::ProjectionError;
use raster_common::CrsCode;

/// Airy 1830 semi-major axis (meters).
const A: f64 = 6377563.396;
/// Airy 1830 semi-minor axis (meters).
const B: f64 = 6356256.909;
/// Central meridian scale factor.
const F0: f64 = 0.9996012717;
/// True origin latitude, 49°N (radians).
const LAT0: f64 = 49.0 * std::f64::consts::PI / 180.0;
/// True origin longitude, 2°W (radians).
const LON0: f64 = -2.0 * std::f64::consts::PI / 180.0;
/// False origin easting (meters).
const E0: f64 = 400000.0;
/// False origin northing (meters).
const N0: f64 = -100000.0;

/// First eccentricity squared.
fn e2() -> f64 {
    1.0 - (B * B) / (A * A)
}

/// Meridian arc length from the true origin to latitude `lat`.
fn meridian_arc(lat: f64) -> f64 {
    let n = (A - B) / (A + B);
    let n2 = n * n;
    let n3 = n2 * n;

    let dlat = lat - LAT0;
    let slat = lat + LAT0;

    B * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dlat
            - (3.0 * n + 3.0 * n2 + 2.625 * n3) * dlat.sin() * slat.cos()
            + (1.875 * n2 + 1.875 * n3) * (2.0 * dlat).sin() * (2.0 * slat).cos()
            - (35.0 / 24.0) * n3 * (3.0 * dlat).sin() * (3.0 * slat).cos())
}

/// Project lon/lat degrees to easting/northing meters.
pub fn from_lonlat(lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() >= 89.9 {
        return Err(ProjectionError::OutOfDomain {
            x: lon,
            y: lat,
            crs: CrsCode::Epsg27700,
        });
    }

    let phi = lat.to_radians();
    let lam = lon.to_radians();
    let e2 = e2();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;

    let nu = A * F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = A * F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let m = meridian_arc(phi);

    let i = m + N0;
    let ii = (nu / 2.0) * sin_phi * cos_phi;
    let iii = (nu / 24.0) * sin_phi * cos_phi.powi(3) * (5.0 - tan2 + 9.0 * eta2);
    let iiia = (nu / 720.0) * sin_phi * cos_phi.powi(5) * (61.0 - 58.0 * tan2 + tan4);
    let iv = nu * cos_phi;
    let v = (nu / 6.0) * cos_phi.powi(3) * (nu / rho - tan2);
    let vi = (nu / 120.0)
        * cos_phi.powi(5)
        * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dl = lam - LON0;
    let north = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
    let east = E0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);

    if !east.is_finite() || !north.is_finite() {
        return Err(ProjectionError::OutOfDomain {
            x: lon,
            y: lat,
            crs: CrsCode::Epsg27700,
        });
    }
    Ok((east, north))
}

/// Unproject easting/northing meters to lon/lat degrees.
pub fn to_lonlat(east: f64, north: f64) -> Result<(f64, f64), ProjectionError> {
    if !east.is_finite() || !north.is_finite() {
        return Err(ProjectionError::OutOfDomain {
            x: east,
            y: north,
            crs: CrsCode::Epsg27700,
        });
    }

    let e2 = e2();

    // Iterate the footpoint latitude until the meridian arc converges.
    let mut phi = LAT0 + (north - N0) / (A * F0);
    let mut m = meridian_arc(phi);
    let mut iterations = 0;
    while (north - N0 - m).abs() >= 1e-4 {
        phi += (north - N0 - m) / (A * F0);
        m = meridian_arc(phi);
        iterations += 1;
        if iterations > 100 {
            return Err(ProjectionError::OutOfDomain {
                x: east,
                y: north,
                crs: CrsCode::Epsg27700,
            });
        }
    }

    let sin_phi = phi.sin();
    let tan_phi = phi.tan();
    let sec_phi = 1.0 / phi.cos();
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;
    let tan6 = tan4 * tan2;

    let nu = A * F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = A * F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let vii = tan_phi / (2.0 * rho * nu);
    let viii = tan_phi / (24.0 * rho * nu.powi(3))
        * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
    let ix = tan_phi / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
    let x = sec_phi / nu;
    let xi = sec_phi / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
    let xii = sec_phi / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
    let xiia = sec_phi / (5040.0 * nu.powi(7))
        * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

    let de = east - E0;
    let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = LON0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);

    Ok((lon.to_degrees(), lat.to_degrees()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_worked_example() {
        // Ordnance Survey worked example: 52°39'27.2531"N, 1°43'4.5177"E
        // maps to E 651409.903, N 313177.270.
        let lat = 52.0 + 39.0 / 60.0 + 27.2531 / 3600.0;
        let lon = 1.0 + 43.0 / 60.0 + 4.5177 / 3600.0;

        let (e, n) = from_lonlat(lon, lat).unwrap();
        assert!((e - 651409.903).abs() < 0.01, "easting: {e}");
        assert!((n - 313177.270).abs() < 0.01, "northing: {n}");
    }

    #[test]
    fn test_inverse_of_worked_example() {
        let (lon, lat) = to_lonlat(651409.903, 313177.270).unwrap();
        let exp_lat = 52.0 + 39.0 / 60.0 + 27.2531 / 3600.0;
        let exp_lon = 1.0 + 43.0 / 60.0 + 4.5177 / 3600.0;
        assert!((lat - exp_lat).abs() < 1e-7, "lat: {lat}");
        assert!((lon - exp_lon).abs() < 1e-7, "lon: {lon}");
    }

    #[test]
    fn test_roundtrip_lake_district() {
        // NY50 tile area in the original LiDAR inputs.
        let (e, n) = (350000.0, 520000.0);
        let (lon, lat) = to_lonlat(e, n).unwrap();
        let (e2, n2) = from_lonlat(lon, lat).unwrap();
        assert!((e - e2).abs() < 1e-4);
        assert!((n - n2).abs() < 1e-4);
    }

    #[test]
    fn test_false_origin() {
        // The true origin projects onto the false origin offsets.
        let (e, n) = from_lonlat(-2.0, 49.0).unwrap();
        assert!((e - 400000.0).abs() < 1e-6);
        assert!((n - -100000.0).abs() < 1e-6);
    }
}
