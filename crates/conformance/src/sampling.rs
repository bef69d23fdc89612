//! Bilinear interpolation over band data.

/// Sample a band at fractional grid coordinates with bilinear weights.
///
/// Coordinates are pixel-center based: `(0.0, 0.0)` is the center of
/// the top-left pixel. Positions outside the grid clamp to the edge
/// pixels. NaN (missing) neighbors poison the result, which keeps
/// interpolation from inventing data at nodata boundaries.
pub fn bilinear_sample(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if width == 0 || height == 0 {
        return f32::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);

    let x1 = x.floor() as usize;
    let y1 = y.floor() as usize;
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);

    let dx = (x - x1 as f64) as f32;
    let dy = (y - y1 as f64) as f32;

    let v11 = data[y1 * width + x1];
    let v21 = data[y1 * width + x2];
    let v12 = data[y2 * width + x1];
    let v22 = data[y2 * width + x2];

    let top = v11 * (1.0 - dx) + v21 * dx;
    let bottom = v12 * (1.0 - dx) + v22 * dx;
    top * (1.0 - dy) + bottom * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pixel() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(bilinear_sample(&data, 2, 2, 0.0, 0.0), 1.0);
        assert_eq!(bilinear_sample(&data, 2, 2, 1.0, 1.0), 4.0);
    }

    #[test]
    fn test_midpoint() {
        let data = vec![0.0, 2.0, 4.0, 6.0];
        let v = bilinear_sample(&data, 2, 2, 0.5, 0.5);
        assert!((v - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamps_outside_grid() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(bilinear_sample(&data, 2, 2, -5.0, -5.0), 1.0);
        assert_eq!(bilinear_sample(&data, 2, 2, 10.0, 10.0), 4.0);
    }

    #[test]
    fn test_nan_poisons() {
        let data = vec![1.0, f32::NAN, 3.0, 4.0];
        assert!(bilinear_sample(&data, 2, 2, 0.5, 0.0).is_nan());
    }
}
