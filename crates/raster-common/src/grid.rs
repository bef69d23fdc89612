//! Geotransform mapping between pixel and world coordinates.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Affine transform from pixel space to world coordinates.
///
/// Uses the conventional six-coefficient form:
///
/// ```text
/// x = c + col * a + row * b
/// y = f + col * d + row * e
/// ```
///
/// where `(c, f)` is the world position of the top-left corner of the
/// top-left pixel. For the usual north-up raster, `b` and `d` are zero
/// and `e` is negative (rows advance southward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    /// North-up transform from the top-left corner and pixel sizes.
    ///
    /// `xres` and `yres` are positive pixel dimensions in world units.
    pub fn from_origin(origin_x: f64, origin_y: f64, xres: f64, yres: f64) -> Self {
        Self {
            a: xres,
            b: 0.0,
            c: origin_x,
            d: 0.0,
            e: -yres,
            f: origin_y,
        }
    }

    /// Build from the six coefficients in `[a, b, c, d, e, f]` order.
    pub fn from_coefficients(coeffs: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = coeffs;
        Self { a, b, c, d, e, f }
    }

    /// The six coefficients in `[a, b, c, d, e, f]` order.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Absolute pixel size `(x, y)` in world units.
    pub fn resolution(&self) -> (f64, f64) {
        (self.a.abs(), self.e.abs())
    }

    /// World position of the top-left corner.
    pub fn origin(&self) -> (f64, f64) {
        (self.c, self.f)
    }

    /// True when the transform has no rotation terms and rows go south.
    pub fn is_north_up(&self) -> bool {
        self.b == 0.0 && self.d == 0.0 && self.a > 0.0 && self.e < 0.0
    }

    /// World coordinates of a (fractional) pixel edge position.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.c + col * self.a + row * self.b,
            self.f + col * self.d + row * self.e,
        )
    }

    /// World coordinates of a pixel's center.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional pixel position of a world coordinate.
    ///
    /// Returns `None` for a degenerate (non-invertible) transform.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let dx = x - self.c;
        let dy = y - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (self.a * dy - self.d * dx) / det;
        Some((col, row))
    }

    /// Bounding box of a raster with the given pixel dimensions.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(width as f64, 0.0),
            self.pixel_to_world(0.0, height as f64),
            self.pixel_to_world(width as f64, height as f64),
        ];

        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }

    /// Same origin, new pixel sizes. Only meaningful for north-up rasters.
    pub fn with_resolution(&self, xres: f64, yres: f64) -> Self {
        Self::from_origin(self.c, self.f, xres, yres)
    }
}
