//! Schema validation of raster metadata.
//!
//! The validator never mutates a raster and never throws on a failed
//! check: it evaluates all three properties independently and returns
//! the complete failing set, so the pipeline can decide which
//! corrective steps a variable needs.

use raster_common::{ConformanceSchema, RasterDescriptor};
use std::fmt;

/// The schema properties a raster is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceProperty {
    Crs,
    Resolution,
    BandCount,
}

impl fmt::Display for ConformanceProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConformanceProperty::Crs => write!(f, "CRS"),
            ConformanceProperty::Resolution => write!(f, "resolution"),
            ConformanceProperty::BandCount => write!(f, "band count"),
        }
    }
}

/// One failed property with expected and found values.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFailure {
    pub property: ConformanceProperty,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for PropertyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (expected {}, found {})",
            self.property, self.expected, self.found
        )
    }
}

/// Result of validating one raster.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub variable: String,
    pub failures: Vec<PropertyFailure>,
}

impl ValidationOutcome {
    /// True when no property failed.
    pub fn conforms(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether a specific property is among the failures.
    pub fn failed(&self, property: ConformanceProperty) -> bool {
        self.failures.iter().any(|f| f.property == property)
    }

    /// Human-readable list of the failing properties.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks raster descriptors against a conformance schema.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: ConformanceSchema,
    resolution_tolerance: f64,
}

impl Validator {
    /// Validator with exact resolution matching.
    pub fn new(schema: ConformanceSchema) -> Self {
        Self {
            schema,
            resolution_tolerance: 0.0,
        }
    }

    /// Allow resolutions within an absolute per-axis tolerance.
    ///
    /// The default of zero rejects sub-pixel floating-point noise;
    /// callers mixing independently produced rasters can widen it.
    pub fn with_resolution_tolerance(mut self, tolerance: f64) -> Self {
        self.resolution_tolerance = tolerance;
        self
    }

    pub fn schema(&self) -> &ConformanceSchema {
        &self.schema
    }

    /// Evaluate all three conformance checks against one descriptor.
    pub fn validate(&self, descriptor: &RasterDescriptor) -> ValidationOutcome {
        let variable = descriptor
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("<unknown>")
            .to_lowercase();

        let mut failures = Vec::new();

        // CRS: exact EPSG equality; an unset CRS is a failure, not an error.
        let expected_epsg = self.schema.coordinate_reference_system;
        match descriptor.crs {
            Some(crs) if crs.epsg() == expected_epsg => {}
            Some(crs) => failures.push(PropertyFailure {
                property: ConformanceProperty::Crs,
                expected: format!("EPSG:{}", expected_epsg),
                found: crs.to_string(),
            }),
            None => failures.push(PropertyFailure {
                property: ConformanceProperty::Crs,
                expected: format!("EPSG:{}", expected_epsg),
                found: "none".to_string(),
            }),
        }

        // Resolution: per-axis comparison within the configured tolerance.
        let (rx, ry) = descriptor.resolution();
        let (tx, ty) = self.schema.spatial_resolution;
        if (rx - tx).abs() > self.resolution_tolerance
            || (ry - ty).abs() > self.resolution_tolerance
        {
            failures.push(PropertyFailure {
                property: ConformanceProperty::Resolution,
                expected: format!("({}, {})", tx, ty),
                found: format!("({}, {})", rx, ry),
            });
        }

        // Band count: fewer than the maximum is acceptable.
        let max_bands = self.schema.number_of_bands.max;
        if descriptor.band_count > max_bands {
            failures.push(PropertyFailure {
                property: ConformanceProperty::BandCount,
                expected: format!("at most {}", max_bands),
                found: descriptor.band_count.to_string(),
            });
        }

        ValidationOutcome { variable, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{BandLimits, CrsCode, GeoTransform};
    use std::path::PathBuf;

    fn schema() -> ConformanceSchema {
        ConformanceSchema {
            coordinate_reference_system: 27700,
            spatial_resolution: (10.0, 10.0),
            number_of_bands: BandLimits { max: 3 },
            default_crs: 27700,
        }
    }

    fn descriptor(
        crs: Option<CrsCode>,
        res: (f64, f64),
        band_count: usize,
    ) -> RasterDescriptor {
        RasterDescriptor {
            path: PathBuf::from("agb.tif"),
            width: 100,
            height: 100,
            band_count,
            crs,
            transform: GeoTransform::from_origin(350000.0, 520000.0, res.0, res.1),
            nodata: None,
        }
    }

    #[test]
    fn test_conformant_raster() {
        let outcome =
            Validator::new(schema()).validate(&descriptor(Some(CrsCode::Epsg27700), (10.0, 10.0), 1));
        assert!(outcome.conforms());
        assert_eq!(outcome.variable, "agb");
    }

    #[test]
    fn test_wrong_crs() {
        let outcome =
            Validator::new(schema()).validate(&descriptor(Some(CrsCode::Epsg4326), (10.0, 10.0), 1));
        assert!(!outcome.conforms());
        assert!(outcome.failed(ConformanceProperty::Crs));
        assert!(!outcome.failed(ConformanceProperty::Resolution));
        assert_eq!(outcome.failures[0].found, "EPSG:4326");
    }

    #[test]
    fn test_missing_crs_is_failure_not_error() {
        let outcome = Validator::new(schema()).validate(&descriptor(None, (10.0, 10.0), 1));
        assert!(outcome.failed(ConformanceProperty::Crs));
        assert_eq!(outcome.failures[0].found, "none");
    }

    #[test]
    fn test_wrong_resolution() {
        let outcome =
            Validator::new(schema()).validate(&descriptor(Some(CrsCode::Epsg27700), (5.0, 10.0), 1));
        assert!(outcome.failed(ConformanceProperty::Resolution));
    }

    #[test]
    fn test_exact_matching_rejects_noise() {
        let outcome = Validator::new(schema()).validate(&descriptor(
            Some(CrsCode::Epsg27700),
            (10.0 + 1e-9, 10.0),
            1,
        ));
        assert!(outcome.failed(ConformanceProperty::Resolution));
    }

    #[test]
    fn test_tolerance_accepts_noise() {
        let validator = Validator::new(schema()).with_resolution_tolerance(1e-6);
        let outcome = validator.validate(&descriptor(
            Some(CrsCode::Epsg27700),
            (10.0 + 1e-9, 10.0),
            1,
        ));
        assert!(!outcome.failed(ConformanceProperty::Resolution));
    }

    #[test]
    fn test_band_count_over_max() {
        let outcome =
            Validator::new(schema()).validate(&descriptor(Some(CrsCode::Epsg27700), (10.0, 10.0), 4));
        assert!(outcome.failed(ConformanceProperty::BandCount));
    }

    #[test]
    fn test_fewer_bands_acceptable() {
        let outcome =
            Validator::new(schema()).validate(&descriptor(Some(CrsCode::Epsg27700), (10.0, 10.0), 2));
        assert!(outcome.conforms());
    }

    #[test]
    fn test_all_failures_reported_together() {
        let outcome =
            Validator::new(schema()).validate(&descriptor(Some(CrsCode::Epsg4326), (5.0, 5.0), 9));
        assert_eq!(outcome.failures.len(), 3);
        assert!(outcome.failed(ConformanceProperty::Crs));
        assert!(outcome.failed(ConformanceProperty::Resolution));
        assert!(outcome.failed(ConformanceProperty::BandCount));
    }
}
