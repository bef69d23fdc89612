//! Shared types for the raster conformance workspace.
//!
//! This crate holds the leaf vocabulary used by every other crate:
//! bounding boxes, CRS codes, geotransforms, raster descriptors, the
//! conformance schema, the expected-variable contract, and the workspace
//! error type.

pub mod bbox;
pub mod crs;
pub mod descriptor;
pub mod error;
pub mod files;
pub mod grid;
pub mod schema;
pub mod variable;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use descriptor::RasterDescriptor;
pub use error::{RasterError, RasterResult};
pub use files::{list_raster_files, variable_stem};
pub use grid::GeoTransform;
pub use schema::{BandLimits, ConformanceSchema};
pub use variable::{ExpectedVariableSet, EXPECTED_VARIABLES};
