//! Shared test fixtures for the raster conformance workspace.

pub mod generators;

pub use generators::{create_test_grid, temp_raster_dir, write_test_raster, RasterSpec};
