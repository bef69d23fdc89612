//! GeoTIFF reading and writing for the conformance pipeline.
//!
//! This is a deliberate subset of the format, implemented in-tree rather
//! than bound to GDAL: uncompressed 32-bit float samples, strip layout,
//! pixel-scale/tiepoint georeferencing, EPSG codes via the GeoKey
//! directory, and the GDAL ASCII nodata tag. That covers every raster
//! the extraction tools produce while keeping byte-level control over
//! what lands on disk.
//!
//! The [`RasterDataset`] handle owns a fully decoded raster for the
//! duration of one operation; dropping it releases everything, so no
//! file handle outlives an operation on any exit path.

mod decoder;
mod encoder;
mod tags;

pub mod dataset;

pub use dataset::{read_descriptor, RasterDataset};
