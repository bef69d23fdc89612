//! Mosaic building: grouping raster fragments by logical variable and
//! merging same-name fragments into one raster per variable.

pub mod builder;
pub mod merge;

pub use builder::{build_mosaics, collect_groups, VariableGroup};
pub use merge::merge_fragments;
