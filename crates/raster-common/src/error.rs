//! Error types shared across the conformance workspace.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for raster conformance operations.
#[derive(Debug, Error)]
pub enum RasterError {
    /// A required directory is missing or unreadable. Fatal for the run.
    #[error("cannot access directory {path}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The working directory's variable names do not match the expected set.
    #[error("variable set mismatch: missing {missing:?}, unexpected {extra:?}")]
    VariableSetMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    /// A raster file cannot be opened, read, or written.
    #[error("raster I/O error for {path}: {message}")]
    RasterIo { path: PathBuf, message: String },

    /// Reprojection cannot produce a valid target grid.
    #[error("cannot compute reprojection grid for {path}: {message}")]
    TransformComputation { path: PathBuf, message: String },

    /// A variable still fails validation after the single correction attempt.
    #[error("variable '{variable}' rejected: {details}")]
    ConformanceRejected { variable: String, details: String },

    /// Schema file load or persist failure.
    #[error("schema error: {0}")]
    Schema(String),

    /// Coordinate transform failure between two CRSs.
    #[error("projection error: {0}")]
    Projection(String),

    /// An EPSG code outside the supported set.
    #[error("unsupported CRS: EPSG:{0}")]
    UnsupportedCrs(u32),
}

impl RasterError {
    /// Create a RasterIo error for the given file.
    pub fn raster_io(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::RasterIo {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a TransformComputation error for the given file.
    pub fn transform_computation(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::TransformComputation {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a DirectoryAccess error.
    pub fn directory_access(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::DirectoryAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<crate::crs::CrsParseError> for RasterError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        match err {
            crate::crs::CrsParseError::UnsupportedEpsg(code) => RasterError::UnsupportedCrs(code),
        }
    }
}
