//! Raster file discovery helpers.
//!
//! The directory contract is a flat listing: fragments are grouped purely
//! by filename stem, extension `.tif` compared case-insensitively, and no
//! embedded tiling metadata is consulted.

use crate::{RasterError, RasterResult};
use std::path::{Path, PathBuf};

/// Check whether a path looks like a raster file (`.tif`, case-insensitive).
pub fn is_raster_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tif"))
        .unwrap_or(false)
}

/// Lowercased filename stem used as the logical variable name.
pub fn variable_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_lowercase())
}

/// List raster files directly inside `dir`, sorted by filename.
///
/// Fails with `DirectoryAccess` if the directory cannot be listed. An
/// empty result is not an error; callers decide whether that matters.
pub fn list_raster_files(dir: &Path) -> RasterResult<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).map_err(|source| RasterError::directory_access(dir, source))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RasterError::directory_access(dir, source))?;
        let path = entry.path();
        if path.is_file() && is_raster_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_raster_file() {
        assert!(is_raster_file(Path::new("agb.tif")));
        assert!(is_raster_file(Path::new("AGB.TIF")));
        assert!(!is_raster_file(Path::new("agb.png")));
        assert!(!is_raster_file(Path::new("agb")));
    }

    #[test]
    fn test_variable_stem() {
        assert_eq!(variable_stem(Path::new("/data/AGB.tif")).unwrap(), "agb");
        assert_eq!(variable_stem(Path::new("_P75.TIF")).unwrap(), "_p75");
    }

    #[test]
    fn test_list_raster_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["red.tif", "agb.tif", "notes.txt", "blue.TIF"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = list_raster_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["agb.tif", "blue.TIF", "red.tif"]);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let err = list_raster_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, RasterError::DirectoryAccess { .. }));
    }
}
