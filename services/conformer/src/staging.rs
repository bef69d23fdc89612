//! Staged working directories for raster files.
//!
//! Conformance corrections rewrite files in place, so the pipeline
//! never runs against the caller's directories. Inputs are copied into
//! a staging directory first and only moved to their final home after
//! the whole set is accepted.

use raster_common::{list_raster_files, RasterError, RasterResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies rasters into one directory and moves them out again.
pub struct RasterFileStager {
    dir: PathBuf,
}

impl RasterFileStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The staged raster files, sorted by name.
    pub fn raster_files(&self) -> RasterResult<Vec<PathBuf>> {
        list_raster_files(&self.dir)
    }

    /// Copy each source file into the staging directory, keeping its
    /// filename. An existing staged file of the same name is an error;
    /// the variable set contract forbids duplicates anyway.
    pub fn copy_into(&self, sources: &[PathBuf]) -> RasterResult<()> {
        for src in sources {
            let name = src.file_name().ok_or_else(|| {
                RasterError::raster_io(src, "source path has no file name")
            })?;
            let dest = self.dir.join(name);
            if dest.exists() {
                return Err(RasterError::raster_io(
                    &dest,
                    "staging directory already contains a file with this name",
                ));
            }
            std::fs::copy(src, &dest)
                .map_err(|e| RasterError::raster_io(src, format!("cannot stage file: {}", e)))?;
            debug!(src = %src.display(), dest = %dest.display(), "staged raster");
        }
        Ok(())
    }

    /// Move every staged raster into `dest_dir`.
    ///
    /// Implemented as copy plus remove rather than rename, since the
    /// staging directory often lives on a different filesystem (a
    /// system temp dir) than the destination.
    pub fn move_into(&self, dest_dir: &Path) -> RasterResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dest_dir)
            .map_err(|source| RasterError::directory_access(dest_dir, source))?;

        let mut moved = Vec::new();
        for src in self.raster_files()? {
            let name = src.file_name().ok_or_else(|| {
                RasterError::raster_io(&src, "staged path has no file name")
            })?;
            let dest = dest_dir.join(name);
            std::fs::copy(&src, &dest)
                .map_err(|e| RasterError::raster_io(&src, format!("cannot move file: {}", e)))?;
            std::fs::remove_file(&src)
                .map_err(|e| RasterError::raster_io(&src, format!("cannot remove staged file: {}", e)))?;
            moved.push(dest);
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_then_move() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("input");
        let staging = root.path().join("staging");
        let final_dir = root.path().join("final");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&staging).unwrap();

        std::fs::write(input.join("agb.tif"), b"agb").unwrap();
        std::fs::write(input.join("ele.tif"), b"ele").unwrap();

        let stager = RasterFileStager::new(&staging);
        stager
            .copy_into(&[input.join("agb.tif"), input.join("ele.tif")])
            .unwrap();
        assert_eq!(stager.raster_files().unwrap().len(), 2);

        let moved = stager.move_into(&final_dir).unwrap();
        assert_eq!(moved.len(), 2);
        assert!(final_dir.join("agb.tif").exists());
        assert!(stager.raster_files().unwrap().is_empty());
        // Originals are untouched.
        assert!(input.join("agb.tif").exists());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let root = tempfile::tempdir().unwrap();
        let a = root.path().join("a");
        let b = root.path().join("b");
        let staging = root.path().join("staging");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(a.join("agb.tif"), b"one").unwrap();
        std::fs::write(b.join("agb.tif"), b"two").unwrap();

        let stager = RasterFileStager::new(&staging);
        stager.copy_into(&[a.join("agb.tif")]).unwrap();
        let err = stager.copy_into(&[b.join("agb.tif")]).unwrap_err();
        assert!(matches!(err, RasterError::RasterIo { .. }));
    }
}
