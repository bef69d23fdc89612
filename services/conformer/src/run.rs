//! End-to-end orchestration of one conformance run.
//!
//! Mosaic the fragment directories, bootstrap missing CRSs, learn the
//! target resolution into the schema, stage everything into a scratch
//! directory, enforce the variable set contract, run the conformance
//! pipeline, and finally move the accepted set into place. Any failure
//! leaves the caller's input directories untouched.

use crate::staging::RasterFileStager;
use anyhow::{bail, Context, Result};
use conformance::ConformancePipeline;
use geotiff::RasterDataset;
use mosaic::build_mosaics;
use raster_common::{variable_stem, ConformanceSchema, ExpectedVariableSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory the mosaics are built into, next to the fragment tiles.
const MOSAIC_DIR_NAME: &str = "lidar_raster";
/// Default destination for the accepted set, next to the raster dir.
const FINAL_DIR_NAME: &str = "final_variable";

pub struct RunConfig {
    pub fragment_dirs: Vec<PathBuf>,
    pub raster_dir: PathBuf,
    pub schema_path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub resolution_tolerance: f64,
}

pub fn execute(config: &RunConfig) -> Result<()> {
    let schema = ConformanceSchema::load(&config.schema_path)
        .with_context(|| format!("loading schema {}", config.schema_path.display()))?;

    // 1. Mosaic the per-tile fragments into one raster per variable.
    let first_fragment_dir = config
        .fragment_dirs
        .first()
        .context("at least one fragment directory is required")?;
    let mosaic_dir = sibling_dir(first_fragment_dir, MOSAIC_DIR_NAME)?;
    let mosaics = build_mosaics(&config.fragment_dirs, &mosaic_dir)?;
    if mosaics.is_empty() {
        bail!("no raster fragments found under the fragment directories");
    }

    // 2. Mosaics without a CRS get the schema's default before any
    // validation sees them; a reprojection needs a source CRS.
    let bootstrap_crs = schema.bootstrap_crs()?;
    for path in &mosaics {
        let descriptor = geotiff::read_descriptor(path)?;
        if descriptor.crs.is_none() {
            let mut dataset = RasterDataset::open(path)?;
            dataset.set_crs(bootstrap_crs);
            dataset.write_to(path)?;
            info!(path = %path.display(), crs = %bootstrap_crs, "assigned default CRS");
        }
    }

    // 3. Learn the target resolution from the first mosaic and persist
    // it, so later runs validate against the same grid.
    let reference = geotiff::read_descriptor(&mosaics[0])?;
    let schema = schema.with_resolution(reference.resolution());
    schema.persist(&config.schema_path)?;
    info!(
        reference = %mosaics[0].display(),
        resolution = ?schema.spatial_resolution,
        "learned target resolution"
    );

    // 4. Stage mosaics and the pre-existing rasters together; all
    // corrections happen on the staged copies.
    let scratch = tempfile::tempdir().context("creating staging directory")?;
    let stager = RasterFileStager::new(scratch.path());
    stager.copy_into(&mosaics)?;
    stager.copy_into(&raster_common::list_raster_files(&config.raster_dir)?)?;

    // 5. The staged set must contain exactly the expected variables.
    let staged = stager.raster_files()?;
    let stems: Vec<String> = staged.iter().filter_map(|p| variable_stem(p)).collect();
    ExpectedVariableSet::default().check(&stems)?;

    // 6. Validate and correct every variable; the first rejection or
    // I/O failure aborts the run with the scratch directory dropped.
    let pipeline = ConformancePipeline::new(schema, config.resolution_tolerance)?;
    let reports = pipeline.run_directory(stager.dir())?;
    let corrected = reports.iter().filter(|r| r.corrected).count();

    // 7. Move the accepted set into its final home. The destination is
    // rebuilt from scratch so stale variables from earlier runs cannot
    // leak into the output.
    let final_dir = match &config.output_dir {
        Some(dir) => dir.clone(),
        None => sibling_dir(&config.raster_dir, FINAL_DIR_NAME)?,
    };
    if final_dir.exists() {
        std::fs::remove_dir_all(&final_dir)
            .with_context(|| format!("clearing {}", final_dir.display()))?;
    }
    let moved = stager.move_into(&final_dir)?;

    info!(
        variables = moved.len(),
        corrected,
        dest = %final_dir.display(),
        "conformance run complete"
    );
    Ok(())
}

fn sibling_dir(path: &Path, name: &str) -> Result<PathBuf> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    Ok(parent.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{BandLimits, RasterError, EXPECTED_VARIABLES};
    use test_utils::{write_test_raster, RasterSpec};

    fn write_schema(path: &Path) {
        ConformanceSchema {
            coordinate_reference_system: 4326,
            spatial_resolution: (0.0, 0.0),
            number_of_bands: BandLimits { max: 3 },
            default_crs: 4326,
        }
        .persist(path)
        .unwrap();
    }

    #[test]
    fn test_execute_full_run_rebuilds_final_dir() {
        let root = tempfile::tempdir().unwrap();
        let tiles = root.path().join("tiles");
        let raster_dir = root.path().join("rasters");
        std::fs::create_dir_all(&tiles).unwrap();
        std::fs::create_dir_all(&raster_dir).unwrap();

        // Twelve variables arrive as fragments, one pre-built raster.
        for name in EXPECTED_VARIABLES.iter().filter(|&&n| n != "red") {
            write_test_raster(&tiles.join(format!("{}.tif", name)), &RasterSpec::default());
        }
        write_test_raster(&raster_dir.join("red.tif"), &RasterSpec::default());

        let schema_path = root.path().join("schema.json");
        write_schema(&schema_path);

        // Stale output from an earlier run must not survive.
        let final_dir = root.path().join(FINAL_DIR_NAME);
        std::fs::create_dir_all(&final_dir).unwrap();
        std::fs::write(final_dir.join("stale.tif"), b"stale").unwrap();

        execute(&RunConfig {
            fragment_dirs: vec![tiles.clone()],
            raster_dir,
            schema_path: schema_path.clone(),
            output_dir: None,
            resolution_tolerance: 0.0,
        })
        .unwrap();

        let outputs = raster_common::list_raster_files(&final_dir).unwrap();
        assert_eq!(outputs.len(), EXPECTED_VARIABLES.len());
        assert!(!final_dir.join("stale.tif").exists());

        // Mosaics land next to the fragment tiles.
        assert!(root.path().join(MOSAIC_DIR_NAME).join("agb.tif").exists());
        // The learned resolution was persisted back to the schema file.
        let learned = ConformanceSchema::load(&schema_path).unwrap();
        assert_eq!(learned.spatial_resolution, (0.01, 0.01));
        // Inputs are untouched.
        assert!(tiles.join("agb.tif").exists());
    }

    #[test]
    fn test_execute_incomplete_set_aborts_before_output() {
        let root = tempfile::tempdir().unwrap();
        let tiles = root.path().join("tiles");
        let raster_dir = root.path().join("rasters");
        std::fs::create_dir_all(&tiles).unwrap();
        std::fs::create_dir_all(&raster_dir).unwrap();
        write_test_raster(&tiles.join("agb.tif"), &RasterSpec::default());

        let schema_path = root.path().join("schema.json");
        write_schema(&schema_path);

        let err = execute(&RunConfig {
            fragment_dirs: vec![tiles],
            raster_dir,
            schema_path,
            output_dir: None,
            resolution_tolerance: 0.0,
        })
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RasterError>(),
            Some(RasterError::VariableSetMismatch { .. })
        ));
        assert!(!root.path().join(FINAL_DIR_NAME).exists());
    }
}
