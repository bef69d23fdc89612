//! Validate, correct once, re-validate, accept or reject.

use crate::transformer;
use crate::validator::{ValidationOutcome, Validator};
use raster_common::{ConformanceSchema, CrsCode, RasterError, RasterResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a variable stands in the conformance process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableState {
    Pending,
    NeedsCorrection,
    Corrected,
    Accepted,
    Rejected,
}

/// Outcome of processing one variable's raster.
#[derive(Debug, Clone)]
pub struct VariableReport {
    pub variable: String,
    pub path: PathBuf,
    pub state: VariableState,
    /// Whether any correction actually rewrote the file.
    pub corrected: bool,
    /// Failing properties after the final validation, empty on acceptance.
    pub details: String,
}

impl VariableReport {
    pub fn accepted(&self) -> bool {
        self.state == VariableState::Accepted
    }
}

/// Drives each raster through validation and a single correction round.
///
/// A raster that fails validation gets one shot at conformance: a
/// reprojection followed by a resampling, each of which skips itself
/// when its precondition already holds. The corrected file is
/// re-validated and either accepted or rejected for good; there is no
/// second correction round, so a failure the transforms cannot fix
/// (such as too many bands) rejects deterministically.
pub struct ConformancePipeline {
    validator: Validator,
    target_crs: CrsCode,
    target_resolution: (f64, f64),
    resolution_tolerance: f64,
}

impl ConformancePipeline {
    pub fn new(schema: ConformanceSchema, resolution_tolerance: f64) -> RasterResult<Self> {
        let target_crs = schema.target_crs()?;
        let target_resolution = schema.spatial_resolution;
        Ok(Self {
            validator: Validator::new(schema).with_resolution_tolerance(resolution_tolerance),
            target_crs,
            target_resolution,
            resolution_tolerance,
        })
    }

    /// Process one raster file through the state machine.
    ///
    /// Only I/O and transform computation failures surface as errors;
    /// a nonconforming raster is a `Rejected` report, not an error.
    pub fn process_variable(&self, path: &Path) -> RasterResult<VariableReport> {
        let state = VariableState::Pending;
        let descriptor = geotiff::read_descriptor(path)?;
        let outcome = self.validator.validate(&descriptor);
        let variable = outcome.variable.clone();
        debug!(variable = %variable, state = ?state, "validating raster");

        if outcome.conforms() {
            info!(variable = %variable, "raster conforms");
            return Ok(self.report(variable, path, VariableState::Accepted, false, &outcome));
        }

        // No CRS means no reprojection source. The orchestrator's
        // bootstrap assigns a default before the pipeline runs, so a
        // raster still lacking one here is rejected, not corrected.
        if descriptor.crs.is_none() {
            warn!(variable = %variable, "raster has no CRS, rejecting");
            return Ok(self.report(variable, path, VariableState::Rejected, false, &outcome));
        }

        let state = VariableState::NeedsCorrection;
        warn!(
            variable = %variable,
            state = ?state,
            failures = %outcome.summary(),
            "raster needs correction"
        );

        // Each correction skips itself when its own property already
        // conforms, so a failure neither transform addresses leaves the
        // file untouched and the re-validation rejects it.
        let reprojected = transformer::reproject(path, self.target_crs)?;
        let resampled =
            transformer::resample(path, self.target_resolution, self.resolution_tolerance)?;
        let corrected = reprojected || resampled;

        let state = VariableState::Corrected;
        let descriptor = geotiff::read_descriptor(path)?;
        let outcome = self.validator.validate(&descriptor);
        debug!(variable = %variable, state = ?state, "re-validating raster");
        if outcome.conforms() {
            info!(variable = %variable, "raster conforms after correction");
            Ok(self.report(variable, path, VariableState::Accepted, corrected, &outcome))
        } else {
            warn!(
                variable = %variable,
                failures = %outcome.summary(),
                "raster rejected after correction"
            );
            Ok(self.report(variable, path, VariableState::Rejected, corrected, &outcome))
        }
    }

    /// Process every raster in a directory, failing fast on the first
    /// rejection.
    ///
    /// Files are processed in sorted name order so a directory with
    /// several nonconforming rasters always reports the same one.
    pub fn run_directory(&self, dir: &Path) -> RasterResult<Vec<VariableReport>> {
        let files = raster_common::list_raster_files(dir)?;
        let mut reports = Vec::with_capacity(files.len());

        for path in files {
            let report = self.process_variable(&path)?;
            if !report.accepted() {
                return Err(RasterError::ConformanceRejected {
                    variable: report.variable,
                    details: report.details,
                });
            }
            reports.push(report);
        }

        info!(count = reports.len(), "all rasters conform to the schema");
        Ok(reports)
    }

    fn report(
        &self,
        variable: String,
        path: &Path,
        state: VariableState,
        corrected: bool,
        outcome: &ValidationOutcome,
    ) -> VariableReport {
        VariableReport {
            variable,
            path: path.to_path_buf(),
            state,
            corrected,
            details: outcome.summary(),
        }
    }
}
