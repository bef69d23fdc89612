//! Schema conformance for raster working sets.
//!
//! Three collaborators around one state machine: the [`Validator`]
//! checks a raster's metadata against the schema and reports the full
//! set of failing properties; the [`transformer`] corrects geometry
//! (reprojection, then resampling); and the [`ConformancePipeline`]
//! drives validate, correct once, re-validate, accept or reject.

pub mod pipeline;
pub mod sampling;
pub mod transformer;
pub mod validator;

pub use pipeline::{ConformancePipeline, VariableReport, VariableState};
pub use validator::{ConformanceProperty, PropertyFailure, ValidationOutcome, Validator};
