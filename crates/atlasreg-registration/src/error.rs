//! Error types for the registration pipeline.
//!
//! Stage failures are split by the kind of stage that raised them:
//! [`RegistrationError`] for the registration and transform-inversion stages,
//! [`SegmentationError`] for label propagation. [`PipelineError`] is the
//! job-level error, and carries the one failure that is deliberately outside
//! both hierarchies: a missing input image.

use std::path::PathBuf;
use thiserror::Error;

use crate::executor::ExecutionError;
use crate::registration::Stage;

/// Errors raised by registration stages and input validation.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// An input image is neither canonical nor convertible.
    #[error("Cannot perform registration, image {} not in supported format", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The external program for a stage failed.
    #[error("{stage} failed; {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: ExecutionError,
    },

    /// A stage was invoked before the stage it depends on completed.
    #[error("{stage} requires {missing} to have completed first")]
    OutOfOrder { stage: Stage, missing: Stage },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors raised while propagating label volumes onto the sample.
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// The label propagation program failed.
    #[error("{stage} failed; {source}")]
    PropagationFailed {
        stage: Stage,
        #[source]
        source: ExecutionError,
    },

    /// Propagation was invoked before the control points existed.
    #[error("{stage} requires {missing} to have completed first")]
    OutOfOrder { stage: Stage, missing: Stage },
}

/// Job-level error.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input image does not exist. Fatal; the job must stop.
    #[error("Cannot perform registration, image {} not found", .0.display())]
    MissingInput(PathBuf),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    /// Raised by the format converter, passed through unchanged.
    #[error(transparent)]
    Conversion(#[from] anyhow::Error),
}

/// Result type for registration stages.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create an unsupported-format error.
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat(path.into())
    }

    /// Wrap an executor failure for `stage`.
    pub fn stage_failed(stage: Stage, source: ExecutionError) -> Self {
        Self::StageFailed { stage, source }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

impl SegmentationError {
    /// Wrap an executor failure for `stage`.
    pub fn propagation_failed(stage: Stage, source: ExecutionError) -> Self {
        Self::PropagationFailed { stage, source }
    }
}

impl PipelineError {
    /// True for the configuration errors that must halt the whole job.
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }
}
