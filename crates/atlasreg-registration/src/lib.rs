pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod params;
pub mod paths;
pub mod progress;
pub mod registration;
pub mod sanitise;
pub mod validation;

pub use command::{CommandBuilder, CommandLine, OpenMpThreads};
pub use config::RegistrationConfig;
pub use error::{PipelineError, RegistrationError, Result, SegmentationError};
pub use executor::{CommandRunner, ExecutionError, ProcessRunner};
pub use params::{
    AffineParams, FreeformParams, RegistrationParameters, SegmentationParams, ToolkitPrograms,
};
pub use paths::{InputImages, PathSet, StageLogs};
pub use progress::{HistoryCallback, StageCallback, StageEvent, StageTracker, TracingCallback};
pub use registration::{BranchExecution, BrainRegistration, Stage};
pub use sanitise::{sanitise_inputs, FormatConverter, SanitisedInputs, TiffStackConverter};
