//! The registration pipeline controller.
//!
//! A job aligns the average brain of an atlas to a sample brain (affine,
//! then freeform), derives the inverse transforms, and propagates the atlas
//! and hemisphere label volumes onto the sample with the freeform control
//! points. Every stage is one blocking call to an external toolkit program.
//!
//! ```text
//! Affine -> Freeform -> InverseAffine -> InverseFreeform
//!              |
//!              +-----> Segmentation, Hemispheres
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::command::{CommandBuilder, CommandLine, OpenMpThreads};
use crate::config::RegistrationConfig;
use crate::error::{PipelineError, RegistrationError, Result, SegmentationError};
use crate::executor::{CommandRunner, ExecutionError, ProcessRunner};
use crate::params::RegistrationParameters;
use crate::paths::{InputImages, PathSet, StageLogs};
use crate::progress::{StageCallback, StageTracker, TracingCallback};
use crate::sanitise::{sanitise_inputs, FormatConverter, SanitisedInputs, TiffStackConverter};
use crate::validation::validate_process_count;

/// One step of a registration job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Affine,
    Freeform,
    InverseAffine,
    InverseFreeform,
    Segmentation,
    Hemispheres,
}

impl Stage {
    /// Every stage, in full-run order.
    pub const ALL: [Stage; 6] = [
        Stage::Affine,
        Stage::Freeform,
        Stage::InverseAffine,
        Stage::InverseFreeform,
        Stage::Segmentation,
        Stage::Hemispheres,
    ];

    /// The stage whose outputs this stage reads.
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Stage::Affine => None,
            Stage::Freeform => Some(Stage::Affine),
            Stage::InverseAffine => Some(Stage::Freeform),
            Stage::InverseFreeform => Some(Stage::InverseAffine),
            Stage::Segmentation | Stage::Hemispheres => Some(Stage::Freeform),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Affine => "Affine registration",
            Stage::Freeform => "Freeform registration",
            Stage::InverseAffine => "Generation of inverted affine transform",
            Stage::InverseFreeform => "Inverse freeform registration",
            Stage::Segmentation => "Segmentation",
            Stage::Hemispheres => "Hemisphere segmentation",
        };
        f.write_str(name)
    }
}

/// How [`BrainRegistration::run_all`] runs the two branches that follow the
/// freeform stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchExecution {
    /// Inverse transforms, then segmentation, then hemispheres.
    #[default]
    Sequential,
    /// Inverse transforms alongside label propagation.
    Concurrent,
}

/// Registers an atlas to a sample brain with the external toolkit.
pub struct BrainRegistration<R: CommandRunner = ProcessRunner> {
    commands: CommandBuilder,
    runner: R,
    tracker: StageTracker,
    completed: Mutex<Vec<Stage>>,
}

impl BrainRegistration<ProcessRunner> {
    /// Validate configuration and inputs, then build a controller that runs
    /// real processes.
    ///
    /// Fails with [`PipelineError::MissingInput`] before anything is written
    /// if an input image is absent, even when the configuration is also bad.
    pub fn prepare(
        config: &RegistrationConfig,
        paths: PathSet,
        images: &InputImages,
        n_processes: Option<usize>,
    ) -> std::result::Result<Self, PipelineError> {
        Self::prepare_with(config, paths, images, n_processes, &TiffStackConverter, ProcessRunner)
    }
}

impl<R: CommandRunner> BrainRegistration<R> {
    /// Stage transitions are logged through `tracing` from the start; further
    /// callbacks are added with [`with_callback`](BrainRegistration::with_callback).
    pub fn new(
        params: RegistrationParameters,
        paths: PathSet,
        inputs: SanitisedInputs,
        threads: Option<OpenMpThreads>,
        runner: R,
    ) -> Self {
        let mut tracker = StageTracker::new();
        tracker.add_callback(Arc::new(TracingCallback));
        Self {
            commands: CommandBuilder::new(params, paths, inputs, threads),
            runner,
            tracker,
            completed: Mutex::new(Vec::new()),
        }
    }

    /// [`prepare`](BrainRegistration::prepare) with an explicit converter and runner.
    pub fn prepare_with(
        config: &RegistrationConfig,
        paths: PathSet,
        images: &InputImages,
        n_processes: Option<usize>,
        converter: &dyn FormatConverter,
        runner: R,
    ) -> std::result::Result<Self, PipelineError> {
        // Missing inputs are reported ahead of any configuration problem.
        let inputs = sanitise_inputs(images, converter)?;
        let threads = validate_process_count(n_processes)?;
        let params = RegistrationParameters::from_config(config)?;
        Ok(Self::new(params, paths, inputs, threads, runner))
    }

    /// Register a callback for stage events.
    pub fn with_callback(mut self, callback: Arc<dyn StageCallback>) -> Self {
        self.tracker.add_callback(callback);
        self
    }

    pub fn commands(&self) -> &CommandBuilder {
        &self.commands
    }

    pub fn paths(&self) -> &PathSet {
        self.commands.paths()
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Stages that have succeeded so far, in completion order.
    pub fn completed_stages(&self) -> Vec<Stage> {
        self.completed.lock().unwrap().clone()
    }

    pub fn is_complete(&self, stage: Stage) -> bool {
        self.completed.lock().unwrap().contains(&stage)
    }

    fn missing_predecessor(&self, stage: Stage) -> Option<Stage> {
        stage.predecessor().filter(|p| !self.is_complete(*p))
    }

    fn execute(
        &self,
        stage: Stage,
        command: CommandLine,
        logs: &StageLogs,
    ) -> std::result::Result<(), ExecutionError> {
        self.tracker.track(stage, || {
            self.runner.run(&command, &logs.stdout, &logs.stderr)
        })?;

        let mut completed = self.completed.lock().unwrap();
        if !completed.contains(&stage) {
            completed.push(stage);
        }
        Ok(())
    }

    fn run_registration_stage(&self, stage: Stage, logs: &StageLogs) -> Result<()> {
        if let Some(missing) = self.missing_predecessor(stage) {
            return Err(RegistrationError::OutOfOrder { stage, missing });
        }
        self.execute(stage, self.commands.command_for(stage), logs)
            .map_err(|e| RegistrationError::stage_failed(stage, e))
    }

    fn run_propagation_stage(&self, stage: Stage) -> std::result::Result<(), SegmentationError> {
        if let Some(missing) = self.missing_predecessor(stage) {
            return Err(SegmentationError::OutOfOrder { stage, missing });
        }
        let command = self.commands.command_for(stage);
        self.execute(stage, command, &self.paths().segmentation_logs)
            .map_err(|e| SegmentationError::propagation_failed(stage, e))
    }

    /// Affine registration of the atlas brain to the sample.
    pub fn register_affine(&self) -> Result<()> {
        self.run_registration_stage(Stage::Affine, &self.paths().affine_logs)
    }

    /// Freeform (elastic) registration of the atlas brain to the sample.
    pub fn register_freeform(&self) -> Result<()> {
        self.run_registration_stage(Stage::Freeform, &self.paths().freeform_logs)
    }

    /// Invert the affine matrix so the sample can be mapped onto the atlas.
    pub fn generate_inverse_affine(&self) -> Result<()> {
        self.run_registration_stage(Stage::InverseAffine, &self.paths().invert_affine_logs)
    }

    /// Freeform registration of the sample onto the atlas brain.
    pub fn register_inverse_freeform(&self) -> Result<()> {
        self.run_registration_stage(Stage::InverseFreeform, &self.paths().inverse_freeform_logs)
    }

    pub fn generate_inverse_transforms(&self) -> Result<()> {
        self.generate_inverse_affine()?;
        self.register_inverse_freeform()
    }

    /// Propagate the atlas labels onto the sample.
    pub fn segment(&self) -> std::result::Result<(), SegmentationError> {
        self.run_propagation_stage(Stage::Segmentation)
    }

    /// Propagate the hemisphere labels onto the sample.
    pub fn register_hemispheres(&self) -> std::result::Result<(), SegmentationError> {
        self.run_propagation_stage(Stage::Hemispheres)
    }

    /// Run every stage of a job, stopping at the first failure.
    pub fn run_all(&self, branches: BranchExecution) -> std::result::Result<(), PipelineError> {
        self.register_affine()?;
        self.register_freeform()?;

        match branches {
            BranchExecution::Sequential => {
                self.generate_inverse_transforms()?;
                self.segment()?;
                self.register_hemispheres()?;
            }
            BranchExecution::Concurrent => {
                let (inverse, labels) = rayon::join(
                    || self.generate_inverse_transforms(),
                    || self.segment().and_then(|_| self.register_hemispheres()),
                );
                inverse?;
                labels?;
            }
        }
        Ok(())
    }
}
