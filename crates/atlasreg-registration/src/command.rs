//! Typed command lines for the external registration toolkit.
//!
//! Commands are kept as an ordered program + argument list and handed to
//! [`std::process::Command`] directly, so paths are never re-parsed by a
//! shell. The [`Display`](fmt::Display) rendering is only used for logs and
//! error messages.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::params::RegistrationParameters;
use crate::paths::{InputImages, PathSet};
use crate::registration::Stage;
use crate::sanitise::SanitisedInputs;

/// Floating image flag.
pub const FLOATING: &str = "-flo";
/// Reference image flag.
pub const REFERENCE: &str = "-ref";
/// Affine matrix flag.
pub const AFFINE: &str = "-aff";
/// Control point grid flag.
pub const CONTROL_POINTS: &str = "-cpp";
/// Result image flag.
pub const RESULT: &str = "-res";
/// Affine inversion flag, followed by input and output matrix.
pub const INVERT_AFFINE: &str = "-invAff";
/// OpenMP thread count flag.
pub const OPENMP: &str = "-omp";

/// A program and its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append a `flag value` pair.
    pub fn flag(self, name: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(name).arg(value)
    }

    /// Append a pre-formatted parameter fragment such as `" -ln 6 -lp 5 "`.
    pub fn param_fragment(mut self, fragment: &str) -> Self {
        self.args
            .extend(fragment.trim().split_whitespace().map(OsString::from));
        self
    }

    /// Append `-omp <n>` when a thread count is set.
    pub fn openmp(self, threads: Option<OpenMpThreads>) -> Self {
        match threads {
            Some(threads) => self.flag(OPENMP, threads.to_string()),
            None => self,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Build a process invocation without going through a shell.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Thread count passed to the toolkit, fixed when the pipeline is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenMpThreads(NonZeroUsize);

impl OpenMpThreads {
    /// `None` for a zero count.
    pub fn new(n_processes: usize) -> Option<Self> {
        NonZeroUsize::new(n_processes).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for OpenMpThreads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds the command line of every stage from the job's fixed state.
///
/// All builders are pure: the same parameters, paths, images and thread
/// count always render the same command.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    params: RegistrationParameters,
    paths: PathSet,
    images: InputImages,
    threads: Option<OpenMpThreads>,
}

impl CommandBuilder {
    pub fn new(
        params: RegistrationParameters,
        paths: PathSet,
        images: SanitisedInputs,
        threads: Option<OpenMpThreads>,
    ) -> Self {
        Self {
            params,
            paths,
            images: images.into_inner(),
            threads,
        }
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn images(&self) -> &InputImages {
        &self.images
    }

    /// Atlas brain (floating) onto the sample (reference).
    pub fn affine(&self) -> CommandLine {
        CommandLine::new(self.params.affine_reg_program_path())
            .param_fragment(&self.params.format_affine_params())
            .flag(FLOATING, &self.images.atlas_brain)
            .flag(REFERENCE, &self.images.dataset)
            .flag(AFFINE, &self.paths.affine_matrix)
            .flag(RESULT, &self.paths.affine_registered_atlas_brain)
            .openmp(self.threads)
    }

    /// Elastic refinement of the affine alignment.
    pub fn freeform(&self) -> CommandLine {
        CommandLine::new(self.params.freeform_reg_program_path())
            .param_fragment(&self.params.format_freeform_params())
            .flag(AFFINE, &self.paths.affine_matrix)
            .flag(FLOATING, &self.images.atlas_brain)
            .flag(REFERENCE, &self.images.dataset)
            .flag(CONTROL_POINTS, &self.paths.control_point_file)
            .flag(RESULT, &self.paths.freeform_registered_atlas_brain)
            .openmp(self.threads)
    }

    pub fn inverse_affine(&self) -> CommandLine {
        CommandLine::new(self.params.transform_program_path())
            .arg(INVERT_AFFINE)
            .arg(&self.paths.affine_matrix)
            .arg(&self.paths.invert_affine_matrix)
    }

    /// Sample (floating) back onto the atlas brain, seeded with the inverted affine.
    pub fn inverse_freeform(&self) -> CommandLine {
        CommandLine::new(self.params.freeform_reg_program_path())
            .param_fragment(&self.params.format_freeform_params())
            .flag(AFFINE, &self.paths.invert_affine_matrix)
            .flag(FLOATING, &self.images.dataset)
            .flag(REFERENCE, &self.images.atlas_brain)
            .flag(CONTROL_POINTS, &self.paths.inverse_control_point_file)
            .flag(RESULT, &self.paths.inverse_freeform_registered_atlas_brain)
            .openmp(self.threads)
    }

    /// Resample `floating` into sample space with the freeform control points.
    pub fn propagation(&self, floating: &Path, destination: &Path) -> CommandLine {
        CommandLine::new(self.params.segmentation_program_path())
            .param_fragment(&self.params.format_segmentation_params())
            .flag(CONTROL_POINTS, &self.paths.control_point_file)
            .flag(FLOATING, floating)
            .flag(REFERENCE, &self.images.dataset)
            .flag(RESULT, destination)
    }

    pub fn segmentation(&self) -> CommandLine {
        self.propagation(&self.images.atlas, &self.paths.registered_atlas)
    }

    pub fn hemispheres(&self) -> CommandLine {
        self.propagation(&self.images.hemispheres, &self.paths.registered_hemispheres)
    }

    /// The command a stage runs.
    pub fn command_for(&self, stage: Stage) -> CommandLine {
        match stage {
            Stage::Affine => self.affine(),
            Stage::Freeform => self.freeform(),
            Stage::InverseAffine => self.inverse_affine(),
            Stage::InverseFreeform => self.inverse_freeform(),
            Stage::Segmentation => self.segmentation(),
            Stage::Hemispheres => self.hemispheres(),
        }
    }
}
