use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use atlasreg_registration::{
    BranchExecution, BrainRegistration, InputImages, PathSet, PipelineError, RegistrationConfig,
    Stage,
};

mod spinner;

use spinner::SpinnerCallback;

#[derive(Parser)]
#[command(name = "atlasreg")]
#[command(about = "Register a brain atlas to a sample with an external registration toolkit")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every registration stage
    Register {
        #[command(flatten)]
        job: JobArgs,

        /// Run the inverse transforms alongside label propagation
        #[arg(long)]
        parallel_branches: bool,
    },

    /// Print the command each stage would run
    ShowCommands {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Convert a TIFF stack to NIfTI
    Convert {
        /// TIFF stack to convert
        source: PathBuf,

        /// Output file (defaults to the source with a .nii extension)
        destination: Option<PathBuf>,
    },
}

#[derive(Args)]
struct JobArgs {
    /// Downsampled sample brain
    #[arg(long)]
    dataset: PathBuf,

    /// Average brain of the atlas
    #[arg(long)]
    atlas_brain: PathBuf,

    /// Atlas label volume
    #[arg(long)]
    atlas: PathBuf,

    /// Hemisphere label volume
    #[arg(long)]
    hemispheres: PathBuf,

    /// Directory for registration outputs and logs
    #[arg(short, long, default_value = "registration")]
    output_dir: PathBuf,

    /// JSON registration config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Threads passed to the registration programs
    #[arg(short = 'n', long)]
    n_processes: Option<usize>,
}

impl JobArgs {
    fn images(&self) -> InputImages {
        InputImages {
            dataset: self.dataset.clone(),
            atlas_brain: self.atlas_brain.clone(),
            atlas: self.atlas.clone(),
            hemispheres: self.hemispheres.clone(),
        }
    }

    fn prepare(&self) -> Result<BrainRegistration> {
        let config = match &self.config {
            Some(path) => RegistrationConfig::from_file(path)?,
            None => RegistrationConfig::default(),
        };
        std::fs::create_dir_all(&self.output_dir)?;

        match BrainRegistration::prepare(
            &config,
            PathSet::in_directory(&self.output_dir),
            &self.images(),
            self.n_processes,
        ) {
            Ok(registration) => Ok(registration),
            Err(e @ PipelineError::MissingInput(_)) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Register { job, parallel_branches } => {
            register(&job, parallel_branches)?;
        }
        Commands::ShowCommands { job } => {
            print_commands(&job)?;
        }
        Commands::Convert { source, destination } => {
            let destination =
                destination.unwrap_or_else(|| atlasreg_io::format::canonical_path(&source));
            atlasreg_io::tiff_to_nifti(&source, &destination)?;
        }
    }

    Ok(())
}

fn register(job: &JobArgs, parallel_branches: bool) -> Result<()> {
    info!("Registering atlas to {}", job.dataset.display());

    let registration = job.prepare()?;
    let spinner = SpinnerCallback::new(Stage::ALL.len() as u64, Duration::from_millis(120))?;
    let registration = registration.with_callback(Arc::new(spinner.clone()));

    let branches = if parallel_branches {
        BranchExecution::Concurrent
    } else {
        BranchExecution::Sequential
    };
    registration.run_all(branches)?;
    spinner.finish();

    info!(
        "Registered atlas written to {}",
        registration.paths().registered_atlas.display()
    );
    Ok(())
}

fn print_commands(job: &JobArgs) -> Result<()> {
    let registration = job.prepare()?;
    for stage in Stage::ALL {
        println!("# {}", stage);
        println!("{}", registration.commands().command_for(stage));
    }
    Ok(())
}
