//! Running toolkit programs as blocking child processes.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

use crate::command::CommandLine;

/// Generic failure of a command execution.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The program could not be started.
    #[error("Could not launch command: {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A log file could not be created or read back.
    #[error("Could not use log file {}: {source}", .path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error(
        "An error occurred during the execution of command: {command}, exit status: {}, errors: {stderr}",
        describe_exit(.code)
    )]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

/// Executes a command, sending its output to two log files.
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion. Standard output goes to `stdout_log`,
    /// standard error to `stderr_log`; both are truncated first.
    fn run(
        &self,
        command: &CommandLine,
        stdout_log: &Path,
        stderr_log: &Path,
    ) -> Result<(), ExecutionError>;
}

/// Runs commands as real child processes, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

fn create_log(path: &Path) -> Result<File, ExecutionError> {
    File::create(path).map_err(|source| ExecutionError::Log {
        path: path.to_path_buf(),
        source,
    })
}

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        command: &CommandLine,
        stdout_log: &Path,
        stderr_log: &Path,
    ) -> Result<(), ExecutionError> {
        let stdout = create_log(stdout_log)?;
        let stderr = create_log(stderr_log)?;

        tracing::debug!("Running: {}", command);
        let status = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(|source| ExecutionError::Launch {
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }

        let errors = fs::read(stderr_log).map_err(|source| ExecutionError::Log {
            path: stderr_log.to_path_buf(),
            source,
        })?;

        Err(ExecutionError::NonZeroExit {
            command: command.to_string(),
            code: status.code(),
            stderr: String::from_utf8_lossy(&errors).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("/bin/sh").arg("-c").arg(script)
    }

    #[test]
    fn test_output_goes_to_log_files() {
        let dir = tempdir().unwrap();
        let (out, err) = (dir.path().join("log.txt"), dir.path().join("err.txt"));

        ProcessRunner::new()
            .run(&sh("echo registered; echo warning >&2"), &out, &err)
            .unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "registered\n");
        assert_eq!(fs::read_to_string(&err).unwrap(), "warning\n");
    }

    #[test]
    fn test_non_zero_exit_embeds_stderr() {
        let dir = tempdir().unwrap();
        let (out, err) = (dir.path().join("log.txt"), dir.path().join("err.txt"));

        let result = ProcessRunner::new().run(&sh("echo 'bad header' >&2; exit 3"), &out, &err);
        match result {
            Err(ExecutionError::NonZeroExit { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "bad header\n");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_stderr_keeps_exit_code() {
        let dir = tempdir().unwrap();
        let (out, err) = (dir.path().join("log.txt"), dir.path().join("err.txt"));

        let script = r"printf 'cannot open /data/\351chantillon.nii\n' >&2; exit 7";
        let result = ProcessRunner::new().run(&sh(script), &out, &err);
        match result {
            Err(ExecutionError::NonZeroExit { code, stderr, .. }) => {
                assert_eq!(code, Some(7));
                assert!(stderr.starts_with("cannot open /data/"));
                assert!(stderr.contains("chantillon.nii"));
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let dir = tempdir().unwrap();
        let cmd = CommandLine::new(dir.path().join("no_such_program"));
        let result = ProcessRunner::new().run(&cmd, &dir.path().join("o"), &dir.path().join("e"));
        assert!(matches!(result, Err(ExecutionError::Launch { .. })));
    }

    #[test]
    fn test_unwritable_log_is_reported() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("missing_dir").join("log.txt");
        let result = ProcessRunner::new().run(&sh("true"), &log, &dir.path().join("e"));
        assert!(matches!(result, Err(ExecutionError::Log { .. })));
    }
}
