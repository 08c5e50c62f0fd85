//! Validation of job configuration before any stage runs.

use std::path::Path;

use crate::command::OpenMpThreads;
use crate::error::{RegistrationError, Result};
use crate::params::ToolkitPrograms;

/// Validate a process-count hint and turn it into a thread flag value.
pub fn validate_process_count(n_processes: Option<usize>) -> Result<Option<OpenMpThreads>> {
    match n_processes {
        None => Ok(None),
        Some(n) => OpenMpThreads::new(n).map(Some).ok_or_else(|| {
            RegistrationError::invalid_configuration(format!(
                "Number of processes must be at least 1, got {}",
                n
            ))
        }),
    }
}

/// Validate that a toolkit program exists and is a file.
pub fn validate_program(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(RegistrationError::invalid_configuration(format!(
            "Registration program {} not found",
            path.display()
        )));
    }
    Ok(())
}

/// Validate every toolkit program.
pub fn validate_programs(programs: &ToolkitPrograms) -> Result<()> {
    programs.iter().try_for_each(validate_program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_process_count() {
        assert_eq!(validate_process_count(None).unwrap(), None);
        assert_eq!(validate_process_count(Some(6)).unwrap().map(OpenMpThreads::get), Some(6));
        assert!(matches!(
            validate_process_count(Some(0)),
            Err(RegistrationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_programs() {
        let dir = tempdir().unwrap();
        let programs = ToolkitPrograms::in_directory(dir.path());
        assert!(validate_programs(&programs).is_err());

        for program in programs.iter() {
            std::fs::write(program, b"").unwrap();
        }
        assert!(validate_programs(&programs).is_ok());
    }

    #[test]
    fn test_directory_is_not_a_program() {
        let dir = tempdir().unwrap();
        let err = validate_program(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
