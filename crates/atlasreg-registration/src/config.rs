//! Job configuration loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RegistrationError, Result};
use crate::params::{
    AffineParams, FreeformParams, RegistrationParameters, SegmentationParams, ToolkitPrograms,
};
use crate::validation::validate_programs;

/// Static configuration of the registration toolkit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Directory holding the toolkit programs.
    pub binaries_dir: PathBuf,
    pub affine: AffineParams,
    pub freeform: FreeformParams,
    pub segmentation: SegmentationParams,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            binaries_dir: PathBuf::from("/usr/local/bin"),
            affine: AffineParams::default(),
            freeform: FreeformParams::default(),
            segmentation: SegmentationParams::default(),
        }
    }
}

impl RegistrationConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file; missing sections and fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            RegistrationError::invalid_configuration(format!(
                "Could not read {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| RegistrationError::invalid_configuration(e.to_string()))
    }

    /// Set the toolkit directory.
    pub fn with_binaries_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.binaries_dir = dir.into();
        self
    }

    /// Set the affine settings.
    pub fn with_affine(mut self, affine: AffineParams) -> Self {
        self.affine = affine;
        self
    }

    /// Set the freeform settings.
    pub fn with_freeform(mut self, freeform: FreeformParams) -> Self {
        self.freeform = freeform;
        self
    }

    /// Set the label propagation settings.
    pub fn with_segmentation(mut self, segmentation: SegmentationParams) -> Self {
        self.segmentation = segmentation;
        self
    }

    pub fn programs(&self) -> ToolkitPrograms {
        ToolkitPrograms::in_directory(&self.binaries_dir)
    }
}

impl RegistrationParameters {
    /// Resolve and check the toolkit programs named by `config`.
    pub fn from_config(config: &RegistrationConfig) -> Result<Self> {
        let programs = config.programs();
        validate_programs(&programs)?;
        Ok(Self::new(
            programs,
            config.affine.clone(),
            config.freeform.clone(),
            config.segmentation.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RegistrationConfig::from_json(
            r#"{ "binaries_dir": "/opt/niftyreg", "freeform": { "bending_energy_weight": 0.5 } }"#,
        )
        .unwrap();

        assert_eq!(config.binaries_dir, PathBuf::from("/opt/niftyreg"));
        assert_eq!(config.freeform.bending_energy_weight, 0.5);
        assert_eq!(config.freeform.n_steps, 6);
        assert_eq!(config.affine, AffineParams::default());
    }

    #[test]
    fn test_malformed_json_is_invalid_configuration() {
        let err = RegistrationConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_parameters_require_programs() {
        let dir = tempdir().unwrap();
        let config = RegistrationConfig::new().with_binaries_dir(dir.path());
        assert!(RegistrationParameters::from_config(&config).is_err());

        for program in config.programs().iter() {
            fs::write(program, b"").unwrap();
        }
        let params = RegistrationParameters::from_config(&config).unwrap();
        assert_eq!(params.programs(), &config.programs());
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registration.json");
        let config = RegistrationConfig::new().with_affine(AffineParams {
            n_steps: 4,
            use_n_steps: 3,
        });
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(RegistrationConfig::from_file(&path).unwrap(), config);
        assert!(RegistrationConfig::from_file(dir.path().join("absent.json")).is_err());
    }
}
