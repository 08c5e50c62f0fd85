//! Filesystem locations read and written by the pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The four images a job starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputImages {
    /// Downsampled, filtered sample brain.
    pub dataset: PathBuf,
    /// Average brain of the atlas.
    pub atlas_brain: PathBuf,
    /// Atlas label (annotation) volume.
    pub atlas: PathBuf,
    /// Hemisphere label volume.
    pub hemispheres: PathBuf,
}

/// Standard output and standard error log of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLogs {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl StageLogs {
    fn in_directory(dir: &Path, name: &str) -> Self {
        Self {
            stdout: dir.join(format!("tmp__{name}_log.txt")),
            stderr: dir.join(format!("tmp__{name}_error.txt")),
        }
    }
}

/// Output and log paths of a registration job.
///
/// Produced once per job and never modified by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSet {
    pub affine_matrix: PathBuf,
    pub invert_affine_matrix: PathBuf,
    pub control_point_file: PathBuf,
    pub inverse_control_point_file: PathBuf,

    pub affine_registered_atlas_brain: PathBuf,
    pub freeform_registered_atlas_brain: PathBuf,
    pub inverse_freeform_registered_atlas_brain: PathBuf,
    pub registered_atlas: PathBuf,
    pub registered_hemispheres: PathBuf,

    pub affine_logs: StageLogs,
    pub freeform_logs: StageLogs,
    pub invert_affine_logs: StageLogs,
    pub inverse_freeform_logs: StageLogs,
    /// Shared by atlas and hemisphere propagation.
    pub segmentation_logs: StageLogs,
}

impl PathSet {
    /// Customary layout of a job inside `dir`.
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            affine_matrix: dir.join("affine_matrix.txt"),
            invert_affine_matrix: dir.join("invert_affine_matrix.txt"),
            control_point_file: dir.join("control_point_file.nii"),
            inverse_control_point_file: dir.join("inverse_control_point_file.nii"),

            affine_registered_atlas_brain: dir.join("affine_registered_atlas_brain.nii"),
            freeform_registered_atlas_brain: dir.join("freeform_registered_atlas_brain.nii"),
            inverse_freeform_registered_atlas_brain: dir
                .join("inverse_freeform_registered_atlas_brain.nii"),
            registered_atlas: dir.join("registered_atlas.nii"),
            registered_hemispheres: dir.join("registered_hemispheres.nii"),

            affine_logs: StageLogs::in_directory(dir, "affine"),
            freeform_logs: StageLogs::in_directory(dir, "freeform"),
            invert_affine_logs: StageLogs::in_directory(dir, "invert_affine"),
            inverse_freeform_logs: StageLogs::in_directory(dir, "inverse_freeform"),
            segmentation_logs: StageLogs::in_directory(dir, "segmentation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_in_directory() {
        let paths = PathSet::in_directory("/job");
        assert_eq!(paths.affine_matrix, PathBuf::from("/job/affine_matrix.txt"));
        assert_eq!(paths.affine_logs.stdout, PathBuf::from("/job/tmp__affine_log.txt"));
        assert_eq!(
            paths.inverse_freeform_logs.stderr,
            PathBuf::from("/job/tmp__inverse_freeform_error.txt")
        );
    }
}
