//! Per-stage parameters of the external registration toolkit.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const AFFINE_PROGRAM: &str = "reg_aladin";
const FREEFORM_PROGRAM: &str = "reg_f3d";
const TRANSFORM_PROGRAM: &str = "reg_transform";
const SEGMENTATION_PROGRAM: &str = "reg_resample";

/// Affine (block matching) registration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffineParams {
    /// Number of pyramid levels to build.
    pub n_steps: u32,
    /// Number of those levels actually used.
    pub use_n_steps: u32,
}

impl Default for AffineParams {
    fn default() -> Self {
        Self {
            n_steps: 6,
            use_n_steps: 5,
        }
    }
}

/// Freeform (B-spline) registration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeformParams {
    pub n_steps: u32,
    pub use_n_steps: u32,
    pub bending_energy_weight: f64,
    /// Control point spacing; negative values are in voxels.
    pub grid_spacing: i32,
    pub smoothing_sigma_reference: f64,
    pub smoothing_sigma_floating: f64,
    pub histogram_n_bins_floating: u32,
    pub histogram_n_bins_reference: u32,
}

impl Default for FreeformParams {
    fn default() -> Self {
        Self {
            n_steps: 6,
            use_n_steps: 4,
            bending_energy_weight: 0.95,
            grid_spacing: -10,
            smoothing_sigma_reference: -1.0,
            smoothing_sigma_floating: -1.0,
            histogram_n_bins_floating: 128,
            histogram_n_bins_reference: 128,
        }
    }
}

/// Label propagation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// 0 is nearest neighbour, which keeps label values intact.
    pub interpolation_order: u32,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            interpolation_order: 0,
        }
    }
}

/// Locations of the four toolkit programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitPrograms {
    pub affine: PathBuf,
    pub freeform: PathBuf,
    pub transform: PathBuf,
    pub segmentation: PathBuf,
}

impl ToolkitPrograms {
    /// The toolkit's standard program names inside `dir`.
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let program = |name: &str| dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        Self {
            affine: program(AFFINE_PROGRAM),
            freeform: program(FREEFORM_PROGRAM),
            transform: program(TRANSFORM_PROGRAM),
            segmentation: program(SEGMENTATION_PROGRAM),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.affine, &self.freeform, &self.transform, &self.segmentation]
            .into_iter()
            .map(PathBuf::as_path)
    }
}

/// Parameter sets of every stage plus the programs that consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationParameters {
    programs: ToolkitPrograms,
    affine: AffineParams,
    freeform: FreeformParams,
    segmentation: SegmentationParams,
}

impl RegistrationParameters {
    pub fn new(
        programs: ToolkitPrograms,
        affine: AffineParams,
        freeform: FreeformParams,
        segmentation: SegmentationParams,
    ) -> Self {
        Self {
            programs,
            affine,
            freeform,
            segmentation,
        }
    }

    pub fn format_affine_params(&self) -> String {
        format!(" -ln {} -lp {}", self.affine.n_steps, self.affine.use_n_steps)
    }

    pub fn format_freeform_params(&self) -> String {
        let f = &self.freeform;
        format!(
            " -ln {} -lp {} -be {} -sx {} -smooR {} -smooF {} -fbn {} -rbn {}",
            f.n_steps,
            f.use_n_steps,
            f.bending_energy_weight,
            f.grid_spacing,
            f.smoothing_sigma_reference,
            f.smoothing_sigma_floating,
            f.histogram_n_bins_floating,
            f.histogram_n_bins_reference,
        )
    }

    pub fn format_segmentation_params(&self) -> String {
        format!(" -inter {}", self.segmentation.interpolation_order)
    }

    pub fn programs(&self) -> &ToolkitPrograms {
        &self.programs
    }

    pub fn affine_reg_program_path(&self) -> &Path {
        &self.programs.affine
    }

    pub fn freeform_reg_program_path(&self) -> &Path {
        &self.programs.freeform
    }

    pub fn transform_program_path(&self) -> &Path {
        &self.programs.transform
    }

    pub fn segmentation_program_path(&self) -> &Path {
        &self.programs.segmentation
    }
}
