//! Input validation and format normalisation.

use atlasreg_io::format::{canonical_path, ImageFormat};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, RegistrationError};
use crate::paths::InputImages;

/// Converts an image into the canonical volumetric format.
pub trait FormatConverter: Send + Sync {
    fn convert(&self, source: &Path, destination: &Path) -> anyhow::Result<()>;
}

/// Converts TIFF stacks with [`atlasreg_io::tiff_to_nifti`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffStackConverter;

impl FormatConverter for TiffStackConverter {
    fn convert(&self, source: &Path, destination: &Path) -> anyhow::Result<()> {
        atlasreg_io::tiff_to_nifti(source, destination)
    }
}

/// Input images that exist and are all in the canonical format.
///
/// Only [`sanitise_inputs`] produces one, so holding a value proves the
/// checks ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitisedInputs(InputImages);

impl SanitisedInputs {
    pub fn images(&self) -> &InputImages {
        &self.0
    }

    pub fn into_inner(self) -> InputImages {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn assume_sanitised(images: InputImages) -> Self {
        Self(images)
    }
}

/// Check the dataset, atlas and atlas brain images and return the set with
/// any converted paths substituted.
///
/// `images` is left untouched. A TIFF stack is converted to a `.nii` file
/// beside it; the returned set points at that file, so sanitising the result
/// again converts nothing. The hemisphere volume is passed through as-is.
pub fn sanitise_inputs(
    images: &InputImages,
    converter: &dyn FormatConverter,
) -> Result<SanitisedInputs, PipelineError> {
    let dataset = sanitise_image(&images.dataset, converter)?;
    let atlas = sanitise_image(&images.atlas, converter)?;
    let atlas_brain = sanitise_image(&images.atlas_brain, converter)?;

    Ok(SanitisedInputs(InputImages {
        dataset,
        atlas_brain,
        atlas,
        hemispheres: images.hemispheres.clone(),
    }))
}

/// Resolve a single image to a canonical path.
pub fn sanitise_image(
    path: &Path,
    converter: &dyn FormatConverter,
) -> Result<PathBuf, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }

    let format = ImageFormat::from_path(path);
    if format.is_canonical() {
        return Ok(path.to_path_buf());
    }
    if !format.is_convertible() {
        return Err(RegistrationError::unsupported_format(path).into());
    }

    let converted = canonical_path(path);
    tracing::warn!(
        "Image {} is not in NIfTI format, converting to {}",
        path.display(),
        converted.display()
    );
    converter.convert(path, &converted)?;
    Ok(converted)
}
