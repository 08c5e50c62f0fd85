//! Volume format detection by file extension.

use std::path::{Path, PathBuf};

/// Extension of the canonical volumetric format accepted by the registration toolkit.
pub const CANONICAL_EXTENSION: &str = "nii";

/// Image formats the pipeline knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Uncompressed NIfTI-1 volume (`.nii`), consumed as-is.
    Nifti,
    /// Multi-page TIFF stack (`.tif` / `.tiff`), converted before use.
    TiffStack,
    /// Anything else.
    Unsupported,
}

impl ImageFormat {
    /// Classify a path by its extension only; the file is not opened.
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Unsupported;
        };

        if ext == CANONICAL_EXTENSION {
            Self::Nifti
        } else if ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff") {
            Self::TiffStack
        } else {
            Self::Unsupported
        }
    }

    pub fn is_canonical(self) -> bool {
        self == Self::Nifti
    }

    pub fn is_convertible(self) -> bool {
        self == Self::TiffStack
    }
}

/// Path of the canonical file written beside `path` when it is converted.
pub fn canonical_path(path: &Path) -> PathBuf {
    path.with_extension(CANONICAL_EXTENSION)
}
