use anyhow::{Context, Result};
use std::path::Path;

use crate::nifti_io::write_nifti_volume;
use crate::tiff_io::read_tiff_stack;

/// Convert a TIFF stack at `src` into a NIfTI volume at `dst`.
pub fn tiff_to_nifti<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let volume = read_tiff_stack(src)
        .with_context(|| format!("Failed to load {} for conversion", src.display()))?;
    write_nifti_volume(dst, &volume)
        .with_context(|| format!("Failed to write converted volume {}", dst.display()))?;
    tracing::info!("Converted {} to {}", src.display(), dst.display());
    Ok(())
}
