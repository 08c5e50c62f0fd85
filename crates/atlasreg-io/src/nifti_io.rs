use anyhow::{anyhow, Context, Result};
use ndarray::{Array3, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;

/// Read a 3-D NIfTI volume as `f32`, indexed `[x, y, z]`.
pub fn read_nifti_volume<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let obj = ReaderOptions::new()
        .read_file(path.as_ref())
        .context("Failed to read NIfTI file")?;

    let volume = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;

    if volume.ndim() != 3 {
        anyhow::bail!("Expected 3D NIfTI file, found {} dimensions", volume.ndim());
    }

    volume
        .into_dimensionality::<Ix3>()
        .map_err(|e| anyhow!("Failed to reshape NIfTI volume: {}", e))
}

/// Write a volume indexed `[x, y, z]` to an uncompressed NIfTI file.
///
/// Unit voxel spacing is recorded; the registration toolkit only needs the
/// voxel grid for atlas propagation.
pub fn write_nifti_volume<P: AsRef<Path>>(path: P, volume: &Array3<f32>) -> Result<()> {
    WriterOptions::new(path.as_ref())
        .write_nifti(volume)
        .map_err(|e| anyhow!("Failed to write NIfTI file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_volume() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("volume.nii");

        let volume = Array3::from_shape_fn((3, 4, 5), |(x, y, z)| (x + 10 * y + 100 * z) as f32);
        write_nifti_volume(&file_path, &volume)?;

        let read = read_nifti_volume(&file_path)?;
        assert_eq!(read.dim(), (3, 4, 5));
        assert_eq!(read[[2, 3, 4]], 432.0);
        assert_eq!(read, volume);
        Ok(())
    }
}
