use atlasreg_io::{read_nifti_volume, tiff_to_nifti, ImageFormat};
use std::fs::File;
use tempfile::tempdir;
use tiff::encoder::{colortype, TiffEncoder};

#[test]
fn test_tiff_stack_converts_to_nifti_with_same_voxels() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let src = dir.path().join("sample.tiff");
    let dst = dir.path().join("sample.nii");

    let (w, h, d) = (4u32, 3u32, 5usize);
    let pages: Vec<Vec<u8>> = (0..d)
        .map(|z| (0..(w * h)).map(|i| (i as usize + 20 * z) as u8).collect())
        .collect();
    {
        let mut file = File::create(&src)?;
        let mut encoder = TiffEncoder::new(&mut file)?;
        for page in &pages {
            encoder.write_image::<colortype::Gray8>(w, h, page)?;
        }
    }

    tiff_to_nifti(&src, &dst)?;
    assert_eq!(ImageFormat::from_path(&dst), ImageFormat::Nifti);

    let volume = read_nifti_volume(&dst)?;
    assert_eq!(volume.dim(), (w as usize, h as usize, d));
    for z in 0..d {
        for y in 0..h as usize {
            for x in 0..w as usize {
                let expected = pages[z][y * w as usize + x] as f32;
                assert_eq!(volume[[x, y, z]], expected, "voxel ({x}, {y}, {z})");
            }
        }
    }
    Ok(())
}

#[test]
fn test_conversion_error_names_source() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("broken.tif");
    std::fs::write(&src, b"not a tiff").unwrap();

    let err = tiff_to_nifti(&src, dir.path().join("broken.nii")).unwrap_err();
    assert!(format!("{err:#}").contains("broken.tif"));
    assert!(!dir.path().join("broken.nii").exists());
}
