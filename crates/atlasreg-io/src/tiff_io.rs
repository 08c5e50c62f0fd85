use anyhow::{bail, Context, Result};
use ndarray::Array3;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;

/// Read a multi-page grayscale TIFF into a volume indexed `[x, y, z]`.
///
/// Each page is one z plane; rows map to y and columns to x, which is the
/// axis order NIfTI expects. Samples are widened to `f32`.
pub fn read_tiff_stack<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let path = path.as_ref();
    let file = File::open(path).context("Failed to open TIFF file")?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .context("Failed to read TIFF header")?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().context("Failed to read TIFF dimensions")?;
    let (nx, ny) = (width as usize, height as usize);
    let mut planes: Vec<Vec<f32>> = Vec::new();

    loop {
        match decoder.colortype().context("Failed to read TIFF colour type")? {
            ColorType::Gray(_) => {}
            other => bail!(
                "Expected a grayscale TIFF stack, found {:?} in page {}",
                other,
                planes.len()
            ),
        }

        let (w, h) = decoder.dimensions()?;
        if (w as usize, h as usize) != (nx, ny) {
            bail!(
                "TIFF page {} is {}x{}, expected {}x{}",
                planes.len(),
                w,
                h,
                nx,
                ny
            );
        }

        let page = decoder
            .read_image()
            .with_context(|| format!("Failed to decode TIFF page {}", planes.len()))?;
        planes.push(widen(page)?);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let nz = planes.len();
    tracing::debug!("Read TIFF stack {}: {}x{}x{}", path.display(), nx, ny, nz);

    Ok(Array3::from_shape_fn((nx, ny, nz), |(x, y, z)| planes[z][y * nx + x]))
}

fn widen(page: DecodingResult) -> Result<Vec<f32>> {
    let samples = match page {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|s| s as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|s| s as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|s| s as f32).collect(),
        _ => bail!("Unsupported TIFF sample type"),
    };
    Ok(samples)
}
