pub mod format;
pub mod tiff_io;
pub mod nifti_io;
pub mod convert;

pub use format::ImageFormat;
pub use tiff_io::read_tiff_stack;
pub use nifti_io::{read_nifti_volume, write_nifti_volume};
pub use convert::tiff_to_nifti;
