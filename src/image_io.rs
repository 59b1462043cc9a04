use std::path::Path;

use crate::error::Result;
use crate::tonemap::{DisplayFrame, SampleGrid16};

/// Load a radiometric image as 16-bit single-channel samples.
/// 8-bit or color sources are widened/converted to 16-bit luma.
pub fn load_radiometric(path: &Path) -> Result<SampleGrid16> {
    let img = image::open(path)?;
    if img.color() != image::ColorType::L16 {
        log::warn!(
            "{} is {:?}, not 16-bit grayscale; temperatures will be meaningless",
            path.display(),
            img.color()
        );
    }
    Ok(img.into_luma16())
}

pub fn save_frame(frame: &DisplayFrame, path: &Path) -> Result<()> {
    frame.save(path)?;
    Ok(())
}
