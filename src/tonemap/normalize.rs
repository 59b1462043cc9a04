use image::GrayImage;

use super::{SampleGrid16, SampleGrid8};

/// Min/max stretch of a 16-bit grid onto the full 8-bit range.
pub fn normalize(src: &SampleGrid16) -> SampleGrid8 {
    normalize_range(src, 0, 255)
}

/// Affine rescale so the grid minimum lands on `min_val` and the maximum on `max_val`.
///
/// Samples are rounded to the nearest level. A flat grid has no range to
/// stretch and comes back uniformly `min_val`. Whatever lies outside the
/// useful signal band still consumes output levels, so a few hot or dead
/// pixels will squeeze the rest of the scene into a narrow band.
pub fn normalize_range(src: &SampleGrid16, min_val: u8, max_val: u8) -> SampleGrid8 {
    let (w, h) = src.dimensions();
    let raw = src.as_raw();

    let Some((lo, hi)) = sample_range(raw) else {
        return GrayImage::new(w, h);
    };

    let (scale, shift) = if hi > lo {
        let scale = (max_val as f64 - min_val as f64) / (hi - lo) as f64;
        (scale, min_val as f64 - lo as f64 * scale)
    } else {
        log::debug!("normalize: flat grid at {lo}, mapping every sample to {min_val}");
        (0.0, min_val as f64)
    };

    let mut out = GrayImage::new(w, h);
    for (dst, &v) in out.iter_mut().zip(raw) {
        *dst = (v as f64 * scale + shift).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// (min, max) over the samples, `None` when empty.
pub fn sample_range(samples: &[u16]) -> Option<(u16, u16)> {
    samples.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
