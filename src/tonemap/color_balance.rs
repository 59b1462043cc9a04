use image::{ImageBuffer, Pixel};
use rayon::prelude::*;

use super::histogram::{Histogram, LookupTable};
use crate::error::{Result, ToneMapError};

/// "Simplest color balance": per-channel percentile clip and stretch.
///
/// `percent` is the share of pixels, split evenly between both tails, that
/// each channel may saturate. Channels are balanced independently and then
/// recombined. When a channel already sits hard against 0 and 255 the cuts
/// land on the extremes and the result is close to the input.
pub fn simplest_cb<P>(img: &ImageBuffer<P, Vec<u8>>, percent: f64) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8> + Sync,
{
    if !(percent.is_finite() && (0.0..=100.0).contains(&percent)) {
        return Err(ToneMapError::invalid(format!(
            "clip percent must be within [0, 100], got {percent}"
        )));
    }

    let luts: Vec<LookupTable> = (0..P::CHANNEL_COUNT as usize)
        .into_par_iter()
        .map(|c| channel_stretch(&Histogram::of_channel(img, c), percent))
        .collect();

    let mut out = img.clone();
    for (c, lut) in luts.iter().enumerate() {
        lut.apply_to_channel(&mut out, c);
    }
    Ok(out)
}

fn channel_stretch(hist: &Histogram, percent: f64) -> LookupTable {
    let total = hist.total() as f64;
    let tail = percent / 200.0 * total;
    // nothing to clip, both ends stay pinned
    if tail <= 0.0 {
        return LookupTable::identity();
    }

    let low = hist.level_reaching(tail);
    let high = hist.level_reaching(total - tail);
    if high <= low {
        log::debug!("simplest_cb: cuts collapsed at level {low}, channel left as is");
    }
    LookupTable::stretching(low, high)
}
