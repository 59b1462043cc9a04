use super::histogram::{Histogram, LookupTable};
use super::normalize::normalize;
use super::{SampleGrid16, SampleGrid8};

/// Global histogram equalization of a 16-bit grid.
///
/// The grid is min/max normalized to 8 bits first, then every level is
/// remapped through its cumulative share of the pixel count. Densely
/// populated ranges get spread apart and the extremes saturate, which also
/// makes sensor noise more visible.
pub fn equalize_histogram(src: &SampleGrid16) -> SampleGrid8 {
    equalize_histogram_u8(&normalize(src))
}

/// Global histogram equalization of an already 8-bit grid.
pub fn equalize_histogram_u8(src: &SampleGrid8) -> SampleGrid8 {
    let lut = LookupTable::equalizing(&Histogram::of_channel(src, 0));
    let mut out = src.clone();
    lut.apply_to_channel(&mut out, 0);
    out
}
