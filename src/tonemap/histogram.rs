use image::{ImageBuffer, Pixel};

/// 256-bin level histogram of a single 8-bit channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [u32; 256],
}

impl Histogram {
    /// Histogram of `channel` across all pixels of an 8-bit image.
    ///
    /// `channel` must be below `P::CHANNEL_COUNT`.
    pub fn of_channel<P>(img: &ImageBuffer<P, Vec<u8>>, channel: usize) -> Self
    where
        P: Pixel<Subpixel = u8>,
    {
        debug_assert!(
            channel < P::CHANNEL_COUNT as usize,
            "channel {channel} out of range for {}-channel pixels",
            P::CHANNEL_COUNT
        );
        let mut bins = [0u32; 256];
        for pixel in img.pixels() {
            bins[pixel.channels()[channel] as usize] += 1;
        }
        Self { bins }
    }

    pub fn from_bins(bins: [u32; 256]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u32; 256] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&c| c as u64).sum()
    }

    /// Running sum of the bins. The last entry equals `total()`.
    pub fn cumulative(&self) -> [u64; 256] {
        let mut cdf = [0u64; 256];
        let mut acc = 0u64;
        for (i, &count) in self.bins.iter().enumerate() {
            acc += count as u64;
            cdf[i] = acc;
        }
        cdf
    }

    /// First level whose cumulative count reaches `target`, or 255 if none does.
    pub fn level_reaching(&self, target: f64) -> u8 {
        self.cumulative()
            .iter()
            .position(|&c| c as f64 >= target)
            .map_or(255, |i| i as u8)
    }
}

/// 256-entry 8-bit level mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTable(pub [u8; 256]);

impl LookupTable {
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        LookupTable(table)
    }

    /// Equalization table: `i -> round(255 * cdf(i) / total)`.
    pub fn equalizing(hist: &Histogram) -> Self {
        let total = hist.total();
        if total == 0 {
            return Self::identity();
        }
        let cdf = hist.cumulative();
        let mut table = [0u8; 256];
        for (v, &c) in table.iter_mut().zip(cdf.iter()) {
            *v = (255.0 * c as f64 / total as f64).round().clamp(0.0, 255.0) as u8;
        }
        LookupTable(table)
    }

    /// Clip-stretch table: below `low` -> 0, above `high` -> 255, linear in between.
    pub fn stretching(low: u8, high: u8) -> Self {
        if high <= low {
            return Self::identity();
        }
        let span = (high - low) as f64;
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            let i = i as u8;
            *v = if i < low {
                0
            } else if i > high {
                255
            } else {
                ((i - low) as f64 * 255.0 / span).round() as u8
            };
        }
        LookupTable(table)
    }

    #[inline]
    pub fn map(&self, level: u8) -> u8 {
        self.0[level as usize]
    }

    /// Remap one channel of `img` in place.
    pub fn apply_to_channel<P>(&self, img: &mut ImageBuffer<P, Vec<u8>>, channel: usize)
    where
        P: Pixel<Subpixel = u8>,
    {
        for pixel in img.pixels_mut() {
            let c = &mut pixel.channels_mut()[channel];
            *c = self.map(*c);
        }
    }
}
