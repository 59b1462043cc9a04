//! Contrast limited adaptive histogram equalization (CLAHE).
//!
//! The image is split into a grid of tiles. Each tile gets its own
//! equalization table built from a clipped histogram, and every pixel is
//! mapped through the four nearest tile tables with bilinear weights so tile
//! seams do not show. Sharp edges that straddle a tile boundary can still
//! leave a faint halo.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use rayon::prelude::*;

use super::{SampleGrid16, SampleGrid8};
use crate::error::{Result, ToneMapError};

/// Clip threshold reference: a bin may hold `clip_limit` times its share of
/// the tile spread over 256 display levels, whatever the table depth.
const CLIP_REFERENCE_LEVELS: f64 = 256.0;

/// Upper bound on tile table entries (128 MiB of u16). 1024 tiles at 16 bits.
pub const MAX_TABLE_ENTRIES: usize = 1 << 26;

/// Number of tile rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub rows: usize,
    pub cols: usize,
}

impl TileGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let grid = Self { rows, cols };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ToneMapError::invalid(format!(
                "tile grid dimensions must be positive, got {self}"
            )));
        }
        Ok(())
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self { rows: 8, cols: 8 }
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl TryFrom<&[usize]> for TileGrid {
    type Error = ToneMapError;

    fn try_from(dims: &[usize]) -> Result<Self> {
        match dims {
            [rows, cols] => TileGrid::new(*rows, *cols),
            _ => Err(ToneMapError::invalid(format!(
                "tile grid needs exactly 2 dimensions, got {}",
                dims.len()
            ))),
        }
    }
}

/// Accepts `8x8`, `8,8` or `8 8`.
impl FromStr for TileGrid {
    type Err = ToneMapError;

    fn from_str(s: &str) -> Result<Self> {
        let dims = s
            .split(|c: char| c == 'x' || c == 'X' || c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|e| ToneMapError::invalid(format!("bad tile dimension '{part}': {e}")))
            })
            .collect::<Result<Vec<usize>>>()?;
        TileGrid::try_from(dims.as_slice())
    }
}

/// CLAHE on raw 16-bit samples.
///
/// Tiles are equalized over the full 65536-level range and the 16-bit result
/// is narrowed to 8 bits by dropping the low byte. Fails when the grid needs
/// more than [`MAX_TABLE_ENTRIES`] table entries.
pub fn adaptive_equalize_histogram(
    src: &SampleGrid16,
    clip_limit: f64,
    tile_grid: TileGrid,
) -> Result<SampleGrid8> {
    validate_args(clip_limit, tile_grid)?;
    let (w, h) = src.dimensions();
    let wide = equalize_tiles(src.as_raw(), w as usize, h as usize, 1 << 16, clip_limit, tile_grid)?;
    let mut out = GrayImage::new(w, h);
    for (dst, &v) in out.iter_mut().zip(&wide) {
        *dst = (v >> 8) as u8;
    }
    Ok(out)
}

/// CLAHE on an 8-bit grid, 256 levels per tile table.
pub fn adaptive_equalize_histogram_u8(
    src: &SampleGrid8,
    clip_limit: f64,
    tile_grid: TileGrid,
) -> Result<SampleGrid8> {
    validate_args(clip_limit, tile_grid)?;
    let (w, h) = src.dimensions();
    let samples: Vec<u16> = src.as_raw().iter().map(|&v| v as u16).collect();
    let levels = equalize_tiles(&samples, w as usize, h as usize, 256, clip_limit, tile_grid)?;
    let mut out = GrayImage::new(w, h);
    for (dst, &v) in out.iter_mut().zip(&levels) {
        *dst = v.min(255) as u8;
    }
    Ok(out)
}

fn validate_args(clip_limit: f64, tile_grid: TileGrid) -> Result<()> {
    tile_grid.validate()?;
    if !(clip_limit.is_finite() && clip_limit > 0.0) {
        return Err(ToneMapError::invalid(format!(
            "clip limit must be a positive number, got {clip_limit}"
        )));
    }
    Ok(())
}

/// Tile geometry over an image, with the grid capped at the image extent.
struct TileLayout {
    rows: usize,
    cols: usize,
    tile_w: f64,
    tile_h: f64,
    width: usize,
    height: usize,
}

impl TileLayout {
    fn new(width: usize, height: usize, grid: TileGrid) -> Self {
        let rows = grid.rows.min(height);
        let cols = grid.cols.min(width);
        if rows != grid.rows || cols != grid.cols {
            log::debug!("clahe: {grid} tiles on {width}x{height} image, using {rows}x{cols}");
        }
        Self {
            rows,
            cols,
            tile_w: width as f64 / cols as f64,
            tile_h: height as f64 / rows as f64,
            width,
            height,
        }
    }

    /// Pixel span `[x0, x1) x [y0, y1)` of tile (ty, tx).
    fn bounds(&self, ty: usize, tx: usize) -> (usize, usize, usize, usize) {
        let edge = |i: usize, size: f64, count: usize, extent: usize| {
            if i >= count { extent } else { (i as f64 * size).floor() as usize }
        };
        (
            edge(tx, self.tile_w, self.cols, self.width),
            edge(tx + 1, self.tile_w, self.cols, self.width),
            edge(ty, self.tile_h, self.rows, self.height),
            edge(ty + 1, self.tile_h, self.rows, self.height),
        )
    }
}

/// Per-tile lookup tables stored back to back, indexed by tile coordinate.
struct TileLuts {
    levels: usize,
    cols: usize,
    table: Vec<u16>,
}

impl TileLuts {
    #[inline]
    fn lut(&self, ty: usize, tx: usize) -> &[u16] {
        let start = (ty * self.cols + tx) * self.levels;
        &self.table[start..start + self.levels]
    }
}

/// Interpolation neighbours along one axis: (near tile, far tile, far weight).
fn axis_weights(extent: usize, tile_size: f64, count: usize) -> Vec<(usize, usize, f64)> {
    let inv = 1.0 / tile_size;
    (0..extent)
        .map(|p| {
            let f = p as f64 * inv - 0.5;
            let near = f.floor();
            let weight = f - near;
            let near = near as isize;
            let far = (near + 1).min(count as isize - 1).max(0) as usize;
            (near.max(0) as usize, far, weight)
        })
        .collect()
}

fn equalize_tiles(
    samples: &[u16],
    width: usize,
    height: usize,
    levels: usize,
    clip_limit: f64,
    grid: TileGrid,
) -> Result<Vec<u16>> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }
    let layout = TileLayout::new(width, height, grid);
    let tiles = layout.rows * layout.cols;
    if tiles.saturating_mul(levels) > MAX_TABLE_ENTRIES {
        return Err(ToneMapError::invalid(format!(
            "{}x{} tiles at {levels} levels exceed the table budget, at most {} tiles",
            layout.rows,
            layout.cols,
            MAX_TABLE_ENTRIES / levels
        )));
    }
    let luts = build_tile_luts(samples, &layout, levels, clip_limit);

    let xs = axis_weights(width, layout.tile_w, layout.cols);
    let ys = axis_weights(height, layout.tile_h, layout.rows);
    let max_level = (levels - 1) as f64;

    let mut out = vec![0u16; width * height];
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let (ty1, ty2, ya) = ys[y];
        let src_row = &samples[y * width..(y + 1) * width];
        for (x, (dst, &v)) in row.iter_mut().zip(src_row).enumerate() {
            let (tx1, tx2, xa) = xs[x];
            let v = v as usize;
            let top = luts.lut(ty1, tx1)[v] as f64 * (1.0 - xa) + luts.lut(ty1, tx2)[v] as f64 * xa;
            let bottom = luts.lut(ty2, tx1)[v] as f64 * (1.0 - xa) + luts.lut(ty2, tx2)[v] as f64 * xa;
            *dst = (top * (1.0 - ya) + bottom * ya).round().clamp(0.0, max_level) as u16;
        }
    });
    Ok(out)
}

fn build_tile_luts(samples: &[u16], layout: &TileLayout, levels: usize, clip_limit: f64) -> TileLuts {
    let mut table = vec![0u16; layout.rows * layout.cols * levels];
    table.par_chunks_mut(levels).enumerate().for_each(|(t, lut)| {
        let (ty, tx) = (t / layout.cols, t % layout.cols);
        let (x0, x1, y0, y1) = layout.bounds(ty, tx);

        let mut hist = vec![0u32; levels];
        for y in y0..y1 {
            let row = &samples[y * layout.width + x0..y * layout.width + x1];
            for &v in row {
                hist[(v as usize).min(levels - 1)] += 1;
            }
        }

        let area = (x1 - x0) * (y1 - y0);
        clip_histogram(&mut hist, area, clip_limit);
        fill_lut(&hist, area, lut);
    });
    TileLuts {
        levels,
        cols: layout.cols,
        table,
    }
}

/// Cap every bin at `floor(clip_limit * area / 256)` (at least 1) and spread
/// the clipped counts evenly over all bins, keeping the total unchanged.
fn clip_histogram(hist: &mut [u32], area: usize, clip_limit: f64) {
    let bins = hist.len();
    let limit = ((clip_limit * area as f64 / CLIP_REFERENCE_LEVELS) as u32).max(1);

    let mut excess = 0u64;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += (*bin - limit) as u64;
            *bin = limit;
        }
    }

    let batch = (excess / bins as u64) as u32;
    let mut residual = (excess % bins as u64) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (bins / residual).max(1);
        for bin in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }
}

fn fill_lut(hist: &[u32], area: usize, lut: &mut [u16]) {
    let max_level = (lut.len() - 1) as f64;
    let scale = max_level / area.max(1) as f64;
    let mut sum = 0u64;
    for (out, &count) in lut.iter_mut().zip(hist) {
        sum += count as u64;
        *out = (sum as f64 * scale).round().min(max_level) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    #[test]
    fn rejects_zero_tile_dimensions() {
        let src: SampleGrid16 = ImageBuffer::from_pixel(16, 16, Luma([1000]));
        for grid in [TileGrid { rows: 0, cols: 8 }, TileGrid { rows: 8, cols: 0 }] {
            let err = adaptive_equalize_histogram(&src, 4.0, grid).unwrap_err();
            assert!(matches!(err, ToneMapError::InvalidArgument(_)));
        }
    }

    #[test]
    fn rejects_non_positive_clip_limit() {
        let src: SampleGrid16 = ImageBuffer::from_pixel(16, 16, Luma([1000]));
        for clip in [0.0, -1.0, f64::NAN] {
            assert!(adaptive_equalize_histogram(&src, clip, TileGrid::default()).is_err());
        }
    }

    #[test]
    fn parses_tile_grid_text() {
        assert_eq!("8x4".parse::<TileGrid>().unwrap(), TileGrid { rows: 8, cols: 4 });
        assert_eq!("2, 3".parse::<TileGrid>().unwrap(), TileGrid { rows: 2, cols: 3 });
        assert!("8x8x8".parse::<TileGrid>().is_err());
        assert!("0x8".parse::<TileGrid>().is_err());
        assert!("eight".parse::<TileGrid>().is_err());
        assert!(TileGrid::try_from(&[8usize, 8, 8][..]).is_err());
    }

    #[test]
    fn clipping_preserves_mass() {
        let mut hist = vec![0u32; 256];
        hist[10] = 900;
        hist[20] = 100;
        clip_histogram(&mut hist, 1000, 2.0);
        assert_eq!(hist.iter().map(|&c| c as u64).sum::<u64>(), 1000);
        assert!(hist[10] < 900);
    }

    #[test]
    fn clip_threshold_ignores_table_depth() {
        // 4.0 * 1024 / 256 = 16 per bin, at 256 or 65536 levels alike
        for levels in [256usize, 1 << 16] {
            let mut hist = vec![0u32; levels];
            hist[5] = 1000;
            hist[7] = 24;
            clip_histogram(&mut hist, 1024, 4.0);
            let batch = (1000 - 16) / levels as u32;
            assert!(hist[5] <= 16 + batch + 1, "{levels}: {}", hist[5]);
            assert!(hist[7] >= 16, "{levels}: {}", hist[7]);
        }
    }

    #[test]
    fn oversized_16bit_grid_is_rejected() {
        let src: SampleGrid16 = ImageBuffer::from_fn(64, 64, |x, y| Luma([(x * 64 + y) as u16]));
        let err = adaptive_equalize_histogram(&src, 4.0, TileGrid::new(64, 64).unwrap()).unwrap_err();
        assert!(matches!(err, ToneMapError::InvalidArgument(_)));
        // the same grid fits at 8 bits
        let small = GrayImage::from_fn(64, 64, |x, y| Luma([(x + y) as u8]));
        assert!(adaptive_equalize_histogram_u8(&small, 4.0, TileGrid::new(64, 64).unwrap()).is_ok());
    }

    #[test]
    fn ramp_has_no_seam_at_tile_boundary() {
        let src: SampleGrid16 = ImageBuffer::from_fn(256, 64, |x, _| Luma([20_000 + x as u16 * 40]));
        let out = adaptive_equalize_histogram(&src, 4.0, TileGrid::new(2, 2).unwrap()).unwrap();
        let row: Vec<i32> = (0..256).map(|x| out.get_pixel(x, 10)[0] as i32).collect();
        // tile_w = 128; without interpolation 127 -> 128 would jump from 255 to ~0
        assert!((row[128] - row[127]).abs() <= 3, "{} -> {}", row[127], row[128]);
        let worst = row.windows(2).map(|w| (w[1] - w[0]).abs()).max().unwrap();
        assert!(worst <= 4, "largest step {worst}");
    }

    #[test]
    fn tile_bounds_cover_image() {
        let layout = TileLayout::new(10, 7, TileGrid { rows: 3, cols: 4 });
        let mut covered = 0;
        for ty in 0..layout.rows {
            for tx in 0..layout.cols {
                let (x0, x1, y0, y1) = layout.bounds(ty, tx);
                assert!(x1 > x0 && y1 > y0);
                covered += (x1 - x0) * (y1 - y0);
            }
        }
        assert_eq!(covered, 70);
    }

    #[test]
    fn grid_larger_than_image_is_capped() {
        let src: SampleGrid16 = ImageBuffer::from_fn(3, 2, |x, y| Luma([(x * 100 + y * 7) as u16]));
        let out = adaptive_equalize_histogram(&src, 4.0, TileGrid::default()).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn single_tile_matches_ordering_of_input() {
        let src = GrayImage::from_fn(64, 16, |x, _| Luma([(x * 4) as u8]));
        let out = adaptive_equalize_histogram_u8(&src, 40.0, TileGrid::new(1, 1).unwrap()).unwrap();
        let row: Vec<u8> = (0..64).map(|x| out.get_pixel(x, 0)[0]).collect();
        assert!(row.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(row[63], 255);
    }

    #[test]
    fn expands_local_contrast_in_each_half() {
        let src = GrayImage::from_fn(64, 32, |x, y| {
            let base = if x < 32 { 30 } else { 200 };
            Luma([base + ((x + y * 7) % 20) as u8])
        });
        let out = adaptive_equalize_histogram_u8(&src, 4.0, TileGrid::new(2, 2).unwrap()).unwrap();
        let left: Vec<u8> = (0..16).map(|x| out.get_pixel(x, 8)[0]).collect();
        let spread = left.iter().max().unwrap() - left.iter().min().unwrap();
        assert!(spread > 19, "left spread {spread}");
    }
}
