use image::DynamicImage;

use crate::error::Result;
use crate::overlay::{self, AnnotationSpec, CursorSample};
use crate::tonemap::{self, DisplayFrame, SampleGrid16, SampleGrid8, TileGrid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneMapStrategy {
    Normalize,
    Equalize,
    Adaptive,
    ColorBalance,
}

impl ToneMapStrategy {
    pub const ALL: &[ToneMapStrategy] = &[
        ToneMapStrategy::Normalize,
        ToneMapStrategy::Equalize,
        ToneMapStrategy::Adaptive,
        ToneMapStrategy::ColorBalance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToneMapStrategy::Normalize => "Normalize",
            ToneMapStrategy::Equalize => "Histogram Equalization",
            ToneMapStrategy::Adaptive => "CLAHE",
            ToneMapStrategy::ColorBalance => "Simplest Color Balance",
        }
    }

    /// Single-letter mode codes: n(ormalize), e/h (equalize), c/a (CLAHE), b (balance).
    /// Anything else falls back to normalize.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "e" | "h" | "equalize" => ToneMapStrategy::Equalize,
            "c" | "a" | "adaptive" | "clahe" => ToneMapStrategy::Adaptive,
            "b" | "balance" | "color_balance" => ToneMapStrategy::ColorBalance,
            _ => ToneMapStrategy::Normalize,
        }
    }
}

/// All tone mapping parameters controlled by the user.
#[derive(Debug, Clone)]
pub struct ToneMapParams {
    pub strategy: ToneMapStrategy,

    // CLAHE
    pub clip_limit: f64,
    pub tile_grid: TileGrid,

    // Simplest color balance
    pub percent: f64,
}

impl Default for ToneMapParams {
    fn default() -> Self {
        Self {
            strategy: ToneMapStrategy::Normalize,
            clip_limit: 4.0,
            tile_grid: TileGrid::default(),
            percent: 1.0,
        }
    }
}

/// Run the selected strategy on a radiometric grid.
pub fn tone_map(grid: &SampleGrid16, params: &ToneMapParams) -> Result<SampleGrid8> {
    match params.strategy {
        ToneMapStrategy::Normalize => Ok(tonemap::normalize(grid)),
        ToneMapStrategy::Equalize => Ok(tonemap::equalize_histogram(grid)),
        ToneMapStrategy::Adaptive => {
            tonemap::adaptive_equalize_histogram(grid, params.clip_limit, params.tile_grid)
        }
        ToneMapStrategy::ColorBalance => tonemap::simplest_cb(&tonemap::normalize(grid), params.percent),
    }
}

/// Tone map into a three-channel frame ready for drawing and display.
pub fn render_frame(grid: &SampleGrid16, params: &ToneMapParams) -> Result<DisplayFrame> {
    let gray = tone_map(grid, params)?;
    Ok(DynamicImage::ImageLuma8(gray).into_rgb8())
}

/// A rendered frame with the cursor marker composited in, plus the
/// annotation for the host to finish (label text).
pub struct AnnotatedFrame {
    pub frame: DisplayFrame,
    pub cursor: Option<CursorSample>,
    pub annotation: Option<AnnotationSpec>,
}

/// Full re-render for one cursor position. Nothing is cached between calls.
pub fn render_annotated(
    grid: &SampleGrid16,
    params: &ToneMapParams,
    cursor: Option<(u32, u32)>,
) -> Result<AnnotatedFrame> {
    let mut frame = render_frame(grid, params)?;
    let cursor = cursor.and_then(|(x, y)| CursorSample::at(grid, x, y));
    let annotation = cursor.map(|c| c.annotation());
    if let Some(spec) = &annotation {
        overlay::composite_marker(&mut frame, spec);
    }
    Ok(AnnotatedFrame {
        frame,
        cursor,
        annotation,
    })
}
