//! Radiometric read-out at the cursor.
//!
//! Samples are centikelvin; the overlay converts the sample under the
//! cursor to degrees Celsius and describes a marker plus label for the
//! host to draw over the tone-mapped frame.

use image::Rgb;
use imageproc::drawing::draw_filled_circle_mut;

use crate::tonemap::{DisplayFrame, SampleGrid16};

pub const KELVIN_OFFSET: f64 = 273.15;
pub const UNIT_SUFFIX: &str = "Degree Celsius";

pub const MARKER_RADIUS: i32 = 2;
/// Label anchor relative to the marker, up and to the left so the text
/// does not cover the marker.
pub const LABEL_OFFSET: (i32, i32) = (-40, -15);
pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Centikelvin sample to degrees Celsius. No range checking: garbage in,
/// implausible temperature out.
#[inline]
pub fn sample_to_physical(sample: u16) -> f64 {
    sample as f64 / 100.0 - KELVIN_OFFSET
}

/// Inverse of [`sample_to_physical`], rounded and saturated to the 16-bit range.
pub fn physical_to_sample(celsius: f64) -> u16 {
    ((celsius + KELVIN_OFFSET) * 100.0).round().clamp(0.0, u16::MAX as f64) as u16
}

/// Cursor position and the temperature under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSample {
    pub x: u32,
    pub y: u32,
    pub sample: u16,
    pub celsius: f64,
}

impl CursorSample {
    /// Read the grid at (x, y), clamped into the image. `None` for an empty grid.
    pub fn at(grid: &SampleGrid16, x: u32, y: u32) -> Option<Self> {
        let (w, h) = grid.dimensions();
        if w == 0 || h == 0 {
            return None;
        }
        let (x, y) = (x.min(w - 1), y.min(h - 1));
        let sample = grid.get_pixel(x, y)[0];
        Some(Self {
            x,
            y,
            sample,
            celsius: sample_to_physical(sample),
        })
    }

    pub fn annotation(&self) -> AnnotationSpec {
        describe_annotation(self.x as i32, self.y as i32, self.celsius)
    }
}

/// Marker plus text label, in image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    pub marker_center: (i32, i32),
    pub marker_radius: i32,
    pub label: String,
    /// Top-left of the label text.
    pub label_pos: (i32, i32),
    pub color: Rgb<u8>,
}

pub fn describe_annotation(x: i32, y: i32, celsius: f64) -> AnnotationSpec {
    AnnotationSpec {
        marker_center: (x, y),
        marker_radius: MARKER_RADIUS,
        label: format_temperature(celsius),
        label_pos: (x + LABEL_OFFSET.0, y + LABEL_OFFSET.1),
        color: ANNOTATION_COLOR,
    }
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1} {UNIT_SUFFIX}")
}

/// Draw the filled marker of `spec` into `frame`. Text is left to the
/// host, which owns the fonts.
pub fn composite_marker(frame: &mut DisplayFrame, spec: &AnnotationSpec) {
    draw_filled_circle_mut(frame, spec.marker_center, spec.marker_radius, spec.color);
}
