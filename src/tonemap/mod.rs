//! 16-bit to 8-bit tone mapping.
//!
//! Every function here is pure: it reads its input grid and returns a new
//! one, so calls on independent inputs can run concurrently.

pub mod clahe;
pub mod color_balance;
pub mod equalize;
pub mod histogram;
pub mod normalize;

use image::{GrayImage, ImageBuffer, Luma, RgbImage};

/// Raw single-channel radiometric samples.
pub type SampleGrid16 = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Single-channel 8-bit display samples.
pub type SampleGrid8 = GrayImage;

/// Three-channel 8-bit frame that annotations can be drawn onto.
pub type DisplayFrame = RgbImage;

pub use clahe::{adaptive_equalize_histogram, adaptive_equalize_histogram_u8, TileGrid};
pub use color_balance::simplest_cb;
pub use equalize::{equalize_histogram, equalize_histogram_u8};
pub use histogram::{Histogram, LookupTable};
pub use normalize::{normalize, normalize_range};
