//! Thermal Tonemap - library crate.
//!
//! Tone maps 16-bit radiometric frames (centikelvin samples, as written by
//! thermal cameras) to 8-bit display frames and reads temperatures back
//! out at the cursor. Used by the viewer binary and the integration tests.

pub mod error;
pub mod image_io;
pub mod overlay;
pub mod pipeline;
pub mod synthetic;
pub mod tonemap;

pub use error::{Result, ToneMapError};
