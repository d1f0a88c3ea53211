//! Pixel interpolation methods for image transformations.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: uses the nearest pixel value (no interpolation)
//! - **Bilinear**: linear interpolation between the four adjacent pixels

mod bilinear;

/// Grid generation and coordinate mapping utilities.
pub mod grid;

pub(crate) mod interpolate;
mod nearest;
mod remap;

pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use remap::remap;
