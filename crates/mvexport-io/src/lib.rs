#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`error::IoError`] variants for file access, encoding/decoding failures,
/// and format-specific errors.
pub mod error;

/// High-level image reading functions.
///
/// See [`functional::read_image_any_rgb8`] for automatic format detection.
pub mod functional;

/// JPEG image encoding and decoding.
///
/// Pure Rust JPEG codec for reading and writing JPEG images.
pub mod jpeg;

/// PNG image encoding and decoding.
pub mod png;

pub use crate::error::IoError;
