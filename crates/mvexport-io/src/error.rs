use std::path::PathBuf;

/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// The file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(PathBuf),

    /// The file extension does not match the codec.
    #[error("Unexpected file extension: {0}")]
    InvalidFileExtension(PathBuf),

    /// Reading or writing the file failed.
    #[error("File access failed")]
    File(#[from] std::io::Error),

    /// The JPEG stream could not be decoded.
    #[error("Failed to decode JPEG")]
    JpegDecode(#[from] zune_jpeg::errors::DecodeErrors),

    /// The JPEG stream could not be encoded.
    #[error("Failed to encode JPEG")]
    JpegEncode(#[from] jpeg_encoder::EncodingError),

    /// The PNG stream could not be decoded.
    #[error("Failed to decode PNG: {0}")]
    PngDecode(String),

    /// The PNG stream could not be encoded.
    #[error("Failed to encode PNG: {0}")]
    PngEncode(String),

    /// A format without a dedicated codec could not be decoded.
    #[error("Failed to decode image")]
    Decode(#[from] image::ImageError),

    /// The decoded buffer does not form a valid image.
    #[error("Invalid decoded image")]
    Image(#[from] mvexport_image::ImageError),

    /// The image dimensions cannot be represented by the encoder.
    #[error("Image of size {0}x{1} exceeds the encoder limits")]
    ImageTooLarge(usize, usize),
}
