/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images or maps are expected to share a size.
    #[error("Image size mismatch: ({0}, {1}) vs ({2}, {3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the pixel index is out of bounds.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a pixel value cannot be cast to the target type.
    #[error("Failed to cast image data")]
    CastError,
}
