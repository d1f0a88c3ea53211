use std::path::Path;

use mvexport_image::{Image, ImageSize};

use crate::{error::IoError, jpeg, png};

/// Reads an RGB8 image from the given file path.
///
/// JPEG and PNG files go through the dedicated decoders; any other format is
/// decoded with the image crate and converted to RGB8.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An image containing the image data.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref().to_owned();

    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    if jpeg::has_jpeg_extension(&file_path) {
        return jpeg::read_image_jpeg_rgb8(&file_path);
    }

    if file_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
    {
        return png::read_image_png_rgb8(&file_path);
    }

    let img = image::ImageReader::open(&file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Image::new(size, img.into_rgb8().into_raw())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_any_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("image.PNG");

        let image = Image::<u8, 3>::from_size_val([5, 4].into(), 9)?;
        png::write_image_png_rgb8(&file_path, &image)?;

        let image_back = read_image_any_rgb8(&file_path)?;
        assert_eq!(image_back, image);

        Ok(())
    }

    #[test]
    fn read_any_guessed_format() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let png_path = tmp_dir.path().join("image.png");
        let raw_path = tmp_dir.path().join("image.bin");

        let image = Image::<u8, 3>::from_size_val([3, 2].into(), 200)?;
        png::write_image_png_rgb8(&png_path, &image)?;
        std::fs::copy(&png_path, &raw_path)?;

        let image_back = read_image_any_rgb8(&raw_path)?;
        assert_eq!(image_back.size(), image.size());
        assert_eq!(image_back.as_slice(), image.as_slice());

        Ok(())
    }

    #[test]
    fn read_any_missing() {
        let res = read_image_any_rgb8("/nope/image.tif");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }
}
