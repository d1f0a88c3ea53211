use crate::error::IoError;
use jpeg_encoder::{ColorType, Encoder};
use mvexport_image::{Image, ImageSize};
use std::{fs, path::Path};

/// Returns true if the path carries a JPEG extension (`jpg` or `jpeg`, any case).
pub fn has_jpeg_extension(file_path: impl AsRef<Path>) -> bool {
    file_path.as_ref().extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")
    })
}

/// Writes the given JPEG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG image.
/// - `image` - The image containing the pixel data
/// - `quality` - The quality of the JPEG encoding, range from 0 (lowest) to 100 (highest)
pub fn write_image_jpeg_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
    quality: u8,
) -> Result<(), IoError> {
    let image_size = image.size();
    let (Ok(width), Ok(height)) = (
        u16::try_from(image_size.width),
        u16::try_from(image_size.height),
    ) else {
        return Err(IoError::ImageTooLarge(image_size.width, image_size.height));
    };

    let encoder = Encoder::new_file(file_path, quality)?;
    encoder.encode(image.as_slice(), width, height, ColorType::Rgb)?;

    Ok(())
}

/// Read a JPEG image with three channels _(rgb8)_.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG file.
pub fn read_image_jpeg_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref().to_owned();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    if !has_jpeg_extension(&file_path) {
        return Err(IoError::InvalidFileExtension(file_path));
    }

    let jpeg_data = fs::read(file_path)?;
    decode_image_jpeg_rgb8(&jpeg_data)
}

/// Decodes a JPEG image with three channels _(rgb8)_ from raw bytes.
pub fn decode_image_jpeg_rgb8(src: &[u8]) -> Result<Image<u8, 3>, IoError> {
    let mut decoder = zune_jpeg::JpegDecoder::new(src);
    decoder.decode_headers()?;

    let image_info = decoder.info().ok_or_else(|| {
        IoError::JpegDecode(zune_jpeg::errors::DecodeErrors::Format(String::from(
            "Failed to find image info from its metadata",
        )))
    })?;

    let image_size = ImageSize {
        width: image_info.width as usize,
        height: image_info.height as usize,
    };

    let img_data = decoder.decode()?;

    Ok(Image::new(image_size, img_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_extension() {
        assert!(has_jpeg_extension("a/b/c.jpg"));
        assert!(has_jpeg_extension("c.JPG"));
        assert!(has_jpeg_extension("c.Jpeg"));
        assert!(!has_jpeg_extension("c.png"));
        assert!(!has_jpeg_extension("jpg"));
    }

    #[test]
    fn read_write_jpeg() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("flat.jpg");

        let image = Image::<u8, 3>::from_size_val([32, 16].into(), 120)?;
        write_image_jpeg_rgb8(&file_path, &image, 100)?;
        assert!(file_path.exists(), "File does not exist: {:?}", file_path);

        let image_back = read_image_jpeg_rgb8(&file_path)?;
        assert_eq!(image_back.cols(), 32);
        assert_eq!(image_back.rows(), 16);
        assert_eq!(image_back.num_channels(), 3);

        // a flat image survives lossy compression almost untouched
        for &v in image_back.as_slice() {
            assert!((v as i32 - 120).abs() <= 2, "value {v}");
        }

        Ok(())
    }

    #[test]
    fn read_jpeg_wrong_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("image.png");
        std::fs::write(&file_path, b"not a jpeg")?;

        let res = read_image_jpeg_rgb8(&file_path);
        assert!(matches!(res, Err(IoError::InvalidFileExtension(_))));

        Ok(())
    }

    #[test]
    fn read_jpeg_missing() {
        let res = read_image_jpeg_rgb8("/definitely/not/here.jpg");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }
}
