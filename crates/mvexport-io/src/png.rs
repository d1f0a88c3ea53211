use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use mvexport_image::{Image, ImageSize};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};

use crate::error::IoError;

/// Read a PNG image with three channels (rgb8).
///
/// Palette, grayscale and 16 bit images are expanded to 8 bit RGB and the alpha
/// channel, if any, is dropped.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
pub fn read_image_png_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref().to_owned();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let file = File::open(file_path)?;
    let mut decoder = Decoder::new(BufReader::new(file));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::PngDecode(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecode(e.to_string()))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != BitDepth::Eight {
        return Err(IoError::PngDecode(format!(
            "Unsupported bit depth after expansion: {:?}",
            info.bit_depth
        )));
    }

    let rgb = match info.color_type {
        ColorType::Rgb => buf,
        ColorType::Rgba => buf
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v]).collect(),
        ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0]])
            .collect(),
        ColorType::Indexed => {
            return Err(IoError::PngDecode(
                "Indexed color was not expanded".to_string(),
            ))
        }
    };

    let size = ImageSize {
        width: info.width as usize,
        height: info.height as usize,
    };

    Ok(Image::new(size, rgb)?)
}

/// Writes the given PNG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image containing the pixel data.
pub fn write_image_png_rgb8(file_path: impl AsRef<Path>, image: &Image<u8, 3>) -> Result<(), IoError> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);

    let mut encoder = Encoder::new(writer, image.width() as u32, image.height() as u32);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncode(e.to_string()))?;
    writer
        .write_image_data(image.as_slice())
        .map_err(|e| IoError::PngEncode(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| IoError::PngEncode(e.to_string()))?;

    Ok(())
}
