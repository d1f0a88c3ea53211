use crate::parallel;

use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use mvexport_image::{Image, ImageError};

/// Apply generic geometric transformation to an image.
///
/// Destination pixels whose source coordinate falls outside the input image
/// are set to zero.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map_x` - The x coordinates of the pixels to interpolate.
/// * `map_y` - The y coordinates of the pixels to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Errors
///
/// * The mapx and mapy must have the same size.
/// * The output image must have the same size as the mapx and mapy.
pub fn remap<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if map_x.size() != map_y.size() {
        return Err(ImageError::InvalidImageSize(
            map_x.rows(),
            map_x.cols(),
            map_y.rows(),
            map_y.cols(),
        ));
    }

    if dst.size() != map_x.size() {
        return Err(ImageError::InvalidImageSize(
            map_x.rows(),
            map_x.cols(),
            dst.rows(),
            dst.cols(),
        ));
    }

    if src.cols() == 0 || src.rows() == 0 {
        dst.as_slice_mut().fill(0.0);
        return Ok(());
    }

    let (max_x, max_y) = ((src.cols() - 1) as f32, (src.rows() - 1) as f32);

    parallel::par_iter_rows_resample(dst, map_x, map_y, |&x, &y, dst_pixel| {
        if !(0.0..=max_x).contains(&x) || !(0.0..=max_y).contains(&y) {
            dst_pixel.fill(0.0);
            return;
        }
        let pixel = interpolate_pixel(src, x, y, interpolation);
        dst_pixel.copy_from_slice(&pixel);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use mvexport_image::{Image, ImageError, ImageSize};

    #[test]
    fn remap_smoke() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 3,
                height: 3,
            },
            vec![0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )?;

        let new_size = ImageSize {
            width: 2,
            height: 2,
        };

        let map_x = Image::new(new_size, vec![0.0, 2.0, 0.0, 2.0])?;
        let map_y = Image::new(new_size, vec![0.0, 0.0, 2.0, 2.0])?;

        let expected = [0.0, 2.0, 6.0, 8.0];

        let mut image_transformed = Image::<_, 1>::from_size_val(new_size, 0.0)?;

        super::remap(
            &image,
            &mut image_transformed,
            &map_x,
            &map_y,
            super::InterpolationMode::Bilinear,
        )?;

        assert_eq!(image_transformed.num_channels(), 1);
        assert_eq!(image_transformed.size(), new_size);

        for (a, b) in image_transformed.as_slice().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }

        Ok(())
    }

    #[test]
    fn remap_out_of_bounds_is_black() -> Result<(), ImageError> {
        let image = Image::<_, 3>::from_size_val([2, 2].into(), 1.0f32)?;
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let map_x = Image::new(size, vec![-0.5, 5.0])?;
        let map_y = Image::new(size, vec![0.0, 0.0])?;
        let mut dst = Image::<_, 3>::from_size_val(size, 0.5f32)?;

        super::remap(
            &image,
            &mut dst,
            &map_x,
            &map_y,
            super::InterpolationMode::Bilinear,
        )?;

        assert!(dst.as_slice().iter().all(|&v| v == 0.0));

        Ok(())
    }

    #[test]
    fn remap_size_mismatch() -> Result<(), ImageError> {
        let image = Image::<_, 1>::from_size_val([2, 2].into(), 1.0f32)?;
        let map_x = Image::from_size_val([2, 2].into(), 0.0f32)?;
        let map_y = Image::from_size_val([2, 1].into(), 0.0f32)?;
        let mut dst = Image::<_, 1>::from_size_val([2, 2].into(), 0.0f32)?;

        let res = super::remap(
            &image,
            &mut dst,
            &map_x,
            &map_y,
            super::InterpolationMode::Nearest,
        );
        assert!(res.is_err());

        Ok(())
    }
}
