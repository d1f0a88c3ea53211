use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use mvexport_image::Image;

/// Interpolation mode for the remap operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// The image must not be empty.
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated pixel values.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> [f32; C] {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvexport_image::{Image, ImageError, ImageSize};

    #[test]
    fn interpolate_bilinear_center() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0, 1.0, 2.0, 3.0],
        )?;
        let [v] = interpolate_pixel(&image, 0.5, 0.5, InterpolationMode::Bilinear);
        approx::assert_relative_eq!(v, 1.5);

        let [v] = interpolate_pixel(&image, 1.0, 1.0, InterpolationMode::Bilinear);
        approx::assert_relative_eq!(v, 3.0);

        Ok(())
    }

    #[test]
    fn interpolate_nearest() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0, 1.0, 2.0, 3.0],
        )?;
        let [v] = interpolate_pixel(&image, 0.6, 0.2, InterpolationMode::Nearest);
        assert_eq!(v, 1.0);

        Ok(())
    }
}
