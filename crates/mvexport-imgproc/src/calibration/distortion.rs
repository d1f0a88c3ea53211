use super::{CameraIntrinsic, PixelDistortion};
use crate::interpolation::{grid::meshgrid_from_fn, remap, InterpolationMode};
use mvexport_image::{Image, ImageError, ImageSize};

/// Represents the polynomial distortion parameters of a camera
///
/// # Fields
///
/// * `k1` - The first radial distortion coefficient
/// * `k2` - The second radial distortion coefficient
/// * `k3` - The third radial distortion coefficient
/// * `k4` - The fourth radial distortion coefficient
/// * `k5` - The fifth radial distortion coefficient
/// * `k6` - The sixth radial distortion coefficient
/// * `p1` - The first tangential distortion coefficient
/// * `p2` - The second tangential distortion coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
    /// The fifth radial distortion coefficient
    pub k5: f64,
    /// The sixth radial distortion coefficient
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
}

/// Distort a point using polynomial distortion
///
/// # Arguments
///
/// * `x` - The x coordinate of the point
/// * `y` - The y coordinate of the point
/// * `intrinsic` - The intrinsic parameters of the camera
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// * `x` - The x coordinate of the distorted point
/// * `y` - The y coordinate of the distorted point
pub fn distort_point_polynomial(
    x: f64,
    y: f64,
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    // unpack the intrinsic and distortion parameters
    let (fx, fy, cx, cy) = (intrinsic.fx, intrinsic.fy, intrinsic.cx, intrinsic.cy);
    let (k1, k2, k3, k4, k5, k6, p1, p2) = (
        distortion.k1,
        distortion.k2,
        distortion.k3,
        distortion.k4,
        distortion.k5,
        distortion.k6,
        distortion.p1,
        distortion.p2,
    );

    // normalize the coordinates
    let x = (x - cx) / fx;
    let y = (y - cy) / fy;

    // calculate the radial distance
    let r2 = x * x + y * y;

    // radial distortion
    let kr = (1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2)
        / (1.0 + k4 * r2 + k5 * r2 * r2 + k6 * r2 * r2 * r2);

    // tangential distortion
    let xd = x * kr + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let yd = y * kr + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

    // denormalize the coordinates
    let xdst = fx * xd + cx;
    let ydst = fy * yd + cy;

    (xdst, ydst)
}

/// Generate the undistortion map for a lens model.
///
/// Every pixel of the undistorted output stores the location in the distorted
/// source image it has to be sampled from.
///
/// # Arguments
///
/// * `distortion` - The lens model of the camera
/// * `size` - The size of the image
///
/// # Returns
///
/// * `map_x` - The x map for undistorting the image
/// * `map_y` - The y map for undistorting the image
pub fn generate_correction_map<D: PixelDistortion + ?Sized>(
    distortion: &D,
    size: &ImageSize,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    meshgrid_from_fn(size.width, size.height, |x, y| {
        let (xdst, ydst) = distortion.distort_pixel(x as f64, y as f64);
        (xdst as f32, ydst as f32)
    })
}

/// Undistort an rgb8 image.
///
/// Pixels of the output that map outside the source image are black.
///
/// # Arguments
///
/// * `src` - The distorted input image
/// * `distortion` - The lens model of the camera that captured `src`
/// * `interpolation` - The interpolation mode to use
pub fn undistort_image<D: PixelDistortion + ?Sized>(
    src: &Image<u8, 3>,
    distortion: &D,
    interpolation: InterpolationMode,
) -> Result<Image<u8, 3>, ImageError> {
    let (map_x, map_y) = generate_correction_map(distortion, &src.size())?;

    let src_f32 = src.cast_and_scale::<f32>(1.0 / 255.0)?;
    let mut dst_f32 = Image::from_size_val(src.size(), 0.0f32)?;
    remap(&src_f32, &mut dst_f32, &map_x, &map_y, interpolation)?;

    dst_f32.scale_and_cast(255.0)
}
