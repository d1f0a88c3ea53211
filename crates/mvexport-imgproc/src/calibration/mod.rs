/// image distortion module.
pub mod distortion;

/// Represents the instrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

/// A lens model able to map an ideal (undistorted) pixel to the pixel where the
/// lens actually images it.
pub trait PixelDistortion {
    /// Map an undistorted pixel coordinate to its distorted location.
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64);
}
