use mvexport_image::ImageSize;
use mvexport_imgproc::calibration::{
    distortion::{distort_point_polynomial, PolynomialDistortion},
    CameraIntrinsic, PixelDistortion,
};

/// Capabilities shared by every supported camera intrinsic model.
///
/// Every model can map an ideal pixel to its distorted location through
/// [`PixelDistortion`], so images of any model can be undistorted generically.
pub trait CameraModel: PixelDistortion + Send + Sync {
    /// Name of the model as used in scene files.
    fn name(&self) -> &'static str;

    /// The image size the calibration refers to.
    fn image_size(&self) -> ImageSize;

    /// The calibration parameters: focal, principal point, then distortion terms.
    fn params(&self) -> Vec<f64>;

    /// Returns true if the lens model bends rays, i.e. a distortion term is nonzero.
    fn has_distortion(&self) -> bool;

    /// Returns true if the model can be written to an MVE camera file.
    fn supports_export(&self) -> bool {
        false
    }
}

/// A pinhole camera with a single focal length and no distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Focal length in pixels
    pub focal: f64,
    /// Principal point in pixels (ppx, ppy)
    pub principal_point: [f64; 2],
}

impl PinholeCamera {
    fn intrinsic(&self) -> CameraIntrinsic {
        CameraIntrinsic {
            fx: self.focal,
            fy: self.focal,
            cx: self.principal_point[0],
            cy: self.principal_point[1],
        }
    }

    fn base_params(&self) -> Vec<f64> {
        vec![self.focal, self.principal_point[0], self.principal_point[1]]
    }

    fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width as usize,
            height: self.height as usize,
        }
    }
}

impl PixelDistortion for PinholeCamera {
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}

impl CameraModel for PinholeCamera {
    fn name(&self) -> &'static str {
        "pinhole"
    }

    fn image_size(&self) -> ImageSize {
        self.size()
    }

    fn params(&self) -> Vec<f64> {
        self.base_params()
    }

    fn has_distortion(&self) -> bool {
        false
    }
}

/// A pinhole camera with one radial distortion coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeRadialK1 {
    /// Pinhole part of the model
    pub pinhole: PinholeCamera,
    /// Radial distortion coefficient
    pub k1: f64,
}

impl PixelDistortion for PinholeRadialK1 {
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let distortion = PolynomialDistortion {
            k1: self.k1,
            ..Default::default()
        };
        distort_point_polynomial(x, y, &self.pinhole.intrinsic(), &distortion)
    }
}

impl CameraModel for PinholeRadialK1 {
    fn name(&self) -> &'static str {
        "pinhole_radial_k1"
    }

    fn image_size(&self) -> ImageSize {
        self.pinhole.size()
    }

    fn params(&self) -> Vec<f64> {
        let mut params = self.pinhole.base_params();
        params.push(self.k1);
        params
    }

    fn has_distortion(&self) -> bool {
        self.k1 != 0.0
    }
}

/// A pinhole camera with three radial distortion coefficients.
///
/// This is the model MVE camera files are written for: its six parameters
/// `f ppx ppy k1 k2 k3` form the first line of the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeRadialK3 {
    /// Pinhole part of the model
    pub pinhole: PinholeCamera,
    /// Radial distortion coefficients (k1, k2, k3)
    pub k: [f64; 3],
}

impl PixelDistortion for PinholeRadialK3 {
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let distortion = PolynomialDistortion {
            k1: self.k[0],
            k2: self.k[1],
            k3: self.k[2],
            ..Default::default()
        };
        distort_point_polynomial(x, y, &self.pinhole.intrinsic(), &distortion)
    }
}

impl CameraModel for PinholeRadialK3 {
    fn name(&self) -> &'static str {
        "pinhole_radial_k3"
    }

    fn image_size(&self) -> ImageSize {
        self.pinhole.size()
    }

    fn params(&self) -> Vec<f64> {
        let mut params = self.pinhole.base_params();
        params.extend_from_slice(&self.k);
        params
    }

    fn has_distortion(&self) -> bool {
        self.k.iter().any(|&k| k != 0.0)
    }

    fn supports_export(&self) -> bool {
        true
    }
}

/// A pinhole camera with three radial and two tangential distortion coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeBrownT2 {
    /// Pinhole part of the model
    pub pinhole: PinholeCamera,
    /// Radial distortion coefficients (k1, k2, k3)
    pub k: [f64; 3],
    /// Tangential distortion coefficients (t1, t2)
    pub t: [f64; 2],
}

impl PixelDistortion for PinholeBrownT2 {
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let distortion = PolynomialDistortion {
            k1: self.k[0],
            k2: self.k[1],
            k3: self.k[2],
            p1: self.t[0],
            p2: self.t[1],
            ..Default::default()
        };
        distort_point_polynomial(x, y, &self.pinhole.intrinsic(), &distortion)
    }
}

impl CameraModel for PinholeBrownT2 {
    fn name(&self) -> &'static str {
        "pinhole_brown_t2"
    }

    fn image_size(&self) -> ImageSize {
        self.pinhole.size()
    }

    fn params(&self) -> Vec<f64> {
        let mut params = self.pinhole.base_params();
        params.extend_from_slice(&self.k);
        params.extend_from_slice(&self.t);
        params
    }

    fn has_distortion(&self) -> bool {
        self.k.iter().chain(self.t.iter()).any(|&k| k != 0.0)
    }
}

/// An equidistant fisheye camera with four distortion coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FisheyeCamera {
    /// Pinhole part of the model
    pub pinhole: PinholeCamera,
    /// Distortion coefficients (k1, k2, k3, k4)
    pub k: [f64; 4],
}

impl PixelDistortion for FisheyeCamera {
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        const EPS: f64 = 1e-8;

        let intrinsic = self.pinhole.intrinsic();
        let xn = (x - intrinsic.cx) / intrinsic.fx;
        let yn = (y - intrinsic.cy) / intrinsic.fy;

        let r = (xn * xn + yn * yn).sqrt();
        let theta = r.atan();
        let theta2 = theta * theta;
        let theta4 = theta2 * theta2;
        let theta6 = theta4 * theta2;
        let theta8 = theta4 * theta4;
        let theta_dist = theta
            * (1.0
                + self.k[0] * theta2
                + self.k[1] * theta4
                + self.k[2] * theta6
                + self.k[3] * theta8);

        let scale = if r > EPS { theta_dist / r } else { 1.0 };

        (
            intrinsic.fx * xn * scale + intrinsic.cx,
            intrinsic.fy * yn * scale + intrinsic.cy,
        )
    }
}

impl CameraModel for FisheyeCamera {
    fn name(&self) -> &'static str {
        "fisheye"
    }

    fn image_size(&self) -> ImageSize {
        self.pinhole.size()
    }

    fn params(&self) -> Vec<f64> {
        let mut params = self.pinhole.base_params();
        params.extend_from_slice(&self.k);
        params
    }

    fn has_distortion(&self) -> bool {
        true
    }
}

/// A camera intrinsic as stored in a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Intrinsic {
    /// Pinhole model without distortion
    Pinhole(PinholeCamera),
    /// Pinhole model with one radial coefficient
    PinholeRadialK1(PinholeRadialK1),
    /// Pinhole model with three radial coefficients
    PinholeRadialK3(PinholeRadialK3),
    /// Pinhole model with radial and tangential coefficients
    PinholeBrownT2(PinholeBrownT2),
    /// Equidistant fisheye model
    Fisheye(FisheyeCamera),
    /// A model this crate cannot interpret; views using it are never exported.
    Unsupported {
        /// Model name found in the scene file
        name: String,
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
    },
}

impl Intrinsic {
    /// Access the model capabilities, if the model is known.
    pub fn as_model(&self) -> Option<&dyn CameraModel> {
        match self {
            Intrinsic::Pinhole(cam) => Some(cam),
            Intrinsic::PinholeRadialK1(cam) => Some(cam),
            Intrinsic::PinholeRadialK3(cam) => Some(cam),
            Intrinsic::PinholeBrownT2(cam) => Some(cam),
            Intrinsic::Fisheye(cam) => Some(cam),
            Intrinsic::Unsupported { .. } => None,
        }
    }

    /// Name of the model.
    pub fn name(&self) -> &str {
        match self {
            Intrinsic::Unsupported { name, .. } => name,
            _ => self.as_model().map_or("unknown", |m| m.name()),
        }
    }

    /// Returns true if the model can be written to an MVE camera file.
    pub fn supports_export(&self) -> bool {
        self.as_model().is_some_and(|m| m.supports_export())
    }

    /// Returns true if the lens model has a nonzero distortion.
    pub fn has_distortion(&self) -> bool {
        self.as_model().is_some_and(|m| m.has_distortion())
    }

    /// The calibration parameters, empty for unsupported models.
    pub fn params(&self) -> Vec<f64> {
        self.as_model().map(|m| m.params()).unwrap_or_default()
    }
}

impl PixelDistortion for Intrinsic {
    fn distort_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        match self.as_model() {
            Some(model) => model.distort_pixel(x, y),
            None => (x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pinhole() -> PinholeCamera {
        PinholeCamera {
            width: 640,
            height: 480,
            focal: 500.0,
            principal_point: [320.0, 240.0],
        }
    }

    #[test]
    fn radial_k3_params_and_capabilities() {
        let cam = Intrinsic::PinholeRadialK3(PinholeRadialK3 {
            pinhole: pinhole(),
            k: [0.1, -0.01, 0.001],
        });
        assert_eq!(cam.params(), vec![500.0, 320.0, 240.0, 0.1, -0.01, 0.001]);
        assert!(cam.supports_export());
        assert!(cam.has_distortion());
        assert_eq!(cam.name(), "pinhole_radial_k3");
    }

    #[test]
    fn radial_k3_without_distortion() {
        let cam = Intrinsic::PinholeRadialK3(PinholeRadialK3 {
            pinhole: pinhole(),
            k: [0.0; 3],
        });
        assert!(cam.supports_export());
        assert!(!cam.has_distortion());
        let (x, y) = cam.distort_pixel(12.5, 400.0);
        assert_relative_eq!(x, 12.5, epsilon = 1e-9);
        assert_relative_eq!(y, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn only_radial_k3_is_exportable() {
        let others = [
            Intrinsic::Pinhole(pinhole()),
            Intrinsic::PinholeRadialK1(PinholeRadialK1 {
                pinhole: pinhole(),
                k1: 0.2,
            }),
            Intrinsic::PinholeBrownT2(PinholeBrownT2 {
                pinhole: pinhole(),
                k: [0.1, 0.0, 0.0],
                t: [0.001, 0.002],
            }),
            Intrinsic::Fisheye(FisheyeCamera {
                pinhole: pinhole(),
                k: [0.0; 4],
            }),
            Intrinsic::Unsupported {
                name: "spherical".to_string(),
                width: 10,
                height: 10,
            },
        ];
        for cam in others.iter() {
            assert!(!cam.supports_export(), "{} should not export", cam.name());
        }
    }

    #[test]
    fn radial_k3_matches_closed_form() {
        let cam = PinholeRadialK3 {
            pinhole: pinhole(),
            k: [0.1, 0.01, 0.001],
        };
        // normalized (0.2, 0.1): r2 = 0.05
        let r2: f64 = 0.05;
        let coeff = 1.0 + 0.1 * r2 + 0.01 * r2 * r2 + 0.001 * r2 * r2 * r2;
        let (x, y) = cam.distort_pixel(420.0, 290.0);
        assert_relative_eq!(x, 320.0 + 500.0 * 0.2 * coeff, epsilon = 1e-9);
        assert_relative_eq!(y, 240.0 + 500.0 * 0.1 * coeff, epsilon = 1e-9);
    }

    #[test]
    fn fisheye_center_is_fixed() {
        let cam = FisheyeCamera {
            pinhole: pinhole(),
            k: [0.01, 0.02, 0.0, 0.0],
        };
        let (x, y) = cam.distort_pixel(320.0, 240.0);
        assert_relative_eq!(x, 320.0);
        assert_relative_eq!(y, 240.0);

        // pure equidistant projection compresses radially
        let (x, _) = FisheyeCamera {
            pinhole: pinhole(),
            k: [0.0; 4],
        }
        .distort_pixel(820.0, 240.0);
        assert_relative_eq!(x, 320.0 + 500.0 * 1.0f64.atan(), epsilon = 1e-9);
    }
}
