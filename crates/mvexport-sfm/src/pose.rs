/// A camera pose: world-to-camera rotation and the camera center in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3 {
    /// Rotation matrix (row-major) mapping world to camera coordinates
    pub rotation: [[f64; 3]; 3],
    /// Camera center in world coordinates
    pub center: [f64; 3],
}

impl Default for Pose3 {
    fn default() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            center: [0.0; 3],
        }
    }
}

impl Pose3 {
    /// Create a new pose from a rotation and a camera center.
    pub fn new(rotation: [[f64; 3]; 3], center: [f64; 3]) -> Self {
        Self { rotation, center }
    }

    /// The rotation matrix.
    pub fn rotation(&self) -> &[[f64; 3]; 3] {
        &self.rotation
    }

    /// The translation `t = -R * C`, so that `x_cam = R * x_world + t`.
    pub fn translation(&self) -> [f64; 3] {
        let r = &self.rotation;
        let c = &self.center;
        let mut t = [0.0; 3];
        for (i, ti) in t.iter_mut().enumerate() {
            *ti = -(r[i][0] * c[0] + r[i][1] * c[1] + r[i][2] * c[2]);
        }
        t
    }
}
