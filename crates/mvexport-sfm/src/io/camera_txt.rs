use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use crate::pose::Pose3;

/// Number of calibration values on the first line of a camera file.
pub const NUM_CAMERA_PARAMS: usize = 6;

/// Error types for the camera file module.
#[derive(Debug, thiserror::Error)]
pub enum CameraTxtError {
    /// Error reading or writing file
    #[error("error reading or writing camera file")]
    IoError(#[from] std::io::Error),

    /// Invalid number of camera parameters
    #[error("Invalid number of camera parameters {0}, expected at least {NUM_CAMERA_PARAMS}")]
    InvalidNumCameraParams(usize),

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),
}

/// A camera as stored in an MVE camera file.
#[derive(Debug, Clone, PartialEq)]
pub struct MveCamera {
    /// Focal length, principal point and three radial coefficients
    pub params: [f64; NUM_CAMERA_PARAMS],
    /// World-to-camera rotation, row-major
    pub rotation: [[f64; 3]; 3],
    /// Translation `t = -R * C`
    pub translation: [f64; 3],
}

fn join<'a>(values: impl IntoIterator<Item = &'a f64>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write a camera file.
///
/// The file has three lines: the six leading calibration parameters, the
/// rotation matrix as nine row-major values and the translation vector.
///
/// # Arguments
///
/// * `writer` - The destination, flushed before returning.
/// * `params` - The intrinsic parameters; only the first six are written.
/// * `pose` - The camera pose.
pub fn write_camera_txt<W: Write>(
    mut writer: W,
    params: &[f64],
    pose: &Pose3,
) -> Result<(), CameraTxtError> {
    let params = params
        .get(..NUM_CAMERA_PARAMS)
        .ok_or(CameraTxtError::InvalidNumCameraParams(params.len()))?;

    writeln!(writer, "{}", join(params))?;
    writeln!(writer, "{}", join(pose.rotation().iter().flatten()))?;
    writeln!(writer, "{}", join(pose.translation().iter()))?;
    writer.flush()?;

    Ok(())
}

fn parse_line<const N: usize>(line: Option<&str>) -> Result<[f64; N], CameraTxtError> {
    let line = line.ok_or_else(|| CameraTxtError::ParseError("missing line".into()))?;
    let values = line
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|e| CameraTxtError::ParseError(format!("{v}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let len = values.len();
    values
        .try_into()
        .map_err(|_| CameraTxtError::ParseError(format!("expected {N} values, got {len}")))
}

/// Read a camera file written by [`write_camera_txt`].
pub fn read_camera_txt(path: impl AsRef<Path>) -> Result<MveCamera, CameraTxtError> {
    let file = File::open(path)?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()?;
    let mut lines = lines.iter().map(String::as_str);

    let params = parse_line::<NUM_CAMERA_PARAMS>(lines.next())?;
    let r = parse_line::<9>(lines.next())?;
    let translation = parse_line::<3>(lines.next())?;

    Ok(MveCamera {
        params,
        rotation: [[r[0], r[1], r[2]], [r[3], r[4], r[5]], [r[6], r[7], r[8]]],
        translation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_camera_lines() -> Result<(), CameraTxtError> {
        let rotation = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let pose = Pose3::new(rotation, [2.0, 1.0, 5.0]);

        let mut buffer = Vec::new();
        write_camera_txt(&mut buffer, &[800.0, 320.5, 240.0, 0.1, -0.02, 0.0, 9.0], &pose)?;

        let text = String::from_utf8_lossy(&buffer);
        assert_eq!(
            text,
            "800 320.5 240 0.1 -0.02 0\n0 -1 0 1 0 0 0 0 1\n1 -2 -5\n"
        );

        Ok(())
    }

    #[test]
    fn write_too_few_params() {
        let res = write_camera_txt(Vec::new(), &[800.0, 320.0, 240.0], &Pose3::default());
        assert!(matches!(res, Err(CameraTxtError::InvalidNumCameraParams(3))));
    }

    #[test]
    fn write_then_read() -> Result<(), CameraTxtError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("00000000.txt");

        let pose = Pose3::new(Pose3::default().rotation, [0.5, 0.25, -1.0]);
        let params = [1000.0, 512.0, 384.0, 1e-3, 0.0, -2e-5];
        write_camera_txt(File::create(&path)?, &params, &pose)?;

        let camera = read_camera_txt(&path)?;
        assert_eq!(camera.params, params);
        assert_eq!(camera.rotation, pose.rotation);
        assert_eq!(camera.translation, [-0.5, -0.25, 1.0]);

        Ok(())
    }
}
