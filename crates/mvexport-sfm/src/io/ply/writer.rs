use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use super::{PlyError, VERTEX_PROPERTIES, VISIBILITY_PROPERTY};
use crate::colorize::ColoredPoint;

/// Confidence written for every vertex; MVE treats negative values as unknown.
const UNKNOWN_CONFIDENCE: i32 = -1;

/// Write colored points with their visibility lists as an ASCII PLY.
///
/// # Arguments
///
/// * `writer` - The destination, flushed before returning.
/// * `points` - The points in output order.
pub fn write_ply_visibility<W: Write>(
    mut writer: W,
    points: &[ColoredPoint],
) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment generated by mvexport")?;
    writeln!(writer, "element vertex {}", points.len())?;
    for (data_type, name) in VERTEX_PROPERTIES {
        writeln!(writer, "property {data_type} {name}")?;
    }
    writeln!(writer, "{VISIBILITY_PROPERTY}")?;
    writeln!(writer, "end_header")?;

    for point in points {
        let [x, y, z] = point.position;
        let [r, g, b] = point.color;
        write!(
            writer,
            "{x} {y} {z} {r} {g} {b} {UNKNOWN_CONFIDENCE} {}",
            point.visibility.len()
        )?;
        for index in &point.visibility {
            write!(writer, " {index}")?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;

    Ok(())
}

/// Write a visibility PLY file.
///
/// The data is written to a temporary sibling file which is renamed over `path`
/// once complete, so a failure never leaves a truncated file behind.
pub fn write_ply_visibility_file(
    path: impl AsRef<Path>,
    points: &[ColoredPoint],
) -> Result<(), PlyError> {
    let path = path.as_ref();
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = File::create(&tmp_path)
        .map_err(PlyError::from)
        .and_then(|file| write_ply_visibility(BufWriter::new(file), points));

    match result {
        Ok(()) => {
            std::fs::rename(&tmp_path, path)?;
            log::debug!("Wrote {} points to {}", points.len(), path.display());
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<ColoredPoint> {
        vec![
            ColoredPoint {
                position: [1.0, 2.5, -3.0],
                color: [255, 128, 0],
                visibility: vec![0, 2],
            },
            ColoredPoint {
                position: [0.0, 0.0, 0.0],
                color: [1, 2, 3],
                visibility: vec![1],
            },
        ]
    }

    #[test]
    fn write_ascii_layout() -> Result<(), PlyError> {
        let mut buffer = Vec::new();
        write_ply_visibility(&mut buffer, &points())?;

        let text = String::from_utf8_lossy(&buffer);
        let expected = "ply\n\
            format ascii 1.0\n\
            comment generated by mvexport\n\
            element vertex 2\n\
            property float x\n\
            property float y\n\
            property float z\n\
            property uchar red\n\
            property uchar green\n\
            property uchar blue\n\
            property float confidence\n\
            property list int int visibility\n\
            end_header\n\
            1 2.5 -3 255 128 0 -1 2 0 2\n\
            0 0 0 1 2 3 -1 1 1\n";
        assert_eq!(text, expected);

        Ok(())
    }

    #[test]
    fn write_empty_cloud() -> Result<(), PlyError> {
        let mut buffer = Vec::new();
        write_ply_visibility(&mut buffer, &[])?;

        let text = String::from_utf8_lossy(&buffer);
        assert!(text.contains("element vertex 0\n"));
        assert!(text.ends_with("end_header\n"));

        Ok(())
    }

    #[test]
    fn write_file_replaces_target() -> Result<(), PlyError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("calib.ply");
        std::fs::write(&path, "stale")?;

        write_ply_visibility_file(&path, &points())?;

        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("ply\n"));
        assert!(!tmp_dir.path().join("calib.ply.tmp").exists());

        Ok(())
    }

    #[test]
    fn write_file_missing_directory() {
        let tmp_dir = tempfile::tempdir().expect("tempdir");
        let path = tmp_dir.path().join("missing").join("calib.ply");
        let res = write_ply_visibility_file(&path, &points());
        assert!(matches!(res, Err(PlyError::Io(_))));
        assert!(!path.exists());
    }
}
