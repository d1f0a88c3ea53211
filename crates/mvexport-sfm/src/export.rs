use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use mvexport_image::ImageError;
use mvexport_imgproc::{calibration::distortion::undistort_image, interpolation::InterpolationMode};
use mvexport_io::{
    functional::read_image_any_rgb8,
    jpeg::{has_jpeg_extension, write_image_jpeg_rgb8},
    IoError,
};

use crate::{
    colorize::{colorize_tracks, ColorizeError, FileImageSource},
    io::{
        camera_txt::{write_camera_txt, CameraTxtError},
        ply::{write_ply_visibility_file, PlyError},
        sfm_json::SfmJsonError,
    },
    reindex::{reindex_views, ExportableView, ViewExporter},
    scene::{IndexT, SfmData},
};

/// Contents of the marker file MVE looks for in a scene directory.
const VIEWS_MARKER: &str = "MVE checks for the presence of this file to determine that this directory\n\
    contains OpenMVE data, but MVE ignores the contents of this file.\n";

/// Error types for writing an MVE scene.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A file or directory could not be written
    #[error("Failed to write {path}")]
    Io {
        /// The file being written
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// An image could not be read or encoded
    #[error("Failed to process image {path} of view {view_id}")]
    Image {
        /// The view being exported
        view_id: IndexT,
        /// The image being read or written
        path: PathBuf,
        /// The underlying error
        #[source]
        source: IoError,
    },

    /// An image could not be undistorted
    #[error("Failed to undistort image of view {view_id}")]
    Undistort {
        /// The view being exported
        view_id: IndexT,
        /// The underlying error
        #[source]
        source: ImageError,
    },

    /// The camera file could not be written
    #[error("Failed to write camera file {path} of view {view_id}")]
    CameraFile {
        /// The view being exported
        view_id: IndexT,
        /// The camera file
        path: PathBuf,
        /// The underlying error
        #[source]
        source: CameraTxtError,
    },

    /// An output directory is not accessible
    #[error("Cannot access output directory {0}")]
    Directory(PathBuf),
}

/// Error types for the whole conversion.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The scene could not be loaded
    #[error(transparent)]
    Scene(#[from] SfmJsonError),

    /// A view could not be exported
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The tracks could not be colored
    #[error(transparent)]
    Colorize(#[from] ColorizeError),

    /// The point cloud could not be written
    #[error(transparent)]
    Ply(#[from] PlyError),
}

/// Layout and encoding options of an exported scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// The scene directory
    pub output_dir: PathBuf,
    /// Directory of the exported images, relative to `output_dir`
    pub images_dir: String,
    /// Directory of the camera files, relative to `output_dir`
    pub cameras_dir: String,
    /// Directory of the point cloud, relative to `output_dir`
    pub clouds_dir: String,
    /// Name of the marker file in `output_dir`
    pub views_file: String,
    /// Name of the point cloud in `clouds_dir`
    pub ply_file: String,
    /// Quality of re-encoded images, from 0 to 100
    pub jpeg_quality: u8,
    /// Number of digits exported file names are zero padded to
    pub index_padding: usize,
    /// Interpolation used when undistorting images
    pub interpolation: InterpolationMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("mve_scene"),
            images_dir: "images".to_string(),
            cameras_dir: "cameras_disto".to_string(),
            clouds_dir: "clouds".to_string(),
            views_file: "views.txt".to_string(),
            ply_file: "calib.ply".to_string(),
            jpeg_quality: 95,
            index_padding: 8,
            interpolation: InterpolationMode::Bilinear,
        }
    }
}

impl ExportConfig {
    /// The default layout rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }
}

/// The resolved output paths of a scene export.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDirs {
    /// The scene directory
    pub root: PathBuf,
    /// Directory of the exported images
    pub images: PathBuf,
    /// Directory of the camera files
    pub cameras: PathBuf,
    /// Directory of the point cloud
    pub clouds: PathBuf,
    /// The marker file
    pub views_file: PathBuf,
    /// The point cloud file
    pub ply_file: PathBuf,
}

impl OutputDirs {
    /// Resolve the output paths of `config`.
    pub fn new(config: &ExportConfig) -> Self {
        let root = config.output_dir.clone();
        let clouds = root.join(&config.clouds_dir);
        Self {
            images: root.join(&config.images_dir),
            cameras: root.join(&config.cameras_dir),
            views_file: root.join(&config.views_file),
            ply_file: clouds.join(&config.ply_file),
            clouds,
            root,
        }
    }
}

/// Create the output directories of `config`.
///
/// # Errors
///
/// Fails if a directory cannot be created or is not a directory afterwards.
pub fn prepare_output_dirs(config: &ExportConfig) -> Result<OutputDirs, ExportError> {
    let dirs = OutputDirs::new(config);

    for dir in [&dirs.root, &dirs.images, &dirs.cameras, &dirs.clouds] {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.clone(),
            source,
        })?;
        if !dir.is_dir() {
            return Err(ExportError::Directory(dir.clone()));
        }
    }

    Ok(dirs)
}

/// Write the marker file identifying `dirs.root` as an MVE scene.
pub fn write_views_marker(dirs: &OutputDirs) -> Result<(), ExportError> {
    std::fs::write(&dirs.views_file, VIEWS_MARKER).map_err(|source| ExportError::Io {
        path: dirs.views_file.clone(),
        source,
    })
}

/// How the image of an exported view is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageExport {
    /// Read, undistort and encode
    Undistort,
    /// Copy the source file unchanged
    Copy,
    /// Read and encode
    Reencode,
}

impl ImageExport {
    /// Choose the export of an image from the distortion of its camera and
    /// the source file extension.
    pub fn select(has_distortion: bool, source: &Path) -> Self {
        if has_distortion {
            ImageExport::Undistort
        } else if has_jpeg_extension(source) {
            ImageExport::Copy
        } else {
            ImageExport::Reencode
        }
    }
}

/// Writes camera files and images of exported views to disk.
pub struct FileViewExporter<'a> {
    scene: &'a SfmData,
    dirs: &'a OutputDirs,
    config: &'a ExportConfig,
}

impl<'a> FileViewExporter<'a> {
    /// Create an exporter writing into `dirs`.
    pub fn new(scene: &'a SfmData, dirs: &'a OutputDirs, config: &'a ExportConfig) -> Self {
        Self {
            scene,
            dirs,
            config,
        }
    }

    fn write_camera(&self, view: &ExportableView<'_>, path: PathBuf) -> Result<(), ExportError> {
        let view_id = view.view.id_view;
        let file = File::create(&path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        write_camera_txt(BufWriter::new(file), &view.intrinsic.params(), view.pose).map_err(
            |source| ExportError::CameraFile {
                view_id,
                path,
                source,
            },
        )
    }

    fn write_image(&self, view: &ExportableView<'_>, dst: PathBuf) -> Result<(), ExportError> {
        let view_id = view.view.id_view;
        let src = view.source_path(self.scene);
        let mode = ImageExport::select(view.intrinsic.has_distortion(), &src);

        let image_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: IoError| ExportError::Image {
                view_id,
                path,
                source,
            }
        };

        if mode == ImageExport::Copy {
            std::fs::copy(&src, &dst).map_err(|source| ExportError::Image {
                view_id,
                path: src.clone(),
                source: IoError::File(source),
            })?;
            return Ok(());
        }

        let image = read_image_any_rgb8(&src).map_err(image_err(&src))?;
        let image = match mode {
            ImageExport::Undistort => {
                undistort_image(&image, view.intrinsic, self.config.interpolation)
                    .map_err(|source| ExportError::Undistort { view_id, source })?
            }
            _ => image,
        };
        write_image_jpeg_rgb8(&dst, &image, self.config.jpeg_quality).map_err(image_err(&dst))
    }
}

impl ViewExporter for FileViewExporter<'_> {
    type Error = ExportError;

    fn export_view(&mut self, view: &ExportableView<'_>) -> Result<(), Self::Error> {
        let stem = view.file_stem(self.config.index_padding);

        self.write_camera(view, self.dirs.cameras.join(format!("{stem}.txt")))?;
        self.write_image(view, self.dirs.images.join(format!("{stem}.jpg")))?;

        log::debug!(
            "Exported view {} as {stem} ({})",
            view.view.id_view,
            view.intrinsic.name()
        );

        Ok(())
    }
}

/// Counts of an export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Views written to the scene
    pub views_exported: usize,
    /// Views skipped for lacking a pose or an exportable intrinsic
    pub views_skipped: usize,
    /// Landmarks written to the point cloud
    pub landmarks_colored: usize,
    /// Images read to color the landmarks
    pub images_sampled: usize,
    /// The point cloud file
    pub ply_path: PathBuf,
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} views exported, {} skipped, {} landmarks colored from {} images, point cloud {}",
            self.views_exported,
            self.views_skipped,
            self.landmarks_colored,
            self.images_sampled,
            self.ply_path.display()
        )
    }
}

/// Convert a scene to the MVE layout described by `config`.
///
/// Creates the output directories and the marker file, exports every view with
/// a pose and an exportable intrinsic, colors the landmarks from the source
/// images and writes the point cloud.
pub fn run_export(scene: &SfmData, config: &ExportConfig) -> Result<ExportSummary, PipelineError> {
    let dirs = prepare_output_dirs(config)?;
    write_views_marker(&dirs)?;

    log::info!(
        "Exporting {} views to {}",
        scene.views.len(),
        dirs.root.display()
    );
    let mut exporter = FileViewExporter::new(scene, &dirs, config);
    let index_map = reindex_views(scene, &mut exporter)?;
    log::info!(
        "Exported {} views, skipped {}",
        index_map.len(),
        scene.views.len() - index_map.len()
    );

    log::info!(
        "Coloring {} landmarks from {} observations",
        scene.landmarks.len(),
        scene.num_observations()
    );
    let mut images = FileImageSource::new(scene);
    let tracks = colorize_tracks(&scene.landmarks, &index_map, &mut images)?;
    log::info!("Colored landmarks in {} passes", tracks.num_passes());

    write_ply_visibility_file(&dirs.ply_file, &tracks.points)?;
    log::info!(
        "Wrote {} points to {}",
        tracks.points.len(),
        dirs.ply_file.display()
    );

    Ok(ExportSummary {
        views_exported: index_map.len(),
        views_skipped: scene.views.len() - index_map.len(),
        landmarks_colored: tracks.points.len(),
        images_sampled: tracks.num_passes(),
        ply_path: dirs.ply_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let config = ExportConfig::new("/tmp/scene");
        let dirs = OutputDirs::new(&config);
        assert_eq!(dirs.images, Path::new("/tmp/scene/images"));
        assert_eq!(dirs.cameras, Path::new("/tmp/scene/cameras_disto"));
        assert_eq!(dirs.ply_file, Path::new("/tmp/scene/clouds/calib.ply"));
        assert_eq!(dirs.views_file, Path::new("/tmp/scene/views.txt"));
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.index_padding, 8);
    }

    #[test]
    fn prepare_dirs_and_marker() -> Result<(), ExportError> {
        let tmp_dir = tempfile::tempdir().map_err(|source| ExportError::Io {
            path: PathBuf::new(),
            source,
        })?;
        let config = ExportConfig::new(tmp_dir.path().join("out"));

        let dirs = prepare_output_dirs(&config)?;
        write_views_marker(&dirs)?;

        assert!(dirs.images.is_dir());
        assert!(dirs.cameras.is_dir());
        assert!(dirs.clouds.is_dir());
        let marker = std::fs::read_to_string(&dirs.views_file).map_err(|source| ExportError::Io {
            path: dirs.views_file.clone(),
            source,
        })?;
        let lines = marker.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            [
                "MVE checks for the presence of this file to determine that this directory",
                "contains OpenMVE data, but MVE ignores the contents of this file.",
            ]
        );

        Ok(())
    }

    #[test]
    fn prepare_dirs_blocked_by_file() -> Result<(), std::io::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let root = tmp_dir.path().join("out");
        std::fs::create_dir(&root)?;
        std::fs::write(root.join("images"), "not a directory")?;

        let res = prepare_output_dirs(&ExportConfig::new(&root));
        assert!(res.is_err());

        Ok(())
    }

    #[test]
    fn image_export_selection() {
        assert_eq!(
            ImageExport::select(true, Path::new("a.jpg")),
            ImageExport::Undistort
        );
        assert_eq!(ImageExport::select(false, Path::new("a.JPG")), ImageExport::Copy);
        assert_eq!(ImageExport::select(false, Path::new("a.jpeg")), ImageExport::Copy);
        assert_eq!(
            ImageExport::select(false, Path::new("a.png")),
            ImageExport::Reencode
        );
    }
}
