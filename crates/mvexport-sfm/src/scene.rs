use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{camera::Intrinsic, pose::Pose3};

/// Index type used for view, intrinsic, pose and landmark ids.
pub type IndexT = u32;

/// Sentinel used by scene files for a missing reference.
pub const UNDEFINED_INDEX: IndexT = IndexT::MAX;

/// One camera capture: an image plus its intrinsic and pose references.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Stable view id
    pub id_view: IndexT,
    /// Image path relative to the scene root
    pub image_path: PathBuf,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Intrinsic reference, if any
    pub id_intrinsic: Option<IndexT>,
    /// Pose reference, if any
    pub id_pose: Option<IndexT>,
}

/// The 2D location of a landmark projection in one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Pixel coordinates (x, y)
    pub x: [f64; 2],
    /// Id of the feature the observation was matched from
    pub id_feat: IndexT,
}

/// A reconstructed 3D point and the views it was observed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Landmark {
    /// Position in world coordinates
    pub position: [f64; 3],
    /// Observations keyed by view id
    pub observations: BTreeMap<IndexT, Observation>,
}

/// A reconstructed scene.
///
/// All collections are ordered by id, which is the iteration order every stage
/// of the export relies on.
#[derive(Debug, Clone, Default)]
pub struct SfmData {
    /// Directory image paths are relative to
    pub root_path: PathBuf,
    /// Views keyed by view id
    pub views: BTreeMap<IndexT, View>,
    /// Intrinsics keyed by intrinsic id
    pub intrinsics: BTreeMap<IndexT, Intrinsic>,
    /// Poses keyed by pose id
    pub poses: BTreeMap<IndexT, Pose3>,
    /// Landmarks keyed by landmark id
    pub landmarks: BTreeMap<IndexT, Landmark>,
}

impl SfmData {
    /// The intrinsic referenced by a view, if it resolves.
    pub fn view_intrinsic(&self, view: &View) -> Option<&Intrinsic> {
        view.id_intrinsic.and_then(|id| self.intrinsics.get(&id))
    }

    /// The pose referenced by a view, if it resolves.
    pub fn view_pose(&self, view: &View) -> Option<&Pose3> {
        view.id_pose.and_then(|id| self.poses.get(&id))
    }

    /// The full path of the image of a view.
    pub fn image_path(&self, view: &View) -> PathBuf {
        resolve_path(&self.root_path, &view.image_path)
    }

    /// Total number of observations over all landmarks.
    pub fn num_observations(&self) -> usize {
        self.landmarks.values().map(|l| l.observations.len()).sum()
    }
}

fn resolve_path(root: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() || root.as_os_str().is_empty() {
        relative.to_path_buf()
    } else {
        root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PinholeCamera;

    fn view(id: IndexT, intrinsic: Option<IndexT>, pose: Option<IndexT>) -> View {
        View {
            id_view: id,
            image_path: PathBuf::from(format!("img_{id}.jpg")),
            width: 4,
            height: 4,
            id_intrinsic: intrinsic,
            id_pose: pose,
        }
    }

    #[test]
    fn pose_and_intrinsic_resolution() {
        let mut scene = SfmData {
            root_path: PathBuf::from("/data/images"),
            ..Default::default()
        };
        scene.intrinsics.insert(
            0,
            Intrinsic::Pinhole(PinholeCamera {
                width: 4,
                height: 4,
                focal: 2.0,
                principal_point: [2.0, 2.0],
            }),
        );
        scene.poses.insert(3, Pose3::default());

        let resolved = |v: &View| (scene.view_intrinsic(v).is_some(), scene.view_pose(v).is_some());

        assert_eq!(resolved(&view(0, Some(0), Some(3))), (true, true));
        assert_eq!(resolved(&view(1, Some(0), None)), (true, false));
        assert_eq!(resolved(&view(2, Some(7), Some(3))), (false, true));
        assert_eq!(resolved(&view(3, None, Some(4))), (false, false));

        assert_eq!(
            scene.image_path(&view(5, None, None)),
            PathBuf::from("/data/images/img_5.jpg")
        );
    }
}
