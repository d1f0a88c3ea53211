use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    camera::Intrinsic,
    pose::Pose3,
    scene::{IndexT, SfmData, View},
};

/// A dense renumbering of exported view ids.
///
/// Indices are assigned in insertion order, so index `i` is the `i`-th view
/// inserted and the range `[0, len)` has no gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContiguousIndexMap {
    order: Vec<IndexT>,
    lookup: BTreeMap<IndexT, usize>,
}

impl ContiguousIndexMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a view id, returning its contiguous index.
    ///
    /// Inserting an id twice returns the index assigned the first time.
    pub fn insert(&mut self, view_id: IndexT) -> usize {
        if let Some(&index) = self.lookup.get(&view_id) {
            return index;
        }
        let index = self.order.len();
        self.order.push(view_id);
        self.lookup.insert(view_id, index);
        index
    }

    /// The contiguous index of a view id.
    pub fn get(&self, view_id: IndexT) -> Option<usize> {
        self.lookup.get(&view_id).copied()
    }

    /// The number of indexed views.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no view is indexed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The view ids in index order.
    pub fn view_ids(&self) -> &[IndexT] {
        &self.order
    }

    /// Iterate over `(index, view_id)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, IndexT)> + '_ {
        self.order.iter().copied().enumerate()
    }
}

impl FromIterator<IndexT> for ContiguousIndexMap {
    fn from_iter<I: IntoIterator<Item = IndexT>>(iter: I) -> Self {
        let mut map = Self::new();
        for view_id in iter {
            map.insert(view_id);
        }
        map
    }
}

/// A view that passed the export checks, with everything needed to write it.
#[derive(Debug, Clone, Copy)]
pub struct ExportableView<'a> {
    /// The contiguous index assigned to the view
    pub index: usize,
    /// The view itself
    pub view: &'a View,
    /// The resolved intrinsic
    pub intrinsic: &'a Intrinsic,
    /// The resolved pose
    pub pose: &'a Pose3,
}

impl ExportableView<'_> {
    /// The file stem of the exported artifacts, the index zero padded to `width` digits.
    pub fn file_stem(&self, width: usize) -> String {
        format!("{:0width$}", self.index)
    }

    /// The source image path resolved against the scene root.
    pub fn source_path(&self, scene: &SfmData) -> PathBuf {
        scene.image_path(self.view)
    }
}

/// Writes the artifacts of an exported view.
pub trait ViewExporter {
    /// The error returned when a view cannot be written.
    type Error;

    /// Write the artifacts of one view.
    fn export_view(&mut self, view: &ExportableView<'_>) -> Result<(), Self::Error>;
}

/// Assign contiguous indices to the exportable views of a scene.
///
/// Views are visited in ascending view id order. A view is skipped when its pose
/// or intrinsic does not resolve, or when the intrinsic model cannot be exported.
/// Every remaining view gets the next index and is handed to the `exporter`; the
/// first exporter error aborts the run.
///
/// # Arguments
///
/// * `scene` - The scene to export.
/// * `exporter` - Writes the camera and image of each indexed view.
///
/// # Returns
///
/// The map from exported view id to contiguous index.
pub fn reindex_views<E: ViewExporter>(
    scene: &SfmData,
    exporter: &mut E,
) -> Result<ContiguousIndexMap, E::Error> {
    let mut index_map = ContiguousIndexMap::new();

    for view in scene.views.values() {
        let (Some(intrinsic), Some(pose)) = (scene.view_intrinsic(view), scene.view_pose(view))
        else {
            log::debug!(
                "Skipping view {}: pose or intrinsic undefined",
                view.id_view
            );
            continue;
        };

        if !intrinsic.supports_export() {
            log::debug!(
                "Skipping view {}: unsupported intrinsic model {}",
                view.id_view,
                intrinsic.name()
            );
            continue;
        }

        let index = index_map.insert(view.id_view);
        exporter.export_view(&ExportableView {
            index,
            view,
            intrinsic,
            pose,
        })?;
    }

    log::debug!(
        "Indexed {} of {} views",
        index_map.len(),
        scene.views.len()
    );

    Ok(index_map)
}
