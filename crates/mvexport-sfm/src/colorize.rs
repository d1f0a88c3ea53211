use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
    path::PathBuf,
};

use mvexport_image::{Image, ImageError};
use mvexport_io::{functional::read_image_any_rgb8, IoError};

use crate::{
    reindex::ContiguousIndexMap,
    scene::{IndexT, Landmark, SfmData},
};

/// Error types for the colorization module.
#[derive(Debug, thiserror::Error)]
pub enum ColorizeError {
    /// A landmark has no observation to take a color from
    #[error("Landmark {0} has no observations")]
    EmptyTrack(IndexT),

    /// An observation references a view the image source does not know
    #[error("View {0} is not part of the scene")]
    UnknownView(IndexT),

    /// The image of a view could not be read
    #[error("Failed to read image of view {view_id} from {path}")]
    Image {
        /// The view being sampled
        view_id: IndexT,
        /// The image path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: IoError,
    },

    /// The image of a view has no pixels
    #[error("Image of view {0} is empty")]
    EmptyImage(IndexT),

    /// Failed to sample a pixel
    #[error(transparent)]
    Pixel(#[from] ImageError),

    /// A landmark was left without color
    #[error("Landmark {0} was not colored")]
    Uncolored(IndexT),
}

/// Provides the image of a view for sampling colors.
pub trait ImageSource {
    /// Load the rgb8 image of a view.
    fn load(&mut self, view_id: IndexT) -> Result<Image<u8, 3>, ColorizeError>;
}

/// Reads view images from disk, resolved against the scene root.
pub struct FileImageSource<'a> {
    scene: &'a SfmData,
}

impl<'a> FileImageSource<'a> {
    /// Create a source reading the images of `scene`.
    pub fn new(scene: &'a SfmData) -> Self {
        Self { scene }
    }
}

impl ImageSource for FileImageSource<'_> {
    fn load(&mut self, view_id: IndexT) -> Result<Image<u8, 3>, ColorizeError> {
        let view = self
            .scene
            .views
            .get(&view_id)
            .ok_or(ColorizeError::UnknownView(view_id))?;
        let path = self.scene.image_path(view);
        read_image_any_rgb8(&path).map_err(|source| ColorizeError::Image {
            view_id,
            path,
            source,
        })
    }
}

/// A landmark with its sampled color and the contiguous indices of the views
/// it is visible in.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredPoint {
    /// Position in world coordinates
    pub position: [f64; 3],
    /// Sampled rgb color
    pub color: [u8; 3],
    /// Contiguous view indices, in ascending view id order
    pub visibility: Vec<usize>,
}

/// The result of [`colorize_tracks`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorizedTracks {
    /// One point per landmark, in landmark id order
    pub points: Vec<ColoredPoint>,
    /// The landmark id of each point
    pub landmark_ids: Vec<IndexT>,
    /// The view sampled at each pass, in pass order
    pub sampled_views: Vec<IndexT>,
}

impl ColorizedTracks {
    /// The number of selection passes, equal to the number of images read.
    pub fn num_passes(&self) -> usize {
        self.sampled_views.len()
    }
}

/// Per-view count of the remaining landmarks observed by that view.
///
/// Counts are kept in a max-heap ordered by `(count, Reverse(view_id))`. Retiring
/// a landmark pushes the decremented counts; entries whose count no longer
/// matches the current one are discarded when they reach the top.
#[derive(Debug, Clone)]
pub struct Tally {
    counts: BTreeMap<IndexT, usize>,
    heap: BinaryHeap<(usize, Reverse<IndexT>)>,
}

impl Tally {
    /// Build the tally from the observing views of each remaining landmark.
    pub fn new<'a>(tracks: impl IntoIterator<Item = &'a [IndexT]>) -> Self {
        let mut counts = BTreeMap::new();
        for views in tracks {
            for &view_id in views {
                *counts.entry(view_id).or_insert(0) += 1;
            }
        }
        let heap = counts
            .iter()
            .map(|(&view_id, &count)| (count, Reverse(view_id)))
            .collect();
        Self { counts, heap }
    }

    /// Count from scratch, the reference for the incremental tally.
    pub fn recompute<'a>(tracks: impl IntoIterator<Item = &'a [IndexT]>) -> BTreeMap<IndexT, usize> {
        Self::new(tracks).counts
    }

    /// The current non-zero counts.
    pub fn counts(&self) -> &BTreeMap<IndexT, usize> {
        &self.counts
    }

    /// The view with the highest count, the lowest view id on ties.
    ///
    /// Returns `None` once every count is zero.
    pub fn select(&mut self) -> Option<IndexT> {
        while let Some(&(count, Reverse(view_id))) = self.heap.peek() {
            if self.counts.get(&view_id) == Some(&count) {
                return Some(view_id);
            }
            self.heap.pop();
        }
        None
    }

    /// Remove a landmark observed by `views` from the counts.
    pub fn retire(&mut self, views: &[IndexT]) {
        for view_id in views {
            let Some(count) = self.counts.get_mut(view_id) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                self.counts.remove(view_id);
            } else {
                self.heap.push((*count, Reverse(*view_id)));
            }
        }
    }
}

// truncate toward zero and clamp into the image, returning whether it clamped
fn pixel_coords(x: [f64; 2], width: usize, height: usize) -> ([usize; 2], bool) {
    let clamp = |v: f64, size: usize| -> (usize, bool) {
        let t = v.trunc();
        let max = (size - 1) as f64;
        if t < 0.0 || t.is_nan() {
            (0, true)
        } else if t > max {
            (size - 1, true)
        } else {
            (t as usize, false)
        }
    };
    let (col, clamped_x) = clamp(x[0], width);
    let (row, clamped_y) = clamp(x[1], height);
    ([col, row], clamped_x || clamped_y)
}

/// Assign a color to every landmark by sampling as few images as possible.
///
/// Each pass picks the view observing the most uncolored landmarks, ties going
/// to the lowest view id, reads its image once and colors every uncolored
/// landmark it observes with the pixel under the observation. Passes repeat
/// until every landmark is colored.
///
/// Observations in views missing from `index_map` still take part in the
/// selection but are left out of the visibility lists.
///
/// # Arguments
///
/// * `landmarks` - The landmarks to color, each with at least one observation.
/// * `index_map` - The contiguous indices of the exported views.
/// * `images` - The source of view images.
///
/// # Returns
///
/// One colored point per landmark, in landmark id order.
pub fn colorize_tracks<S: ImageSource + ?Sized>(
    landmarks: &BTreeMap<IndexT, Landmark>,
    index_map: &ContiguousIndexMap,
    images: &mut S,
) -> Result<ColorizedTracks, ColorizeError> {
    if let Some((&id, _)) = landmarks.iter().find(|(_, l)| l.observations.is_empty()) {
        return Err(ColorizeError::EmptyTrack(id));
    }

    let landmark_ids = landmarks.keys().copied().collect::<Vec<_>>();
    let track_landmarks = landmarks.values().collect::<Vec<_>>();
    let tracks = track_landmarks
        .iter()
        .map(|l| l.observations.keys().copied().collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut skipped_observations = 0;
    let mut points = track_landmarks
        .iter()
        .map(|l| {
            let visibility = l
                .observations
                .keys()
                .filter_map(|&view_id| {
                    let index = index_map.get(view_id);
                    if index.is_none() {
                        skipped_observations += 1;
                    }
                    index
                })
                .collect();
            ColoredPoint {
                position: l.position,
                color: [0; 3],
                visibility,
            }
        })
        .collect::<Vec<_>>();
    if skipped_observations > 0 {
        log::debug!("{skipped_observations} observations in unindexed views left out of visibility");
    }

    // landmarks observed by each view
    let mut view_tracks: BTreeMap<IndexT, Vec<usize>> = BTreeMap::new();
    for (i, views) in tracks.iter().enumerate() {
        for &view_id in views {
            view_tracks.entry(view_id).or_default().push(i);
        }
    }

    let mut tally = Tally::new(tracks.iter().map(Vec::as_slice));
    let mut colored = vec![false; landmarks.len()];
    let mut num_remaining = landmarks.len();
    let mut sampled_views = Vec::new();

    while num_remaining > 0 {
        let Some(view_id) = tally.select() else {
            break;
        };

        let image = images.load(view_id)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ColorizeError::EmptyImage(view_id));
        }

        let mut num_colored = 0;
        let mut num_clamped = 0;
        for &i in view_tracks.get(&view_id).map(Vec::as_slice).unwrap_or_default() {
            if colored[i] {
                continue;
            }
            let Some(obs) = track_landmarks[i].observations.get(&view_id) else {
                continue;
            };
            let ([col, row], clamped) = pixel_coords(obs.x, image.width(), image.height());
            if clamped {
                num_clamped += 1;
            }
            points[i].color = image.get_pixel(col, row)?;
            colored[i] = true;
            tally.retire(&tracks[i]);
            num_colored += 1;
        }

        if num_clamped > 0 {
            log::warn!(
                "View {view_id}: {num_clamped} observations outside the image were clamped"
            );
        }
        log::debug!(
            "Pass {}: view {view_id} colored {num_colored} landmarks",
            sampled_views.len()
        );

        num_remaining -= num_colored;
        sampled_views.push(view_id);
    }

    if let Some(i) = colored.iter().position(|c| !c) {
        return Err(ColorizeError::Uncolored(landmark_ids[i]));
    }

    Ok(ColorizedTracks {
        points,
        landmark_ids,
        sampled_views,
    })
}
