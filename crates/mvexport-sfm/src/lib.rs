#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera intrinsic models.
pub mod camera;

/// Greedy multi-view track colorization.
pub mod colorize;

/// Export of a scene to the MVE layout.
pub mod export;

/// I/O utilities for reading and writing scenes, cameras and point clouds.
pub mod io;

/// Camera poses.
pub mod pose;

/// Contiguous reindexing of exportable views.
pub mod reindex;

/// Scene model: views, intrinsics, poses and landmarks.
pub mod scene;
