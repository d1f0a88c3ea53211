/// MVE camera file writer.
pub mod camera_txt;

/// PLY point cloud with per-point visibility lists.
pub mod ply;

/// openMVG `sfm_data.json` reader.
pub mod sfm_json;
