use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    camera::{
        FisheyeCamera, Intrinsic, PinholeBrownT2, PinholeCamera, PinholeRadialK1, PinholeRadialK3,
    },
    pose::Pose3,
    scene::{IndexT, Landmark, Observation, SfmData, View, UNDEFINED_INDEX},
};

/// Error types for the sfm_data reader.
#[derive(Debug, thiserror::Error)]
pub enum SfmJsonError {
    /// Error reading the file
    #[error("Failed to read scene file {0}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Error decoding the JSON document
    #[error("Failed to parse scene file")]
    Json(#[from] serde_json::Error),

    /// A polymorphic entry references a type that was never named
    #[error("Unknown polymorphic id {0} for intrinsic {1}")]
    UnknownPolymorphicId(u64, IndexT),

    /// A shared pointer has no data and no earlier definition
    #[error("Missing pointer data for {0} {1}")]
    MissingPointerData(&'static str, IndexT),

    /// A distortion vector has the wrong length
    #[error("Intrinsic {0} of type {1} expects {2} distortion coefficients")]
    InvalidDistortion(IndexT, String, usize),

    /// A pinhole-family intrinsic lacks a required field
    #[error("Intrinsic {0} of type {1} has no {2}")]
    MissingIntrinsicField(IndexT, String, &'static str),
}

// cereal marks the first occurrence of a polymorphic type with this bit
const POLYMORPHIC_NAME_BIT: u64 = 0x8000_0000;

#[derive(Deserialize)]
struct KeyValue<K, V> {
    key: K,
    value: V,
}

#[derive(Deserialize)]
struct PtrWrapper<T> {
    id: Option<u64>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct Polymorphic<T> {
    polymorphic_id: Option<u64>,
    polymorphic_name: Option<String>,
    ptr_wrapper: PtrWrapper<T>,
}

#[derive(Deserialize, Clone)]
struct JsonView {
    #[serde(default)]
    local_path: String,
    filename: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    id_view: IndexT,
    id_intrinsic: IndexT,
    id_pose: IndexT,
}

#[derive(Deserialize, Clone)]
struct JsonIntrinsic {
    width: u32,
    height: u32,
    focal_length: Option<f64>,
    principal_point: Option<[f64; 2]>,
    disto_k1: Option<Vec<f64>>,
    disto_k3: Option<Vec<f64>>,
    disto_t2: Option<Vec<f64>>,
    fisheye: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct JsonPose {
    rotation: [[f64; 3]; 3],
    center: [f64; 3],
}

#[derive(Deserialize)]
struct JsonObservation {
    #[serde(default)]
    id_feat: IndexT,
    x: [f64; 2],
}

#[derive(Deserialize)]
struct JsonLandmark {
    #[serde(rename = "X")]
    position: [f64; 3],
    #[serde(default)]
    observations: Vec<KeyValue<IndexT, JsonObservation>>,
}

#[derive(Deserialize)]
struct JsonSfmData {
    #[serde(default)]
    root_path: String,
    #[serde(default)]
    views: Vec<KeyValue<IndexT, Polymorphic<JsonView>>>,
    #[serde(default)]
    intrinsics: Vec<KeyValue<IndexT, Polymorphic<JsonIntrinsic>>>,
    #[serde(default)]
    extrinsics: Vec<KeyValue<IndexT, JsonPose>>,
    #[serde(default)]
    structure: Vec<KeyValue<IndexT, JsonLandmark>>,
}

/// Read an openMVG `sfm_data.json` scene file.
///
/// # Arguments
///
/// * `path` - The path to the scene file.
///
/// # Returns
///
/// The scene with views, intrinsics, poses and landmarks.
pub fn read_sfm_data_json(path: impl AsRef<Path>) -> Result<SfmData, SfmJsonError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SfmJsonError::Io(path.to_path_buf(), e))?;
    parse_sfm_data_json(BufReader::new(file))
}

/// Parse an openMVG `sfm_data.json` document from a reader.
pub fn parse_sfm_data_json<R: Read>(reader: R) -> Result<SfmData, SfmJsonError> {
    let json: JsonSfmData = serde_json::from_reader(reader)?;

    let mut scene = SfmData {
        root_path: PathBuf::from(&json.root_path),
        ..Default::default()
    };

    let mut view_ptrs: HashMap<u64, JsonView> = HashMap::new();
    for entry in json.views {
        let data = resolve_ptr(entry.value.ptr_wrapper, &mut view_ptrs)
            .ok_or(SfmJsonError::MissingPointerData("view", entry.key))?;
        scene.views.insert(entry.key, convert_view(data));
    }

    let mut type_names: HashMap<u64, String> = HashMap::new();
    let mut intrinsic_ptrs: HashMap<u64, JsonIntrinsic> = HashMap::new();
    for entry in json.intrinsics {
        let name = polymorphic_name(
            entry.value.polymorphic_id,
            entry.value.polymorphic_name,
            &mut type_names,
        )
        .ok_or(SfmJsonError::UnknownPolymorphicId(
            entry.value.polymorphic_id.unwrap_or_default(),
            entry.key,
        ))?;
        let data = resolve_ptr(entry.value.ptr_wrapper, &mut intrinsic_ptrs)
            .ok_or(SfmJsonError::MissingPointerData("intrinsic", entry.key))?;
        scene
            .intrinsics
            .insert(entry.key, convert_intrinsic(entry.key, &name, data)?);
    }

    for entry in json.extrinsics {
        scene
            .poses
            .insert(entry.key, Pose3::new(entry.value.rotation, entry.value.center));
    }

    for entry in json.structure {
        let observations = entry
            .value
            .observations
            .into_iter()
            .map(|obs| {
                (
                    obs.key,
                    Observation {
                        x: obs.value.x,
                        id_feat: obs.value.id_feat,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        scene.landmarks.insert(
            entry.key,
            Landmark {
                position: entry.value.position,
                observations,
            },
        );
    }

    log::debug!(
        "Parsed scene: {} views, {} intrinsics, {} poses, {} landmarks",
        scene.views.len(),
        scene.intrinsics.len(),
        scene.poses.len(),
        scene.landmarks.len()
    );

    Ok(scene)
}

fn resolve_ptr<T: Clone>(ptr: PtrWrapper<T>, seen: &mut HashMap<u64, T>) -> Option<T> {
    match (ptr.id, ptr.data) {
        (Some(id), Some(data)) => {
            seen.insert(id & !POLYMORPHIC_NAME_BIT, data.clone());
            Some(data)
        }
        (None, Some(data)) => Some(data),
        (Some(id), None) => seen.get(&(id & !POLYMORPHIC_NAME_BIT)).cloned(),
        (None, None) => None,
    }
}

fn polymorphic_name(
    id: Option<u64>,
    name: Option<String>,
    type_names: &mut HashMap<u64, String>,
) -> Option<String> {
    match (id, name) {
        (Some(id), Some(name)) => {
            type_names.insert(id & !POLYMORPHIC_NAME_BIT, name.clone());
            Some(name)
        }
        (None, Some(name)) => Some(name),
        (Some(id), None) => type_names.get(&(id & !POLYMORPHIC_NAME_BIT)).cloned(),
        (None, None) => None,
    }
}

fn defined(id: IndexT) -> Option<IndexT> {
    (id != UNDEFINED_INDEX).then_some(id)
}

// local_path is written with a trailing separator and is "/" for images
// directly under the root, so it is always taken relative to the root
fn view_image_path(local_path: &str, filename: &str) -> PathBuf {
    Path::new(local_path.trim_start_matches(['/', '\\'])).join(filename)
}

fn convert_view(view: JsonView) -> View {
    View {
        id_view: view.id_view,
        image_path: view_image_path(&view.local_path, &view.filename),
        width: view.width,
        height: view.height,
        id_intrinsic: defined(view.id_intrinsic),
        id_pose: defined(view.id_pose),
    }
}

fn coefficients<const N: usize>(
    id: IndexT,
    name: &str,
    values: Option<Vec<f64>>,
) -> Result<[f64; N], SfmJsonError> {
    values
        .unwrap_or_default()
        .try_into()
        .map_err(|_| SfmJsonError::InvalidDistortion(id, name.to_string(), N))
}

fn convert_intrinsic(
    id: IndexT,
    name: &str,
    data: JsonIntrinsic,
) -> Result<Intrinsic, SfmJsonError> {
    let pinhole = || -> Result<PinholeCamera, SfmJsonError> {
        let missing =
            |field: &'static str| SfmJsonError::MissingIntrinsicField(id, name.to_string(), field);
        Ok(PinholeCamera {
            width: data.width,
            height: data.height,
            focal: data.focal_length.ok_or_else(|| missing("focal_length"))?,
            principal_point: data.principal_point.ok_or_else(|| missing("principal_point"))?,
        })
    };

    let intrinsic = match name {
        "pinhole" => Intrinsic::Pinhole(pinhole()?),
        "pinhole_radial_k1" => {
            let [k1] = coefficients::<1>(id, name, data.disto_k1)?;
            Intrinsic::PinholeRadialK1(PinholeRadialK1 {
                pinhole: pinhole()?,
                k1,
            })
        }
        "pinhole_radial_k3" => Intrinsic::PinholeRadialK3(PinholeRadialK3 {
            pinhole: pinhole()?,
            k: coefficients(id, name, data.disto_k3)?,
        }),
        "pinhole_brown_t2" => {
            let [k1, k2, k3, t1, t2] = coefficients::<5>(id, name, data.disto_t2)?;
            Intrinsic::PinholeBrownT2(PinholeBrownT2 {
                pinhole: pinhole()?,
                k: [k1, k2, k3],
                t: [t1, t2],
            })
        }
        "fisheye" => Intrinsic::Fisheye(FisheyeCamera {
            pinhole: pinhole()?,
            k: coefficients(id, name, data.fisheye)?,
        }),
        other => {
            log::debug!("Intrinsic {id} uses unsupported model {other}");
            Intrinsic::Unsupported {
                name: other.to_string(),
                width: data.width,
                height: data.height,
            }
        }
    };

    Ok(intrinsic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Intrinsic;

    const SCENE: &str = r#"{
        "sfm_data_version": "0.3",
        "root_path": "/data/images",
        "views": [
            {"key": 0, "value": {"polymorphic_id": 1073741824, "ptr_wrapper": {"id": 2147483649, "data": {
                "local_path": "/", "filename": "a.JPG", "width": 8, "height": 6,
                "id_view": 0, "id_intrinsic": 0, "id_pose": 0}}}},
            {"key": 1, "value": {"polymorphic_id": 1073741824, "ptr_wrapper": {"id": 2147483650, "data": {
                "local_path": "sub", "filename": "b.png", "width": 8, "height": 6,
                "id_view": 1, "id_intrinsic": 1, "id_pose": 4294967295}}}}
        ],
        "intrinsics": [
            {"key": 0, "value": {"polymorphic_id": 2147483649, "polymorphic_name": "pinhole_radial_k3",
                "ptr_wrapper": {"id": 2147483651, "data": {"width": 8, "height": 6, "focal_length": 10.0,
                "principal_point": [4.0, 3.0], "disto_k3": [0.1, 0.0, 0.0]}}}},
            {"key": 1, "value": {"polymorphic_id": 1,
                "ptr_wrapper": {"id": 2147483652, "data": {"width": 8, "height": 6, "focal_length": 12.0,
                "principal_point": [4.0, 3.0], "disto_k3": [0.0, 0.0, 0.0]}}}},
            {"key": 2, "value": {"polymorphic_id": 2147483650, "polymorphic_name": "spherical",
                "ptr_wrapper": {"id": 2147483653, "data": {"width": 8, "height": 6}}}}
        ],
        "extrinsics": [
            {"key": 0, "value": {"rotation": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                "center": [0.0, 0.0, -1.0]}}
        ],
        "structure": [
            {"key": 7, "value": {"X": [1.0, 2.0, 3.0], "observations": [
                {"key": 0, "value": {"id_feat": 3, "x": [1.5, 2.5]}},
                {"key": 1, "value": {"id_feat": 9, "x": [4.0, 5.0]}}
            ]}}
        ],
        "control_points": []
    }"#;

    #[test]
    fn parse_scene() -> Result<(), SfmJsonError> {
        let scene = parse_sfm_data_json(SCENE.as_bytes())?;

        assert_eq!(scene.root_path, PathBuf::from("/data/images"));
        assert_eq!(scene.views.len(), 2);
        assert_eq!(scene.views[&0].id_pose, Some(0));
        assert_eq!(scene.views[&1].id_pose, None);
        assert_eq!(
            scene.image_path(&scene.views[&0]),
            PathBuf::from("/data/images/a.JPG")
        );
        assert_eq!(
            scene.image_path(&scene.views[&1]),
            PathBuf::from("/data/images/sub/b.png")
        );

        // the second intrinsic reuses the type registered by the first one
        assert!(matches!(scene.intrinsics[&1], Intrinsic::PinholeRadialK3(_)));
        assert_eq!(scene.intrinsics[&0].params(), vec![10.0, 4.0, 3.0, 0.1, 0.0, 0.0]);
        assert!(matches!(
            scene.intrinsics[&2],
            Intrinsic::Unsupported { ref name, width: 8, height: 6 } if name == "spherical"
        ));

        assert_eq!(scene.poses[&0].translation(), [0.0, 0.0, 1.0]);

        let landmark = &scene.landmarks[&7];
        assert_eq!(landmark.position, [1.0, 2.0, 3.0]);
        assert_eq!(landmark.observations.len(), 2);
        assert_eq!(landmark.observations[&1].x, [4.0, 5.0]);
        assert_eq!(landmark.observations[&0].id_feat, 3);

        Ok(())
    }

    #[test]
    fn invalid_distortion_length() {
        let scene = r#"{"intrinsics": [
            {"key": 0, "value": {"polymorphic_id": 2147483649, "polymorphic_name": "pinhole_radial_k3",
                "ptr_wrapper": {"id": 2147483649, "data": {"width": 8, "height": 6, "focal_length": 10.0,
                "principal_point": [4.0, 3.0], "disto_k3": [0.1]}}}}
        ]}"#;
        let res = parse_sfm_data_json(scene.as_bytes());
        assert!(matches!(res, Err(SfmJsonError::InvalidDistortion(0, _, 3))));
    }

    #[test]
    fn unknown_polymorphic_id() {
        let scene = r#"{"intrinsics": [
            {"key": 5, "value": {"polymorphic_id": 3,
                "ptr_wrapper": {"id": 2147483649, "data": {"width": 8, "height": 6, "focal_length": 10.0,
                "principal_point": [4.0, 3.0]}}}}
        ]}"#;
        let res = parse_sfm_data_json(scene.as_bytes());
        assert!(matches!(res, Err(SfmJsonError::UnknownPolymorphicId(3, 5))));
    }

    #[test]
    fn pinhole_without_focal_length() {
        let scene = r#"{"intrinsics": [
            {"key": 2, "value": {"polymorphic_id": 2147483649, "polymorphic_name": "pinhole",
                "ptr_wrapper": {"id": 2147483649, "data": {"width": 8, "height": 6,
                "principal_point": [4.0, 3.0]}}}}
        ]}"#;
        let res = parse_sfm_data_json(scene.as_bytes());
        assert!(matches!(
            res,
            Err(SfmJsonError::MissingIntrinsicField(2, _, "focal_length"))
        ));
    }

    #[test]
    fn local_path_relative_to_root() {
        assert_eq!(view_image_path("/", "a.JPG"), PathBuf::from("a.JPG"));
        assert_eq!(view_image_path("", "a.JPG"), PathBuf::from("a.JPG"));
        assert_eq!(view_image_path("/sub/", "b.png"), PathBuf::from("sub/b.png"));
        assert_eq!(view_image_path("sub/", "b.png"), PathBuf::from("sub/b.png"));
    }
}
