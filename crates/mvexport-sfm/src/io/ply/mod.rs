mod parser;
mod writer;

pub use parser::*;
pub use writer::*;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read or write the PLY file
    #[error("Failed to read or write PLY file")]
    Io(#[from] std::io::Error),

    /// Failed to parse a PLY line
    #[error("Failed to parse PLY file at line {0}: {1}")]
    Parse(usize, String),

    /// The header does not describe a visibility point cloud
    #[error("Unsupported PLY header: {0}")]
    UnsupportedFormat(String),
}

/// The vertex properties of a visibility point cloud, in file order.
pub(crate) const VERTEX_PROPERTIES: [(&str, &str); 7] = [
    ("float", "x"),
    ("float", "y"),
    ("float", "z"),
    ("uchar", "red"),
    ("uchar", "green"),
    ("uchar", "blue"),
    ("float", "confidence"),
];

/// The per-vertex list of view indices.
pub(crate) const VISIBILITY_PROPERTY: &str = "property list int int visibility";
