use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

use super::{PlyError, VERTEX_PROPERTIES, VISIBILITY_PROPERTY};
use crate::colorize::ColoredPoint;

struct PlyHeader {
    vertex_count: usize,
    // number of lines consumed by the header
    num_lines: usize,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    let mut num_lines = 0;
    let mut is_ply = false;
    let mut is_ascii = false;
    let mut vertex_count = None;
    let mut properties = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::UnsupportedFormat("missing end_header".into()));
        }
        num_lines += 1;
        let trimmed = line.trim();

        if trimmed == "ply" {
            is_ply = true;
        } else if trimmed == "end_header" {
            break;
        } else if trimmed.starts_with("format") {
            is_ascii = trimmed.starts_with("format ascii");
        } else if trimmed.starts_with("element vertex") {
            vertex_count = trimmed
                .split_whitespace()
                .last()
                .and_then(|s| s.parse::<usize>().ok());
        } else if trimmed.starts_with("property") {
            properties.push(trimmed.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }

    if !is_ply || !is_ascii {
        return Err(PlyError::UnsupportedFormat("expected ascii ply".into()));
    }

    let expected = VERTEX_PROPERTIES
        .iter()
        .map(|(data_type, name)| format!("property {data_type} {name}"))
        .chain(std::iter::once(VISIBILITY_PROPERTY.to_string()))
        .collect::<Vec<_>>();
    if properties != expected {
        return Err(PlyError::UnsupportedFormat(format!(
            "unexpected vertex properties {properties:?}"
        )));
    }

    let vertex_count = vertex_count
        .ok_or_else(|| PlyError::UnsupportedFormat("missing vertex count".into()))?;

    Ok(PlyHeader {
        vertex_count,
        num_lines,
    })
}

fn parse_value<T: FromStr>(token: Option<&str>, line_no: usize) -> Result<T, PlyError> {
    let token = token.ok_or_else(|| PlyError::Parse(line_no, "missing value".into()))?;
    token
        .parse()
        .map_err(|_| PlyError::Parse(line_no, format!("invalid value {token}")))
}

fn parse_vertex_line(line: &str, line_no: usize) -> Result<ColoredPoint, PlyError> {
    let mut tokens = line.split_whitespace();

    let mut position = [0.0; 3];
    for p in position.iter_mut() {
        *p = parse_value(tokens.next(), line_no)?;
    }

    let mut color = [0u8; 3];
    for c in color.iter_mut() {
        *c = parse_value(tokens.next(), line_no)?;
    }

    let _confidence: f32 = parse_value(tokens.next(), line_no)?;

    let count: usize = parse_value(tokens.next(), line_no)?;
    let visibility = (0..count)
        .map(|_| parse_value(tokens.next(), line_no))
        .collect::<Result<Vec<usize>, _>>()?;

    if tokens.next().is_some() {
        return Err(PlyError::Parse(line_no, "trailing values".into()));
    }

    Ok(ColoredPoint {
        position,
        color,
        visibility,
    })
}

/// Parse a visibility point cloud from a reader.
pub fn parse_ply_visibility<R: BufRead>(mut reader: R) -> Result<Vec<ColoredPoint>, PlyError> {
    let header = parse_header(&mut reader)?;

    let mut points = Vec::with_capacity(header.vertex_count);
    let mut lines = reader.lines();
    for i in 0..header.vertex_count {
        let line_no = header.num_lines + i + 1;
        let line = lines
            .next()
            .ok_or_else(|| PlyError::Parse(line_no, "unexpected end of file".into()))??;
        points.push(parse_vertex_line(&line, line_no)?);
    }

    Ok(points)
}

/// Read a visibility point cloud written by [`super::write_ply_visibility`].
///
/// # Arguments
///
/// * `path` - The path to the PLY file.
///
/// # Returns
///
/// The points with their colors and visibility lists.
pub fn read_ply_visibility(path: impl AsRef<Path>) -> Result<Vec<ColoredPoint>, PlyError> {
    let file = File::open(path)?;
    parse_ply_visibility(BufReader::new(file))
}
