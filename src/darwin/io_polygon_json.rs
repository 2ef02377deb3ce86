//! Vector polygon JSON reader and writer.
//!
//! Accepted input shapes:
//!
//! - a single ring: `[{"x": 0, "y": 0}, ...]`
//! - several rings: `[[{"x": 0, "y": 0}, ...], ...]`
//! - a Darwin polygon body: `{"paths": [[...], ...]}` or the legacy
//!   `{"path": [...]}`
//! - a Darwin annotation wrapping either of those: `{"polygon": {...}}`
//!
//! Output is always `{"paths": [[...], ...]}` with external rings before
//! hole rings, the order the tracer produces them in.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LabelvoxError;
use crate::mask::{Point, Polygon};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PolygonDocument {
    Ring(Vec<Point>),
    Rings(Vec<Vec<Point>>),
    Paths { paths: Vec<Vec<Point>> },
    Path { path: Vec<Point> },
    Annotation { polygon: Box<PolygonDocument> },
}

impl PolygonDocument {
    fn into_paths(self) -> Vec<Polygon> {
        match self {
            PolygonDocument::Ring(points) | PolygonDocument::Path { path: points } => {
                vec![Polygon::new(points)]
            }
            PolygonDocument::Rings(rings) | PolygonDocument::Paths { paths: rings } => {
                rings.into_iter().map(Polygon::new).collect()
            }
            PolygonDocument::Annotation { polygon } => polygon.into_paths(),
        }
    }
}

#[derive(Serialize)]
struct PathsDocument<'a> {
    paths: &'a [Polygon],
}

/// Reads polygon paths from a JSON file.
///
/// # Errors
/// Returns [`LabelvoxError::PolygonJsonParse`] if the file is not one of the
/// accepted shapes.
pub fn read_polygon_json(path: &Path) -> Result<Vec<Polygon>, LabelvoxError> {
    let file = File::open(path).map_err(LabelvoxError::Io)?;
    let reader = BufReader::new(file);

    let doc: PolygonDocument =
        serde_json::from_reader(reader).map_err(|source| LabelvoxError::PolygonJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(doc.into_paths())
}

/// Writes polygon paths to a JSON file as `{"paths": [...]}`.
pub fn write_polygon_json(path: &Path, paths: &[Polygon]) -> Result<(), LabelvoxError> {
    let file = File::create(path).map_err(LabelvoxError::Io)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &PathsDocument { paths })
        .map_err(LabelvoxError::PolygonJsonWrite)
}

/// Reads polygon paths from a JSON string.
pub fn from_polygon_str(json: &str) -> Result<Vec<Polygon>, serde_json::Error> {
    let doc: PolygonDocument = serde_json::from_str(json)?;
    Ok(doc.into_paths())
}

/// Writes polygon paths to a JSON string as `{"paths": [...]}`.
pub fn to_polygon_json_string(paths: &[Polygon]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&PathsDocument { paths })
}
