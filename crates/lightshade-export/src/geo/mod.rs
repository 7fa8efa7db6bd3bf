//! `.geo` document export
//!
//! A `.geo` file is one JSON object with three keys: `meta` (source file and
//! export time), `geometry` (one record per exported node, keyed by node
//! name, in selection order) and `armature` (always empty).

mod exporter;

pub mod axis;
pub mod buffers;
pub mod canonical;
pub mod collision;
pub mod node;
pub mod weld;

pub use buffers::MeshBuffers;
pub use collision::CollisionRecord;
pub use exporter::{GeoExportError, GeoExportOptions, GeoExporter, GeoResult, TIMESTAMP_FORMAT};
pub use node::{MeshStats, NodeSerializer};
pub use weld::{weld, AttributeTuple, WeldedVertexBuffer, Welder};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use canonical::{Scalar, Scalars};

/// Output file extension
pub const GEO_EXTENSION: &str = "geo";

/// Document header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    /// Basename of the host scene file
    pub filename: String,
    /// Export time, `YYYY/MM/DD HH:MM:SS`
    pub created: String,
}

/// A complete `.geo` document
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDocument {
    pub meta: Meta,
    /// Exported nodes in selection order
    pub geometry: Vec<NodeRecord>,
    /// Armatures partitioned out of the selection. Only their names are
    /// kept; the `armature` map is always written empty.
    pub armatures: Vec<String>,
}

impl GeoDocument {
    /// Look up an exported node by name
    pub fn node(&self, name: &str) -> Option<&NodeRecord> {
        self.geometry.iter().find(|record| record.name == name)
    }
}

impl Serialize for GeoDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("meta", &self.meta)?;
        map.serialize_entry("geometry", &Geometry(&self.geometry))?;
        map.serialize_entry("armature", &EmptyMap)?;
        map.end()
    }
}

struct Geometry<'a>(&'a [NodeRecord]);

impl Serialize for Geometry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for record in self.0 {
            map.serialize_entry(&record.name, record)?;
        }
        map.end()
    }
}

struct EmptyMap;

impl Serialize for EmptyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// One entry of the `geometry` map.
///
/// Position, rotation and scale are axis-mapped and canonical.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    /// Host type string (`MESH`, `EMPTY`, ...)
    pub kind: String,
    pub class: String,
    pub category: String,
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: f64,
    pub payload: NodePayload,
}

/// Kind-specific part of a [`NodeRecord`]
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Mesh {
        buffers: MeshBuffers,
        collision: Option<Vec<CollisionRecord>>,
    },
    Empty {
        collision: Option<Vec<CollisionRecord>>,
    },
    /// Any other node type: scale `1.0` and nothing else
    Stub,
}

impl NodePayload {
    pub fn buffers(&self) -> Option<&MeshBuffers> {
        match self {
            NodePayload::Mesh { buffers, .. } => Some(buffers),
            _ => None,
        }
    }

    pub fn collision(&self) -> Option<&[CollisionRecord]> {
        match self {
            NodePayload::Mesh { collision, .. } | NodePayload::Empty { collision } => {
                collision.as_deref()
            }
            NodePayload::Stub => None,
        }
    }
}

impl Serialize for NodeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry("class", &self.class)?;
        map.serialize_entry("category", &self.category)?;
        map.serialize_entry("position", &Scalars(&self.position))?;
        map.serialize_entry("rotation", &Scalars(&self.rotation))?;
        map.serialize_entry("scale", &Scalar(self.scale))?;
        if let Some(buffers) = self.payload.buffers() {
            buffers.write_entries(&mut map)?;
        }
        if let Some(collision) = self.payload.collision() {
            map.serialize_entry("collision", collision)?;
        }
        map.end()
    }
}
