//! Flattened attribute arrays for a welded mesh

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::canonical::{self, Array, Indices};
use super::weld::WeldedVertexBuffer;

/// Parallel attribute arrays and the triangle index buffer of one mesh.
///
/// Every scalar is zero-snapped; truncation happens when the arrays are
/// written. `positions.len() / 3 == uvs.len() / 2 ==
/// normals.len() / 3 == slot count`, `colors` (when present) has three
/// values per slot, and every index is below the slot count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<f64>,
    pub indices: Vec<u32>,
    pub uvs: Vec<f64>,
    pub colors: Option<Vec<f64>>,
    pub normals: Vec<f64>,
}

impl MeshBuffers {
    /// Flatten welded slots into zero-snapped arrays
    pub fn from_welded(welded: &WeldedVertexBuffer) -> Self {
        let slots = welded.slot_count();
        let mut buffers = MeshBuffers {
            positions: Vec::with_capacity(slots * 3),
            indices: welded.indices().to_vec(),
            uvs: Vec::with_capacity(slots * 2),
            colors: welded.has_color().then(|| Vec::with_capacity(slots * 3)),
            normals: Vec::with_capacity(slots * 3),
        };

        for tuple in welded.tuples() {
            extend_snapped(&mut buffers.positions, &tuple.position);
            extend_snapped(&mut buffers.uvs, &tuple.uv);
            extend_snapped(&mut buffers.normals, &tuple.normal);
            if let (Some(colors), Some(rgb)) = (buffers.colors.as_mut(), tuple.color) {
                extend_snapped(colors, &rgb);
            }
        }
        buffers
    }

    /// Write the mesh keys into an open map, in document order
    pub fn write_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry("vertices", &Array(&self.positions))?;
        map.serialize_entry("indices", &Indices(&self.indices))?;
        map.serialize_entry("UV", &Array(&self.uvs))?;
        if let Some(colors) = &self.colors {
            map.serialize_entry("vertexcolors", &Array(colors))?;
        }
        map.serialize_entry("normals", &Array(&self.normals))
    }

    pub fn slot_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl Serialize for MeshBuffers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.write_entries(&mut map)?;
        map.end()
    }
}

fn extend_snapped(out: &mut Vec<f64>, values: &[f64]) {
    out.extend(values.iter().map(|&v| canonical::snap_zero(v)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::weld::{weld, AttributeTuple, Welder};
    use lightshade_core::{Vec2, Vec3, Vec4};
    use lightshade_scene::{Corner, TriangulatedMesh};

    fn tuple(vertex: u32, x: f64, color: Option<[f64; 3]>) -> AttributeTuple {
        AttributeTuple {
            vertex,
            position: [x, 0.000003, 1.23456789],
            uv: [0.5, 1.0],
            normal: [0.0, 1.0, 0.0],
            color,
        }
    }

    #[test]
    fn test_lengths_match_slots() {
        let mut welder = Welder::new(false);
        for v in [0u32, 1, 2, 0, 2, 3] {
            welder.insert(tuple(v, f64::from(v), None)).unwrap();
        }
        let buffers = MeshBuffers::from_welded(&welder.finish());

        assert_eq!(buffers.slot_count(), 4);
        assert_eq!(buffers.positions.len(), 12);
        assert_eq!(buffers.uvs.len(), 8);
        assert_eq!(buffers.normals.len(), 12);
        assert_eq!(buffers.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(buffers.colors, None);
    }

    #[test]
    fn test_values_are_snapped() {
        let mut welder = Welder::new(true);
        welder.insert(tuple(0, -0.00005, Some([0.123456789, 1.0, 0.0]))).unwrap();
        let buffers = MeshBuffers::from_welded(&welder.finish());

        assert_eq!(buffers.positions, vec![0.0, 0.0, 1.23456789]);
        assert_eq!(buffers.colors, Some(vec![0.123456789, 1.0, 0.0]));

        let json = serde_json::to_string(&buffers).unwrap();
        assert!(json.contains(r#""vertices":[0,0,1.23456]"#));
        assert!(json.contains(r#""vertexcolors":[0.12345,1,0]"#));
    }

    #[test]
    fn test_near_integers_collapse_before_truncation() {
        let mut welder = Welder::new(false);
        welder.insert(tuple(0, 2.999909, None)).unwrap();
        let json = serde_json::to_string(&MeshBuffers::from_welded(&welder.finish())).unwrap();
        assert!(json.contains(r#""vertices":[3,0,1.23456]"#), "{json}");
    }

    #[test]
    fn test_serialized_keys_and_order() {
        let mut mesh = TriangulatedMesh::new();
        mesh.push_vertex(Vec3::new(1.0, 0.0, 0.0));
        mesh.push_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh.push_vertex(Vec3::new(0.0, 0.0, 1.0));
        mesh.has_color_layer = true;
        let n = Vec3::new(0.0, 0.0, 1.0);
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        mesh.push_face([
            Corner::new(0, Some(Vec2::new(0.0, 0.0)), n).with_color(red),
            Corner::new(1, Some(Vec2::new(1.0, 0.0)), n).with_color(red),
            Corner::new(2, Some(Vec2::new(0.0, 1.0)), n).with_color(red),
        ]);

        let buffers = MeshBuffers::from_welded(&weld(&mesh).unwrap());
        let json = serde_json::to_string(&buffers).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"vertices":[-1,0,0,0,0,1,0,1,0],"indices":[0,1,2],"#,
                r#""UV":[0,1,1,1,0,0],"vertexcolors":[1,0,0,1,0,0,1,0,0],"#,
                r#""normals":[0,1,0,0,1,0,0,1,0]}"#
            )
        );
    }

    #[test]
    fn test_no_color_layer_omits_key() {
        let mut welder = Welder::new(false);
        welder.insert(tuple(0, 1.0, None)).unwrap();
        let json = serde_json::to_string(&MeshBuffers::from_welded(&welder.finish())).unwrap();
        assert!(!json.contains("vertexcolors"));
    }
}
