//! Per-node serialization
//!
//! Every node gets name, type, class, category, position and rotation.
//! What follows depends on the node kind:
//! - `MESH`: `scale.x`, the welded mesh buffers, and collision children
//! - `EMPTY`: half the display size as scale, and collision children
//! - anything else: a stub scale of `1.0`

use lightshade_scene::{MeshEvaluator, NodeKind, SceneNode, SceneSource, WorkingMesh};
use serde::Serialize;
use tracing::debug;

use super::buffers::MeshBuffers;
use super::weld::{weld, WeldedVertexBuffer};
use super::{axis, canonical, collision, GeoExportError, GeoResult, NodePayload, NodeRecord};

/// Scale written for node kinds without a scale of their own
pub const STUB_SCALE: f64 = 1.0;

/// Serializes nodes against one scene and mesh evaluator
pub struct NodeSerializer<'a, S: ?Sized, E: ?Sized> {
    scene: &'a S,
    evaluator: &'a E,
}

impl<'a, S, E> NodeSerializer<'a, S, E>
where
    S: SceneSource + ?Sized,
    E: MeshEvaluator + ?Sized,
{
    pub fn new(scene: &'a S, evaluator: &'a E) -> Self {
        Self { scene, evaluator }
    }

    /// Build the document record for `node`
    pub fn serialize(&self, node: &SceneNode) -> GeoResult<NodeRecord> {
        let transform = &node.transform;
        let (scale, payload) = match node.kind {
            NodeKind::Mesh => (f64::from(transform.scale.x), self.mesh_payload(node)?),
            NodeKind::Empty => (
                f64::from(node.display_size) / 2.0,
                NodePayload::Empty {
                    collision: collision::collect(self.scene, self.evaluator, node)?,
                },
            ),
            _ => (STUB_SCALE, NodePayload::Stub),
        };

        Ok(NodeRecord {
            name: node.name.clone(),
            kind: node.kind.as_str().to_string(),
            class: node.class.clone(),
            category: node.category.clone(),
            position: axis::position(transform.location).map(canonical::canonicalize),
            rotation: axis::rotation(transform.rotation).map(canonical::canonicalize),
            scale: canonical::canonicalize(scale),
            payload,
        })
    }

    fn mesh_payload(&self, node: &SceneNode) -> GeoResult<NodePayload> {
        let buffers = {
            let welded = self.weld_node(node)?;
            MeshBuffers::from_welded(&welded)
        };
        let collision = collision::collect(self.scene, self.evaluator, node)?;
        Ok(NodePayload::Mesh { buffers, collision })
    }

    /// Evaluate, validate and weld the node's mesh. The working copy is
    /// released before this returns.
    fn weld_node(&self, node: &SceneNode) -> GeoResult<WeldedVertexBuffer> {
        let working = WorkingMesh::acquire(self.evaluator, node)?;
        working.validate().map_err(GeoExportError::invalid_mesh)?;
        let welded = weld(&working)?;
        debug!(
            node = %node.name,
            vertices = working.vertex_count(),
            triangles = welded.triangle_count(),
            "Mesh welded"
        );
        Ok(welded)
    }

    /// Weld statistics for a mesh node, without building its buffers
    pub fn inspect(&self, node: &SceneNode) -> GeoResult<MeshStats> {
        if node.kind != NodeKind::Mesh {
            return Err(GeoExportError::invalid_mesh(format!(
                "{} is a {} node, not a mesh",
                node.name, node.kind
            )));
        }
        let welded = self.weld_node(node)?;
        let collision_children = node
            .children
            .iter()
            .map(|&id| self.scene.require_node(id))
            .filter(|child| child.as_ref().map_or(true, |c| c.is_collision()))
            .map(|child| child.map(|c| c.name.clone()))
            .collect::<lightshade_core::Result<Vec<_>>>()?;

        Ok(MeshStats {
            name: node.name.clone(),
            corners: welded.corner_count(),
            triangles: welded.triangle_count(),
            slots: welded.slot_count(),
            splits: welded.split_count(),
            has_color: welded.has_color(),
            collision_children,
        })
    }
}

/// Weld summary of one mesh node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStats {
    pub name: String,
    pub corners: usize,
    pub triangles: usize,
    pub slots: usize,
    /// Slots beyond one per referenced vertex
    pub splits: usize,
    pub has_color: bool,
    pub collision_children: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightshade_scene::{MemoryScene, NodeId};

    const SCENE: &str = r#"{
        "nodes": [
            { "name": "Crate", "type": "MESH",
              "location": [0.5, -2.0, 0.00001], "rotation": [0.1, 0.2, 0.3], "scale": [1.5, 9, 9],
              "class": "prop", "category": "wood", "children": ["CrateHull"],
              "mesh": {
                "vertices": [[0,0,0], [1,0,0], [1,1,0], [0,1,0]],
                "color_layer": true,
                "polygons": [{ "vertices": [0,1,2,3],
                               "normals": [[0,0,1],[0,0,1],[0,0,1],[0,0,1]],
                               "uvs": [[0,0],[1,0],[1,1],[0,1]],
                               "colors": [[1,0,0,1],[1,0,0,1],[0,1,0,1],[1,0,0,1]] }]
              } },
            { "name": "CrateHull", "type": "MESH", "class": "collision",
              "mesh": { "vertices": [[0,0,0], [2,0,0], [0,0,2]],
                        "polygons": [{ "vertices": [0,1,2], "normals": [[0,-1,0],[0,-1,0],[0,-1,0]] }] } },
            { "name": "Anchor", "type": "EMPTY", "display_size": 0.5, "location": [1, 1, 1],
              "children": ["CrateHull"] },
            { "name": "Sun", "type": "LIGHT", "scale": [4, 4, 4] }
        ]
    }"#;

    fn scene() -> MemoryScene {
        MemoryScene::from_reader(SCENE.as_bytes()).unwrap()
    }

    #[test]
    fn test_mesh_record() {
        let scene = scene();
        let serializer = NodeSerializer::new(&scene, &scene);
        let record = serializer.serialize(scene.node(NodeId(0)).unwrap()).unwrap();

        assert_eq!(record.kind, "MESH");
        assert_eq!(record.class, "prop");
        assert_eq!(record.category, "wood");
        assert_eq!(record.position, [-0.5, 0.0, -2.0]);
        assert_eq!(record.rotation[0], -0.1);
        assert_eq!(record.scale, 1.5);

        let buffers = record.payload.buffers().unwrap();
        assert_eq!(buffers.slot_count(), 4);
        assert_eq!(buffers.colors.as_ref().map(Vec::len), Some(12));
        let collision = record.payload.collision().unwrap();
        assert_eq!(collision[0].name, "CrateHull");
        assert_eq!(collision[0].vpos.len(), 3);
        assert_eq!(scene.live_duplicates(), 0);
    }

    #[test]
    fn test_empty_record() {
        let scene = scene();
        let serializer = NodeSerializer::new(&scene, &scene);
        let record = serializer.serialize(scene.node(NodeId(2)).unwrap()).unwrap();

        assert_eq!(record.kind, "EMPTY");
        assert_eq!(record.scale, 0.25);
        assert_eq!(record.position, [-1.0, 1.0, 1.0]);
        assert!(record.payload.buffers().is_none());
        assert_eq!(record.payload.collision().map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_other_kinds_get_stub_scale() {
        let scene = scene();
        let serializer = NodeSerializer::new(&scene, &scene);
        let record = serializer.serialize(scene.node(NodeId(3)).unwrap()).unwrap();

        assert_eq!(record.kind, "LIGHT");
        assert_eq!(record.scale, STUB_SCALE);
        assert_eq!(record.payload, NodePayload::Stub);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.ends_with(r#""scale":1.0}"#));
    }

    #[test]
    fn test_inspect() {
        let scene = scene();
        let serializer = NodeSerializer::new(&scene, &scene);
        let stats = serializer.inspect(scene.node(NodeId(0)).unwrap()).unwrap();

        assert_eq!(stats.corners, 6);
        assert_eq!(stats.triangles, 2);
        // vertex 2 is green, every other corner red
        assert_eq!(stats.slots, 4);
        assert_eq!(stats.splits, 0);
        assert!(stats.has_color);
        assert_eq!(stats.collision_children, vec!["CrateHull".to_string()]);

        assert!(serializer.inspect(scene.node(NodeId(2)).unwrap()).is_err());
        assert_eq!(scene.live_duplicates(), 0);
    }
}
