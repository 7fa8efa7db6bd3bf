//! In-memory host scene loaded from a JSON scene dump.
//!
//! Stands in for the host application: it owns nodes and their polygon
//! meshes, hands out fan-triangulated working copies, and counts live
//! duplicates so callers can check that every copy is released.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use lightshade_core::{Error, Result, ResultExt, Transform, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mesh::{Corner, TriangulatedMesh};
use crate::node::{NodeId, NodeKind, SceneNode};
use crate::source::{MeshEvaluator, SceneSource};

/// Top-level scene dump document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDump {
    /// Name of the host file the dump was taken from
    #[serde(default)]
    pub filename: String,
    /// Selected node names, in selection order
    #[serde(default)]
    pub selection: Vec<String>,
    pub nodes: Vec<NodeDump>,
}

/// One node in a scene dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDump {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub location: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_display_size")]
    pub display_size: f32,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub mesh: Option<MeshDump>,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_display_size() -> f32 {
    1.0
}

/// Polygon mesh data of a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshDump {
    pub vertices: Vec<Vec3>,
    /// Whether the mesh has an active color layer
    #[serde(default)]
    pub color_layer: bool,
    pub polygons: Vec<PolygonDump>,
}

/// One n-gon with per-corner attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolygonDump {
    pub vertices: Vec<u32>,
    pub normals: Vec<Vec3>,
    /// Missing when the polygon has no active UV layer
    #[serde(default)]
    pub uvs: Option<Vec<Vec2>>,
    #[serde(default)]
    pub colors: Option<Vec<Vec4>>,
}

impl MeshDump {
    fn validate(&self, node: &str) -> Result<()> {
        let vertex_count = self.vertices.len();
        for (index, polygon) in self.polygons.iter().enumerate() {
            let corners = polygon.vertices.len();
            let fail = |what: &str| {
                Err(Error::invalid_data(format!(
                    "{}: polygon {} {}",
                    node, index, what
                )))
            };
            if corners < 3 {
                return fail("has fewer than 3 corners");
            }
            if polygon.normals.len() != corners {
                return fail("normal count does not match corner count");
            }
            if polygon.uvs.as_ref().is_some_and(|uvs| uvs.len() != corners) {
                return fail("uv count does not match corner count");
            }
            match &polygon.colors {
                Some(colors) if colors.len() != corners => {
                    return fail("color count does not match corner count")
                }
                None if self.color_layer => return fail("is missing colors for the active color layer"),
                _ => {}
            }
            if let Some(&v) = polygon.vertices.iter().find(|&&v| v as usize >= vertex_count) {
                return fail(format!("references vertex {} of {}", v, vertex_count).as_str());
            }
        }
        Ok(())
    }

    /// Check corner counts, then fan-triangulate every polygon from its
    /// first corner
    pub fn triangulate(&self) -> Result<TriangulatedMesh> {
        self.validate("mesh")?;
        Ok(self.fan())
    }

    /// Indexes polygon attributes directly; only call on a validated dump
    fn fan(&self) -> TriangulatedMesh {
        let mut mesh = TriangulatedMesh::new();
        for position in &self.vertices {
            mesh.push_vertex(*position);
        }
        mesh.has_color_layer = self.color_layer;

        for polygon in &self.polygons {
            let corner = |i: usize| {
                let mut corner = Corner::new(
                    polygon.vertices[i],
                    polygon.uvs.as_ref().map(|uvs| uvs[i]),
                    polygon.normals[i],
                );
                if self.color_layer {
                    corner.color = polygon.colors.as_ref().map(|colors| colors[i]);
                }
                corner
            };
            for i in 1..polygon.vertices.len() - 1 {
                mesh.push_face([corner(0), corner(i), corner(i + 1)]);
            }
        }
        mesh
    }
}

/// Host scene held in memory
#[derive(Debug, Default)]
pub struct MemoryScene {
    filename: String,
    nodes: Vec<SceneNode>,
    meshes: HashMap<NodeId, MeshDump>,
    by_name: HashMap<String, NodeId>,
    selection: Vec<NodeId>,
    live_duplicates: Cell<usize>,
}

impl MemoryScene {
    /// Load a scene dump from a JSON file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let scene = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("loading scene dump {}", path.display()))?;
        info!(path = %path.display(), nodes = scene.nodes.len(), "Loaded scene dump");
        Ok(scene)
    }

    /// Load a scene dump from any JSON reader
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let dump: SceneDump = serde_json::from_reader(reader)?;
        Self::from_dump(dump)
    }

    /// Build a scene from a parsed dump, resolving names to handles
    pub fn from_dump(dump: SceneDump) -> Result<Self> {
        let mut scene = MemoryScene {
            filename: dump.filename,
            ..Default::default()
        };

        for (index, node) in dump.nodes.iter().enumerate() {
            let id = NodeId(index as u32);
            if scene.by_name.insert(node.name.clone(), id).is_some() {
                return Err(Error::DuplicateNode {
                    name: node.name.clone(),
                });
            }
        }

        for (index, node) in dump.nodes.into_iter().enumerate() {
            let id = NodeId(index as u32);
            let children = node
                .children
                .iter()
                .map(|child| scene.resolve(child))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("resolving children of {}", node.name))?;

            if let Some(mesh) = node.mesh {
                mesh.validate(&node.name)?;
                scene.meshes.insert(id, mesh);
            }

            scene.nodes.push(SceneNode {
                id,
                name: node.name,
                kind: node.kind,
                transform: Transform::new(node.location, node.rotation, node.scale),
                display_size: node.display_size,
                class: node.class,
                category: node.category,
                children,
            });
        }

        scene.selection = dump
            .selection
            .iter()
            .map(|name| scene.resolve(name))
            .collect::<Result<Vec<_>>>()
            .context("resolving selection")?;

        Ok(scene)
    }

    /// Resolve a node name to its handle
    pub fn resolve(&self, name: &str) -> Result<NodeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::node_not_found(name))
    }

    /// Replace the selection with the named nodes, in the given order
    pub fn select<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        self.selection = names
            .iter()
            .map(|name| self.resolve(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Number of working copies handed out and not yet released
    pub fn live_duplicates(&self) -> usize {
        self.live_duplicates.get()
    }
}

impl SceneSource for MemoryScene {
    fn source_filename(&self) -> &str {
        &self.filename
    }

    fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }
}

impl MeshEvaluator for MemoryScene {
    fn duplicate(&self, node: &SceneNode) -> Result<TriangulatedMesh> {
        let mesh = self
            .meshes
            .get(&node.id)
            .ok_or_else(|| Error::mesh_unavailable(&node.name, "node has no mesh data"))?;
        // validated when the scene was built
        let working = mesh.fan();
        self.live_duplicates.set(self.live_duplicates.get() + 1);
        debug!(
            node = %node.name,
            polygons = mesh.polygons.len(),
            triangles = working.face_count(),
            "Duplicated and triangulated mesh"
        );
        Ok(working)
    }

    fn release(&self, node: &SceneNode) {
        let live = self.live_duplicates.get().saturating_sub(1);
        self.live_duplicates.set(live);
        debug!(node = %node.name, live, "Released mesh duplicate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::working::WorkingMesh;

    const QUAD_SCENE: &str = r#"{
        "filename": "level.blend",
        "selection": ["Floor"],
        "nodes": [
            {
                "name": "Floor",
                "type": "MESH",
                "location": [1.0, 2.0, 3.0],
                "class": "ground",
                "children": ["FloorCollision"],
                "mesh": {
                    "vertices": [[0,0,0],[1,0,0],[1,1,0],[0,1,0]],
                    "polygons": [
                        {
                            "vertices": [0,1,2,3],
                            "normals": [[0,0,1],[0,0,1],[0,0,1],[0,0,1]],
                            "uvs": [[0,0],[1,0],[1,1],[0,1]]
                        }
                    ]
                }
            },
            {
                "name": "FloorCollision",
                "type": "MESH",
                "class": "collision",
                "mesh": {
                    "vertices": [[0,0,0],[1,0,0],[0,1,0]],
                    "polygons": [{ "vertices": [0,1,2], "normals": [[0,0,1],[0,0,1],[0,0,1]] }]
                }
            }
        ]
    }"#;

    #[test]
    fn test_load_resolves_names() {
        let scene = MemoryScene::from_reader(QUAD_SCENE.as_bytes()).unwrap();
        assert_eq!(scene.source_filename(), "level.blend");
        assert_eq!(scene.selection(), &[NodeId(0)]);

        let floor = scene.node(NodeId(0)).unwrap();
        assert_eq!(floor.kind, NodeKind::Mesh);
        assert_eq!(floor.class, "ground");
        assert_eq!(floor.category, "");
        assert_eq!(floor.transform.scale, Vec3::ONE);
        assert_eq!(floor.children, vec![NodeId(1)]);
        assert!(scene.node(NodeId(1)).unwrap().is_collision());
    }

    #[test]
    fn test_quad_fan_triangulation() {
        let scene = MemoryScene::from_reader(QUAD_SCENE.as_bytes()).unwrap();
        let floor = scene.node(NodeId(0)).unwrap();
        let working = WorkingMesh::acquire(&scene, floor).unwrap();

        assert_eq!(working.face_count(), 2);
        let order: Vec<u32> = working.corners().map(|c| c.vertex).collect();
        assert_eq!(order, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(scene.live_duplicates(), 1);
        drop(working);
        assert_eq!(scene.live_duplicates(), 0);
    }

    #[test]
    fn test_missing_uvs_stay_missing() {
        let scene = MemoryScene::from_reader(QUAD_SCENE.as_bytes()).unwrap();
        let collision = scene.node(NodeId(1)).unwrap();
        let working = WorkingMesh::acquire(&scene, collision).unwrap();
        assert!(working.corners().all(|c| c.uv.is_none()));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "nodes": [ {"name": "A", "type": "EMPTY"}, {"name": "A", "type": "MESH"} ] }"#;
        let err = MemoryScene::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::DuplicateNode { .. }));
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let json = r#"{ "selection": ["Ghost"], "nodes": [ {"name": "A", "type": "EMPTY"} ] }"#;
        let err = MemoryScene::from_reader(json.as_bytes()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mismatched_normals_rejected() {
        let json = r#"{ "nodes": [ {"name": "A", "type": "MESH", "mesh": {
            "vertices": [[0,0,0],[1,0,0],[0,1,0]],
            "polygons": [{ "vertices": [0,1,2], "normals": [[0,0,1]] }]
        }} ] }"#;
        let err = MemoryScene::from_reader(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("normal count"));
    }

    #[test]
    fn test_triangulate_rejects_unvalidated_dump() {
        let mut mesh = MeshDump {
            vertices: vec![Vec3::ZERO, Vec3::ONE, Vec3::new(0.0, 1.0, 0.0)],
            color_layer: false,
            polygons: vec![PolygonDump::default()],
        };
        let err = mesh.triangulate().unwrap_err();
        assert!(err.to_string().contains("fewer than 3 corners"));

        mesh.polygons[0].vertices = vec![0, 1, 2];
        mesh.polygons[0].normals = vec![Vec3::ONE];
        let err = mesh.triangulate().unwrap_err();
        assert!(err.to_string().contains("normal count"));

        mesh.polygons[0].normals = vec![Vec3::ONE; 3];
        assert_eq!(mesh.triangulate().unwrap().face_count(), 1);
    }

    #[test]
    fn test_node_without_mesh_is_unavailable() {
        let json = r#"{ "nodes": [ {"name": "Marker", "type": "EMPTY"} ] }"#;
        let scene = MemoryScene::from_reader(json.as_bytes()).unwrap();
        let marker = scene.node(NodeId(0)).unwrap();
        assert!(WorkingMesh::acquire(&scene, marker).is_err());
        assert_eq!(scene.live_duplicates(), 0);
    }

    #[test]
    fn test_select_overrides_selection() {
        let mut scene = MemoryScene::from_reader(QUAD_SCENE.as_bytes()).unwrap();
        scene.select(&["FloorCollision", "Floor"]).unwrap();
        assert_eq!(scene.selection(), &[NodeId(1), NodeId(0)]);
        assert!(scene.select(&["Nope"]).is_err());
    }
}
