//! Collision sub-mesh export
//!
//! Children whose `class` property is `"collision"` are exported as raw,
//! unwelded vertex positions. A node with no such child gets no
//! `"collision"` key at all.

use lightshade_scene::{MeshEvaluator, SceneNode, SceneSource, WorkingMesh};
use serde::Serialize;
use tracing::debug;

use super::{axis, canonical, GeoExportError, GeoResult};

/// Raw positions of one collision child
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionRecord {
    pub name: String,
    /// One `[x, z, y]` entry per vertex, zero-snapped
    #[serde(serialize_with = "canonical::serialize_positions")]
    pub vpos: Vec<[f64; 3]>,
}

/// Collect collision records for every collision-tagged child of `node`.
///
/// Returns `None` when the node has no collision child.
pub fn collect<S, E>(
    scene: &S,
    evaluator: &E,
    node: &SceneNode,
) -> GeoResult<Option<Vec<CollisionRecord>>>
where
    S: SceneSource + ?Sized,
    E: MeshEvaluator + ?Sized,
{
    let mut records = Vec::new();
    for &child_id in &node.children {
        let child = scene.require_node(child_id)?;
        if !child.is_collision() {
            continue;
        }
        let record = export_child(evaluator, child)
            .map_err(|e| e.with_context(format!("collision child {}", child.name)))?;
        debug!(
            node = %node.name,
            child = %child.name,
            vertices = record.vpos.len(),
            "Collision mesh"
        );
        records.push(record);
    }
    Ok((!records.is_empty()).then_some(records))
}

fn export_child<E>(evaluator: &E, child: &SceneNode) -> GeoResult<CollisionRecord>
where
    E: MeshEvaluator + ?Sized,
{
    let working = WorkingMesh::acquire(evaluator, child).map_err(GeoExportError::Scene)?;
    let vpos = working
        .vertices
        .iter()
        .map(|v| axis::collision_position(v.position).map(canonical::snap_zero))
        .collect();
    Ok(CollisionRecord {
        name: child.name.clone(),
        vpos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightshade_scene::{MemoryScene, NodeId};

    const SCENE: &str = r#"{
        "nodes": [
            { "name": "Rock", "type": "MESH", "children": ["RockHull", "RockDetail"] },
            { "name": "RockHull", "type": "MESH", "class": "collision", "mesh": {
                "vertices": [[1.0, 2.0, 3.0], [0.00001, -4.5, 0.25], [0, 0, 0]],
                "polygons": [{ "vertices": [0,1,2], "normals": [[0,0,1],[0,0,1],[0,0,1]] }]
            }},
            { "name": "RockDetail", "type": "MESH", "class": "detail" },
            { "name": "Bare", "type": "MESH" }
        ]
    }"#;

    #[test]
    fn test_collects_tagged_children_only() {
        let scene = MemoryScene::from_reader(SCENE.as_bytes()).unwrap();
        let rock = scene.node(NodeId(0)).unwrap();

        let records = collect(&scene, &scene, rock).unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "RockHull");
        assert_eq!(
            records[0].vpos,
            vec![[1.0, 3.0, 2.0], [0.0, 0.25, -4.5], [0.0, 0.0, 0.0]]
        );
        assert_eq!(scene.live_duplicates(), 0);
    }

    #[test]
    fn test_no_collision_children_is_none() {
        let scene = MemoryScene::from_reader(SCENE.as_bytes()).unwrap();
        let bare = scene.node(NodeId(3)).unwrap();
        assert_eq!(collect(&scene, &scene, bare).unwrap(), None);
    }

    #[test]
    fn test_serialized_positions() {
        let record = CollisionRecord {
            name: "Hull".into(),
            vpos: vec![[1.0, 3.0, 2.0], [0.0, 0.123456789, -4.5]],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Hull","vpos":[[1.0,3.0,2.0],[0.0,0.12345,-4.5]]}"#);
    }

    #[test]
    fn test_collision_child_without_mesh_fails() {
        let json = r#"{ "nodes": [
            { "name": "Crate", "type": "MESH", "children": ["CrateHull"] },
            { "name": "CrateHull", "type": "EMPTY", "class": "collision" }
        ] }"#;
        let scene = MemoryScene::from_reader(json.as_bytes()).unwrap();
        let crate_node = scene.node(NodeId(0)).unwrap();
        let err = collect(&scene, &scene, crate_node).unwrap_err();
        assert!(err.to_string().contains("CrateHull"));
    }
}
