//! Triangulated working-copy mesh data structures

use lightshade_core::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A triangulated, per-corner-attributed mesh produced by the host
/// for one node. Owned by that node's export and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangulatedMesh {
    /// Vertices, indexed by original vertex index
    pub vertices: Vec<MeshVertex>,
    /// Triangles in host iteration order
    pub faces: Vec<Triangle>,
    /// Whether an active color layer exists
    pub has_color_layer: bool,
}

/// Mesh vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    /// Stable original vertex index
    pub index: u32,
    pub position: Vec3,
}

/// One triangle; exactly three corners in loop order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub corners: [Corner; 3],
}

/// One (face, vertex) incidence with its own attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    /// Originating vertex index
    pub vertex: u32,
    /// `None` when the face has no active UV layer
    pub uv: Option<Vec2>,
    pub normal: Vec3,
    /// Present when the mesh has an active color layer
    pub color: Option<Vec4>,
}

impl Corner {
    pub fn new(vertex: u32, uv: Option<Vec2>, normal: Vec3) -> Self {
        Self {
            vertex,
            uv,
            normal,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = Some(color);
        self
    }
}

impl TriangulatedMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex, assigning it the next original index
    pub fn push_vertex(&mut self, position: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex { index, position });
        index
    }

    pub fn push_face(&mut self, corners: [Corner; 3]) {
        self.faces.push(Triangle { corners });
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Get corner count (three per triangle)
    pub fn corner_count(&self) -> usize {
        self.faces.len() * 3
    }

    /// Look up a vertex by original index
    pub fn vertex(&self, index: u32) -> Option<&MeshVertex> {
        self.vertices.get(index as usize)
    }

    /// Corners in face-then-loop order
    pub fn corners(&self) -> impl Iterator<Item = &Corner> + '_ {
        self.faces.iter().flat_map(|f| f.corners.iter())
    }

    /// Check that corners reference existing vertices and that colors are
    /// present whenever the color layer is active.
    pub fn validate(&self) -> Result<(), String> {
        for (face_index, face) in self.faces.iter().enumerate() {
            for corner in &face.corners {
                if corner.vertex as usize >= self.vertices.len() {
                    return Err(format!(
                        "face {} references vertex {} (vertex count {})",
                        face_index,
                        corner.vertex,
                        self.vertices.len()
                    ));
                }
                if self.has_color_layer && corner.color.is_none() {
                    return Err(format!(
                        "face {} has a corner without color on a mesh with an active color layer",
                        face_index
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(v: u32) -> Corner {
        Corner::new(v, Some(Vec2::ZERO), Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn test_counts() {
        let mut mesh = TriangulatedMesh::new();
        for _ in 0..3 {
            mesh.push_vertex(Vec3::ZERO);
        }
        mesh.push_face([corner(0), corner(1), corner(2)]);

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.corner_count(), 3);
        assert_eq!(mesh.corners().map(|c| c.vertex).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_validate_out_of_range_vertex() {
        let mut mesh = TriangulatedMesh::new();
        mesh.push_vertex(Vec3::ZERO);
        mesh.push_face([corner(0), corner(0), corner(5)]);

        let err = mesh.validate().unwrap_err();
        assert!(err.contains("vertex 5"));
    }

    #[test]
    fn test_validate_missing_color() {
        let mut mesh = TriangulatedMesh::new();
        for _ in 0..3 {
            mesh.push_vertex(Vec3::ZERO);
        }
        mesh.has_color_layer = true;
        mesh.push_face([corner(0).with_color(Vec4::ONE), corner(1), corner(2)]);

        assert!(mesh.validate().is_err());
    }
}
