//! Vertex welding: per-corner attributes to a shared vertex buffer.
//!
//! Each corner of each triangle yields an [`AttributeTuple`] built from its
//! vertex position, UV, normal and (optional) color after axis mapping.
//! Corners of the same original vertex whose tuples match exactly share one
//! slot; any difference (a UV seam, a hard edge) splits the vertex.
//!
//! Slots are numbered 0..N in order of first appearance while walking faces
//! and then corners in host order. The per-corner slot sequence is the
//! triangle index buffer.

use std::collections::{HashMap, HashSet};

use lightshade_core::Vec2;
use lightshade_scene::{Corner, TriangulatedMesh};
use tracing::debug;

use super::axis;
use super::{GeoExportError, GeoResult};

/// UVs substituted for a face without an active UV layer
pub const FALLBACK_UVS: [Vec2; 3] = [
    Vec2 { x: 0.0, y: 0.0 },
    Vec2 { x: 1.0, y: 0.0 },
    Vec2 { x: 0.0, y: 0.0 },
];

/// Welding key and output vertex. Values are axis-mapped but not
/// canonicalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeTuple {
    /// Original vertex index
    pub vertex: u32,
    pub position: [f64; 3],
    pub uv: [f64; 2],
    pub normal: [f64; 3],
    /// RGB, present when the mesh has an active color layer
    pub color: Option<[f64; 3]>,
}

impl AttributeTuple {
    fn from_corner(mesh: &TriangulatedMesh, corner: &Corner, uv: Vec2) -> GeoResult<Self> {
        let vertex = mesh.vertex(corner.vertex).ok_or_else(|| {
            GeoExportError::invalid_mesh(format!("corner references missing vertex {}", corner.vertex))
        })?;
        let color = if mesh.has_color_layer {
            let color = corner.color.ok_or_else(|| {
                GeoExportError::invalid_mesh(format!(
                    "corner of vertex {} has no color on a mesh with a color layer",
                    corner.vertex
                ))
            })?;
            Some(color.rgb_f64())
        } else {
            None
        };
        Ok(Self {
            vertex: corner.vertex,
            position: axis::position(vertex.position),
            uv: axis::uv(uv),
            normal: axis::normal(corner.normal),
            color,
        })
    }

    fn key(&self) -> AttributeKey {
        let mut bits = [0u64; 11];
        let color = self.color.unwrap_or_default();
        let values = self
            .position
            .iter()
            .chain(&self.uv)
            .chain(&self.normal)
            .chain(&color);
        for (slot, value) in bits.iter_mut().zip(values) {
            // float equality treats -0.0 and 0.0 as equal; bits do not
            *slot = (value + 0.0).to_bits();
        }
        AttributeKey {
            vertex: self.vertex,
            bits,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AttributeKey {
    vertex: u32,
    bits: [u64; 11],
}

/// Welded vertices in slot order plus the per-corner index buffer
#[derive(Debug, Clone, Default)]
pub struct WeldedVertexBuffer {
    tuples: Vec<AttributeTuple>,
    indices: Vec<u32>,
    has_color: bool,
    referenced_vertices: usize,
}

impl WeldedVertexBuffer {
    /// Slot `i` holds `tuples()[i]`
    pub fn tuples(&self) -> &[AttributeTuple] {
        &self.tuples
    }

    /// Slot per corner, three per triangle, in face order
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn has_color(&self) -> bool {
        self.has_color
    }

    pub fn slot_count(&self) -> usize {
        self.tuples.len()
    }

    pub fn corner_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Extra slots created by attribute seams
    pub fn split_count(&self) -> usize {
        self.tuples.len() - self.referenced_vertices
    }
}

/// Incremental welder; feed corners in order, then [`finish`](Welder::finish)
#[derive(Debug, Default)]
pub struct Welder {
    slots: HashMap<AttributeKey, u32>,
    buffer: WeldedVertexBuffer,
    seen_vertices: HashSet<u32>,
}

impl Welder {
    pub fn new(has_color: bool) -> Self {
        Self {
            buffer: WeldedVertexBuffer {
                has_color,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Return the slot for `tuple`, assigning the next one if unseen
    pub fn insert(&mut self, tuple: AttributeTuple) -> GeoResult<u32> {
        let next = next_slot(self.buffer.tuples.len())?;
        let slot = *self.slots.entry(tuple.key()).or_insert(next);
        if slot == next {
            self.buffer.tuples.push(tuple);
            self.seen_vertices.insert(tuple.vertex);
        }
        self.buffer.indices.push(slot);
        Ok(slot)
    }

    pub fn finish(mut self) -> WeldedVertexBuffer {
        self.buffer.referenced_vertices = self.seen_vertices.len();
        self.buffer
    }
}

/// Slot number for the `count`-th distinct tuple; index buffers are u32
fn next_slot(count: usize) -> GeoResult<u32> {
    u32::try_from(count).map_err(|_| {
        GeoExportError::invalid_mesh(format!("more than {} welded vertices", u32::MAX))
    })
}

/// Weld a triangulated mesh
pub fn weld(mesh: &TriangulatedMesh) -> GeoResult<WeldedVertexBuffer> {
    let mut welder = Welder::new(mesh.has_color_layer);
    let mut fallback_faces = 0usize;

    for face in &mesh.faces {
        let has_uvs = face.corners.iter().all(|c| c.uv.is_some());
        if !has_uvs {
            fallback_faces += 1;
        }
        for (i, corner) in face.corners.iter().enumerate() {
            let uv = match corner.uv {
                Some(uv) if has_uvs => uv,
                _ => FALLBACK_UVS[i],
            };
            welder.insert(AttributeTuple::from_corner(mesh, corner, uv)?)?;
        }
    }

    if fallback_faces > 0 {
        debug!(faces = fallback_faces, "Faces without UV layer use fallback UVs");
    }

    let welded = welder.finish();
    debug!(
        corners = welded.corner_count(),
        slots = welded.slot_count(),
        splits = welded.split_count(),
        "Welded vertices"
    );
    Ok(welded)
}
