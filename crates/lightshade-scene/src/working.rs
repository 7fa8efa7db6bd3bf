//! Scoped working copy of a node's mesh

use std::ops::Deref;

use lightshade_core::{Result, ResultExt};
use tracing::trace;

use crate::mesh::TriangulatedMesh;
use crate::node::SceneNode;
use crate::source::MeshEvaluator;

/// A host duplicate that is released when dropped.
///
/// Holds the triangulated mesh for one node. `Drop` calls
/// [`MeshEvaluator::release`], so the temporary host object is removed on
/// normal return, on `?` early return, and during unwinding.
pub struct WorkingMesh<'a, E: MeshEvaluator + ?Sized> {
    evaluator: &'a E,
    node: &'a SceneNode,
    mesh: TriangulatedMesh,
}

impl<'a, E: MeshEvaluator + ?Sized> WorkingMesh<'a, E> {
    /// Duplicate and triangulate `node` through `evaluator`
    pub fn acquire(evaluator: &'a E, node: &'a SceneNode) -> Result<Self> {
        let mesh = evaluator
            .duplicate(node)
            .with_context(|| format!("evaluating mesh of {}", node.name))?;
        trace!(node = %node.name, faces = mesh.face_count(), "acquired working mesh");
        Ok(Self {
            evaluator,
            node,
            mesh,
        })
    }

    pub fn node(&self) -> &SceneNode {
        self.node
    }
}

impl<E: MeshEvaluator + ?Sized> Deref for WorkingMesh<'_, E> {
    type Target = TriangulatedMesh;

    fn deref(&self) -> &TriangulatedMesh {
        &self.mesh
    }
}

impl<E: MeshEvaluator + ?Sized> Drop for WorkingMesh<'_, E> {
    fn drop(&mut self) {
        trace!(node = %self.node.name, "releasing working mesh");
        self.evaluator.release(self.node);
    }
}
