//! Traits describing the host application at the export boundary.
//!
//! The exporter never talks to a host directly. It reads the selection and
//! node data through [`SceneSource`], asks a [`MeshEvaluator`] for
//! triangulated working copies, and stamps documents with a [`Clock`].

use chrono::NaiveDateTime;
use lightshade_core::Result;

use crate::mesh::TriangulatedMesh;
use crate::node::{NodeId, SceneNode};

/// Read-only access to the host scene graph
pub trait SceneSource {
    /// Basename of the file the scene was loaded from
    fn source_filename(&self) -> &str;

    /// Current selection, in host order
    fn selection(&self) -> &[NodeId];

    /// Resolve a node handle
    fn node(&self, id: NodeId) -> Option<&SceneNode>;

    /// Resolve a node handle, failing with `NodeNotFound`
    fn require_node(&self, id: NodeId) -> Result<&SceneNode> {
        self.node(id)
            .ok_or_else(|| lightshade_core::Error::node_not_found(id.to_string()))
    }
}

/// Host mesh-evaluation service.
///
/// `duplicate` creates a temporary evaluated copy of the node's mesh and
/// triangulates it; `release` deletes that temporary from the host scene.
/// Callers should go through [`WorkingMesh::acquire`](crate::WorkingMesh::acquire),
/// which pairs the two calls on every exit path.
pub trait MeshEvaluator {
    fn duplicate(&self, node: &SceneNode) -> Result<TriangulatedMesh>;

    fn release(&self, node: &SceneNode);
}

/// Wall-clock source for document timestamps
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
