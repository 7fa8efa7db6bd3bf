//! Host scene boundary for lightshade
//!
//! Describes what the exporter needs from a 3D content-creation host:
//! - [`SceneSource`]: the selection and read-only node data
//! - [`MeshEvaluator`]: triangulated working copies of mesh nodes
//! - [`Clock`]: timestamps for document metadata
//!
//! [`MemoryScene`] implements the first two over a JSON scene dump, and
//! [`WorkingMesh`] scopes every working copy so it is always released.
//!
//! # Example
//! ```no_run
//! use lightshade_scene::{MemoryScene, SceneSource, WorkingMesh};
//!
//! let scene = MemoryScene::open("level.scene.json").unwrap();
//! for &id in scene.selection() {
//!     let node = scene.node(id).unwrap();
//!     let mesh = WorkingMesh::acquire(&scene, node).unwrap();
//!     println!("{}: {} triangles", node.name, mesh.face_count());
//! }
//! ```

pub mod memory;
pub mod mesh;
pub mod node;
pub mod source;
pub mod working;

pub use memory::{MemoryScene, MeshDump, NodeDump, PolygonDump, SceneDump};
pub use mesh::{Corner, MeshVertex, Triangle, TriangulatedMesh};
pub use node::{NodeId, NodeKind, SceneNode, COLLISION_CLASS};
pub use source::{Clock, FixedClock, MeshEvaluator, SceneSource, SystemClock};
pub use working::WorkingMesh;
