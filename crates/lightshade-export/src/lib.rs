//! lightshade export pipeline
//!
//! Turns a host scene selection into a `.geo` document for a WebGL
//! renderer:
//! - per-corner attributes are welded into a shared vertex buffer with a
//!   triangle index list
//! - coordinates move from Z-up to Y-up
//! - every number is canonicalized (zero-snapped, truncated to 5 digits)
//!
//! # Example
//!
//! ```rust,ignore
//! use lightshade_export::GeoExporter;
//! use lightshade_scene::{MemoryScene, SystemClock};
//!
//! let scene = MemoryScene::open("level.json")?;
//! let doc = GeoExporter::new().export_to_file(&scene, &scene, &SystemClock, "level.geo")?;
//! println!("exported {} nodes", doc.geometry.len());
//! ```

pub mod geo;
pub mod logging;

pub use geo::{
    CollisionRecord, GeoDocument, GeoExportError, GeoExportOptions, GeoExporter, GeoResult,
    MeshBuffers, MeshStats, Meta, NodePayload, NodeRecord, NodeSerializer,
};
pub use logging::{init_default, init_with_config, instrument_export, TracingConfig};
