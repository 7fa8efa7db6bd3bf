//! `.geo` document assembly and file output

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lightshade_scene::{Clock, MeshEvaluator, NodeKind, SceneNode, SceneSource};
use tracing::{debug, info, warn};

use super::node::NodeSerializer;
use super::{GeoDocument, Meta};

/// `meta.created` format
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// `.geo` export options
#[derive(Debug, Clone)]
pub struct GeoExportOptions {
    /// Indent the document; numeric arrays stay on one line either way
    pub pretty: bool,
    /// Export selected EMPTY nodes alongside meshes
    pub include_empties: bool,
}

impl Default for GeoExportOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            include_empties: false,
        }
    }
}

/// `.geo` export errors
#[derive(Debug, thiserror::Error)]
pub enum GeoExportError {
    #[error("Nothing selected to export")]
    EmptySelection,

    #[error("Invalid mesh data: {message}")]
    InvalidMesh { message: String },

    #[error("Scene error: {0}")]
    Scene(#[from] lightshade_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<GeoExportError>,
    },
}

pub type GeoResult<T> = Result<T, GeoExportError>;

impl GeoExportError {
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        GeoExportError::InvalidMesh {
            message: message.into(),
        }
    }

    /// Wrap with a description of what was being exported
    pub fn with_context(self, context: impl Into<String>) -> Self {
        GeoExportError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, past any context layers
    pub fn root(&self) -> &GeoExportError {
        match self {
            GeoExportError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Builds `.geo` documents from the host selection
pub struct GeoExporter {
    options: GeoExportOptions,
}

impl GeoExporter {
    /// Create a new exporter with default options
    pub fn new() -> Self {
        Self {
            options: GeoExportOptions::default(),
        }
    }

    /// Create exporter with custom options
    pub fn with_options(options: GeoExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeoExportOptions {
        &self.options
    }

    /// Build the document for the scene's current selection.
    ///
    /// Fails with [`GeoExportError::EmptySelection`] when nothing is
    /// selected. Every working mesh is released before this returns,
    /// whether or not it succeeds.
    pub fn export<S, E, C>(&self, scene: &S, evaluator: &E, clock: &C) -> GeoResult<GeoDocument>
    where
        S: SceneSource + ?Sized,
        E: MeshEvaluator + ?Sized,
        C: Clock + ?Sized,
    {
        let (geometry, armatures) = self.partition(scene)?;
        info!(
            nodes = geometry.len(),
            armatures = armatures.len(),
            "Exporting selection"
        );
        if !armatures.is_empty() {
            warn!(?armatures, "Armature export is not supported; writing an empty armature map");
        }

        let serializer = NodeSerializer::new(scene, evaluator);
        let mut records = Vec::with_capacity(geometry.len());
        for (count, node) in geometry.iter().enumerate() {
            let record = serializer
                .serialize(node)
                .map_err(|e| e.with_context(format!("exporting {}", node.name)))?;
            info!(
                node = %node.name,
                kind = %node.kind,
                "Exported node {} of {}",
                count + 1,
                geometry.len()
            );
            records.push(record);
        }

        Ok(GeoDocument {
            meta: Meta {
                filename: scene.source_filename().to_string(),
                created: clock.now().format(TIMESTAMP_FORMAT).to_string(),
            },
            geometry: records,
            armatures,
        })
    }

    /// Split the selection into exported nodes and armature names,
    /// preserving selection order.
    fn partition<'s, S>(&self, scene: &'s S) -> GeoResult<(Vec<&'s SceneNode>, Vec<String>)>
    where
        S: SceneSource + ?Sized,
    {
        let selection = scene.selection();
        if selection.is_empty() {
            return Err(GeoExportError::EmptySelection);
        }

        let mut geometry = Vec::new();
        let mut armatures = Vec::new();
        for &id in selection {
            let node = scene.require_node(id)?;
            match node.kind {
                NodeKind::Mesh => geometry.push(node),
                NodeKind::Empty if self.options.include_empties => geometry.push(node),
                NodeKind::Armature => armatures.push(node.name.clone()),
                _ => debug!(node = %node.name, kind = %node.kind, "Skipping selected node"),
            }
        }
        Ok((geometry, armatures))
    }

    /// Render a document as text
    pub fn to_string(&self, doc: &GeoDocument) -> GeoResult<String> {
        let text = if self.options.pretty {
            serde_json::to_string_pretty(doc)?
        } else {
            serde_json::to_string(doc)?
        };
        Ok(text)
    }

    /// Write a document to `output_path`
    pub fn write_document(&self, doc: &GeoDocument, output_path: impl AsRef<Path>) -> GeoResult<()> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);

        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, doc)?;
        } else {
            serde_json::to_writer(&mut writer, doc)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Export the selection and write it to `output_path`.
    ///
    /// The document is built in full before the file is created, so a
    /// failed export leaves no file behind.
    pub fn export_to_file<S, E, C>(
        &self,
        scene: &S,
        evaluator: &E,
        clock: &C,
        output_path: impl AsRef<Path>,
    ) -> GeoResult<GeoDocument>
    where
        S: SceneSource + ?Sized,
        E: MeshEvaluator + ?Sized,
        C: Clock + ?Sized,
    {
        let output_path = output_path.as_ref();
        let doc = self.export(scene, evaluator, clock)?;
        self.write_document(&doc, output_path)?;
        info!(path = %output_path.display(), nodes = doc.geometry.len(), "Wrote document");
        Ok(doc)
    }
}

impl Default for GeoExporter {
    fn default() -> Self {
        Self::new()
    }
}
