//! lightshade CLI
//!
//! Command-line front end for `.geo` export from scene dumps.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use lightshade_export::geo::GEO_EXTENSION;
use lightshade_export::{
    init_with_config, instrument_export, GeoExportError, GeoExportOptions, GeoExporter,
    MeshStats, NodeSerializer, TracingConfig,
};
use lightshade_scene::{MemoryScene, NodeKind, SceneSource, SystemClock};

/// lightshade - welded `.geo` geometry export for WebGL renderers
#[derive(Parser)]
#[command(name = "lightshade")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for structured data
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export the selection of a scene dump to a .geo file
    Export(ExportArgs),

    /// Show the selection and per-mesh weld statistics
    Info(InfoArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the JSON scene dump
    #[arg(short, long)]
    scene: PathBuf,

    /// Output file (".geo" is appended when no extension is given)
    #[arg(short, long)]
    output: PathBuf,

    /// Write compact JSON instead of indented
    #[arg(long)]
    compact: bool,

    /// Also export selected EMPTY nodes
    #[arg(long)]
    include_empties: bool,

    /// Select nodes by name, replacing the dump's selection (can be repeated)
    #[arg(long)]
    select: Vec<String>,
}

#[derive(Args)]
struct InfoArgs {
    /// Path to the JSON scene dump
    #[arg(short, long)]
    scene: PathBuf,

    /// Select nodes by name, replacing the dump's selection (can be repeated)
    #[arg(long)]
    select: Vec<String>,
}

fn setup_logging(verbosity: u8) {
    init_with_config(TracingConfig::from_verbosity(verbosity));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args),
        Commands::Info(args) => cmd_info(args, cli.format),
    }
}

fn load_scene(path: &Path, select: &[String]) -> Result<MemoryScene> {
    let mut scene = MemoryScene::open(path)
        .with_context(|| format!("Failed to load scene dump {:?}", path))?;
    if !select.is_empty() {
        scene
            .select(select)
            .context("Failed to apply --select")?;
        debug!(selection = ?select, "Selection overridden");
    }
    Ok(scene)
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    let scene = load_scene(&args.scene, &args.select)?;

    let mut output = args.output;
    if output.extension().is_none() {
        output.set_extension(GEO_EXTENSION);
    }

    let exporter = GeoExporter::with_options(GeoExportOptions {
        pretty: !args.compact,
        include_empties: args.include_empties,
    });

    let result = instrument_export("geo", || {
        exporter.export_to_file(&scene, &scene, &SystemClock, &output)
    });
    let doc = match result {
        Ok(doc) => doc,
        Err(GeoExportError::EmptySelection) => {
            bail!("Nothing selected: set a selection in the scene dump or pass --select")
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to export {:?}", output)),
    };

    info!(path = %output.display(), "Export complete");
    println!("Exported {} node(s) to {:?}", doc.geometry.len(), output);
    if !doc.armatures.is_empty() {
        println!("  Skipped armature(s): {}", doc.armatures.join(", "));
    }
    Ok(())
}

/// One selected node as reported by `info`
struct SelectedNode {
    name: String,
    kind: String,
    mesh: Option<MeshStats>,
}

fn cmd_info(args: InfoArgs, format: OutputFormat) -> Result<()> {
    let scene = load_scene(&args.scene, &args.select)?;
    let serializer = NodeSerializer::new(&scene, &scene);

    let mut selected = Vec::new();
    for &id in scene.selection() {
        let node = scene.require_node(id)?;
        let mesh = match node.kind {
            NodeKind::Mesh => Some(
                serializer
                    .inspect(node)
                    .with_context(|| format!("Failed to inspect {}", node.name))?,
            ),
            _ => None,
        };
        selected.push(SelectedNode {
            name: node.name.clone(),
            kind: node.kind.to_string(),
            mesh,
        });
    }

    match format {
        OutputFormat::Json => {
            let nodes: Vec<_> = selected
                .iter()
                .map(|n| {
                    serde_json::json!({
                        "name": n.name,
                        "type": n.kind,
                        "mesh": n.mesh,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "filename": scene.source_filename(),
                "nodes": scene.nodes().len(),
                "selection": nodes,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Scene: {:?}", args.scene);
            println!("  Source file: {}", scene.source_filename());
            println!("  Nodes:       {}", scene.nodes().len());
            println!("Selection ({}):", selected.len());
            for node in &selected {
                println!("  {} [{}]", node.name, node.kind);
                if let Some(stats) = &node.mesh {
                    println!("    Corners:    {}", stats.corners);
                    println!("    Triangles:  {}", stats.triangles);
                    println!("    Slots:      {} ({} split)", stats.slots, stats.splits);
                    println!("    Colors:     {}", if stats.has_color { "yes" } else { "no" });
                    if !stats.collision_children.is_empty() {
                        println!("    Collision:  {}", stats.collision_children.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}
