//! u3d-export - Unreal vertex mesh tool
//!
//! Converts OBJ meshes to `_d.3d` / `_a.3d` stream pairs with a `.uc` build
//! script, and stream pairs back to OBJ.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use u3d_common::{FormatVariant, MaterialLibrary, U3D_FORMAT};

use u3d_export::{
    ExportOptions, FolderLayout, FrameRange, ImportOptions, LodSettings, export_obj, import_model,
    inspect, manifest,
};

#[derive(Parser)]
#[command(name = "u3d-export")]
#[command(about = "Unreal vertex mesh export tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a model from a manifest file
    Build {
        /// Path to u3d.toml manifest
        #[arg(default_value = "u3d.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to u3d.toml manifest
        #[arg(default_value = "u3d.toml")]
        manifest: PathBuf,
    },

    /// Export a single OBJ mesh
    Export {
        /// Input OBJ file (base mesh)
        input: PathBuf,

        /// Output base path, e.g. out/Soldier.3d
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frame OBJ files, in order (default: the base mesh)
        #[arg(short, long = "frame")]
        frames: Vec<PathBuf>,

        /// Vertex layout: standard or extended
        #[arg(long, default_value = "standard")]
        variant: FormatVariant,

        /// Position scale applied before quantization
        #[arg(short, long, default_value_t = 1.0)]
        scale: f32,

        /// Sequence rate written to the build script
        #[arg(long, default_value_t = 30.0)]
        frame_rate: f32,

        /// Place streams and script in Models/ and Classes/
        #[arg(long)]
        use_folders: bool,

        /// Skip the .uc build script
        #[arg(long)]
        no_script: bool,

        /// Write MLOD=False instead of LOD settings
        #[arg(long)]
        no_lod: bool,
    },

    /// Import a stream pair to OBJ
    Import {
        /// Data stream, animation stream or base path (one or more models)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Vertex layout: auto, standard or extended
        #[arg(long, default_value = "auto")]
        variant: String,

        /// Multiplier applied to decoded positions
        #[arg(short, long, default_value_t = 1.0)]
        scale: f32,

        /// Frame used for the base mesh (1-based)
        #[arg(long, default_value_t = 1)]
        frame: usize,

        /// Also write one OBJ per frame
        #[arg(short, long)]
        animation: bool,

        /// First animation frame (1-based)
        #[arg(long, default_value_t = 1)]
        start: usize,

        /// Last animation frame (0 = last)
        #[arg(long, default_value_t = 0)]
        end: usize,

        /// Do not create materials from polygon tags
        #[arg(long)]
        no_materials: bool,
    },

    /// Print stream headers and material tags
    Info {
        /// Data stream, animation stream or base path
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building model from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Export {
            input,
            output,
            frames,
            variant,
            scale,
            frame_rate,
            use_folders,
            no_script,
            no_lod,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(U3D_FORMAT.extension));
            tracing::info!("Converting {:?} -> {:?}", input, output);

            let options = ExportOptions {
                variant,
                scale,
                frame_rate,
                folders: FolderLayout {
                    use_folders,
                    ..Default::default()
                },
                script: !no_script,
                lod: (!no_lod).then(LodSettings::default),
            };
            let report = export_obj(&input, &frames, &output, &options)?;
            tracing::info!(
                "Done! {} polygons, {} vertices, {} frames",
                report.polygon_count,
                report.vertex_count,
                report.frame_count
            );
        }

        Commands::Import {
            inputs,
            output,
            variant,
            scale,
            frame,
            animation,
            start,
            end,
            no_materials,
        } => {
            let variant = match variant.as_str() {
                "auto" => None,
                other => Some(other.parse::<FormatVariant>().map_err(anyhow::Error::msg)?),
            };
            let options = ImportOptions {
                variant,
                scale,
                base_frame: frame,
                animation: animation.then_some(FrameRange { start, end }),
                materials: !no_materials,
            };

            let mut registry = MaterialLibrary::new();
            for input in &inputs {
                let report = import_model(input, &output, &options, &mut registry)?;
                if !report.skipped_polygons.is_empty() {
                    tracing::warn!(
                        "{}: skipped {} polygons",
                        report.model_name,
                        report.skipped_polygons.len()
                    );
                }
                tracing::info!(
                    "Imported {} ({} triangles, {} frames)",
                    report.model_name,
                    report.triangle_count,
                    report.frame_count
                );
            }
        }

        Commands::Info { input } => {
            let info = inspect(&input)?;
            print!("{}", info);
        }
    }

    Ok(())
}
