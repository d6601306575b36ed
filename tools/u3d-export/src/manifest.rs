//! Manifest parsing and build orchestration
//!
//! Parses u3d.toml and drives one model export. Relative paths are resolved
//! against the manifest's directory.
//!
//! ```toml
//! [model]
//! name = "Soldier"
//! mesh = "soldier.obj"
//! variant = "standard"
//!
//! [output]
//! dir = "build"
//! use_folders = true
//!
//! [[clips]]
//! name = "Walk"
//! frames = ["walk_01.obj", "walk_02.obj"]
//! ```

use anyhow::{Context, Result, bail};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use u3d_common::{AnimationSource, ClipSource, FormatVariant, U3D_FORMAT};

use crate::export::{ExportOptions, ExportReport, export_model};
use crate::obj::{read_obj, read_obj_positions};
use crate::paths::FolderLayout;
use crate::script::LodSettings;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub model: ModelSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub clips: Vec<ClipEntry>,
    #[serde(default)]
    pub scene: Option<SceneSection>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct ModelSection {
    pub name: String,
    /// Base mesh OBJ
    pub mesh: PathBuf,
    /// `standard` or `extended`
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

fn default_scale() -> f32 {
    1.0
}

fn default_frame_rate() -> f32 {
    30.0
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub use_folders: bool,
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    #[serde(default = "default_model_dir")]
    pub anim_dir: String,
    #[serde(default = "default_class_dir")]
    pub class_dir: String,
    #[serde(default = "default_texture_dir")]
    pub texture_dir: String,
    /// Emit the `.uc` build script
    #[serde(default = "default_true")]
    pub script: bool,
    #[serde(default = "default_true")]
    pub lod: bool,
    #[serde(default = "default_lod_style")]
    pub lod_style: u32,
    #[serde(default)]
    pub lod_frame: u32,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            use_folders: false,
            model_dir: default_model_dir(),
            anim_dir: default_model_dir(),
            class_dir: default_class_dir(),
            texture_dir: default_texture_dir(),
            script: true,
            lod: true,
            lod_style: default_lod_style(),
            lod_frame: 0,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_model_dir() -> String {
    "Models".to_string()
}

fn default_class_dir() -> String {
    "Classes".to_string()
}

fn default_texture_dir() -> String {
    "Textures".to_string()
}

fn default_true() -> bool {
    true
}

fn default_lod_style() -> u32 {
    10
}

/// Named clip, one OBJ per frame
#[derive(Debug, Deserialize)]
pub struct ClipEntry {
    pub name: String,
    pub frames: Vec<PathBuf>,
}

/// Unnamed frame list
#[derive(Debug, Deserialize)]
pub struct SceneSection {
    pub frames: Vec<PathBuf>,
}

impl Manifest {
    /// Resolve a manifest path against the manifest directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn variant(&self) -> Result<FormatVariant> {
        match &self.model.variant {
            Some(name) => name.parse().map_err(anyhow::Error::msg),
            None => Ok(FormatVariant::default()),
        }
    }

    pub fn export_options(&self) -> Result<ExportOptions> {
        let output = &self.output;
        Ok(ExportOptions {
            variant: self.variant()?,
            scale: self.model.scale,
            frame_rate: self.model.frame_rate,
            folders: FolderLayout {
                use_folders: output.use_folders,
                model_dir: output.model_dir.clone(),
                anim_dir: output.anim_dir.clone(),
                class_dir: output.class_dir.clone(),
                texture_dir: output.texture_dir.clone(),
            },
            script: output.script,
            lod: output.lod.then_some(LodSettings {
                style: output.lod_style,
                frame: output.lod_frame,
            }),
        })
    }

    fn frame_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.clips
            .iter()
            .flat_map(|clip| &clip.frames)
            .chain(self.scene.iter().flat_map(|scene| &scene.frames))
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    manifest.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    let model = &manifest.model;
    if model.name.is_empty() {
        bail!("Model name is empty");
    }
    if model.scale.is_nan() || model.scale <= 0.0 {
        bail!("Scale must be positive, got {}", model.scale);
    }
    if model.frame_rate.is_nan() || model.frame_rate <= 0.0 {
        bail!("Frame rate must be positive, got {}", model.frame_rate);
    }
    manifest.variant()?;

    let mesh = manifest.resolve(&model.mesh);
    if !mesh.exists() {
        bail!("Mesh source not found: {:?}", mesh);
    }

    if !manifest.clips.is_empty() && manifest.scene.is_some() {
        bail!("Use either [[clips]] or [scene], not both");
    }

    let mut names = HashSet::new();
    for clip in &manifest.clips {
        if clip.name.is_empty() {
            bail!("Clip name is empty");
        }
        if !names.insert(clip.name.as_str()) {
            bail!("Duplicate clip name '{}'", clip.name);
        }
    }

    for frame in manifest.frame_files() {
        let path = manifest.resolve(frame);
        if !path.exists() {
            bail!("Frame source not found: {:?}", path);
        }
    }
    Ok(())
}

fn read_frames(manifest: &Manifest, files: &[PathBuf]) -> Result<Vec<Vec<glam::Vec3>>> {
    files
        .iter()
        .map(|file| read_obj_positions(&manifest.resolve(file)))
        .collect()
}

/// Build the model described by a manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<ExportReport> {
    validate(manifest)?;

    let mesh = read_obj(&manifest.resolve(&manifest.model.mesh))?;

    let source = if !manifest.clips.is_empty() {
        let clips = manifest
            .clips
            .iter()
            .map(|clip| {
                tracing::debug!("Reading clip {} ({} frames)", clip.name, clip.frames.len());
                Ok(ClipSource {
                    name: clip.name.clone(),
                    frames: read_frames(manifest, &clip.frames)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        AnimationSource::Clips(clips)
    } else if let Some(scene) = &manifest.scene {
        AnimationSource::Scene(read_frames(manifest, &scene.frames)?)
    } else {
        AnimationSource::Scene(vec![mesh.positions.clone()])
    };

    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.resolve(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let output_base = output_dir.join(format!("{}.{}", manifest.model.name, U3D_FORMAT.extension));
    tracing::info!("Exporting model: {} -> {:?}", manifest.model.name, output_base);
    export_model(
        &manifest.model.name,
        &mesh,
        &source,
        &output_base,
        &manifest.export_options()?,
    )
}
