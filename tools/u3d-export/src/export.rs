//! Mesh export (OBJ -> `_d.3d` / `_a.3d` / `.uc`)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use u3d_common::{AnimationSource, Clip, FormatVariant, MeshSnapshot, U3D_FORMAT, encode_model};

use crate::obj::{read_obj, read_obj_positions};
use crate::paths::{FolderLayout, animation_path, data_path};
use crate::script::{LodSettings, ScriptInput, render_script};

/// Export settings shared by the CLI and manifest builds
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub variant: FormatVariant,
    /// Multiplier applied to positions before quantization
    pub scale: f32,
    pub frame_rate: f32,
    pub folders: FolderLayout,
    /// Emit the `.uc` build script
    pub script: bool,
    pub lod: Option<LodSettings>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            variant: FormatVariant::Standard,
            scale: 1.0,
            frame_rate: 30.0,
            folders: FolderLayout::default(),
            script: true,
            lod: Some(LodSettings::default()),
        }
    }
}

/// Files and counts produced by one export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub data_path: PathBuf,
    pub animation_path: PathBuf,
    pub script_path: Option<PathBuf>,
    pub polygon_count: usize,
    pub vertex_count: usize,
    pub frame_count: usize,
    pub clips: Option<Vec<Clip>>,
}

/// Encode a mesh and its animation and write the stream pair
///
/// `output_base` names the model, e.g. `out/Soldier.3d`. Both streams are
/// encoded before anything is written, so a failing frame leaves no files.
/// Every frame must have the mesh's vertex count.
pub fn export_model(
    name: &str,
    mesh: &MeshSnapshot,
    animation: &AnimationSource,
    output_base: &Path,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let encoded = encode_model(mesh, animation, options.variant, options.scale)
        .with_context(|| format!("Failed to encode model '{}'", name))?;
    let (data, anim) = (encoded.data, encoded.animation);

    if let Some(parent) = output_base.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let folders = &options.folders;
    let data_out = folders.place(&data_path(output_base), &folders.model_dir)?;
    let anim_out = folders.place(&animation_path(output_base), &folders.anim_dir)?;

    std::fs::write(&data_out, &data.bytes)
        .with_context(|| format!("Failed to write data stream: {:?}", data_out))?;
    tracing::info!("Wrote {:?} ({} bytes)", data_out, data.bytes.len());

    std::fs::write(&anim_out, &anim.bytes)
        .with_context(|| format!("Failed to write animation stream: {:?}", anim_out))?;
    tracing::info!(
        "Wrote {:?} ({} frames, {} variant)",
        anim_out,
        anim.frame_count,
        options.variant
    );

    let script_path = if options.script {
        let class_name = output_base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        let script = render_script(&ScriptInput {
            class_name,
            mesh_name: name,
            data_file: &file_name(&data_out),
            animation_file: &file_name(&anim_out),
            folders,
            variant: options.variant,
            lod: options.lod,
            no_texture: data.no_texture,
            frame_count: anim.frame_count,
            clips: anim.clips.as_deref(),
            textures: &data.textures,
            frame_rate: options.frame_rate,
        })?;

        let script_out = folders.place(
            &output_base.with_extension(U3D_FORMAT.script_ext),
            &folders.class_dir,
        )?;
        std::fs::write(&script_out, script)
            .with_context(|| format!("Failed to write build script: {:?}", script_out))?;
        tracing::info!("Wrote {:?}", script_out);
        Some(script_out)
    } else {
        None
    };

    Ok(ExportReport {
        data_path: data_out,
        animation_path: anim_out,
        script_path,
        polygon_count: mesh.triangles.len(),
        vertex_count: mesh.positions.len(),
        frame_count: anim.frame_count,
        clips: anim.clips,
    })
}

/// Export an OBJ file, optionally animated by a list of frame OBJs
///
/// Without frame files the base mesh is the single frame.
pub fn export_obj(
    input: &Path,
    frames: &[PathBuf],
    output_base: &Path,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let mesh = read_obj(input)?;
    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Mesh")
        .to_string();

    let frames = if frames.is_empty() {
        vec![mesh.positions.clone()]
    } else {
        frames
            .iter()
            .map(|path| read_obj_positions(path))
            .collect::<Result<Vec<_>>>()?
    };

    export_model(
        &name,
        &mesh,
        &AnimationSource::Scene(frames),
        output_base,
        options,
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or_default()
        .to_string()
}
