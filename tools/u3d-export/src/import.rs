//! Mesh import (`_d.3d` / `_a.3d` -> OBJ)

use anyhow::{Context, Result, bail};
use glam::Vec3;
use std::path::{Path, PathBuf};
use u3d_common::{AnimationStream, FormatVariant, MaterialLibrary, decode_model};

use crate::obj::{ObjDocument, ObjFace, write_mtl_file, write_obj_file};
use crate::paths::stream_pair;

/// Inclusive 1-based frame range; `end == 0` means the last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: usize,
    pub end: usize,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self { start: 1, end: 0 }
    }
}

impl FrameRange {
    /// 0-based half-open frame indices, clamped to `frame_count`
    pub fn resolve(&self, frame_count: usize) -> std::ops::Range<usize> {
        let end = if self.end == 0 || self.end > frame_count {
            frame_count
        } else {
            self.end
        };
        let start = self.start.saturating_sub(1).min(end);
        start..end
    }
}

/// Import settings
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Forced layout; `None` detects it from the header
    pub variant: Option<FormatVariant>,
    /// Multiplier applied to decoded positions
    pub scale: f32,
    /// 1-based frame used for the base mesh when no animation is imported
    pub base_frame: usize,
    /// Write one OBJ per frame in this range
    pub animation: Option<FrameRange>,
    /// Create canonical materials from the polygon tags
    pub materials: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            variant: None,
            scale: 1.0,
            base_frame: 1,
            animation: None,
            materials: true,
        }
    }
}

/// Outcome of one import
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub model_name: String,
    pub variant: FormatVariant,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub frame_count: usize,
    /// 0-based frame used for the base mesh
    pub base_frame: usize,
    /// Data stream records that did not become faces
    pub skipped_polygons: Vec<usize>,
    pub written: Vec<PathBuf>,
}

/// Import a stream pair into OBJ files under `output_dir`
///
/// `input` may name either stream or the bare base. `registry` holds the
/// materials created so far, so several imports share canonical materials.
pub fn import_model(
    input: &Path,
    output_dir: &Path,
    options: &ImportOptions,
    registry: &mut MaterialLibrary,
) -> Result<ImportReport> {
    let pair = stream_pair(input);
    let name = pair.model_name.as_str();

    tracing::info!("Opening data stream {:?}", pair.data);
    let data = std::fs::read(&pair.data)
        .with_context(|| format!("Failed to read data stream: {:?}", pair.data))?;
    tracing::info!("Opening animation stream {:?}", pair.animation);
    let anim = std::fs::read(&pair.animation)
        .with_context(|| format!("Failed to read animation stream: {:?}", pair.animation))?;

    let model = decode_model(&data, &anim, options.variant)
        .with_context(|| format!("Failed to decode model '{}'", name))?;
    let stream = model.animation;
    let frame_count = stream.frame_count();
    if frame_count == 0 {
        bail!("Animation stream of '{}' has no frames", name);
    }
    if options.variant.is_none() {
        tracing::info!("Animation format detected as {}", stream.variant());
    }

    let base_frame = match options.animation {
        Some(range) => range.start,
        None => options.base_frame,
    }
    .saturating_sub(1)
    .min(frame_count - 1);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let mut written = Vec::new();

    let mut target = MaterialLibrary::new();
    let material_indices = if options.materials {
        model.resolve_materials(name, &mut target, registry)
    } else {
        Vec::new()
    };

    let faces: Vec<ObjFace> = model
        .triangles
        .iter()
        .enumerate()
        .map(|(i, triangle)| ObjFace {
            vertices: triangle.vertices.map(usize::from),
            uvs: Some(triangle.uvs),
            material: material_indices.get(i).copied(),
        })
        .collect();

    let mtl_name = format!("{name}.mtl");
    if options.materials {
        let mtl_path = output_dir.join(&mtl_name);
        write_mtl_file(&mtl_path, target.names())?;
        written.push(mtl_path);
    }

    let positions = frame_positions(&stream, base_frame, options.scale)?;
    let obj_path = output_dir.join(format!("{name}.obj"));
    write_obj_file(
        &obj_path,
        &ObjDocument {
            name,
            mtllib: options.materials.then_some(mtl_name.as_str()),
            positions: &positions,
            faces: &faces,
            materials: target.names(),
        },
    )?;
    tracing::info!(
        "Wrote {:?} ({} vertices, {} triangles, frame {})",
        obj_path,
        model.vertex_count,
        faces.len(),
        base_frame + 1
    );
    written.push(obj_path);

    if let Some(range) = options.animation {
        if frame_count > 1 {
            let frames = range.resolve(frame_count);
            let frames_written = frames.len();
            if frames.is_empty() {
                tracing::warn!("Frame range {:?} selects no frames", range);
            }
            let bare_faces: Vec<ObjFace> = faces
                .iter()
                .map(|face| ObjFace {
                    uvs: None,
                    material: None,
                    ..*face
                })
                .collect();

            for frame in frames {
                let positions = frame_positions(&stream, frame, options.scale)?;
                let frame_name = format!("{name}_frame{:03}", frame + 1);
                let path = output_dir.join(format!("{frame_name}.obj"));
                write_obj_file(
                    &path,
                    &ObjDocument {
                        name: &frame_name,
                        mtllib: None,
                        positions: &positions,
                        faces: &bare_faces,
                        materials: &[],
                    },
                )?;
                written.push(path);
            }
            tracing::info!("Wrote {} animation frames", frames_written);
        } else {
            tracing::info!("Model '{}' has a single frame, no animation to import", name);
        }
    }

    Ok(ImportReport {
        model_name: name.to_string(),
        variant: stream.variant(),
        vertex_count: model.vertex_count,
        triangle_count: model.triangles.len(),
        frame_count,
        base_frame,
        skipped_polygons: model.skipped_polygons,
        written,
    })
}

fn frame_positions(stream: &AnimationStream, frame: usize, scale: f32) -> Result<Vec<Vec3>> {
    let frame = stream.frame(frame)?;
    Ok(frame.positions.into_iter().map(|p| p * scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportOptions, export_model};
    use crate::obj::{parse_obj, read_obj};
    use u3d_common::AnimationSource;

    const QUAD_OBJ: &str = "\
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl 002_TRANSLUCENT_Quad
f 1/1 2/2 3/3 4/4
";

    fn export_quad(dir: &Path, frames: usize) -> PathBuf {
        let mesh = parse_obj(QUAD_OBJ).unwrap().mesh;
        let source = AnimationSource::Scene(
            (0..frames)
                .map(|f| mesh.positions.iter().map(|p| *p * (f + 1) as f32).collect())
                .collect(),
        );
        let options = ExportOptions {
            script: false,
            ..Default::default()
        };
        export_model("Quad", &mesh, &source, &dir.join("Quad.3d"), &options)
            .unwrap()
            .data_path
    }

    #[test]
    fn test_frame_range_resolve() {
        assert_eq!(FrameRange::default().resolve(5), 0..5);
        assert_eq!(FrameRange { start: 2, end: 3 }.resolve(5), 1..3);
        assert_eq!(FrameRange { start: 2, end: 99 }.resolve(5), 1..5);
        assert_eq!(FrameRange { start: 9, end: 0 }.resolve(5), 5..5);
    }

    #[test]
    fn test_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = export_quad(dir.path(), 1);
        let out = dir.path().join("imported");

        let mut registry = MaterialLibrary::new();
        let report =
            import_model(&data_path, &out, &ImportOptions::default(), &mut registry).unwrap();
        assert_eq!(report.model_name, "Quad");
        assert_eq!(report.variant, FormatVariant::Standard);
        assert_eq!(report.triangle_count, 2);
        assert!(report.skipped_polygons.is_empty());
        assert_eq!(registry.names(), ["002_TRANSLUCENT_Quad"]);

        let mesh = read_obj(&out.join("Quad.obj")).unwrap();
        assert_eq!(mesh.positions[2], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.triangles[0].vertices, [0, 1, 2]);
        assert_eq!(mesh.triangles[1].vertices, [0, 2, 3]);
        assert_eq!(mesh.materials[0].name, "002_TRANSLUCENT_Quad");
        assert!(mesh.uv_layer.is_some());
    }

    #[test]
    fn test_import_animation_frames() {
        let dir = tempfile::tempdir().unwrap();
        export_quad(dir.path(), 4);
        let out = dir.path().join("imported");

        let options = ImportOptions {
            scale: 0.5,
            animation: Some(FrameRange { start: 2, end: 3 }),
            materials: false,
            ..Default::default()
        };
        let report = import_model(
            &dir.path().join("Quad.3d"),
            &out,
            &options,
            &mut MaterialLibrary::new(),
        )
        .unwrap();

        assert_eq!(report.frame_count, 4);
        assert_eq!(report.base_frame, 1);
        assert_eq!(report.written.len(), 3);
        assert!(!out.join("Quad.mtl").exists());

        // Frame 3 is the quad scaled by 3, then by the import scale
        let frame = read_obj(&out.join("Quad_frame003.obj")).unwrap();
        assert_eq!(frame.positions[2], Vec3::new(1.5, 1.5, 0.0));
    }

    #[test]
    fn test_base_frame_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        export_quad(dir.path(), 2);
        let options = ImportOptions {
            base_frame: 10,
            materials: false,
            ..Default::default()
        };
        let report = import_model(
            &dir.path().join("Quad_a.3d"),
            &dir.path().join("out"),
            &options,
            &mut MaterialLibrary::new(),
        )
        .unwrap();
        assert_eq!(report.base_frame, 1);
    }

    #[test]
    fn test_import_missing_stream() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_model(
            &dir.path().join("Nothing_d.3d"),
            dir.path(),
            &ImportOptions::default(),
            &mut MaterialLibrary::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read data stream"));
    }
}
