//! Mesh-level encode/decode
//!
//! Turns a host mesh snapshot plus per-frame vertex snapshots into the two
//! stream buffers, and the two buffers back into topology, material tags and
//! lazily decoded frames. Everything the codec needs is passed in explicitly.

use glam::Vec3;
use hashbrown::HashSet;

use crate::error::FormatError;
use crate::formats::{
    AnimationStream, DataStream, PolygonRecord, encode_animation_stream, encode_data_stream,
};
use crate::material::{MaterialLibrary, MaterialTag, resolve_material, tag_from_name};
use crate::packing::{FormatVariant, unpack_uv};

/// Fallback texture name when a material has no image
const DEFAULT_TEXTURE_NAME: &str = "Texture";

// ============================================================================
// Host Model
// ============================================================================

/// Host material slot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostMaterial {
    /// Material name, parsed for slot and tags
    pub name: String,
    /// Image used by the material, if any
    pub texture: Option<String>,
}

impl HostMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: None,
        }
    }
}

/// Source-winding triangle of a host mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triangle {
    pub vertices: [usize; 3],
    /// Index into [`MeshSnapshot::materials`]
    pub material: usize,
}

/// Triangulated host mesh at the moment of export
#[derive(Debug, Clone, Default)]
pub struct MeshSnapshot {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
    /// Per-triangle corner UVs, parallel to `triangles`; `None` without a UV layer
    pub uv_layer: Option<Vec<[[f32; 2]; 3]>>,
    pub materials: Vec<HostMaterial>,
}

// ============================================================================
// Export
// ============================================================================

/// Texture slot used by the model, for the build script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub slot: u8,
    pub name: String,
}

/// Encoded data stream plus side information for the build script
#[derive(Debug, Clone)]
pub struct EncodedData {
    pub bytes: Vec<u8>,
    /// One entry per distinct texture slot, first material wins
    pub textures: Vec<TextureEntry>,
    /// The mesh had no UV layer; records carry zero UVs
    pub no_texture: bool,
}

/// Encode the data stream for a mesh snapshot
pub fn encode_data(mesh: &MeshSnapshot) -> Result<EncodedData, FormatError> {
    let vertex_count = mesh.positions.len();
    if vertex_count > u16::MAX as usize {
        return Err(FormatError::TooManyVertices(vertex_count));
    }

    let mut material_tags: Vec<MaterialTag> = mesh
        .materials
        .iter()
        .enumerate()
        .map(|(index, material)| tag_from_name(&material.name, index))
        .collect();

    let mut textures: Vec<TextureEntry> = Vec::new();
    for (tag, material) in material_tags.iter().zip(&mesh.materials) {
        if textures.iter().all(|t| t.slot != tag.texture_slot) {
            textures.push(TextureEntry {
                slot: tag.texture_slot,
                name: material
                    .texture
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TEXTURE_NAME.to_string()),
            });
        }
    }

    if material_tags.is_empty() {
        material_tags.push(MaterialTag::default());
    }

    let no_texture = mesh.uv_layer.is_none();
    if no_texture {
        tracing::warn!("Mesh has no UV layer, writing zero UVs");
    }

    let mut records = Vec::with_capacity(mesh.triangles.len());
    for (polygon, triangle) in mesh.triangles.iter().enumerate() {
        let mut vertices = [0u16; 3];
        for (slot, &index) in vertices.iter_mut().zip(&triangle.vertices) {
            if index >= vertex_count {
                return Err(FormatError::IndexOutOfRange {
                    polygon,
                    index,
                    vertex_count,
                });
            }
            *slot = index as u16;
        }

        let material = material_tags
            .get(triangle.material)
            .copied()
            .unwrap_or(material_tags[0]);
        let uvs = mesh
            .uv_layer
            .as_ref()
            .map(|layer| layer.get(polygon).copied().unwrap_or_default());

        records.push(PolygonRecord::from_triangle(vertices, uvs, material));
    }

    let bytes = encode_data_stream(&records, vertex_count)?;
    Ok(EncodedData {
        bytes,
        textures,
        no_texture,
    })
}

/// Named, contiguous frame range within one animation stream
///
/// Bookkeeping for the build script only; never written to the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub name: String,
    pub start_frame: usize,
    pub frame_count: usize,
}

/// Frames of one named clip
#[derive(Debug, Clone, Default)]
pub struct ClipSource {
    pub name: String,
    pub frames: Vec<Vec<Vec3>>,
}

/// Where animation frames come from
#[derive(Debug, Clone)]
pub enum AnimationSource {
    /// One unnamed frame range, no clip metadata
    Scene(Vec<Vec<Vec3>>),
    /// Named clips, concatenated in order
    Clips(Vec<ClipSource>),
}

/// Encoded animation stream plus clip metadata
#[derive(Debug, Clone)]
pub struct EncodedAnimation {
    pub bytes: Vec<u8>,
    pub frame_count: usize,
    /// `None` for scene sources
    pub clips: Option<Vec<Clip>>,
}

/// Encode the animation stream for a frame source
///
/// Empty clips are skipped. Fails without output if any frame's vertex count
/// differs from the first frame's.
pub fn encode_animation(
    source: &AnimationSource,
    variant: FormatVariant,
    scale: f32,
) -> Result<EncodedAnimation, FormatError> {
    let (frames, clips): (Vec<&Vec<Vec3>>, Option<Vec<Clip>>) = match source {
        AnimationSource::Scene(frames) => (frames.iter().collect(), None),
        AnimationSource::Clips(sources) => {
            let mut frames = Vec::new();
            let mut clips = Vec::new();
            for source in sources {
                if source.frames.is_empty() {
                    tracing::info!("No frames in {}, skipping", source.name);
                    continue;
                }
                clips.push(Clip {
                    name: source.name.clone(),
                    start_frame: frames.len(),
                    frame_count: source.frames.len(),
                });
                frames.extend(source.frames.iter());
            }
            (frames, Some(clips))
        }
    };

    let bytes = encode_animation_stream(&frames, variant, scale)?;
    Ok(EncodedAnimation {
        bytes,
        frame_count: frames.len(),
        clips,
    })
}

impl AnimationSource {
    /// All frames in stream order
    pub fn frames(&self) -> Box<dyn Iterator<Item = &Vec<Vec3>> + '_> {
        match self {
            AnimationSource::Scene(frames) => Box::new(frames.iter()),
            AnimationSource::Clips(sources) => {
                Box::new(sources.iter().flat_map(|source| source.frames.iter()))
            }
        }
    }
}

/// Both streams of one model
#[derive(Debug, Clone)]
pub struct EncodedModel {
    pub data: EncodedData,
    pub animation: EncodedAnimation,
}

/// Encode a mesh together with its animation frames
///
/// Every frame must hold exactly the mesh's vertices; the data stream header
/// and the animation frame size are read against each other on import.
pub fn encode_model(
    mesh: &MeshSnapshot,
    source: &AnimationSource,
    variant: FormatVariant,
    scale: f32,
) -> Result<EncodedModel, FormatError> {
    let expected = mesh.positions.len();
    if let Some((frame, positions)) = source
        .frames()
        .enumerate()
        .find(|(_, positions)| positions.len() != expected)
    {
        return Err(FormatError::VertexCountChanged {
            frame,
            expected,
            actual: positions.len(),
        });
    }

    Ok(EncodedModel {
        data: encode_data(mesh)?,
        animation: encode_animation(source, variant, scale)?,
    })
}

// ============================================================================
// Import
// ============================================================================

/// Triangle recovered from a polygon record, in source winding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedTriangle {
    /// Record index in the data stream
    pub polygon: usize,
    pub vertices: [u16; 3],
    pub uvs: [[f32; 2]; 3],
    pub tag: MaterialTag,
}

/// Topology, material tags and animation view decoded from a stream pair
#[derive(Debug, Clone)]
pub struct DecodedModel<'a> {
    pub vertex_count: usize,
    pub triangles: Vec<DecodedTriangle>,
    /// Records that could not form a face (bad index, repeated vertex, duplicate face)
    pub skipped_polygons: Vec<usize>,
    pub animation: AnimationStream<'a>,
}

impl DecodedModel<'_> {
    /// Resolve one material per triangle, creating canonical materials as needed
    pub fn resolve_materials(
        &self,
        base_name: &str,
        target: &mut MaterialLibrary,
        registry: &mut MaterialLibrary,
    ) -> Vec<usize> {
        self.triangles
            .iter()
            .map(|triangle| resolve_material(&triangle.tag, base_name, target, registry))
            .collect()
    }
}

/// Decode a data stream and its animation stream
///
/// `variant` forces the per-vertex layout; `None` detects it. Records that
/// cannot form a face are skipped and reported, not treated as errors.
pub fn decode_model<'a>(
    data: &[u8],
    animation: &'a [u8],
    variant: Option<FormatVariant>,
) -> Result<DecodedModel<'a>, FormatError> {
    let stream = DataStream::parse(data)?;
    let vertex_count = stream.vertex_count();

    let animation = match variant {
        Some(variant) => AnimationStream::parse_with_variant(animation, vertex_count, variant)?,
        None => AnimationStream::parse(animation, vertex_count)?,
    };

    let mut triangles = Vec::with_capacity(stream.polygon_count());
    let mut skipped_polygons = Vec::new();
    let mut seen_faces: HashSet<[u16; 3]> = HashSet::new();

    for (polygon, record) in stream.polygons().enumerate() {
        let (vertices, uvs) = record.source_winding();

        let [a, b, c] = vertices;
        let reason = if vertices.iter().any(|&v| v as usize >= vertex_count) {
            Some("references a missing vertex")
        } else if a == b || b == c || a == c {
            Some("repeats a vertex")
        } else {
            let mut key = vertices;
            key.sort_unstable();
            (!seen_faces.insert(key)).then_some("duplicates an existing face")
        };

        if let Some(reason) = reason {
            tracing::warn!("Polygon {} {}, skipping", polygon + 1, reason);
            skipped_polygons.push(polygon);
            continue;
        }

        triangles.push(DecodedTriangle {
            polygon,
            vertices,
            uvs: uvs.map(unpack_uv),
            tag: record.material_tag(),
        });
    }

    Ok(DecodedModel {
        vertex_count,
        triangles,
        skipped_polygons,
        animation,
    })
}
