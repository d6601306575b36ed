//! Stream pair inspection

use anyhow::{Context, Result};
use hashbrown::HashMap;
use std::fmt;
use std::path::Path;
use u3d_common::{
    AnimationStreamHeader, DataStream, FormatVariant, MaterialTag, name_from_tag,
};

use crate::paths::stream_pair;

/// Summary of a stream pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub model_name: String,
    pub polygon_count: usize,
    pub vertex_count: usize,
    /// `None` when the animation stream is missing
    pub animation: Option<AnimationInfo>,
    /// Material tags with their polygon counts, by slot then tag byte
    pub tags: Vec<(MaterialTag, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationInfo {
    pub frame_count: usize,
    pub frame_byte_size: usize,
    /// `None` when the frame size matches neither layout
    pub variant: Option<FormatVariant>,
}

/// Read the headers and tag histogram of a stream pair
pub fn inspect(input: &Path) -> Result<ModelInfo> {
    let pair = stream_pair(input);
    let data = std::fs::read(&pair.data)
        .with_context(|| format!("Failed to read data stream: {:?}", pair.data))?;
    let stream = DataStream::parse(&data)
        .with_context(|| format!("Invalid data stream: {:?}", pair.data))?;

    let mut histogram: HashMap<MaterialTag, usize> = HashMap::new();
    for record in stream.polygons() {
        *histogram.entry(record.material_tag()).or_default() += 1;
    }
    let mut tags: Vec<_> = histogram.into_iter().collect();
    tags.sort_by_key(|(tag, _)| (tag.texture_slot, tag.encode()));

    let animation = match std::fs::read(&pair.animation) {
        Ok(bytes) => {
            let header = AnimationStreamHeader::from_bytes(&bytes).with_context(|| {
                format!("Invalid animation stream: {:?}", pair.animation)
            })?;
            Some(AnimationInfo {
                frame_count: header.frame_count as usize,
                frame_byte_size: header.frame_byte_size as usize,
                variant: header.detect_variant(stream.vertex_count()),
            })
        }
        Err(err) => {
            tracing::warn!("No animation stream {:?}: {}", pair.animation, err);
            None
        }
    };

    Ok(ModelInfo {
        model_name: pair.model_name,
        polygon_count: stream.polygon_count(),
        vertex_count: stream.vertex_count(),
        animation,
        tags,
    })
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.model_name)?;
        writeln!(f, "  Polygons: {}", self.polygon_count)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        match &self.animation {
            Some(anim) => {
                writeln!(f, "  Frames: {}", anim.frame_count)?;
                writeln!(f, "  Frame size: {} bytes", anim.frame_byte_size)?;
                match anim.variant {
                    Some(variant) => writeln!(f, "  Format: {}", variant)?,
                    None => writeln!(f, "  Format: unknown")?,
                }
            }
            None => writeln!(f, "  Animation: missing")?,
        }
        writeln!(f, "  Materials:")?;
        for (tag, count) in &self.tags {
            writeln!(f, "    {:<32} {:>6} polygons", name_from_tag(tag, "*"), count)?;
        }
        Ok(())
    }
}
