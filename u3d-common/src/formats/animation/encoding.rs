//! Animation stream encoding

use glam::Vec3;

use super::AnimationStreamHeader;
use crate::error::FormatError;
use crate::packing::{FormatVariant, write_position};

/// Encode frames of source positions into a complete animation stream
///
/// Every frame must have as many vertices as the first one. The check runs
/// over all frames before anything is written, so a mismatch never yields a
/// partial stream.
pub fn encode_animation_stream<F: AsRef<[Vec3]>>(
    frames: &[F],
    variant: FormatVariant,
    scale: f32,
) -> Result<Vec<u8>, FormatError> {
    let vertex_count = frames
        .first()
        .map(|frame| frame.as_ref().len())
        .ok_or(FormatError::EmptyAnimation)?;
    if vertex_count == 0 {
        return Err(FormatError::EmptyAnimation);
    }

    for (frame, positions) in frames.iter().enumerate() {
        let actual = positions.as_ref().len();
        if actual != vertex_count {
            return Err(FormatError::VertexCountChanged {
                frame,
                expected: vertex_count,
                actual,
            });
        }
    }

    let frame_count =
        u16::try_from(frames.len()).map_err(|_| FormatError::TooManyFrames(frames.len()))?;
    let per_vertex = variant.vertex_size();
    let frame_byte_size = u16::try_from(vertex_count * per_vertex).map_err(|_| {
        FormatError::FrameTooLarge {
            vertex_count,
            per_vertex,
        }
    })?;

    let header = AnimationStreamHeader::new(frame_count, frame_byte_size);
    let mut out = Vec::with_capacity(header.file_size());
    out.extend_from_slice(&header.to_bytes());

    for positions in frames {
        for &pos in positions.as_ref() {
            write_position(&mut out, pos, scale, variant);
        }
    }

    tracing::debug!(
        "Encoded animation stream: {} frames x {} vertices ({}), {} bytes",
        frame_count,
        vertex_count,
        variant,
        out.len()
    );
    Ok(out)
}
