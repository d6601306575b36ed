//! Codec error type

/// Errors raised while encoding or decoding `_d.3d` / `_a.3d` streams
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Buffer is shorter than its header declares
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// frameByteSize / vertexCount is neither 4 nor 8
    #[error(
        "cannot determine animation format: frame size {frame_byte_size} for {vertex_count} vertices"
    )]
    UnknownVariant {
        frame_byte_size: usize,
        vertex_count: usize,
    },

    /// A forced variant does not fit in the declared frame size
    #[error("frame size {frame_byte_size} is smaller than the {required} bytes one frame needs")]
    FrameSizeMismatch {
        frame_byte_size: usize,
        required: usize,
    },

    /// A frame's vertex count differs from the mesh or from the first frame
    #[error(
        "number of vertices changed (frame {frame} has {actual}, expected {expected}); \
         the animation format has no per-frame topology"
    )]
    VertexCountChanged {
        frame: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{0} polygons exceed the maximum of 65535")]
    TooManyPolygons(usize),

    #[error("{0} vertices exceed the maximum of 65535")]
    TooManyVertices(usize),

    #[error("{0} frames exceed the maximum of 65535")]
    TooManyFrames(usize),

    /// frameByteSize does not fit in the u16 header field
    #[error("{vertex_count} vertices x {per_vertex} bytes do not fit in a 16-bit frame size")]
    FrameTooLarge {
        vertex_count: usize,
        per_vertex: usize,
    },

    #[error("frame {frame} out of range (stream has {frame_count} frames)")]
    FrameOutOfRange { frame: usize, frame_count: usize },

    #[error("polygon {polygon} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        polygon: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error("animation has no frames or no vertices")]
    EmptyAnimation,
}
