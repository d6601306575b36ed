//! Animation stream header

use crate::packing::FormatVariant;

/// Animation stream header (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStreamHeader {
    /// Total number of frames in the stream
    pub frame_count: u16,
    /// Bytes per frame (vertex_count × per-vertex size)
    pub frame_byte_size: u16,
}

impl AnimationStreamHeader {
    pub const SIZE: usize = 4;

    pub fn new(frame_count: u16, frame_byte_size: u16) -> Self {
        Self {
            frame_count,
            frame_byte_size,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.frame_byte_size.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            frame_count: u16::from_le_bytes([bytes[0], bytes[1]]),
            frame_byte_size: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }

    /// Detect the per-vertex layout from the frame size
    ///
    /// Returns `None` unless `frame_byte_size / vertex_count` is exactly 4 or 8.
    pub fn detect_variant(&self, vertex_count: usize) -> Option<FormatVariant> {
        let frame_byte_size = self.frame_byte_size as usize;
        if vertex_count == 0 || frame_byte_size % vertex_count != 0 {
            return None;
        }
        FormatVariant::from_vertex_size(frame_byte_size / vertex_count)
    }

    /// Byte offset of frame `index` from the start of the stream
    pub fn frame_offset(&self, index: usize) -> usize {
        Self::SIZE + index * self.frame_byte_size as usize
    }

    /// Calculate expected data size (excluding header)
    pub fn data_size(&self) -> usize {
        self.frame_count as usize * self.frame_byte_size as usize
    }

    /// Calculate total file size (header + data)
    pub fn file_size(&self) -> usize {
        Self::SIZE + self.data_size()
    }
}
