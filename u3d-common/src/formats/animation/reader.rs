//! Animation stream decoding

use glam::Vec3;
use std::iter::FusedIterator;

use super::AnimationStreamHeader;
use crate::error::FormatError;
use crate::packing::{FormatVariant, read_position};

/// One decoded frame of engine-space vertex positions
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    /// Frame index within the stream
    pub index: usize,
    /// One position per vertex, in vertex order
    pub positions: Vec<Vec3>,
}

/// Parsed view over an animation stream buffer
///
/// Frames are decoded on demand. The view never mutates, so any number of
/// [`Frames`] iterators or [`AnimationStream::frame`] calls can run over it,
/// including from several threads.
#[derive(Debug, Clone, Copy)]
pub struct AnimationStream<'a> {
    header: AnimationStreamHeader,
    variant: FormatVariant,
    vertex_count: usize,
    bytes: &'a [u8],
}

impl<'a> AnimationStream<'a> {
    /// Parse the header and detect the per-vertex layout
    ///
    /// `vertex_count` comes from the matching data stream.
    pub fn parse(bytes: &'a [u8], vertex_count: usize) -> Result<Self, FormatError> {
        let header = Self::read_header(bytes)?;
        let variant =
            header
                .detect_variant(vertex_count)
                .ok_or(FormatError::UnknownVariant {
                    frame_byte_size: header.frame_byte_size as usize,
                    vertex_count,
                })?;
        tracing::debug!("Animation format detected as {}", variant);
        Self::with_header(bytes, header, vertex_count, variant)
    }

    /// Parse with a caller-chosen layout instead of detection
    ///
    /// Frames are still strided by the header's frame size, which must hold
    /// `vertex_count` positions of the given variant.
    pub fn parse_with_variant(
        bytes: &'a [u8],
        vertex_count: usize,
        variant: FormatVariant,
    ) -> Result<Self, FormatError> {
        let header = Self::read_header(bytes)?;
        let required = vertex_count * variant.vertex_size();
        if (header.frame_byte_size as usize) < required {
            return Err(FormatError::FrameSizeMismatch {
                frame_byte_size: header.frame_byte_size as usize,
                required,
            });
        }
        Self::with_header(bytes, header, vertex_count, variant)
    }

    fn read_header(bytes: &[u8]) -> Result<AnimationStreamHeader, FormatError> {
        AnimationStreamHeader::from_bytes(bytes).ok_or(FormatError::BufferTooShort {
            expected: AnimationStreamHeader::SIZE,
            actual: bytes.len(),
        })
    }

    fn with_header(
        bytes: &'a [u8],
        header: AnimationStreamHeader,
        vertex_count: usize,
        variant: FormatVariant,
    ) -> Result<Self, FormatError> {
        let expected = header.file_size();
        if bytes.len() < expected {
            return Err(FormatError::BufferTooShort {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            header,
            variant,
            vertex_count,
            bytes: &bytes[..expected],
        })
    }

    pub fn header(&self) -> AnimationStreamHeader {
        self.header
    }

    pub fn variant(&self) -> FormatVariant {
        self.variant
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn frame_byte_size(&self) -> usize {
        self.header.frame_byte_size as usize
    }

    /// Decode one vertex of one frame
    pub fn position(&self, frame: usize, vertex: usize) -> Option<Vec3> {
        if frame >= self.frame_count() || vertex >= self.vertex_count {
            return None;
        }
        let offset = self.header.frame_offset(frame) + vertex * self.variant.vertex_size();
        Some(read_position(&self.bytes[offset..], self.variant))
    }

    /// Decode frame `index` without touching any other frame
    pub fn frame(&self, index: usize) -> Result<AnimationFrame, FormatError> {
        if index >= self.frame_count() {
            return Err(FormatError::FrameOutOfRange {
                frame: index,
                frame_count: self.frame_count(),
            });
        }

        let start = self.header.frame_offset(index);
        let size = self.variant.vertex_size();
        let positions = self.bytes[start..start + self.vertex_count * size]
            .chunks_exact(size)
            .map(|chunk| read_position(chunk, self.variant))
            .collect();

        Ok(AnimationFrame { index, positions })
    }

    /// Iterate over every frame in order
    pub fn frames(&self) -> Frames<'a> {
        Frames {
            stream: *self,
            next: 0,
            end: self.frame_count(),
        }
    }

    /// Iterate over frames `start..end` (clamped to the stream)
    pub fn frame_range(&self, start: usize, end: usize) -> Frames<'a> {
        let end = end.min(self.frame_count());
        Frames {
            stream: *self,
            next: start.min(end),
            end,
        }
    }
}

/// Lazy iterator over decoded animation frames
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    stream: AnimationStream<'a>,
    next: usize,
    end: usize,
}

impl Iterator for Frames<'_> {
    type Item = AnimationFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let frame = self.stream.frame(self.next).ok()?;
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl FusedIterator for Frames<'_> {}
