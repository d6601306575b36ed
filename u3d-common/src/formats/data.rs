//! Data stream format (`_d.3d`)
//!
//! Static topology, per-polygon material tags and UVs.
//!
//! # Layout
//! ```text
//! Header (48 bytes):
//! 0x00: polygon_count u16
//! 0x02: vertex_count u16
//! 0x04: reserved (44 bytes, zero on write, ignored on read)
//!
//! Polygon records (polygon_count × 16 bytes):
//! +0x00: v0, v2, v1 u16 × 3   - indices, 2nd/3rd swapped for engine winding
//! +0x06: material tag u8      - poly type + poly flags
//! +0x07: reserved u8
//! +0x08: uv0, uv2, uv1 u8 × 6 - same order as the indices, or all zero
//! +0x0E: texture slot u8
//! +0x0F: reserved u8
//! ```

use crate::error::FormatError;
use crate::material::MaterialTag;
use crate::packing::pack_uv;

/// Size of one polygon record
pub const POLYGON_RECORD_SIZE: usize = 16;

/// Data stream header (48 bytes)
///
/// Only the two counts carry information. The reserved fields (rotation,
/// frame, normal, scale and padding in the engine's struct) are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataStreamHeader {
    pub polygon_count: u16,
    pub vertex_count: u16,
}

impl DataStreamHeader {
    pub const SIZE: usize = 48;

    pub fn new(polygon_count: u16, vertex_count: u16) -> Self {
        Self {
            polygon_count,
            vertex_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.polygon_count.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        // reserved bytes stay 0
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            polygon_count: u16::from_le_bytes([bytes[0], bytes[1]]),
            vertex_count: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }

    /// Total stream size (header + records)
    pub fn file_size(&self) -> usize {
        Self::SIZE + self.polygon_count as usize * POLYGON_RECORD_SIZE
    }
}

/// One triangle as stored in the data stream
///
/// Fields are in file order: `indices` and `uvs` hold (v0, v2, v1) for
/// records produced by [`PolygonRecord::from_triangle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolygonRecord {
    pub indices: [u16; 3],
    pub tag: u8,
    pub uvs: [[u8; 2]; 3],
    pub texture_slot: u8,
}

impl PolygonRecord {
    /// Build a record from a source-winding triangle
    ///
    /// Swaps the 2nd and 3rd corner. Without a UV layer the UV bytes are zero.
    pub fn from_triangle(
        vertices: [u16; 3],
        uvs: Option<[[f32; 2]; 3]>,
        material: MaterialTag,
    ) -> Self {
        let uvs = uvs
            .map(|uv| {
                [
                    pack_uv(uv[0][0], uv[0][1]),
                    pack_uv(uv[2][0], uv[2][1]),
                    pack_uv(uv[1][0], uv[1][1]),
                ]
            })
            .unwrap_or_default();

        Self {
            indices: [vertices[0], vertices[2], vertices[1]],
            tag: material.encode(),
            uvs,
            texture_slot: material.texture_slot,
        }
    }

    /// Indices and UVs back in source winding (undoes the export swap)
    pub fn source_winding(&self) -> ([u16; 3], [[u8; 2]; 3]) {
        let [a, c, b] = self.indices;
        let [uva, uvc, uvb] = self.uvs;
        ([a, b, c], [uva, uvb, uvc])
    }

    /// Material tag carried by this record
    pub fn material_tag(&self) -> MaterialTag {
        MaterialTag::decode(self.tag, self.texture_slot)
    }

    /// Write to raw bytes (16 bytes)
    pub fn to_bytes(&self) -> [u8; POLYGON_RECORD_SIZE] {
        let mut bytes = [0u8; POLYGON_RECORD_SIZE];
        for (i, index) in self.indices.iter().enumerate() {
            bytes[i * 2..i * 2 + 2].copy_from_slice(&index.to_le_bytes());
        }
        bytes[6] = self.tag;
        for (i, uv) in self.uvs.iter().enumerate() {
            bytes[8 + i * 2..10 + i * 2].copy_from_slice(uv);
        }
        bytes[14] = self.texture_slot;
        bytes
    }

    /// Parse from raw bytes (16 bytes), indices in file order
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < POLYGON_RECORD_SIZE {
            return None;
        }
        Some(Self {
            indices: [
                u16::from_le_bytes([bytes[0], bytes[1]]),
                u16::from_le_bytes([bytes[2], bytes[3]]),
                u16::from_le_bytes([bytes[4], bytes[5]]),
            ],
            tag: bytes[6],
            uvs: [
                [bytes[8], bytes[9]],
                [bytes[10], bytes[11]],
                [bytes[12], bytes[13]],
            ],
            texture_slot: bytes[14],
        })
    }
}

/// Encode a complete data stream
///
/// Fails if a count overflows its u16 field or a record indexes past
/// `vertex_count`.
pub fn encode_data_stream(
    records: &[PolygonRecord],
    vertex_count: usize,
) -> Result<Vec<u8>, FormatError> {
    let polygon_count =
        u16::try_from(records.len()).map_err(|_| FormatError::TooManyPolygons(records.len()))?;
    let vertex_count_u16 =
        u16::try_from(vertex_count).map_err(|_| FormatError::TooManyVertices(vertex_count))?;

    for (polygon, record) in records.iter().enumerate() {
        if let Some(&index) = record
            .indices
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(FormatError::IndexOutOfRange {
                polygon,
                index: index as usize,
                vertex_count,
            });
        }
    }

    let header = DataStreamHeader::new(polygon_count, vertex_count_u16);
    let mut out = Vec::with_capacity(header.file_size());
    out.extend_from_slice(&header.to_bytes());
    for record in records {
        out.extend_from_slice(&record.to_bytes());
    }

    tracing::debug!(
        "Encoded data stream: {} polygons, {} vertices, {} bytes",
        polygon_count,
        vertex_count,
        out.len()
    );
    Ok(out)
}

/// Parsed view over a data stream buffer
///
/// Records are decoded on demand; [`DataStream::polygons`] can be called any
/// number of times.
#[derive(Debug, Clone, Copy)]
pub struct DataStream<'a> {
    header: DataStreamHeader,
    records: &'a [u8],
}

impl<'a> DataStream<'a> {
    /// Parse the header and check the buffer holds every declared record
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FormatError> {
        let header = DataStreamHeader::from_bytes(bytes).ok_or(FormatError::BufferTooShort {
            expected: DataStreamHeader::SIZE,
            actual: bytes.len(),
        })?;

        let expected = header.file_size();
        if bytes.len() < expected {
            return Err(FormatError::BufferTooShort {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            header,
            records: &bytes[DataStreamHeader::SIZE..expected],
        })
    }

    pub fn header(&self) -> DataStreamHeader {
        self.header
    }

    pub fn polygon_count(&self) -> usize {
        self.header.polygon_count as usize
    }

    pub fn vertex_count(&self) -> usize {
        self.header.vertex_count as usize
    }

    /// Decode a single record by index
    pub fn polygon(&self, index: usize) -> Option<PolygonRecord> {
        let start = index.checked_mul(POLYGON_RECORD_SIZE)?;
        let end = start.checked_add(POLYGON_RECORD_SIZE)?;
        self.records
            .get(start..end)
            .and_then(PolygonRecord::from_bytes)
    }

    /// Iterate over all records in file order
    pub fn polygons(&self) -> impl ExactSizeIterator<Item = PolygonRecord> + 'a {
        let records: &'a [u8] = self.records;
        records
            .chunks_exact(POLYGON_RECORD_SIZE)
            .map(|chunk| PolygonRecord::from_bytes(chunk).unwrap_or_default())
    }
}
