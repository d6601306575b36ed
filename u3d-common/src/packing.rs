//! Vertex position and UV packing
//!
//! Converts f32 positions to the fixed-point layouts of the animation stream:
//! - STANDARD: one u32 with 11/11/10-bit fields (x8, x8, x4 sub-unit steps)
//! - EXTENDED: three i16 fields (x256 sub-unit steps) plus a zero pad
//!
//! Every axis is clamped to [-128, 127] engine units before quantization,
//! whatever its multiplier. The extra bits only hold the fraction, so decoding
//! divides by the multiplier and recovers the sign as an 8-bit value.
//!
//! The engine's Y axis points the other way, so Y is negated on pack and
//! restored on unpack.

use glam::Vec3;
use std::fmt;
use std::str::FromStr;

/// Lowest representable engine coordinate
pub const COORD_MIN: f32 = -128.0;
/// Highest representable engine coordinate
pub const COORD_MAX: f32 = 127.0;

const STANDARD_MULTIPLIERS: [f32; 3] = [8.0, 8.0, 4.0];
const EXTENDED_MULTIPLIERS: [f32; 3] = [256.0, 256.0, 256.0];

const STANDARD_XY_MASK: u32 = 0x7FF;
const STANDARD_Z_MASK: u32 = 0x3FF;

// ============================================================================
// Format Variant
// ============================================================================

/// Per-vertex layout of the animation stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatVariant {
    /// 4 bytes per vertex, 11/11/10-bit packed word
    #[default]
    Standard,
    /// 8 bytes per vertex, three i16 fields + pad
    Extended,
}

impl FormatVariant {
    /// Bytes used by one vertex position
    #[inline]
    pub const fn vertex_size(self) -> usize {
        match self {
            Self::Standard => 4,
            Self::Extended => 8,
        }
    }

    /// Sub-unit multipliers for (x, y, z)
    #[inline]
    pub const fn multipliers(self) -> [f32; 3] {
        match self {
            Self::Standard => STANDARD_MULTIPLIERS,
            Self::Extended => EXTENDED_MULTIPLIERS,
        }
    }

    /// Variant whose vertex size matches, if any
    pub const fn from_vertex_size(size: usize) -> Option<Self> {
        match size {
            4 => Some(Self::Standard),
            8 => Some(Self::Extended),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "unreal" => Ok(Self::Standard),
            "extended" | "ion" => Ok(Self::Extended),
            other => Err(format!("unknown format variant '{other}'")),
        }
    }
}

// ============================================================================
// Axis Quantization
// ============================================================================

/// Quantize one scaled axis value to the multiplier grid
///
/// Clamps to [`COORD_MIN`, `COORD_MAX`] first, then rounds half away from zero.
#[inline]
pub fn quantize_axis(value: f32, multiplier: f32) -> i32 {
    let clamped = value.clamp(COORD_MIN, COORD_MAX);
    (clamped * multiplier).round() as i32
}

/// Undo [`quantize_axis`] given the raw unsigned field value
#[inline]
fn dequantize_field(field: u32, multiplier: f32) -> f32 {
    let value = field as f32 / multiplier;
    if value >= 128.0 { value - 256.0 } else { value }
}

/// Scale a source position and flip it into engine axes
#[inline]
fn to_engine_axes(pos: Vec3, scale: f32) -> [f32; 3] {
    [pos.x * scale, -pos.y * scale, pos.z * scale]
}

// ============================================================================
// Position Packing
// ============================================================================

/// Pack a source position into the STANDARD 32-bit word
///
/// Bit layout: `[z:10][y:11][x:11]` (x in the low bits).
#[inline]
pub fn pack_position_standard(pos: Vec3, scale: f32) -> u32 {
    let [x, y, z] = to_engine_axes(pos, scale);
    let [mx, my, mz] = STANDARD_MULTIPLIERS;

    let qx = quantize_axis(x, mx) as u32 & STANDARD_XY_MASK;
    let qy = quantize_axis(y, my) as u32 & STANDARD_XY_MASK;
    let qz = quantize_axis(z, mz) as u32 & STANDARD_Z_MASK;

    qx | (qy << 11) | (qz << 22)
}

/// Unpack a STANDARD word to an engine-scaled position (Y restored)
#[inline]
pub fn unpack_position_standard(packed: u32) -> Vec3 {
    let [mx, my, mz] = STANDARD_MULTIPLIERS;
    Vec3::new(
        dequantize_field(packed & STANDARD_XY_MASK, mx),
        -dequantize_field((packed >> 11) & STANDARD_XY_MASK, my),
        dequantize_field((packed >> 22) & STANDARD_Z_MASK, mz),
    )
}

/// Pack a source position into the EXTENDED fields `[x, y, z, 0]`
#[inline]
pub fn pack_position_extended(pos: Vec3, scale: f32) -> [i16; 4] {
    let [x, y, z] = to_engine_axes(pos, scale);
    let [mx, my, mz] = EXTENDED_MULTIPLIERS;

    // 127 * 256 and -128 * 256 both fit in i16
    [
        quantize_axis(x, mx) as i16,
        quantize_axis(y, my) as i16,
        quantize_axis(z, mz) as i16,
        0,
    ]
}

/// Unpack EXTENDED fields to an engine-scaled position (Y restored)
#[inline]
pub fn unpack_position_extended(fields: [u16; 3]) -> Vec3 {
    let [mx, my, mz] = EXTENDED_MULTIPLIERS;
    Vec3::new(
        dequantize_field(fields[0] as u32, mx),
        -dequantize_field(fields[1] as u32, my),
        dequantize_field(fields[2] as u32, mz),
    )
}

/// Append one packed position (4 or 8 bytes, little-endian)
pub fn write_position(out: &mut Vec<u8>, pos: Vec3, scale: f32, variant: FormatVariant) {
    match variant {
        FormatVariant::Standard => {
            out.extend_from_slice(&pack_position_standard(pos, scale).to_le_bytes());
        }
        FormatVariant::Extended => {
            for field in pack_position_extended(pos, scale) {
                out.extend_from_slice(&field.to_le_bytes());
            }
        }
    }
}

/// Read one packed position from the start of `bytes`
///
/// `bytes` must hold at least `variant.vertex_size()` bytes.
pub fn read_position(bytes: &[u8], variant: FormatVariant) -> Vec3 {
    debug_assert!(bytes.len() >= variant.vertex_size());
    match variant {
        FormatVariant::Standard => {
            unpack_position_standard(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        FormatVariant::Extended => unpack_position_extended([
            u16::from_le_bytes([bytes[0], bytes[1]]),
            u16::from_le_bytes([bytes[2], bytes[3]]),
            u16::from_le_bytes([bytes[4], bytes[5]]),
        ]),
    }
}

// ============================================================================
// UV Packing
// ============================================================================

/// Pack a UV coordinate into the polygon record's byte pair
///
/// U gets a one-texel bias, V is flipped (engine V origin is at the top).
/// Both truncate toward zero and clamp to [0, 255].
#[inline]
pub fn pack_uv(u: f32, v: f32) -> [u8; 2] {
    let pu = ((u + 1.0 / 255.0) * 255.0) as i32;
    let pv = ((v * 255.0) as i32 - 255).abs();
    [pu.clamp(0, 255) as u8, pv.clamp(0, 255) as u8]
}

/// Unpack a record UV byte pair back to [0, 1) source space
#[inline]
pub fn unpack_uv(uv: [u8; 2]) -> [f32; 2] {
    [uv[0] as f32 / 256.0, 1.0 - uv[1] as f32 / 256.0]
}
