//! Animation stream format (`_a.3d`)
//!
//! Per-frame vertex positions for a fixed topology. POD format with a minimal
//! header and no magic bytes; the per-vertex layout is not stored and is
//! detected from the frame size.
//!
//! # Layout
//! ```text
//! Header (4 bytes):
//! 0x00: frame_count u16 LE      - Total number of frames
//! 0x02: frame_byte_size u16 LE  - vertex_count × 4 (STANDARD) or × 8 (EXTENDED)
//!
//! Frame Data (frame_count × frame_byte_size bytes):
//! Frame i starts at 4 + i × frame_byte_size and holds vertex_count packed
//! positions in vertex order.
//! ```

mod encoding;
mod header;
mod reader;

pub use encoding::*;
pub use header::*;
pub use reader::*;

#[cfg(test)]
mod tests;
