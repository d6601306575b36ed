//! Unreal vertex mesh binary stream formats
//!
//! Two POD streams describe one model, with no magic bytes:
//! - data stream (`_d.3d`): polygon topology, material tags, UVs
//! - animation stream (`_a.3d`): per-frame packed vertex positions
//!
//! All integers are little-endian. Both headers expose `SIZE`, `to_bytes`
//! and `from_bytes`.

pub mod animation;
pub mod data;

pub use animation::*;
pub use data::*;
