//! Shared codec for Unreal vertex mesh streams
//!
//! This crate provides the format logic shared between:
//! - `u3d-export` (OBJ -> `_d.3d` / `_a.3d` / `.uc`)
//! - `u3d-export import` (`_d.3d` / `_a.3d` -> OBJ)
//!
//! # Modules
//!
//! - [`packing`] - Fixed-point position packing and UV byte packing
//! - [`material`] - Material tag byte <-> symbolic material name mapping
//! - [`formats`] - Data stream and animation stream layouts
//! - [`model`] - Mesh-level encode/decode built on the stream codecs
//! - [`naming`] - Stream file naming constants

pub mod error;
pub mod formats;
pub mod material;
pub mod model;
pub mod naming;
pub mod packing;

pub use error::FormatError;

// Re-export commonly used packing items
pub use packing::{
    COORD_MAX, COORD_MIN, FormatVariant, pack_position_extended, pack_position_standard,
    pack_uv, quantize_axis, read_position, unpack_position_extended, unpack_position_standard,
    unpack_uv, write_position,
};

// Re-export commonly used format items
pub use formats::{
    AnimationFrame, AnimationStream, AnimationStreamHeader, DataStream, DataStreamHeader, Frames,
    POLYGON_RECORD_SIZE, PolygonRecord, encode_animation_stream, encode_data_stream,
};

pub use material::{
    MaterialLibrary, MaterialTag, PolyFlags, PolyType, name_from_tag, resolve_material,
    tag_from_name,
};

pub use model::{
    AnimationSource, Clip, ClipSource, DecodedModel, DecodedTriangle, EncodedAnimation,
    EncodedData, EncodedModel, HostMaterial, MeshSnapshot, TextureEntry, Triangle, decode_model,
    encode_animation, encode_data, encode_model,
};

pub use naming::{StreamFormat, U3D_FORMAT};
