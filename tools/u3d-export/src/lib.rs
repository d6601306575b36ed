//! u3d-export library
//!
//! OBJ <-> Unreal vertex mesh conversion built on `u3d-common`, usable from
//! other tools without going through the CLI.

pub mod export;
pub mod import;
pub mod info;
pub mod manifest;
pub mod obj;
pub mod paths;
pub mod script;

pub use export::{ExportOptions, ExportReport, export_model, export_obj};
pub use import::{FrameRange, ImportOptions, ImportReport, import_model};
pub use info::{AnimationInfo, ModelInfo, inspect};
pub use paths::{FolderLayout, StreamPair, animation_path, data_path, stream_pair};
pub use script::{LodSettings, ScriptInput, render_script};
