//! Stream pair file naming and output folder layout

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use u3d_common::U3D_FORMAT;

/// Data and animation stream paths of one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPair {
    pub data: PathBuf,
    pub animation: PathBuf,
    /// Base name shared by both files
    pub model_name: String,
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = base
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(U3D_FORMAT.extension);
    base.with_file_name(format!("{stem}{suffix}.{ext}"))
}

/// `Soldier.3d` -> `Soldier_d.3d`; a bare `Soldier` gets the default extension
pub fn data_path(base: &Path) -> PathBuf {
    with_suffix(base, U3D_FORMAT.data_suffix)
}

/// `Soldier.3d` -> `Soldier_a.3d`; a bare `Soldier` gets the default extension
pub fn animation_path(base: &Path) -> PathBuf {
    with_suffix(base, U3D_FORMAT.animation_suffix)
}

/// Both stream paths for a path naming either stream or the bare base
pub fn stream_pair(path: &Path) -> StreamPair {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let model_name = U3D_FORMAT.base_name(stem).to_string();

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(U3D_FORMAT.extension);
    let base = path.with_file_name(format!("{model_name}.{ext}"));

    StreamPair {
        data: data_path(&base),
        animation: animation_path(&base),
        model_name,
    }
}

/// Output folder names used when `use_folders` is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub use_folders: bool,
    pub model_dir: String,
    pub anim_dir: String,
    pub class_dir: String,
    pub texture_dir: String,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self {
            use_folders: false,
            model_dir: "Models".to_string(),
            anim_dir: "Models".to_string(),
            class_dir: "Classes".to_string(),
            texture_dir: "Textures".to_string(),
        }
    }
}

impl FolderLayout {
    /// Move `path` into `folder` next to it, creating the folder on demand
    ///
    /// Returns `path` unchanged when folders are disabled.
    pub fn place(&self, path: &Path, folder: &str) -> Result<PathBuf> {
        if !self.use_folders {
            return Ok(path.to_path_buf());
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let dir = parent.join(folder);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output folder: {:?}", dir))?;
        Ok(dir.join(path.file_name().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_paths() {
        assert_eq!(
            data_path(Path::new("out/Soldier.3d")),
            PathBuf::from("out/Soldier_d.3d")
        );
        assert_eq!(
            animation_path(Path::new("out/Soldier")),
            PathBuf::from("out/Soldier_a.3d")
        );
    }

    #[test]
    fn test_stream_pair_from_either_file() {
        let expected = StreamPair {
            data: PathBuf::from("m/Cube_d.3d"),
            animation: PathBuf::from("m/Cube_a.3d"),
            model_name: "Cube".to_string(),
        };
        assert_eq!(stream_pair(Path::new("m/Cube_d.3d")), expected);
        assert_eq!(stream_pair(Path::new("m/Cube_a.3d")), expected);
        assert_eq!(stream_pair(Path::new("m/Cube.3d")), expected);
        assert_eq!(stream_pair(Path::new("m/Cube")), expected);
    }

    #[test]
    fn test_folder_layout() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FolderLayout {
            use_folders: true,
            ..Default::default()
        };
        let placed = layout
            .place(&dir.path().join("Cube_d.3d"), &layout.model_dir)
            .unwrap();
        assert_eq!(placed, dir.path().join("Models").join("Cube_d.3d"));
        assert!(dir.path().join("Models").is_dir());

        let flat = FolderLayout::default();
        let path = dir.path().join("Cube.uc");
        assert_eq!(flat.place(&path, "Classes").unwrap(), path);
    }
}
