//! Stream file naming constants.
//!
//! A model is stored as two sibling files sharing a base name and extension:
//! `<base>_d.<ext>` for the data stream and `<base>_a.<ext>` for the animation
//! stream. The codec itself never looks at file names.
//!
//! # Example
//!
//! ```
//! use u3d_common::U3D_FORMAT;
//!
//! assert_eq!(U3D_FORMAT.data_file_name("Soldier"), "Soldier_d.3d");
//! assert_eq!(U3D_FORMAT.animation_file_name("Soldier"), "Soldier_a.3d");
//! ```

/// File naming convention for one stream pair.
#[derive(Debug, Clone, Copy)]
pub struct StreamFormat {
    /// Default stream extension without dot (e.g., "3d")
    pub extension: &'static str,

    /// Suffix appended to the base name for the data stream
    pub data_suffix: &'static str,

    /// Suffix appended to the base name for the animation stream
    pub animation_suffix: &'static str,

    /// Build script extension without dot (e.g., "uc")
    pub script_ext: &'static str,
}

impl StreamFormat {
    pub const fn new(
        extension: &'static str,
        data_suffix: &'static str,
        animation_suffix: &'static str,
        script_ext: &'static str,
    ) -> Self {
        Self {
            extension,
            data_suffix,
            animation_suffix,
            script_ext,
        }
    }

    pub fn data_file_name(&self, base: &str) -> String {
        format!("{base}{}.{}", self.data_suffix, self.extension)
    }

    pub fn animation_file_name(&self, base: &str) -> String {
        format!("{base}{}.{}", self.animation_suffix, self.extension)
    }

    /// Strip a data or animation suffix from a file stem, if present
    pub fn base_name<'a>(&self, stem: &'a str) -> &'a str {
        stem.strip_suffix(self.data_suffix)
            .or_else(|| stem.strip_suffix(self.animation_suffix))
            .unwrap_or(stem)
    }
}

/// Unreal vertex mesh naming: `_d.3d`, `_a.3d`, `.uc`
pub const U3D_FORMAT: StreamFormat = StreamFormat::new("3d", "_d", "_a", "uc");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(U3D_FORMAT.data_file_name("Cube"), "Cube_d.3d");
        assert_eq!(U3D_FORMAT.animation_file_name("Cube"), "Cube_a.3d");
        assert_eq!(U3D_FORMAT.script_ext, "uc");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(U3D_FORMAT.base_name("Cube_d"), "Cube");
        assert_eq!(U3D_FORMAT.base_name("Cube_a"), "Cube");
        assert_eq!(U3D_FORMAT.base_name("Cube"), "Cube");
        assert_eq!(U3D_FORMAT.base_name("Cube_d_a"), "Cube_d");
    }
}
