//! UnrealScript build script (`.uc`) emitter
//!
//! The script imports both streams into the editor, declares the animation
//! sequences and binds one texture per slot.

use anyhow::Result;
use std::fmt::Write;
use std::path::Path;
use u3d_common::{Clip, FormatVariant, TextureEntry};

use crate::paths::FolderLayout;

const RULE: &str =
    "//=============================================================================";

/// Level-of-detail settings for `#exec MESH IMPORT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodSettings {
    pub style: u32,
    pub frame: u32,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            style: 10,
            frame: 0,
        }
    }
}

/// Everything the build script refers to
#[derive(Debug, Clone, Copy)]
pub struct ScriptInput<'a> {
    pub class_name: &'a str,
    pub mesh_name: &'a str,
    /// File name only; the folder comes from `folders`
    pub data_file: &'a str,
    pub animation_file: &'a str,
    pub folders: &'a FolderLayout,
    pub variant: FormatVariant,
    /// `None` writes `MLOD=False`
    pub lod: Option<LodSettings>,
    pub no_texture: bool,
    pub frame_count: usize,
    /// Clip sequences; `None` for scene animation
    pub clips: Option<&'a [Clip]>,
    pub textures: &'a [TextureEntry],
    pub frame_rate: f32,
}

/// Editor-side mesh scale matching the stream's fixed-point layout
fn meshmap_scale(variant: FormatVariant) -> [f32; 3] {
    match variant {
        FormatVariant::Standard => [0.1, 0.1, 0.2],
        FormatVariant::Extended => [0.003125; 3],
    }
}

/// Texture object name and source file for a texture table entry
///
/// The editor imports PCX unless the source is a BMP.
fn texture_file(name: &str) -> (&str, String) {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let is_bmp = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("bmp"));

    let file = if is_bmp {
        name.to_string()
    } else {
        format!("{stem}.PCX")
    };
    (stem, file)
}

/// Render the build script text
pub fn render_script(input: &ScriptInput) -> Result<String> {
    let mut out = String::new();
    write_script(&mut out, input)?;
    Ok(out)
}

fn write_script(out: &mut String, input: &ScriptInput) -> std::fmt::Result {
    let mesh = input.mesh_name;
    let rate = input.frame_rate;

    writeln!(out, "{RULE}")?;
    writeln!(out, "// {}.", input.class_name)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "class {} expands actor;", input.class_name)?;
    writeln!(out)?;

    let lod = match input.lod {
        Some(lod) => format!("LODSTYLE={} LODFRAME={}", lod.style, lod.frame),
        None => "MLOD=False".to_string(),
    };
    write!(
        out,
        "#exec MESH IMPORT MESH={mesh} ANIVFILE={}\\{} DATAFILE={}\\{} X=0 Y=0 Z=0 {lod}",
        input.folders.anim_dir, input.animation_file, input.folders.model_dir, input.data_file,
    )?;
    if input.no_texture {
        write!(out, " LODNOTEX=True")?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "#exec MESH ORIGIN MESH={mesh} X=0 Y=0 Z=0 YAW=-64 PITCH=0 ROLL=0"
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "#exec MESH SEQUENCE MESH={mesh} SEQ=ALL STARTFRAME=0 NUMFRAMES={} RATE={rate}",
        input.frame_count
    )?;
    writeln!(
        out,
        "#exec MESH SEQUENCE MESH={mesh} SEQ=Still STARTFRAME=0 NUMFRAMES=1 RATE={rate}"
    )?;
    for clip in input.clips.unwrap_or_default() {
        writeln!(
            out,
            "#exec MESH SEQUENCE MESH={mesh} SEQ={} STARTFRAME={} NUMFRAMES={} RATE={rate}",
            clip.name, clip.start_frame, clip.frame_count
        )?;
    }
    writeln!(out)?;

    let [x, y, z] = meshmap_scale(input.variant);
    writeln!(out, "#exec MESHMAP NEW MESHMAP={mesh} MESH={mesh}")?;
    writeln!(out, "#exec MESHMAP SCALE MESHMAP={mesh} X={x} Y={y} Z={z}")?;

    for texture in input.textures {
        let (name, file) = texture_file(&texture.name);
        writeln!(out)?;
        writeln!(
            out,
            "#exec TEXTURE IMPORT NAME={name} FILE={}\\{file} GROUP=Skins FLAGS=2",
            input.folders.texture_dir
        )?;
        writeln!(
            out,
            "#exec MESHMAP SETTEXTURE MESHMAP={mesh} NUM={} TEXTURE={name}",
            texture.slot
        )?;
    }

    writeln!(out)?;
    writeln!(out, "defaultproperties")?;
    writeln!(out, "{{")?;
    writeln!(out, "    DrawType=DT_Mesh")?;
    writeln!(out, "    Mesh={mesh}")?;
    write!(out, "}}")
}
