//! OBJ / MTL reading and writing
//!
//! OBJ is the host mesh format of this tool. Unlike a GPU exporter the vertex
//! list is kept as-is: the streams index shared vertices, and every frame OBJ
//! of an animation must line up with the base mesh vertex for vertex.

use anyhow::{Context, Result, bail};
use glam::Vec3;
use hashbrown::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use u3d_common::{HostMaterial, MeshSnapshot, Triangle};

/// Parsed OBJ file plus the material libraries it references
#[derive(Debug, Clone, Default)]
pub struct ObjModel {
    pub mesh: MeshSnapshot,
    /// `mtllib` file names in declaration order
    pub mtllibs: Vec<String>,
}

/// Read an OBJ file and the textures named by its material libraries
pub fn read_obj(input: &Path) -> Result<MeshSnapshot> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let ObjModel { mut mesh, mtllibs } =
        parse_obj(&content).with_context(|| format!("Failed to parse OBJ: {:?}", input))?;

    let dir = input.parent().unwrap_or(Path::new("."));
    let mut textures: HashMap<String, String> = HashMap::new();
    for lib in &mtllibs {
        let path = dir.join(lib);
        match std::fs::read_to_string(&path) {
            Ok(content) => textures.extend(parse_mtl(&content)),
            Err(err) => tracing::warn!("Cannot read material library {:?}: {}", path, err),
        }
    }

    for material in &mut mesh.materials {
        material.texture = textures.get(&material.name).cloned();
    }

    tracing::debug!(
        "Read OBJ {:?}: {} vertices, {} triangles, {} materials",
        input,
        mesh.positions.len(),
        mesh.triangles.len(),
        mesh.materials.len()
    );
    Ok(mesh)
}

/// Read only the vertex positions of a frame OBJ
pub fn read_obj_positions(input: &Path) -> Result<Vec<Vec3>> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to open frame OBJ: {:?}", input))?;
    Ok(content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            (parts.first() == Some(&"v") && parts.len() >= 4).then(|| parse_vec3(&parts[1..4]))
        })
        .collect())
}

/// Parse OBJ text into a mesh snapshot
///
/// Polygons are fan-triangulated. The UV layer exists if any face corner
/// references a `vt`; corners without one get (0, 0).
pub fn parse_obj(content: &str) -> Result<ObjModel> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();
    let mut corner_uvs: Vec<[[f32; 2]; 3]> = Vec::new();
    let mut has_uvs = false;

    let mut materials: Vec<HostMaterial> = Vec::new();
    let mut material_lookup: HashMap<String, usize> = HashMap::new();
    let mut current_material = 0;
    let mut mtllibs = Vec::new();

    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" if parts.len() >= 4 => positions.push(parse_vec3(&parts[1..4])),
            "vt" if parts.len() >= 3 => {
                let u: f32 = parts[1].parse().unwrap_or(0.0);
                let v: f32 = parts[2].parse().unwrap_or(0.0);
                tex_coords.push([u, v]);
            }
            "usemtl" if parts.len() >= 2 => {
                let name = parts[1..].join(" ");
                current_material = match material_lookup.get(&name) {
                    Some(&index) => index,
                    None => {
                        let index = materials.len();
                        material_lookup.insert(name.clone(), index);
                        materials.push(HostMaterial::new(name));
                        index
                    }
                };
            }
            "mtllib" if parts.len() >= 2 => mtllibs.push(parts[1..].join(" ")),
            "f" if parts.len() >= 4 => {
                let face_verts: Vec<(usize, Option<usize>)> = parts[1..]
                    .iter()
                    .filter_map(|v| parse_obj_vertex(v))
                    .collect();

                if face_verts.len() < 3 {
                    continue;
                }

                if let Some(&(vi, _)) = face_verts.iter().find(|(vi, _)| *vi >= positions.len()) {
                    bail!(
                        "Face on line {} references missing vertex {}",
                        line_number + 1,
                        vi + 1
                    );
                }

                // Fan triangulation for convex polygons
                for i in 1..face_verts.len() - 1 {
                    let corners = [face_verts[0], face_verts[i], face_verts[i + 1]];
                    triangles.push(Triangle {
                        vertices: corners.map(|(vi, _)| vi),
                        material: current_material,
                    });
                    corner_uvs.push(corners.map(|(_, vti)| {
                        has_uvs |= vti.is_some();
                        vti.and_then(|ti| tex_coords.get(ti).copied())
                            .unwrap_or([0.0; 2])
                    }));
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        bail!("No vertices found in OBJ file");
    }

    Ok(ObjModel {
        mesh: MeshSnapshot {
            positions,
            triangles,
            uv_layer: has_uvs.then_some(corner_uvs),
            materials,
        },
        mtllibs,
    })
}

/// Parse MTL text into (material name, diffuse texture file name) pairs
pub fn parse_mtl(content: &str) -> HashMap<String, String> {
    let mut textures = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        let Some((keyword, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let rest = rest.trim();
        match keyword {
            "newmtl" => current = Some(rest.to_string()),
            "map_Kd" => {
                if let Some(name) = &current {
                    // Options may precede the file name; the file name is last
                    let file = rest.split_whitespace().last().unwrap_or(rest);
                    let file = Path::new(file)
                        .file_name()
                        .and_then(|f| f.to_str())
                        .unwrap_or(file);
                    textures.insert(name.clone(), file.to_string());
                }
            }
            _ => {}
        }
    }

    textures
}

fn parse_vec3(parts: &[&str]) -> Vec3 {
    let x: f32 = parts[0].parse().unwrap_or(0.0);
    let y: f32 = parts[1].parse().unwrap_or(0.0);
    let z: f32 = parts[2].parse().unwrap_or(0.0);
    Vec3::new(x, y, z)
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
fn parse_obj_vertex(s: &str) -> Option<(usize, Option<usize>)> {
    let mut parts = s.split('/');

    let vi = parts.next()?.parse::<usize>().ok()?.checked_sub(1)?; // OBJ indices are 1-based

    let vti = parts
        .next()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok())
        .and_then(|i| i.checked_sub(1));

    Some((vi, vti))
}

// ============================================================================
// Writing
// ============================================================================

/// One triangle to write, in source winding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjFace {
    pub vertices: [usize; 3],
    pub uvs: Option<[[f32; 2]; 3]>,
    /// Index into [`ObjDocument::materials`]
    pub material: Option<usize>,
}

/// Everything needed to write one OBJ file
#[derive(Debug, Clone, Copy)]
pub struct ObjDocument<'a> {
    pub name: &'a str,
    pub mtllib: Option<&'a str>,
    pub positions: &'a [Vec3],
    pub faces: &'a [ObjFace],
    pub materials: &'a [String],
}

/// Write an OBJ document
///
/// UVs are written as one `vt` per face corner.
pub fn write_obj<W: Write>(w: &mut W, doc: &ObjDocument) -> std::io::Result<()> {
    if let Some(lib) = doc.mtllib {
        writeln!(w, "mtllib {lib}")?;
    }
    writeln!(w, "o {}", doc.name)?;

    for p in doc.positions {
        writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
    }

    for face in doc.faces {
        if let Some(uvs) = face.uvs {
            for [u, v] in uvs {
                writeln!(w, "vt {u} {v}")?;
            }
        }
    }

    let mut current_material = None;
    let mut next_uv = 1;
    for face in doc.faces {
        if face.material != current_material {
            if let Some(name) = face.material.and_then(|m| doc.materials.get(m)) {
                writeln!(w, "usemtl {name}")?;
            }
            current_material = face.material;
        }

        let [a, b, c] = face.vertices.map(|v| v + 1);
        if face.uvs.is_some() {
            let t = next_uv;
            next_uv += 3;
            writeln!(w, "f {a}/{t} {b}/{} {c}/{}", t + 1, t + 2)?;
        } else {
            writeln!(w, "f {a} {b} {c}")?;
        }
    }

    Ok(())
}

/// Write an OBJ document to a file
pub fn write_obj_file(path: &Path, doc: &ObjDocument) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create OBJ: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, doc)?;
    writer.flush()?;
    Ok(())
}

/// Write a material library with one empty material per name
pub fn write_mtl_file(path: &Path, names: &[String]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create MTL: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for name in names {
        writeln!(writer, "newmtl {name}")?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o Quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl 001_MASKED_Quad
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_parse_quad() {
        let model = parse_obj(QUAD_OBJ).unwrap();
        let mesh = &model.mesh;
        assert_eq!(model.mtllibs, ["quad.mtl"]);
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(
            mesh.triangles,
            [
                Triangle {
                    vertices: [0, 1, 2],
                    material: 0
                },
                Triangle {
                    vertices: [0, 2, 3],
                    material: 0
                },
            ]
        );
        assert_eq!(mesh.materials, [HostMaterial::new("001_MASKED_Quad")]);

        let uvs = mesh.uv_layer.as_ref().unwrap();
        assert_eq!(uvs[1], [[0.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn test_parse_without_uvs_or_materials() {
        let model = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n").unwrap();
        assert!(model.mesh.uv_layer.is_none());
        assert!(model.mesh.materials.is_empty());
        assert_eq!(model.mesh.triangles[0].material, 0);
    }

    #[test]
    fn test_parse_rejects_missing_vertex() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.to_string().contains("missing vertex 3"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_obj("# nothing here\n").is_err());
    }

    #[test]
    fn test_parse_obj_vertex() {
        assert_eq!(parse_obj_vertex("3"), Some((2, None)));
        assert_eq!(parse_obj_vertex("3/7"), Some((2, Some(6))));
        assert_eq!(parse_obj_vertex("3//2"), Some((2, None)));
        assert_eq!(parse_obj_vertex("0"), None);
    }

    #[test]
    fn test_parse_mtl() {
        let textures = parse_mtl(
            "newmtl Skin\nKd 1 1 1\nmap_Kd -bm 1 textures/skin.bmp\n\nnewmtl Plain\nKd 1 0 0\n",
        );
        assert_eq!(textures.get("Skin").map(String::as_str), Some("skin.bmp"));
        assert!(!textures.contains_key("Plain"));
    }

    #[test]
    fn test_write_then_parse() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let faces = [
            ObjFace {
                vertices: [0, 1, 2],
                uvs: Some([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
                material: Some(0),
            },
            ObjFace {
                vertices: [1, 3, 2],
                uvs: Some([[1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
                material: Some(1),
            },
        ];
        let materials = ["000_NORMAL_Tri".to_string(), "002_TRANSLUCENT_Tri".to_string()];
        let doc = ObjDocument {
            name: "Tri",
            mtllib: Some("Tri.mtl"),
            positions: &positions,
            faces: &faces,
            materials: &materials,
        };

        let mut out = Vec::new();
        write_obj(&mut out, &doc).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("usemtl 002_TRANSLUCENT_Tri\nf 2/4 4/5 3/6\n"));

        let model = parse_obj(&text).unwrap();
        assert_eq!(model.mesh.positions, positions);
        assert_eq!(model.mesh.triangles[1].vertices, [1, 3, 2]);
        assert_eq!(model.mesh.triangles[1].material, 1);
        assert_eq!(model.mesh.uv_layer.unwrap()[1], faces[1].uvs.unwrap());
    }

    #[test]
    fn test_read_obj_attaches_textures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        std::fs::write(
            dir.path().join("quad.mtl"),
            "newmtl 001_MASKED_Quad\nmap_Kd quad.png\n",
        )
        .unwrap();

        let mesh = read_obj(&dir.path().join("quad.obj")).unwrap();
        assert_eq!(mesh.materials[0].texture.as_deref(), Some("quad.png"));

        let positions = read_obj_positions(&dir.path().join("quad.obj")).unwrap();
        assert_eq!(positions[2], Vec3::new(1.0, 1.0, 0.0));
    }
}
