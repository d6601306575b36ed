//! Material tags
//!
//! Each polygon record carries a tag byte (`poly_type + poly_flags`) and a
//! texture slot. On the host side the same triple lives in the material name,
//! e.g. `003_MASKED_UNLIT_Soldier`:
//!
//! ```text
//! <slot:03>_<POLYTYPE>[_<FLAG>...]_<base name>
//! ```
//!
//! Tags are matched as whole `_`-separated tokens, never as raw substrings, so
//! a base name like `ULTRA` does not pick up the `UL` flag.

use hashbrown::HashMap;
use std::ops::{BitOr, BitOrAssign};

// ============================================================================
// Poly Type
// ============================================================================

/// Polygon render type (low nibble of the tag byte, mutually exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PolyType {
    #[default]
    Normal = 0,
    TwoSided = 1,
    Translucent = 2,
    Masked = 3,
    Modulated = 4,
    AlphaBlend = 5,
    WeaponTri = 8,
}

impl PolyType {
    /// Matching order for name lookup
    pub const ALL: [PolyType; 7] = [
        Self::Normal,
        Self::TwoSided,
        Self::Translucent,
        Self::Masked,
        Self::Modulated,
        Self::AlphaBlend,
        Self::WeaponTri,
    ];

    pub const fn long_tag(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::TwoSided => "2SIDED",
            Self::Translucent => "TRANSLUCENT",
            Self::Masked => "MASKED",
            Self::Modulated => "MODULATED",
            Self::AlphaBlend => "ALPHABLEND",
            Self::WeaponTri => "WEAPONTRI",
        }
    }

    pub const fn short_tag(self) -> &'static str {
        match self {
            Self::Normal => "NM",
            Self::TwoSided => "DD",
            Self::Translucent => "LU",
            Self::Masked => "CL",
            Self::Modulated => "MD",
            Self::AlphaBlend => "AB",
            Self::WeaponTri => "PH",
        }
    }

    /// Decode the low nibble of a tag byte; unknown values read as `Normal`
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            1 => Self::TwoSided,
            2 => Self::Translucent,
            3 => Self::Masked,
            4 => Self::Modulated,
            5 => Self::AlphaBlend,
            8 => Self::WeaponTri,
            _ => Self::Normal,
        }
    }

    fn matches(self, token: &str) -> bool {
        token == self.long_tag() || token == self.short_tag()
    }
}

// ============================================================================
// Poly Flags
// ============================================================================

/// Independently combinable polygon flags (high nibble of the tag byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PolyFlags(u8);

impl PolyFlags {
    pub const UNLIT: Self = Self(16);
    pub const FLAT: Self = Self(32);
    pub const ENVIRONMENT: Self = Self(64);
    pub const NOSMOOTH: Self = Self(128);

    /// Every flag with its (long, short) name tokens, in naming order
    pub const ALL: [(PolyFlags, &'static str, &'static str); 4] = [
        (Self::UNLIT, "UNLIT", "UL"),
        (Self::FLAT, "FLAT", "FL"),
        (Self::ENVIRONMENT, "ENVIRONMENT", "RF"),
        (Self::NOSMOOTH, "NOSMOOTH", "NS"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Keep only the flag bits of a tag byte
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0xF0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Long names of the set flags, in naming order
    pub fn long_tags(self) -> impl Iterator<Item = &'static str> {
        Self::ALL
            .into_iter()
            .filter(move |(flag, _, _)| self.contains(*flag))
            .map(|(_, long, _)| long)
    }
}

impl BitOr for PolyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PolyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

fn is_vocabulary(token: &str) -> bool {
    PolyType::ALL.iter().any(|t| t.matches(token))
        || PolyFlags::ALL
            .iter()
            .any(|(_, long, short)| token == *long || token == *short)
}

// ============================================================================
// Material Tag
// ============================================================================

/// Texture slot + poly type + poly flags of one material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialTag {
    pub texture_slot: u8,
    pub poly_type: PolyType,
    pub poly_flags: PolyFlags,
}

impl MaterialTag {
    /// Tag byte as written at record offset 6
    pub const fn encode(&self) -> u8 {
        self.poly_type as u8 + self.poly_flags.bits()
    }

    /// Rebuild from a record's tag byte and texture slot byte
    pub const fn decode(tag: u8, texture_slot: u8) -> Self {
        Self {
            texture_slot,
            poly_type: PolyType::from_bits(tag),
            poly_flags: PolyFlags::from_bits_truncate(tag),
        }
    }
}

/// Texture slot from up to three leading digits
///
/// `Some(0)` when the digits parse above 255.
fn slot_from_name(name: &str) -> Option<u8> {
    let digits: String = name.chars().take(3).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(u8::try_from(value).unwrap_or(0))
}

/// Derive a material tag from a host material name
///
/// The slot comes from the name's leading digits, else from `material_index`
/// (0 when it does not fit a byte). For canonical names (`NNN_...`) only the
/// run of tag tokens right after the slot is read; any other name is scanned
/// for tag tokens anywhere after its first token. Tokens end at `_` or `.`,
/// so host suffixes like `Skin_MASKED.001` still match.
pub fn tag_from_name(name: &str, material_index: usize) -> MaterialTag {
    let texture_slot = slot_from_name(name)
        .or_else(|| u8::try_from(material_index).ok())
        .unwrap_or(0);

    let mut tokens = name.split(['_', '.']);
    let first = tokens.next().unwrap_or_default();
    let canonical = first.len() == 3 && first.chars().all(|c| c.is_ascii_digit());

    let tokens: Vec<&str> = if canonical {
        tokens.take_while(|token| is_vocabulary(token)).collect()
    } else {
        tokens.collect()
    };

    let poly_type = PolyType::ALL
        .into_iter()
        .find(|t| tokens.iter().any(|token| t.matches(token)))
        .unwrap_or_default();

    let mut poly_flags = PolyFlags::empty();
    for (flag, long, short) in PolyFlags::ALL {
        if tokens.iter().any(|token| *token == long || *token == short) {
            poly_flags |= flag;
        }
    }

    MaterialTag {
        texture_slot,
        poly_type,
        poly_flags,
    }
}

/// Canonical material name for a tag, e.g. `012_MASKED_FLAT_Knight`
pub fn name_from_tag(tag: &MaterialTag, base_name: &str) -> String {
    let mut name = format!("{:03}_{}", tag.texture_slot, tag.poly_type.long_tag());
    for flag in tag.poly_flags.long_tags() {
        name.push('_');
        name.push_str(flag);
    }
    name.push('_');
    name.push_str(base_name);
    name
}

// ============================================================================
// Material Registry
// ============================================================================

/// Ordered, name-indexed list of materials
///
/// Used both for a mesh's own material slots and for a scene-wide registry.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of the first material with exactly this name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Append a material and return its index
    pub fn push(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        let index = self.names.len();
        self.lookup.entry(name.clone()).or_insert(index);
        self.names.push(name);
        index
    }
}

/// Find or create the material for a tag, returning its index in `target`
///
/// Looks in `target` first, then attaches a match from `registry`, and only
/// then creates a new material (registered in both). At most one material per
/// canonical name ends up in `target`.
pub fn resolve_material(
    tag: &MaterialTag,
    base_name: &str,
    target: &mut MaterialLibrary,
    registry: &mut MaterialLibrary,
) -> usize {
    let name = name_from_tag(tag, base_name);

    if let Some(index) = target.find(&name) {
        return index;
    }

    if registry.find(&name).is_none() {
        tracing::debug!("Creating material {}", name);
        registry.push(name.clone());
    }
    target.push(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tags() -> impl Iterator<Item = MaterialTag> {
        (0..16u8).flat_map(|flag_bits| {
            PolyType::ALL.into_iter().map(move |poly_type| MaterialTag {
                texture_slot: flag_bits * 13,
                poly_type,
                poly_flags: PolyFlags::from_bits_truncate(flag_bits << 4),
            })
        })
    }

    #[test]
    fn test_tag_byte_encoding() {
        let tag = MaterialTag {
            texture_slot: 0,
            poly_type: PolyType::AlphaBlend,
            poly_flags: PolyFlags::UNLIT | PolyFlags::ENVIRONMENT,
        };
        assert_eq!(tag.encode(), 5 + 16 + 64);
        assert_eq!(MaterialTag::decode(tag.encode(), 0), tag);
    }

    #[test]
    fn test_unknown_poly_type_reads_as_normal() {
        assert_eq!(PolyType::from_bits(6), PolyType::Normal);
        assert_eq!(PolyType::from_bits(0x17), PolyType::Normal);
        assert_eq!(PolyType::from_bits(0x18), PolyType::WeaponTri);
    }

    #[test]
    fn test_name_from_tag() {
        let tag = MaterialTag {
            texture_slot: 7,
            poly_type: PolyType::TwoSided,
            poly_flags: PolyFlags::NOSMOOTH | PolyFlags::UNLIT,
        };
        assert_eq!(name_from_tag(&tag, "Knight"), "007_2SIDED_UNLIT_NOSMOOTH_Knight");
        assert_eq!(
            name_from_tag(&MaterialTag::default(), "Box"),
            "000_NORMAL_Box"
        );
    }

    #[test]
    fn test_tag_from_name_short_tags() {
        let tag = tag_from_name("Skin_CL_UL_FL", 4);
        assert_eq!(tag.texture_slot, 4);
        assert_eq!(tag.poly_type, PolyType::Masked);
        assert_eq!(tag.poly_flags, PolyFlags::UNLIT | PolyFlags::FLAT);
    }

    #[test]
    fn test_tag_from_name_host_suffix() {
        let tag = tag_from_name("Skin_MASKED.001", 2);
        assert_eq!(tag.poly_type, PolyType::Masked);
        assert_eq!(tag.texture_slot, 2);

        let tag = tag_from_name("003_TRANSLUCENT_UNLIT.002", 0);
        assert_eq!(tag.texture_slot, 3);
        assert_eq!(tag.poly_type, PolyType::Translucent);
        assert_eq!(tag.poly_flags, PolyFlags::UNLIT);

        let name = name_from_tag(&tag, "Knight.001");
        assert_eq!(tag_from_name(&name, 0), tag);
    }

    #[test]
    fn test_tag_from_name_first_poly_type_wins() {
        let tag = tag_from_name("Glass_MODULATED_TRANSLUCENT", 0);
        assert_eq!(tag.poly_type, PolyType::Translucent);
    }

    #[test]
    fn test_tag_from_name_slot_rules() {
        assert_eq!(tag_from_name("012_NORMAL_Box", 40).texture_slot, 12);
        // Digits above 255 fall back to slot 0, not the material index
        assert_eq!(tag_from_name("300_NORMAL_Box", 40).texture_slot, 0);
        assert_eq!(tag_from_name("Box", 40).texture_slot, 40);
        assert_eq!(tag_from_name("Box", 256).texture_slot, 0);
        assert_eq!(tag_from_name("9", 40).texture_slot, 9);
    }

    #[test]
    fn test_tag_from_name_ignores_partial_tokens() {
        let tag = tag_from_name("Mat_ULTRA_FLATTEN_CLOTH", 0);
        assert_eq!(tag.poly_type, PolyType::Normal);
        assert!(tag.poly_flags.is_empty());
    }

    #[test]
    fn test_tag_from_name_first_token_is_not_a_tag() {
        let tag = tag_from_name("MASKED_Thing", 1);
        assert_eq!(tag.poly_type, PolyType::Normal);
    }

    #[test]
    fn test_canonical_name_stops_at_base_name() {
        let tag = tag_from_name("001_TRANSLUCENT_Box_UNLIT", 0);
        assert_eq!(tag.poly_type, PolyType::Translucent);
        assert!(tag.poly_flags.is_empty());
    }

    #[test]
    fn test_name_tag_idempotence() {
        for tag in all_tags() {
            let name = name_from_tag(&tag, "Mesh");
            assert_eq!(tag_from_name(&name, 99), tag, "name {name}");
        }
    }

    #[test]
    fn test_resolve_material_reuses_target() {
        let mut target = MaterialLibrary::new();
        let mut registry = MaterialLibrary::new();
        let tag = MaterialTag::default();

        let first = resolve_material(&tag, "Box", &mut target, &mut registry);
        let second = resolve_material(&tag, "Box", &mut target, &mut registry);
        assert_eq!(first, 0);
        assert_eq!(second, 0);
        assert_eq!(target.len(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(target.get(0), Some("000_NORMAL_Box"));
    }

    #[test]
    fn test_resolve_material_attaches_from_registry() {
        let mut target = MaterialLibrary::new();
        target.push("Existing");
        let mut registry = MaterialLibrary::new();
        registry.push("001_MASKED_Box");

        let tag = MaterialTag {
            texture_slot: 1,
            poly_type: PolyType::Masked,
            poly_flags: PolyFlags::empty(),
        };
        let index = resolve_material(&tag, "Box", &mut target, &mut registry);
        assert_eq!(index, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(target.names(), ["Existing", "001_MASKED_Box"]);
    }

    #[test]
    fn test_resolve_material_distinct_tags() {
        let mut target = MaterialLibrary::new();
        let mut registry = MaterialLibrary::new();
        let indices: Vec<_> = all_tags()
            .map(|tag| resolve_material(&tag, "Box", &mut target, &mut registry))
            .collect();
        assert_eq!(target.len(), indices.len());
        assert_eq!(registry.len(), indices.len());
    }
}
