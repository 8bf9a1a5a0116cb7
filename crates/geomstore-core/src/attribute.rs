//! Semantic roles of per-vertex attributes

use std::fmt;

/// Semantic role of a per-vertex value. A mesh holds at most one buffer per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    Position,
    Normal,
    Color,
    TexCoord,
    BoneIndices,
    BoneWeights,
}

impl AttributeKind {
    pub const ALL: [Self; 6] = [
        Self::Position,
        Self::Normal,
        Self::Color,
        Self::TexCoord,
        Self::BoneIndices,
        Self::BoneWeights,
    ];

    /// Dense index of this kind, `0..ALL.len()`.
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Position => 0,
            Self::Normal => 1,
            Self::Color => 2,
            Self::TexCoord => 3,
            Self::BoneIndices => 4,
            Self::BoneWeights => 5,
        }
    }

    /// Name stored in mesh files.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::Color => "color",
            Self::TexCoord => "texCoord",
            Self::BoneIndices => "boneInds",
            Self::BoneWeights => "boneWeights",
        }
    }

    /// Exact-match lookup of a mesh file attribute name.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_name() == name)
    }

    /// Human-readable name used in diagnostics.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Normal => "Normal",
            Self::Color => "Color",
            Self::TexCoord => "Texture coordinate",
            Self::BoneIndices => "Bone indices",
            Self::BoneWeights => "Bone weights",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
