use std::path::PathBuf;

use geomstore_core::AttributeKind;
use geomstore_mesh::MeshError;

/// Errors that can occur while reading or writing mesh files.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot open mesh file '{0}': {1}")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("mesh file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("file does not have a valid mesh file ID (found {0:?})")]
    BadMagic([u8; 8]),

    #[error("no conversion defined for attribute name: {0:?}")]
    UnknownAttribute(String),

    #[error("attribute name longer than {max} bytes", max = crate::format::MAX_NAME_LEN)]
    AttributeNameTooLong,

    #[error("{kind} attribute has invalid shape: component type {component_type}, {components} components")]
    InvalidShape {
        kind: AttributeKind,
        component_type: u8,
        components: u8,
    },

    #[error("{0} attribute listed more than once")]
    DuplicateAttribute(AttributeKind),

    #[error("{kind} attribute (offset {offset}, stride {stride}) reads past the {block_len}-byte vertex block")]
    InvalidLayout {
        kind: AttributeKind,
        offset: u64,
        stride: u64,
        block_len: usize,
    },

    #[error("index {value} at position {position} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        value: u32,
        vertex_count: usize,
    },

    #[error("{0} too large for this platform")]
    SizeOverflow(&'static str),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl CodecError {
    /// Whether the input was not a well-formed mesh file, as opposed to an I/O
    /// failure or an invalid mesh handed to the writer.
    pub fn is_corrupt_format(&self) -> bool {
        matches!(
            self,
            Self::BadMagic(_)
                | Self::UnknownAttribute(_)
                | Self::AttributeNameTooLong
                | Self::InvalidShape { .. }
                | Self::DuplicateAttribute(_)
                | Self::InvalidLayout { .. }
                | Self::IndexOutOfRange { .. }
                | Self::SizeOverflow(_)
        )
    }
}
