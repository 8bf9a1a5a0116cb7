//! On-disk layout of mesh files
//!
//! ```text
//! header      "meshfile" | u8 attribute count | u64 vertex count | u64 index count
//! attribute   name\0 | u8 component type | u8 component count | u64 offset | u64 stride
//! vertices    vertex count * vertex size bytes
//! indices     index count * u32
//! ```
//!
//! All integers are in host byte order.

use geomstore_core::{AttributeKind, ComponentType, ElementShape};

use crate::error::CodecError;

pub const MAGIC: &[u8; 8] = b"meshfile";
pub const HEADER_SIZE: usize = 25;
/// Bytes following an attribute's name.
pub const DESCRIPTOR_SIZE: usize = 18;
/// Longest attribute name, not counting the terminating NUL.
pub const MAX_NAME_LEN: usize = 31;

/// Fixed-size header following the magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub attribute_count: u8,
    pub vertex_count: u64,
    pub index_count: u64,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..8].copy_from_slice(MAGIC);
        out[8] = self.attribute_count;
        out[9..17].copy_from_slice(&self.vertex_count.to_ne_bytes());
        out[17..25].copy_from_slice(&self.index_count.to_ne_bytes());
        out
    }

    /// Decode the 17 bytes that follow an already checked magic.
    pub fn decode(rest: &[u8; HEADER_SIZE - 8]) -> Self {
        Self {
            attribute_count: rest[0],
            vertex_count: read_u64(&rest[1..9]),
            index_count: read_u64(&rest[9..17]),
        }
    }
}

/// Where one attribute lives inside the vertex block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub kind: AttributeKind,
    pub shape: ElementShape,
    /// Byte offset of the first element within the vertex block.
    pub offset: u64,
    /// Distance in bytes between consecutive elements.
    pub stride: u64,
}

impl AttributeDescriptor {
    pub(crate) fn encode(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        out[0] = self.shape.component_type().code();
        out[1] = self.shape.components();
        out[2..10].copy_from_slice(&self.offset.to_ne_bytes());
        out[10..18].copy_from_slice(&self.stride.to_ne_bytes());
        out
    }

    pub(crate) fn decode(
        kind: AttributeKind,
        raw: &[u8; DESCRIPTOR_SIZE],
    ) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidShape {
            kind,
            component_type: raw[0],
            components: raw[1],
        };
        let component_type = ComponentType::from_code(raw[0]).ok_or_else(invalid)?;
        let shape = ElementShape::new(component_type, raw[1]).map_err(|_| invalid())?;
        Ok(Self {
            kind,
            shape,
            offset: read_u64(&raw[2..10]),
            stride: read_u64(&raw[10..18]),
        })
    }

    /// Byte range of the element at `vertex` within the vertex block.
    ///
    /// Only valid once the descriptor has passed [`MeshFileInfo::validate_layout`].
    pub(crate) fn element_range(&self, vertex: usize) -> std::ops::Range<usize> {
        let start = self.offset as usize + vertex * self.stride as usize;
        start..start + self.shape.element_size()
    }
}

/// Everything a mesh file declares before its data blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFileInfo {
    pub vertex_count: usize,
    pub index_count: usize,
    pub attributes: Vec<AttributeDescriptor>,
}

impl MeshFileInfo {
    /// Size of one vertex: the sum of all attributes' element sizes.
    pub fn vertex_size(&self) -> usize {
        self.attributes
            .iter()
            .map(|attribute| attribute.shape.element_size())
            .sum()
    }

    pub fn vertex_block_len(&self) -> Result<usize, CodecError> {
        self.vertex_count
            .checked_mul(self.vertex_size())
            .ok_or(CodecError::SizeOverflow("vertex block"))
    }

    pub fn index_block_len(&self) -> Result<usize, CodecError> {
        self.index_count
            .checked_mul(std::mem::size_of::<u32>())
            .ok_or(CodecError::SizeOverflow("index block"))
    }

    /// Check that every attribute's elements fall inside the vertex block.
    pub(crate) fn validate_layout(&self) -> Result<(), CodecError> {
        let block_len = self.vertex_block_len()?;
        let Some(last) = self.vertex_count.checked_sub(1) else {
            return Ok(());
        };
        for attribute in &self.attributes {
            let invalid = || CodecError::InvalidLayout {
                kind: attribute.kind,
                offset: attribute.offset,
                stride: attribute.stride,
                block_len,
            };
            let offset = usize::try_from(attribute.offset).map_err(|_| invalid())?;
            let stride = usize::try_from(attribute.stride).map_err(|_| invalid())?;
            let end = last
                .checked_mul(stride)
                .and_then(|start| start.checked_add(offset))
                .and_then(|start| start.checked_add(attribute.shape.element_size()))
                .ok_or_else(invalid)?;
            if end > block_len {
                return Err(invalid());
            }
        }
        Ok(())
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_ne_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(offset: u64, stride: u64) -> AttributeDescriptor {
        AttributeDescriptor {
            kind: AttributeKind::Position,
            shape: ElementShape::FLOAT3,
            offset,
            stride,
        }
    }

    #[test]
    fn header_layout() {
        let header = Header {
            attribute_count: 2,
            vertex_count: 4,
            index_count: 12,
        };
        let bytes = header.encode();
        assert_eq!(&bytes[..8], b"meshfile");
        assert_eq!(bytes[8], 2);
        assert_eq!(&bytes[9..17], &4u64.to_ne_bytes());

        let rest: [u8; HEADER_SIZE - 8] = bytes[8..].try_into().unwrap();
        assert_eq!(Header::decode(&rest), header);
    }

    #[test]
    fn descriptor_rejects_bad_shape() {
        let mut raw = descriptor(0, 12).encode();
        raw[1] = 5;
        assert!(matches!(
            AttributeDescriptor::decode(AttributeKind::Normal, &raw),
            Err(CodecError::InvalidShape {
                kind: AttributeKind::Normal,
                components: 5,
                ..
            })
        ));

        raw[1] = 3;
        raw[0] = 7;
        assert!(matches!(
            AttributeDescriptor::decode(AttributeKind::Normal, &raw),
            Err(CodecError::InvalidShape { component_type: 7, .. })
        ));
    }

    #[test]
    fn layout_bounds() {
        let mut info = MeshFileInfo {
            vertex_count: 4,
            index_count: 0,
            attributes: vec![descriptor(0, 12)],
        };
        assert!(info.validate_layout().is_ok());
        assert_eq!(info.attributes[0].element_range(3), 36..48);

        info.attributes[0] = descriptor(4, 12);
        assert!(matches!(
            info.validate_layout(),
            Err(CodecError::InvalidLayout { block_len: 48, .. })
        ));

        info.attributes[0] = descriptor(0, u64::MAX);
        assert!(info.validate_layout().is_err());
    }
}
