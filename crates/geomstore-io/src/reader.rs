use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use geomstore_core::AttributeKind;
use geomstore_mesh::{Index, Mesh, MeshError};
use tracing::{debug, info};

use crate::error::CodecError;
use crate::format::{
    AttributeDescriptor, Header, MeshFileInfo, DESCRIPTOR_SIZE, HEADER_SIZE, MAGIC, MAX_NAME_LEN,
};

/// Decodes meshes from the binary mesh format.
pub struct MeshReader<R: Read> {
    inner: R,
}

impl MeshReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CodecError::Open(path.to_path_buf(), e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> MeshReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read a complete mesh: header, attribute table, vertex and index blocks.
    pub fn read_mesh(&mut self) -> Result<Mesh, CodecError> {
        let info = self.read_info()?;
        self.read_body(&info)
    }

    /// Read the header and attribute table without touching the data blocks.
    pub fn read_info(&mut self) -> Result<MeshFileInfo, CodecError> {
        let mut magic = [0u8; 8];
        self.inner.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CodecError::BadMagic(magic));
        }

        let mut rest = [0u8; HEADER_SIZE - 8];
        self.inner.read_exact(&mut rest)?;
        let header = Header::decode(&rest);

        let vertex_count = usize::try_from(header.vertex_count)
            .map_err(|_| CodecError::SizeOverflow("vertex count"))?;
        let index_count = usize::try_from(header.index_count)
            .map_err(|_| CodecError::SizeOverflow("index count"))?;

        let mut attributes: Vec<AttributeDescriptor> =
            Vec::with_capacity(usize::from(header.attribute_count));
        for _ in 0..header.attribute_count {
            let name = self.read_name()?;
            let kind =
                AttributeKind::from_wire_name(&name).ok_or(CodecError::UnknownAttribute(name))?;
            if attributes.iter().any(|attribute| attribute.kind == kind) {
                return Err(CodecError::DuplicateAttribute(kind));
            }

            let mut raw = [0u8; DESCRIPTOR_SIZE];
            self.inner.read_exact(&mut raw)?;
            let descriptor = AttributeDescriptor::decode(kind, &raw)?;
            debug!(
                "{}: {} at offset {}, stride {}",
                kind, descriptor.shape, descriptor.offset, descriptor.stride
            );
            attributes.push(descriptor);
        }

        let info = MeshFileInfo {
            vertex_count,
            index_count,
            attributes,
        };
        info.validate_layout()?;
        info.index_block_len()?;
        Ok(info)
    }

    /// Read the vertex and index blocks described by `info`.
    pub fn read_body(&mut self, info: &MeshFileInfo) -> Result<Mesh, CodecError> {
        info.validate_layout()?;
        let block = self.read_block(info.vertex_block_len()?)?;

        let mut mesh = Mesh::with_vertices(info.vertex_count);
        for descriptor in &info.attributes {
            let buffer = mesh
                .create_attribute_buffer(descriptor.kind, descriptor.shape)
                .map_err(|e| match e {
                    MeshError::DuplicateAttribute(kind) => CodecError::DuplicateAttribute(kind),
                    other => CodecError::Mesh(other),
                })?;

            // No vertices: nothing to scatter, and the descriptor's offset was never bounded.
            if buffer.is_empty() {
                continue;
            }
            let element_size = descriptor.shape.element_size();
            if descriptor.stride as usize == element_size {
                let start = descriptor.offset as usize;
                let len = buffer.bytes().len();
                buffer
                    .bytes_mut()
                    .copy_from_slice(&block[start..start + len]);
            } else {
                for (vertex, dst) in buffer.bytes_mut().chunks_exact_mut(element_size).enumerate() {
                    dst.copy_from_slice(&block[descriptor.element_range(vertex)]);
                }
            }
        }

        if info.index_count > 0 {
            let bytes = self.read_block(info.index_block_len()?)?;
            let indices: Vec<Index> = bytes
                .chunks_exact(std::mem::size_of::<Index>())
                .map(|chunk| Index::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            mesh.set_indices(indices).map_err(|e| match e {
                MeshError::IndexOutOfRange {
                    position,
                    value,
                    vertex_count,
                } => CodecError::IndexOutOfRange {
                    position,
                    value,
                    vertex_count,
                },
                other => CodecError::Mesh(other),
            })?;
        }

        info!(
            "read mesh: {} attributes, {} vertices, {} indices",
            mesh.num_attributes(),
            mesh.num_vertices(),
            mesh.indices().len()
        );
        Ok(mesh)
    }

    /// Read a NUL-terminated attribute name.
    fn read_name(&mut self) -> Result<String, CodecError> {
        let mut name = Vec::with_capacity(MAX_NAME_LEN);
        loop {
            let mut byte = [0u8; 1];
            self.inner.read_exact(&mut byte)?;
            match byte[0] {
                0 => break,
                _ if name.len() == MAX_NAME_LEN => return Err(CodecError::AttributeNameTooLong),
                b => name.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    /// Read exactly `len` bytes, growing the buffer only as data arrives so a
    /// bogus count in a short file ends in EOF instead of a huge allocation.
    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        let mut block = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut block)?;
        if block.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, file ended after {}", block.len()),
            )
            .into());
        }
        Ok(block)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Read the mesh stored in the file at `path`.
pub fn read_mesh_file(path: impl AsRef<Path>) -> Result<Mesh, CodecError> {
    MeshReader::open(path)?.read_mesh()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use geomstore_mesh::ElementShape;
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::writer::{write_mesh_file, MeshWriter, WriteScheme};

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::with_vertices(4);
        mesh.create_attribute::<Vec3>(AttributeKind::Position)
            .unwrap()
            .copy_from_slice(&[
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(0.0, -1.0, -1.0),
                Vec3::new(0.0, 1.0, 1.0),
            ]);
        mesh.create_attribute::<Vec2>(AttributeKind::TexCoord)
            .unwrap()
            .fill(Vec2::ZERO);
        mesh.set_indices(vec![0, 1, 2, 0, 3, 1, 1, 3, 2, 2, 3, 0])
            .unwrap();
        mesh
    }

    fn encode(mesh: &Mesh, scheme: WriteScheme) -> Vec<u8> {
        let mut writer = MeshWriter::new(Vec::new());
        writer.write_mesh(mesh, scheme).unwrap();
        writer.into_inner()
    }

    fn decode(bytes: &[u8]) -> Result<Mesh, CodecError> {
        MeshReader::new(Cursor::new(bytes)).read_mesh()
    }

    /// Mesh with one buffer per kind, cycling through all twelve shapes.
    fn patterned(shapes: &[ElementShape]) -> Mesh {
        let mut mesh = Mesh::with_vertices(5);
        for (&kind, &shape) in AttributeKind::ALL.iter().zip(shapes) {
            let buffer = mesh.create_attribute_buffer(kind, shape).unwrap();
            for (i, byte) in buffer.bytes_mut().iter_mut().enumerate() {
                *byte = (i * 7 + kind.ordinal() * 31) as u8;
            }
        }
        mesh.set_indices(vec![4, 0, 3, 1, 2]).unwrap();
        mesh
    }

    /// Float patterns may be NaN, so compare bytes rather than values.
    fn assert_same_bits(a: &Mesh, b: &Mesh) {
        assert_eq!(a.num_vertices(), b.num_vertices());
        assert_eq!(a.indices(), b.indices());
        assert_eq!(a.num_attributes(), b.num_attributes());
        for (x, y) in a.buffers().zip(b.buffers()) {
            assert_eq!((x.kind(), x.shape()), (y.kind(), y.shape()));
            assert_eq!(x.bytes(), y.bytes(), "{}", x.kind());
        }
    }

    #[test]
    fn every_shape_survives_both_schemes() {
        for shapes in ElementShape::ALL.chunks(AttributeKind::ALL.len()) {
            let mesh = patterned(shapes);
            for scheme in [WriteScheme::Interleaved, WriteScheme::NonInterleaved] {
                let decoded = decode(&encode(&mesh, scheme)).unwrap();
                assert_same_bits(&decoded, &mesh);
            }
        }
    }

    #[test]
    fn tetrahedron_interleaved_layout() {
        let mesh = tetrahedron();
        let bytes = encode(&mesh, WriteScheme::Interleaved);

        let names = b"position\0".len() + b"texCoord\0".len();
        let table = names + 2 * DESCRIPTOR_SIZE;
        assert_eq!(bytes.len(), HEADER_SIZE + table + 80 + 12 * 4);

        let info = MeshReader::new(Cursor::new(&bytes)).read_info().unwrap();
        assert_eq!(info.vertex_count, 4);
        assert_eq!(info.index_count, 12);
        assert_eq!(info.vertex_block_len().unwrap(), 80);

        // Second vertex starts with its position.
        let block = &bytes[HEADER_SIZE + table..];
        let x = f32::from_ne_bytes(block[20..24].try_into().unwrap());
        assert_eq!(x, 1.0);

        assert_eq!(decode(&bytes).unwrap(), mesh);
    }

    #[test]
    fn unindexed_mesh_has_no_index_block() {
        let mut mesh = tetrahedron();
        mesh.indices_mut().clear();
        let bytes = encode(&mesh, WriteScheme::NonInterleaved);
        let decoded = decode(&bytes).unwrap();
        assert!(!decoded.has_indices());
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn empty_mesh() {
        let mesh = Mesh::new();
        let bytes = encode(&mesh, WriteScheme::Interleaved);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(decode(&bytes).unwrap(), mesh);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        bytes[..8].copy_from_slice(b"notamesh");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::BadMagic(m) if &m == b"notamesh"));
        assert!(err.is_corrupt_format());
    }

    #[test]
    fn bad_magic_checked_before_header() {
        let err = decode(b"MESHFILE").unwrap_err();
        assert!(matches!(err, CodecError::BadMagic(_)));
    }

    #[test]
    fn unknown_attribute_name() {
        let mut bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        // Exact match only.
        bytes[HEADER_SIZE..HEADER_SIZE + 8].copy_from_slice(b"Position");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(&err, CodecError::UnknownAttribute(name) if name == "Position"));
        assert!(err.is_corrupt_format());
    }

    #[test]
    fn overlong_attribute_name() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.push(1);
        bytes.extend_from_slice(&0u64.to_ne_bytes());
        bytes.extend_from_slice(&0u64.to_ne_bytes());
        bytes.extend_from_slice(&[b'a'; 40]);
        bytes.push(0);
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::AttributeNameTooLong)
        ));
    }

    #[test]
    fn zero_vertices_ignore_attribute_offsets() {
        for offset in [1000u64, u64::MAX] {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(MAGIC);
            bytes.push(1);
            bytes.extend_from_slice(&0u64.to_ne_bytes());
            bytes.extend_from_slice(&0u64.to_ne_bytes());
            bytes.extend_from_slice(b"position\0");
            bytes.extend_from_slice(&[0, 3]);
            bytes.extend_from_slice(&offset.to_ne_bytes());
            bytes.extend_from_slice(&12u64.to_ne_bytes());

            let mesh = decode(&bytes).unwrap();
            assert_eq!(mesh.num_vertices(), 0);
            let buffer = mesh.buffer(AttributeKind::Position).unwrap();
            assert_eq!(buffer.shape(), ElementShape::FLOAT3);
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn zero_vertex_mesh_with_attributes() {
        let mut mesh = Mesh::new();
        mesh.create_attribute::<Vec3>(AttributeKind::Position).unwrap();
        mesh.create_attribute::<Vec2>(AttributeKind::TexCoord).unwrap();
        for scheme in [WriteScheme::Interleaved, WriteScheme::NonInterleaved] {
            assert_eq!(decode(&encode(&mesh, scheme)).unwrap(), mesh);
        }
    }

    #[test]
    fn invalid_component_count() {
        let mut bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        let count_at = HEADER_SIZE + b"position\0".len() + 1;
        bytes[count_at] = 0;
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::InvalidShape {
                kind: AttributeKind::Position,
                components: 0,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_attribute_in_table() {
        let mut bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        let second = HEADER_SIZE + b"position\0".len() + DESCRIPTOR_SIZE;
        bytes[second..second + 8].copy_from_slice(b"position");
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::DuplicateAttribute(AttributeKind::Position))
        ));
    }

    #[test]
    fn layout_outside_vertex_block() {
        let mut bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        let offset_at = HEADER_SIZE + b"position\0".len() + 2;
        bytes[offset_at..offset_at + 8].copy_from_slice(&1000u64.to_ne_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidLayout {
                kind: AttributeKind::Position,
                offset: 1000,
                ..
            }
        ));
    }

    #[test]
    fn index_out_of_range() {
        let mut bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        let last = bytes.len() - 4;
        bytes[last..].copy_from_slice(&9u32.to_ne_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::IndexOutOfRange {
                position: 11,
                value: 9,
                vertex_count: 4,
            })
        ));
    }

    #[test]
    fn truncated_file_is_io_error() {
        let bytes = encode(&tetrahedron(), WriteScheme::Interleaved);
        for len in [4, HEADER_SIZE + 3, bytes.len() - 50, bytes.len() - 1] {
            let err = decode(&bytes[..len]).unwrap_err();
            assert!(
                matches!(&err, CodecError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof),
                "len {len}: {err}"
            );
            assert!(!err.is_corrupt_format());
        }
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("geomstore-{}.mesh", uuid::Uuid::new_v4()));
        let mesh = tetrahedron();
        write_mesh_file(&path, &mesh, WriteScheme::NonInterleaved).unwrap();
        let decoded = read_mesh_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(decoded.unwrap(), mesh);
    }

    #[test]
    fn missing_file() {
        let path = std::env::temp_dir().join(format!("geomstore-{}.mesh", uuid::Uuid::new_v4()));
        assert!(matches!(read_mesh_file(&path), Err(CodecError::Open(..))));
    }
}
