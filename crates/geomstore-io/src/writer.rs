use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use geomstore_mesh::Mesh;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CodecError;
use crate::format::{AttributeDescriptor, Header, MeshFileInfo};

/// How attribute data is arranged in the vertex block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteScheme {
    /// One record per vertex holding every attribute back to back.
    #[default]
    Interleaved,
    /// Each attribute's full array, one after another.
    NonInterleaved,
}

impl FromStr for WriteScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interleaved" => Ok(Self::Interleaved),
            "non-interleaved" => Ok(Self::NonInterleaved),
            other => Err(format!(
                "unknown write scheme '{other}' (expected 'interleaved' or 'non-interleaved')"
            )),
        }
    }
}

impl MeshFileInfo {
    /// Describe how `mesh` is laid out when written with `scheme`.
    pub fn describe(mesh: &Mesh, scheme: WriteScheme) -> Self {
        let vertex_size = mesh.vertex_size() as u64;
        let num_vertices = mesh.num_vertices() as u64;
        let mut offset = 0u64;

        let attributes = mesh
            .buffers()
            .map(|buffer| {
                let element_size = buffer.element_size() as u64;
                let (stride, advance) = match scheme {
                    WriteScheme::Interleaved => (vertex_size, element_size),
                    WriteScheme::NonInterleaved => (element_size, element_size * num_vertices),
                };
                let descriptor = AttributeDescriptor {
                    kind: buffer.kind(),
                    shape: buffer.shape(),
                    offset,
                    stride,
                };
                offset += advance;
                descriptor
            })
            .collect();

        Self {
            vertex_count: mesh.num_vertices(),
            index_count: mesh.indices().len(),
            attributes,
        }
    }
}

/// Encodes meshes into the binary mesh format.
pub struct MeshWriter<W: Write> {
    inner: W,
}

impl MeshWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| CodecError::Open(path.to_path_buf(), e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> MeshWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write `mesh` as one complete file and flush.
    ///
    /// The index array is validated before anything is written. If writing fails
    /// partway, the output is truncated and must be discarded.
    pub fn write_mesh(&mut self, mesh: &Mesh, scheme: WriteScheme) -> Result<(), CodecError> {
        mesh.validate_indices()?;

        let info = MeshFileInfo::describe(mesh, scheme);
        let header = Header {
            // A mesh holds at most one buffer per attribute kind.
            attribute_count: info.attributes.len() as u8,
            vertex_count: info.vertex_count as u64,
            index_count: info.index_count as u64,
        };
        info!(
            "writing mesh: {} attributes, {} vertices, {} indices ({scheme:?})",
            header.attribute_count, header.vertex_count, header.index_count
        );

        self.inner.write_all(&header.encode())?;
        for descriptor in &info.attributes {
            debug!(
                "{}: {} at offset {}, stride {}",
                descriptor.kind, descriptor.shape, descriptor.offset, descriptor.stride
            );
            self.inner.write_all(descriptor.kind.wire_name().as_bytes())?;
            self.inner.write_all(&[0])?;
            self.inner.write_all(&descriptor.encode())?;
        }

        match scheme {
            WriteScheme::Interleaved => self.write_interleaved(mesh)?,
            WriteScheme::NonInterleaved => {
                for buffer in mesh.buffers() {
                    self.inner.write_all(buffer.bytes())?;
                }
            }
        }

        if mesh.has_indices() {
            self.inner.write_all(bytemuck::cast_slice(mesh.indices()))?;
        }
        self.inner.flush()?;
        Ok(())
    }

    fn write_interleaved(&mut self, mesh: &Mesh) -> Result<(), CodecError> {
        let mut record = Vec::with_capacity(mesh.vertex_size());
        for vertex in 0..mesh.num_vertices() {
            record.clear();
            for buffer in mesh.buffers() {
                record.extend_from_slice(buffer.element_bytes(vertex)?);
            }
            self.inner.write_all(&record)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Write `mesh` to a new file at `path`.
pub fn write_mesh_file(
    path: impl AsRef<Path>,
    mesh: &Mesh,
    scheme: WriteScheme,
) -> Result<(), CodecError> {
    MeshWriter::create(path)?.write_mesh(mesh, scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomstore_mesh::{AttributeKind, ElementShape, PackedMesh, VertexLayout};
    use glam::{Vec2, Vec3};

    #[test]
    fn scheme_names() {
        assert_eq!("interleaved".parse::<WriteScheme>(), Ok(WriteScheme::Interleaved));
        assert_eq!("non-interleaved".parse::<WriteScheme>(), Ok(WriteScheme::NonInterleaved));
        assert!("planar".parse::<WriteScheme>().is_err());
    }

    #[test]
    fn describe_offsets_per_scheme() {
        let mut mesh = Mesh::with_vertices(4);
        mesh.create_attribute_buffer(AttributeKind::Position, ElementShape::FLOAT3)
            .unwrap();
        mesh.create_attribute_buffer(AttributeKind::TexCoord, ElementShape::FLOAT2)
            .unwrap();

        let interleaved = MeshFileInfo::describe(&mesh, WriteScheme::Interleaved);
        let offsets: Vec<_> = interleaved
            .attributes
            .iter()
            .map(|a| (a.offset, a.stride))
            .collect();
        assert_eq!(offsets, vec![(0, 20), (12, 20)]);

        let planar = MeshFileInfo::describe(&mesh, WriteScheme::NonInterleaved);
        let offsets: Vec<_> = planar.attributes.iter().map(|a| (a.offset, a.stride)).collect();
        assert_eq!(offsets, vec![(0, 12), (48, 8)]);
        assert_eq!(planar.vertex_block_len().unwrap(), 80);
    }

    #[test]
    fn interleaved_block_matches_packed_vertices() {
        let mut mesh = Mesh::with_vertices(3);
        mesh.create_attribute::<Vec3>(AttributeKind::Position)
            .unwrap()
            .copy_from_slice(&[Vec3::X, Vec3::Y, Vec3::new(1.0, 2.0, 3.0)]);
        mesh.create_attribute::<[u32; 4]>(AttributeKind::BoneIndices)
            .unwrap()
            .copy_from_slice(&[[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]]);
        mesh.create_attribute::<Vec2>(AttributeKind::TexCoord)
            .unwrap()
            .copy_from_slice(&[Vec2::ZERO, Vec2::X, Vec2::new(0.5, 0.25)]);
        mesh.set_indices(vec![0, 1, 2]).unwrap();

        let mut writer = MeshWriter::new(Vec::new());
        writer.write_mesh(&mesh, WriteScheme::Interleaved).unwrap();
        let bytes = writer.into_inner();

        let info = MeshFileInfo::describe(&mesh, WriteScheme::Interleaved);
        let block_len = info.vertex_block_len().unwrap();
        let block_end = bytes.len() - info.index_block_len().unwrap();
        let block = &bytes[block_end - block_len..block_end];

        let packed = PackedMesh::pack(&mesh, &VertexLayout::from_mesh(&mesh), 0).unwrap();
        assert_eq!(packed.stride, 36);
        assert_eq!(packed.vertices.as_slice(), block);
        assert_eq!(packed.indices, mesh.indices());
    }

    #[test]
    fn rejects_bad_indices_before_writing() {
        let mut mesh = Mesh::with_vertices(2);
        mesh.create_attribute_buffer(AttributeKind::Position, ElementShape::FLOAT3)
            .unwrap();
        mesh.indices_mut().extend([0, 1, 2]);

        let mut writer = MeshWriter::new(Vec::new());
        let err = writer.write_mesh(&mesh, WriteScheme::Interleaved).unwrap_err();
        assert!(matches!(err, CodecError::Mesh(_)));
        assert!(!err.is_corrupt_format());
        assert!(writer.into_inner().is_empty());
    }
}
