//! Packing mesh attributes into interleaved vertex blocks for upload
//!
//! The renderer owns GPU vertex/index buffers and hands out a block per mesh
//! (a byte range plus the first vertex slot). This module fills such a block:
//! the attributes named by a [`VertexLayout`] are interleaved per vertex, and the
//! mesh's indices are rebased onto the block's first vertex.

use geomstore_core::{AttributeKind, ElementShape};
use tracing::debug;

use crate::buffer::AttributeBuffer;
use crate::error::MeshError;
use crate::mesh::{Index, Mesh};

/// One attribute slot in an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexMember {
    pub kind: AttributeKind,
    pub shape: ElementShape,
    /// Byte offset within one vertex.
    pub offset: usize,
}

/// Ordered attribute layout expected by a renderer's vertex input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    members: Vec<VertexMember>,
    stride: usize,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute after the ones already in the layout.
    pub fn with_attribute(mut self, kind: AttributeKind, shape: ElementShape) -> Self {
        self.members.push(VertexMember {
            kind,
            shape,
            offset: self.stride,
        });
        self.stride += shape.element_size();
        self
    }

    /// Layout matching every buffer of `mesh`, in creation order.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        mesh.buffers().fold(Self::new(), |layout, buffer| {
            layout.with_attribute(buffer.kind(), buffer.shape())
        })
    }

    pub fn members(&self) -> &[VertexMember] {
        &self.members
    }

    /// Size of one interleaved vertex in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn offset_of(&self, kind: AttributeKind) -> Option<usize> {
        self.members
            .iter()
            .find(|member| member.kind == kind)
            .map(|member| member.offset)
    }

    /// Check that `mesh` has a buffer of the expected shape for every member.
    pub fn validate(&self, mesh: &Mesh) -> Result<(), MeshError> {
        self.resolve(mesh).map(|_| ())
    }

    fn resolve<'m>(&self, mesh: &'m Mesh) -> Result<Vec<&'m AttributeBuffer>, MeshError> {
        self.members
            .iter()
            .map(|member| {
                let buffer = mesh.buffer(member.kind)?;
                if buffer.shape() != member.shape {
                    return Err(MeshError::TypeMismatch {
                        kind: member.kind,
                        expected: member.shape,
                        actual: buffer.shape(),
                    });
                }
                Ok(buffer)
            })
            .collect()
    }
}

/// A mesh packed for upload: interleaved vertex bytes and rebased indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedMesh {
    pub vertices: Vec<u8>,
    pub indices: Vec<Index>,
    pub stride: usize,
}

impl PackedMesh {
    /// Pack `mesh` according to `layout`, adding `base_vertex` to every index.
    pub fn pack(mesh: &Mesh, layout: &VertexLayout, base_vertex: u32) -> Result<Self, MeshError> {
        let mut vertices = vec![0u8; mesh.num_vertices() * layout.stride()];
        let mut indices = vec![0; mesh.indices().len()];
        pack_into(mesh, layout, base_vertex, &mut vertices, &mut indices)?;
        Ok(Self {
            vertices,
            indices,
            stride: layout.stride(),
        })
    }
}

/// Pack `mesh` into caller-provided destinations, typically mapped GPU memory.
///
/// `vertex_dst` must hold exactly `num_vertices * layout.stride()` bytes and
/// `index_dst` exactly as many indices as the mesh has; otherwise
/// [`MeshError::DestinationSize`] is returned and nothing is written.
pub fn pack_into(
    mesh: &Mesh,
    layout: &VertexLayout,
    base_vertex: u32,
    vertex_dst: &mut [u8],
    index_dst: &mut [Index],
) -> Result<(), MeshError> {
    let buffers = layout.resolve(mesh)?;
    let stride = layout.stride();

    let expected = mesh.num_vertices() * stride;
    if vertex_dst.len() != expected {
        return Err(MeshError::DestinationSize {
            what: "vertex",
            expected,
            actual: vertex_dst.len(),
        });
    }
    if index_dst.len() != mesh.indices().len() {
        return Err(MeshError::DestinationSize {
            what: "index",
            expected: mesh.indices().len(),
            actual: index_dst.len(),
        });
    }

    if stride > 0 {
        for (vertex, record) in vertex_dst.chunks_exact_mut(stride).enumerate() {
            for (member, buffer) in layout.members().iter().zip(&buffers) {
                let size = member.shape.element_size();
                record[member.offset..member.offset + size]
                    .copy_from_slice(buffer.element_bytes(vertex)?);
            }
        }
    }

    for (position, (dst, &index)) in index_dst.iter_mut().zip(mesh.indices()).enumerate() {
        *dst = index
            .checked_add(base_vertex)
            .ok_or(MeshError::IndexOutOfRange {
                position,
                value: index,
                vertex_count: (u32::MAX - base_vertex) as usize,
            })?;
    }

    debug!(
        "packed {} vertices ({} bytes each) and {} indices at base vertex {}",
        mesh.num_vertices(),
        stride,
        index_dst.len(),
        base_vertex
    );
    Ok(())
}
