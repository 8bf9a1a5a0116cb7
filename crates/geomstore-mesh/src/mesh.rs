use geomstore_core::{AttributeKind, ElementShape, VertexElement};
use tracing::{debug, trace};

use crate::buffer::AttributeBuffer;
use crate::error::MeshError;

/// Vertex reference stored in a mesh's index array.
pub type Index = u32;

/// Columnar per-vertex geometry.
///
/// Owns at most one [`AttributeBuffer`] per [`AttributeKind`], in creation order,
/// plus an optional index array. Every buffer holds exactly
/// [`num_vertices`](Mesh::num_vertices) elements at all times.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    buffers: Vec<AttributeBuffer>,
    /// Maps `AttributeKind::ordinal()` to the buffer's position in `buffers`.
    slots: [Option<u8>; AttributeKind::ALL.len()],
    num_vertices: usize,
    indices: Vec<Index>,
}

impl Mesh {
    /// Create an empty mesh with no vertices and no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with `num_vertices` vertices and no attributes.
    pub fn with_vertices(num_vertices: usize) -> Self {
        Self {
            num_vertices,
            ..Self::default()
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_attributes(&self) -> usize {
        self.buffers.len()
    }

    fn slot(&self, kind: AttributeKind) -> Option<usize> {
        self.slots[kind.ordinal()].map(usize::from)
    }

    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        self.slot(kind).is_some()
    }

    // ---- Buffer creation ----

    /// Create a buffer of the given shape for `kind`, sized to the current vertex count.
    ///
    /// Fails with [`MeshError::DuplicateAttribute`] if the mesh already has one;
    /// existing buffers are left untouched.
    pub fn create_attribute_buffer(
        &mut self,
        kind: AttributeKind,
        shape: ElementShape,
    ) -> Result<&mut AttributeBuffer, MeshError> {
        if self.has_attribute(kind) {
            return Err(MeshError::DuplicateAttribute(kind));
        }
        let index = self.buffers.len();
        // At most one buffer per kind, so the position always fits.
        self.slots[kind.ordinal()] = Some(index as u8);
        self.buffers
            .push(AttributeBuffer::new(kind, shape, self.num_vertices));
        debug!("created {kind} buffer ({shape}) at index {index}");
        Ok(&mut self.buffers[index])
    }

    /// Typed variant of [`Mesh::create_attribute_buffer`] returning the new elements.
    pub fn create_attribute<T: VertexElement>(
        &mut self,
        kind: AttributeKind,
    ) -> Result<&mut [T], MeshError> {
        self.create_attribute_buffer(kind, T::SHAPE)?
            .as_mut_slice::<T>()
    }

    // ---- Buffer lookup ----

    pub fn buffer(&self, kind: AttributeKind) -> Result<&AttributeBuffer, MeshError> {
        let index = self.slot(kind).ok_or(MeshError::MissingAttribute(kind))?;
        Ok(&self.buffers[index])
    }

    pub fn buffer_mut(&mut self, kind: AttributeKind) -> Result<&mut AttributeBuffer, MeshError> {
        let index = self.slot(kind).ok_or(MeshError::MissingAttribute(kind))?;
        Ok(&mut self.buffers[index])
    }

    /// Buffer at creation ordinal `index`.
    pub fn buffer_at(&self, index: usize) -> Result<&AttributeBuffer, MeshError> {
        let count = self.buffers.len();
        self.buffers
            .get(index)
            .ok_or(MeshError::MissingAttributeIndex { index, count })
    }

    pub fn buffer_at_mut(&mut self, index: usize) -> Result<&mut AttributeBuffer, MeshError> {
        let count = self.buffers.len();
        self.buffers
            .get_mut(index)
            .ok_or(MeshError::MissingAttributeIndex { index, count })
    }

    /// All buffers in creation order.
    pub fn buffers(&self) -> impl ExactSizeIterator<Item = &AttributeBuffer> {
        self.buffers.iter()
    }

    /// Typed elements of `kind`.
    pub fn attribute<T: VertexElement>(&self, kind: AttributeKind) -> Result<&[T], MeshError> {
        self.buffer(kind)?.as_slice::<T>()
    }

    pub fn attribute_mut<T: VertexElement>(
        &mut self,
        kind: AttributeKind,
    ) -> Result<&mut [T], MeshError> {
        self.buffer_mut(kind)?.as_mut_slice::<T>()
    }

    /// Sum of all buffers' element sizes: the size of one interleaved vertex.
    pub fn vertex_size(&self) -> usize {
        self.buffers.iter().map(AttributeBuffer::element_size).sum()
    }

    // ---- Vertex count ----

    /// Set the shared vertex count and resize every buffer to match.
    ///
    /// Capacity for all buffers is reserved before any of them is touched, so on
    /// [`MeshError::Allocation`] the mesh is left exactly as it was.
    pub fn set_vertex_count(&mut self, num_vertices: usize) -> Result<(), MeshError> {
        for buffer in &mut self.buffers {
            buffer.reserve_for(num_vertices)?;
        }
        for buffer in &mut self.buffers {
            buffer.resize(num_vertices);
        }
        trace!(
            "vertex count {} -> {} across {} buffers",
            self.num_vertices,
            num_vertices,
            self.buffers.len()
        );
        self.num_vertices = num_vertices;
        Ok(())
    }

    // ---- Indices ----

    /// Index array; empty means the mesh is not indexed.
    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    /// Direct access to the index array. Values are not checked until
    /// [`Mesh::validate_indices`] runs (the writer always does).
    pub fn indices_mut(&mut self) -> &mut Vec<Index> {
        &mut self.indices
    }

    /// Replace the index array after checking every value against the vertex count.
    pub fn set_indices(&mut self, indices: Vec<Index>) -> Result<(), MeshError> {
        check_indices(&indices, self.num_vertices)?;
        self.indices = indices;
        Ok(())
    }

    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Check that every index refers to an existing vertex.
    pub fn validate_indices(&self) -> Result<(), MeshError> {
        check_indices(&self.indices, self.num_vertices)
    }
}

fn check_indices(indices: &[Index], vertex_count: usize) -> Result<(), MeshError> {
    match indices
        .iter()
        .position(|&value| value as usize >= vertex_count)
    {
        Some(position) => Err(MeshError::IndexOutOfRange {
            position,
            value: indices[position],
            vertex_count,
        }),
        None => Ok(()),
    }
}
