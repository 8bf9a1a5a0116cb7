use bytemuck::Zeroable;
use geomstore_core::{AttributeKind, ComponentType, ElementShape, VertexElement};

use crate::error::MeshError;

/// Typed storage, one variant per supported element shape.
#[derive(Debug, Clone, PartialEq)]
enum Storage {
    Float(Vec<f32>),
    Float2(Vec<[f32; 2]>),
    Float3(Vec<[f32; 3]>),
    Float4(Vec<[f32; 4]>),
    Int(Vec<i32>),
    Int2(Vec<[i32; 2]>),
    Int3(Vec<[i32; 3]>),
    Int4(Vec<[i32; 4]>),
    Uint(Vec<u32>),
    Uint2(Vec<[u32; 2]>),
    Uint3(Vec<[u32; 3]>),
    Uint4(Vec<[u32; 4]>),
}

/// Runs `$body` with `$vec` bound to the variant's vector, whatever its element type.
macro_rules! with_storage {
    ($storage:expr, $vec:ident => $body:expr) => {
        match $storage {
            Storage::Float($vec) => $body,
            Storage::Float2($vec) => $body,
            Storage::Float3($vec) => $body,
            Storage::Float4($vec) => $body,
            Storage::Int($vec) => $body,
            Storage::Int2($vec) => $body,
            Storage::Int3($vec) => $body,
            Storage::Int4($vec) => $body,
            Storage::Uint($vec) => $body,
            Storage::Uint2($vec) => $body,
            Storage::Uint3($vec) => $body,
            Storage::Uint4($vec) => $body,
        }
    };
}

fn zeroed<T: Zeroable + Clone>(len: usize) -> Vec<T> {
    vec![T::zeroed(); len]
}

impl Storage {
    fn new(shape: ElementShape, len: usize) -> Self {
        use ComponentType::{Float, Int, Uint};
        match (shape.component_type(), shape.components()) {
            (Float, 1) => Self::Float(zeroed(len)),
            (Float, 2) => Self::Float2(zeroed(len)),
            (Float, 3) => Self::Float3(zeroed(len)),
            (Float, 4) => Self::Float4(zeroed(len)),
            (Int, 1) => Self::Int(zeroed(len)),
            (Int, 2) => Self::Int2(zeroed(len)),
            (Int, 3) => Self::Int3(zeroed(len)),
            (Int, 4) => Self::Int4(zeroed(len)),
            (Uint, 1) => Self::Uint(zeroed(len)),
            (Uint, 2) => Self::Uint2(zeroed(len)),
            (Uint, 3) => Self::Uint3(zeroed(len)),
            (Uint, 4) => Self::Uint4(zeroed(len)),
            (_, count) => unreachable!("element shapes have 1-4 components, got {count}"),
        }
    }

    fn len(&self) -> usize {
        with_storage!(self, v => v.len())
    }

    fn resize(&mut self, len: usize) {
        with_storage!(self, v => v.resize(len, Zeroable::zeroed()))
    }

    fn try_reserve_len(&mut self, len: usize) -> Result<(), std::collections::TryReserveError> {
        with_storage!(self, v => v.try_reserve(len.saturating_sub(v.len())))
    }

    fn bytes(&self) -> &[u8] {
        with_storage!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        with_storage!(self, v => bytemuck::cast_slice_mut(v.as_mut_slice()))
    }
}

/// Homogeneous storage for one vertex attribute.
///
/// The buffer describes its own binary layout through its [`ElementShape`], so
/// owners can move bytes around without knowing the element type. Typed access
/// is granted only to [`VertexElement`] types whose shape matches the stored one.
///
/// Element count always equals the owning [`Mesh`](crate::Mesh)'s vertex count;
/// only the mesh can resize a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuffer {
    kind: AttributeKind,
    shape: ElementShape,
    storage: Storage,
}

impl AttributeBuffer {
    pub(crate) fn new(kind: AttributeKind, shape: ElementShape, len: usize) -> Self {
        Self {
            kind,
            shape,
            storage: Storage::new(shape, len),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.shape.element_size()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow (zero-filled) or shrink to `len` elements, keeping the existing prefix.
    ///
    /// Any raw pointer previously obtained from this buffer is invalidated.
    pub(crate) fn resize(&mut self, len: usize) {
        self.storage.resize(len);
    }

    /// Reserve capacity for `len` elements without changing the contents.
    pub(crate) fn reserve_for(&mut self, len: usize) -> Result<(), MeshError> {
        self.storage
            .try_reserve_len(len)
            .map_err(|source| MeshError::Allocation {
                kind: self.kind,
                count: len,
                source,
            })
    }

    /// All elements as raw bytes in host byte order.
    pub fn bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    /// Mutable raw bytes. Writes go straight into the typed storage.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.storage.bytes_mut()
    }

    /// Raw bytes of element `index`.
    pub fn element_bytes(&self, index: usize) -> Result<&[u8], MeshError> {
        let range = self.element_range(index)?;
        Ok(&self.bytes()[range])
    }

    /// Mutable raw bytes of element `index`.
    pub fn element_bytes_mut(&mut self, index: usize) -> Result<&mut [u8], MeshError> {
        let range = self.element_range(index)?;
        Ok(&mut self.bytes_mut()[range])
    }

    /// Pointer to the first byte, for upload paths that take a raw address.
    ///
    /// Invalidated by any later resize of the owning mesh.
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes().as_ptr()
    }

    fn element_range(&self, index: usize) -> Result<std::ops::Range<usize>, MeshError> {
        let len = self.len();
        if index >= len {
            return Err(MeshError::ElementOutOfRange {
                kind: self.kind,
                index,
                len,
            });
        }
        let size = self.element_size();
        Ok(index * size..(index + 1) * size)
    }

    fn check_shape<T: VertexElement>(&self) -> Result<(), MeshError> {
        if T::SHAPE != self.shape {
            return Err(MeshError::TypeMismatch {
                kind: self.kind,
                expected: T::SHAPE,
                actual: self.shape,
            });
        }
        Ok(())
    }

    /// View the elements as `T`. Fails with [`MeshError::TypeMismatch`] unless
    /// `T::SHAPE` equals the stored shape.
    pub fn as_slice<T: VertexElement>(&self) -> Result<&[T], MeshError> {
        self.check_shape::<T>()?;
        bytemuck::try_cast_slice(self.bytes()).map_err(|_| MeshError::TypeMismatch {
            kind: self.kind,
            expected: T::SHAPE,
            actual: self.shape,
        })
    }

    /// Mutable counterpart of [`AttributeBuffer::as_slice`].
    pub fn as_mut_slice<T: VertexElement>(&mut self) -> Result<&mut [T], MeshError> {
        self.check_shape::<T>()?;
        let (kind, shape) = (self.kind, self.shape);
        bytemuck::try_cast_slice_mut(self.bytes_mut()).map_err(|_| MeshError::TypeMismatch {
            kind,
            expected: T::SHAPE,
            actual: shape,
        })
    }

    /// Set every element to `value`.
    pub fn fill<T: VertexElement>(&mut self, value: T) -> Result<(), MeshError> {
        self.as_mut_slice::<T>()?.fill(value);
        Ok(())
    }

    /// Copy `values` into the buffer. The length must equal the element count.
    pub fn assign<T: VertexElement>(&mut self, values: &[T]) -> Result<(), MeshError> {
        let len = self.len();
        if values.len() != len {
            return Err(MeshError::SizeMismatch {
                kind: self.kind,
                expected: len,
                actual: values.len(),
            });
        }
        self.as_mut_slice::<T>()?.copy_from_slice(values);
        Ok(())
    }
}
