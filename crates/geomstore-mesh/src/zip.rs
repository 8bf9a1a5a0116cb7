#![allow(private_interfaces)]

//! Simultaneous iteration over several attribute buffers of one mesh.
//!
//! A [`ZipView`] binds a tuple of element references such as
//! `(&mut Vec3, &Vec2)` to a tuple of attribute kinds. Binding resolves each
//! buffer once and keeps a single raw element pointer per buffer; iteration
//! then yields one tuple of references per vertex, pointing straight into the
//! mesh's storage. Nothing is copied or interleaved.
//!
//! # Example
//! ```ignore
//! let mut view = mesh.zip_mut::<(&mut Vec3, &Vec2)>((AttributeKind::Position, AttributeKind::TexCoord))?;
//! for (position, uv) in &mut view {
//!     position.y += uv.x;
//! }
//! ```

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use geomstore_core::{AttributeKind, VertexElement};

use crate::error::MeshError;
use crate::mesh::Mesh;

/// Kinds already bound by a view under construction.
#[derive(Debug, Default)]
pub(crate) struct KindSet(u8);

impl KindSet {
    fn claim(&mut self, kind: AttributeKind) -> Result<(), MeshError> {
        let bit = 1u8 << kind.ordinal();
        if self.0 & bit != 0 {
            return Err(MeshError::DuplicateBinding(kind));
        }
        self.0 |= bit;
        Ok(())
    }
}

/// Element reference types (`&T`, `&mut T`) and tuples of them that a
/// [`ZipView`] can yield.
///
/// # Safety
/// Implementors must only hand out pointers into buffers they claimed while
/// binding, so that no two bindings alias.
pub unsafe trait ZipQuery {
    /// Attribute kinds to bind, mirroring the shape of the query tuple.
    type Kinds: Copy;
    /// Per-buffer base pointers. Equal fetches refer to the same buffers.
    type Fetch: Copy + PartialEq;
    type Item<'m>;

    /// Resolve `kinds` against the mesh, returning the base pointers and the
    /// element count of the first bound buffer.
    ///
    /// # Safety
    /// `mesh` must stay valid and unresized while the returned pointers are used.
    /// Queries yielding mutable references require `mesh` to come from an
    /// exclusive borrow.
    unsafe fn bind(
        mesh: NonNull<Mesh>,
        kinds: Self::Kinds,
        claimed: &mut KindSet,
    ) -> Result<(Self::Fetch, usize), MeshError>;

    /// Produce the references for element `index`.
    ///
    /// # Safety
    /// `index` must be below the bound length, and for mutable queries each index
    /// may be fetched at most once while the previous items are alive.
    unsafe fn fetch<'m>(fetch: Self::Fetch, index: usize) -> Self::Item<'m>;
}

/// Queries that never write through the mesh; these can be bound from `&Mesh`.
///
/// # Safety
/// Implementors must only produce shared references.
pub unsafe trait ReadOnlyZipQuery: ZipQuery {}

// --- &T ---

unsafe impl<T: VertexElement> ZipQuery for &T {
    type Kinds = AttributeKind;
    type Fetch = *const T;
    type Item<'m> = &'m T;

    unsafe fn bind(
        mesh: NonNull<Mesh>,
        kind: AttributeKind,
        claimed: &mut KindSet,
    ) -> Result<(Self::Fetch, usize), MeshError> {
        claimed.claim(kind)?;
        let elements = mesh.as_ref().attribute::<T>(kind)?;
        Ok((elements.as_ptr(), elements.len()))
    }

    unsafe fn fetch<'m>(fetch: Self::Fetch, index: usize) -> Self::Item<'m> {
        &*fetch.add(index)
    }
}

unsafe impl<T: VertexElement> ReadOnlyZipQuery for &T {}

// --- &mut T ---

unsafe impl<T: VertexElement> ZipQuery for &mut T {
    type Kinds = AttributeKind;
    type Fetch = *mut T;
    type Item<'m> = &'m mut T;

    unsafe fn bind(
        mesh: NonNull<Mesh>,
        kind: AttributeKind,
        claimed: &mut KindSet,
    ) -> Result<(Self::Fetch, usize), MeshError> {
        claimed.claim(kind)?;
        // The borrow only touches this kind's storage; pointers from earlier
        // bindings address other buffers.
        let elements = (*mesh.as_ptr()).attribute_mut::<T>(kind)?;
        Ok((elements.as_mut_ptr(), elements.len()))
    }

    unsafe fn fetch<'m>(fetch: Self::Fetch, index: usize) -> Self::Item<'m> {
        &mut *fetch.add(index)
    }
}

// --- Tuples ---

macro_rules! impl_zip_query_tuple {
    ($(($name:ident, $kind:ident, $fetch:ident)),+) => {
        #[allow(non_snake_case)]
        unsafe impl<$($name: ZipQuery),+> ZipQuery for ($($name,)+) {
            type Kinds = ($($name::Kinds,)+);
            type Fetch = ($($name::Fetch,)+);
            type Item<'m> = ($($name::Item<'m>,)+);

            unsafe fn bind(
                mesh: NonNull<Mesh>,
                kinds: Self::Kinds,
                claimed: &mut KindSet,
            ) -> Result<(Self::Fetch, usize), MeshError> {
                let ($($kind,)+) = kinds;
                let mut first_len = None;
                $(
                    let ($fetch, len) = $name::bind(mesh, $kind, claimed)?;
                    match first_len {
                        None => first_len = Some(len),
                        Some(first) => debug_assert_eq!(first, len),
                    }
                )+
                Ok((($($fetch,)+), first_len.unwrap_or_default()))
            }

            unsafe fn fetch<'m>(fetch: Self::Fetch, index: usize) -> Self::Item<'m> {
                let ($($fetch,)+) = fetch;
                ($($name::fetch($fetch, index),)+)
            }
        }

        unsafe impl<$($name: ReadOnlyZipQuery),+> ReadOnlyZipQuery for ($($name,)+) {}
    };
}

impl_zip_query_tuple!((A, ka, fa));
impl_zip_query_tuple!((A, ka, fa), (B, kb, fb));
impl_zip_query_tuple!((A, ka, fa), (B, kb, fb), (C, kc, fc));
impl_zip_query_tuple!((A, ka, fa), (B, kb, fb), (C, kc, fc), (D, kd, fd));
impl_zip_query_tuple!((A, ka, fa), (B, kb, fb), (C, kc, fc), (D, kd, fd), (E, ke, fe));
impl_zip_query_tuple!(
    (A, ka, fa),
    (B, kb, fb),
    (C, kc, fc),
    (D, kd, fd),
    (E, ke, fe),
    (F, kf, ff)
);

/// A bound set of attribute buffers, iterated together by vertex index.
///
/// Holds the mesh borrow for `'m`, so the mesh cannot be resized while the view
/// (or any item it yielded) is alive.
pub struct ZipView<'m, Q: ZipQuery> {
    fetch: Q::Fetch,
    len: usize,
    _marker: PhantomData<(&'m mut Mesh, Q)>,
}

impl<'m, Q: ZipQuery> ZipView<'m, Q> {
    /// # Safety
    /// See [`ZipQuery::bind`].
    unsafe fn bind(mesh: NonNull<Mesh>, kinds: Q::Kinds) -> Result<Self, MeshError> {
        let (fetch, len) = Q::bind(mesh, kinds, &mut KindSet::default())?;
        Ok(Self {
            fetch,
            len,
            _marker: PhantomData,
        })
    }

    /// Number of vertices the view walks: the element count of its first buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate from vertex 0. Items borrow the view, so iteration can restart
    /// once they are dropped.
    pub fn iter_mut(&mut self) -> ZipIter<'_, Q> {
        ZipIter::new(self.fetch, self.len)
    }

    /// References for vertex `index`, or `None` past the end.
    pub fn get(&mut self, index: usize) -> Option<Q::Item<'_>> {
        // Safety: index is in bounds and the item borrows the view exclusively.
        (index < self.len).then(|| unsafe { Q::fetch(self.fetch, index) })
    }
}

impl<'m, Q: ReadOnlyZipQuery> ZipView<'m, Q> {
    /// Shared iteration; several iterators may be alive at once.
    pub fn iter(&self) -> ZipIter<'_, Q> {
        ZipIter::new(self.fetch, self.len)
    }
}

impl<'m, Q: ZipQuery> IntoIterator for ZipView<'m, Q> {
    type Item = Q::Item<'m>;
    type IntoIter = ZipIter<'m, Q>;

    fn into_iter(self) -> Self::IntoIter {
        ZipIter::new(self.fetch, self.len)
    }
}

impl<'v, 'm, Q: ZipQuery> IntoIterator for &'v mut ZipView<'m, Q> {
    type Item = Q::Item<'v>;
    type IntoIter = ZipIter<'v, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Forward-only position within a [`ZipView`].
///
/// Two positions are equal when they have the same index and refer to the same
/// buffers. An exhausted iterator sits at `index() == len`.
pub struct ZipIter<'a, Q: ZipQuery> {
    fetch: Q::Fetch,
    index: usize,
    len: usize,
    _marker: PhantomData<(&'a mut Mesh, Q)>,
}

impl<'a, Q: ZipQuery> ZipIter<'a, Q> {
    fn new(fetch: Q::Fetch, len: usize) -> Self {
        Self {
            fetch,
            index: 0,
            len,
            _marker: PhantomData,
        }
    }

    /// Vertex index of the next item.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.len
    }
}

impl<'a, Q: ZipQuery> Iterator for ZipIter<'a, Q> {
    type Item = Q::Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        // Safety: every index is visited at most once and is below the bound length.
        let item = unsafe { Q::fetch(self.fetch, self.index) };
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<Q: ZipQuery> ExactSizeIterator for ZipIter<'_, Q> {}

impl<Q: ZipQuery> FusedIterator for ZipIter<'_, Q> {}

impl<Q: ZipQuery> PartialEq for ZipIter<'_, Q> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.fetch == other.fetch
    }
}

impl Mesh {
    /// Bind a read-only view over the given attribute kinds.
    ///
    /// Fails with [`MeshError::MissingAttribute`] or [`MeshError::TypeMismatch`]
    /// for any kind that cannot be viewed as the requested type, and with
    /// [`MeshError::DuplicateBinding`] if a kind appears twice.
    pub fn zip<Q: ReadOnlyZipQuery>(&self, kinds: Q::Kinds) -> Result<ZipView<'_, Q>, MeshError> {
        // Safety: read-only queries never write through the pointer.
        unsafe { ZipView::bind(NonNull::from(self), kinds) }
    }

    /// Bind a view that may yield mutable references into the mesh.
    pub fn zip_mut<Q: ZipQuery>(&mut self, kinds: Q::Kinds) -> Result<ZipView<'_, Q>, MeshError> {
        // Safety: the view holds the exclusive borrow for its lifetime.
        unsafe { ZipView::bind(NonNull::from(self), kinds) }
    }
}
