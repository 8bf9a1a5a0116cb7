//! geomstore mesh - columnar per-vertex geometry
//!
//! A [`Mesh`] owns one [`AttributeBuffer`] per attribute kind, all sharing the
//! mesh's vertex count, plus an optional index array. Buffers are typed at
//! runtime by their element shape; [`ZipView`] walks several of them in lockstep
//! and [`pack`] interleaves them for upload.

mod buffer;
mod error;
mod mesh;
pub mod pack;
mod zip;

pub use buffer::AttributeBuffer;
pub use error::MeshError;
pub use geomstore_core::{AttributeKind, ComponentType, ElementShape, VertexElement};
pub use mesh::{Index, Mesh};
pub use pack::{PackedMesh, VertexLayout};
pub use zip::{ReadOnlyZipQuery, ZipIter, ZipQuery, ZipView};
