//! geomstore io - binary mesh file codec
//!
//! [`MeshWriter`] encodes a [`Mesh`](geomstore_mesh::Mesh) as a header, an
//! attribute table and the vertex and index blocks; [`MeshReader`] decodes it
//! back. The vertex block is either interleaved or one array per attribute, see
//! [`WriteScheme`]. Files are in host byte order.

mod error;
pub mod format;
mod reader;
mod writer;

pub use error::CodecError;
pub use format::{AttributeDescriptor, MeshFileInfo};
pub use reader::{read_mesh_file, MeshReader};
pub use writer::{write_mesh_file, MeshWriter, WriteScheme};
