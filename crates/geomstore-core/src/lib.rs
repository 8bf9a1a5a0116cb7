//! geomstore core - attribute kinds and element shapes
//!
//! This crate is the single source of truth for how per-vertex values are
//! described:
//! - [`AttributeKind`]: the semantic role of an attribute (position, normal, ...)
//! - [`ComponentType`] and [`ElementShape`]: the binary layout of one value
//! - [`VertexElement`]: maps a concrete Rust type to its shape

mod attribute;
mod element;
mod shape;

pub use attribute::AttributeKind;
pub use element::VertexElement;
pub use glam::{IVec2, IVec3, IVec4, UVec2, UVec3, UVec4, Vec2, Vec3};
pub use shape::{ComponentType, ElementShape, ShapeError, MAX_COMPONENTS};
