//! Registry mapping Rust value types to element shapes
//!
//! Any type implementing [`VertexElement`] can be used to view an attribute buffer
//! whose stored shape equals [`VertexElement::SHAPE`]. The buffer's storage is
//! 4-byte aligned, so implementors must have an alignment of at most 4 and a size
//! equal to `SHAPE.element_size()`.

use bytemuck::Pod;
use glam::{IVec2, IVec3, IVec4, UVec2, UVec3, UVec4, Vec2, Vec3};

use crate::shape::{ComponentType, ElementShape};

/// A plain-old-data value that can live in an attribute buffer.
pub trait VertexElement: Pod {
    /// Shape tag compared against a buffer's stored shape on typed access.
    const SHAPE: ElementShape;
}

macro_rules! impl_vertex_element {
    ($ty:ty => $component:ident, $count:literal) => {
        impl VertexElement for $ty {
            const SHAPE: ElementShape = ElementShape::of(ComponentType::$component, $count);
        }

        const _: () = {
            assert!(std::mem::size_of::<$ty>() == 4 * $count);
            assert!(std::mem::align_of::<$ty>() <= 4);
        };
    };
}

impl_vertex_element!(f32 => Float, 1);
impl_vertex_element!([f32; 2] => Float, 2);
impl_vertex_element!([f32; 3] => Float, 3);
impl_vertex_element!([f32; 4] => Float, 4);
impl_vertex_element!(i32 => Int, 1);
impl_vertex_element!([i32; 2] => Int, 2);
impl_vertex_element!([i32; 3] => Int, 3);
impl_vertex_element!([i32; 4] => Int, 4);
impl_vertex_element!(u32 => Uint, 1);
impl_vertex_element!([u32; 2] => Uint, 2);
impl_vertex_element!([u32; 3] => Uint, 3);
impl_vertex_element!([u32; 4] => Uint, 4);

impl_vertex_element!(Vec2 => Float, 2);
impl_vertex_element!(Vec3 => Float, 3);
impl_vertex_element!(IVec2 => Int, 2);
impl_vertex_element!(IVec3 => Int, 3);
impl_vertex_element!(IVec4 => Int, 4);
impl_vertex_element!(UVec2 => Uint, 2);
impl_vertex_element!(UVec3 => Uint, 3);
impl_vertex_element!(UVec4 => Uint, 4);

#[cfg(test)]
mod tests {
    use super::*;

    fn shape_of<T: VertexElement>() -> ElementShape {
        T::SHAPE
    }

    #[test]
    fn scalar_and_array_shapes() {
        assert_eq!(shape_of::<f32>(), ElementShape::FLOAT);
        assert_eq!(shape_of::<[i32; 2]>(), ElementShape::INT2);
        assert_eq!(shape_of::<[u32; 4]>(), ElementShape::UINT4);
    }

    #[test]
    fn glam_types_share_array_shapes() {
        assert_eq!(shape_of::<Vec3>(), shape_of::<[f32; 3]>());
        assert_eq!(shape_of::<Vec2>(), shape_of::<[f32; 2]>());
        assert_eq!(shape_of::<UVec4>(), shape_of::<[u32; 4]>());
        assert_eq!(shape_of::<IVec3>(), ElementShape::INT3);
    }

    #[test]
    fn shape_size_matches_type_size() {
        assert_eq!(shape_of::<Vec3>().element_size(), std::mem::size_of::<Vec3>());
        assert_eq!(shape_of::<u32>().element_size(), std::mem::size_of::<u32>());
    }
}
