//! Component types and element shapes
//!
//! An [`ElementShape`] fully describes the binary layout of one attribute value.
//! It is the tag used both for type-checked buffer access and for the mesh file
//! format, so there is exactly one place that knows how large an element is.

use std::fmt;

/// Largest number of components a single element may have.
pub const MAX_COMPONENTS: u8 = 4;

/// Scalar type backing each component of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float,
    Int,
    Uint,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Float => std::mem::size_of::<f32>(),
            Self::Int => std::mem::size_of::<i32>(),
            Self::Uint => std::mem::size_of::<u32>(),
        }
    }

    /// Code stored in mesh files.
    pub const fn code(self) -> u8 {
        match self {
            Self::Float => 0,
            Self::Int => 1,
            Self::Uint => 2,
        }
    }

    /// Inverse of [`ComponentType::code`].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Float),
            1 => Some(Self::Int),
            2 => Some(Self::Uint),
            _ => None,
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Uint => "uint",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Errors from constructing an [`ElementShape`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("component count must be 1-4, given: {0}")]
    InvalidComponentCount(u8),
}

/// (component type, component count) pair describing one attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementShape {
    component_type: ComponentType,
    components: u8,
}

impl ElementShape {
    pub const FLOAT: Self = Self::of(ComponentType::Float, 1);
    pub const FLOAT2: Self = Self::of(ComponentType::Float, 2);
    pub const FLOAT3: Self = Self::of(ComponentType::Float, 3);
    pub const FLOAT4: Self = Self::of(ComponentType::Float, 4);
    pub const INT: Self = Self::of(ComponentType::Int, 1);
    pub const INT2: Self = Self::of(ComponentType::Int, 2);
    pub const INT3: Self = Self::of(ComponentType::Int, 3);
    pub const INT4: Self = Self::of(ComponentType::Int, 4);
    pub const UINT: Self = Self::of(ComponentType::Uint, 1);
    pub const UINT2: Self = Self::of(ComponentType::Uint, 2);
    pub const UINT3: Self = Self::of(ComponentType::Uint, 3);
    pub const UINT4: Self = Self::of(ComponentType::Uint, 4);

    /// Every valid shape, ordered by component type then count.
    pub const ALL: [Self; 12] = [
        Self::FLOAT,
        Self::FLOAT2,
        Self::FLOAT3,
        Self::FLOAT4,
        Self::INT,
        Self::INT2,
        Self::INT3,
        Self::INT4,
        Self::UINT,
        Self::UINT2,
        Self::UINT3,
        Self::UINT4,
    ];

    /// Unchecked constructor for the constants above and the element registry.
    pub(crate) const fn of(component_type: ComponentType, components: u8) -> Self {
        Self {
            component_type,
            components,
        }
    }

    /// Create a shape, rejecting component counts outside `1..=4`.
    pub fn new(component_type: ComponentType, components: u8) -> Result<Self, ShapeError> {
        if components == 0 || components > MAX_COMPONENTS {
            return Err(ShapeError::InvalidComponentCount(components));
        }
        Ok(Self::of(component_type, components))
    }

    pub const fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub const fn components(&self) -> u8 {
        self.components
    }

    /// Size of one element in bytes.
    pub const fn element_size(&self) -> usize {
        self.component_type.size() * self.components as usize
    }
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.component_type, self.components)
    }
}
