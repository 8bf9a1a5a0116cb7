use std::collections::TryReserveError;

use geomstore_core::{AttributeKind, ElementShape};

/// Errors raised by mesh and attribute buffer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh already has a buffer for attribute: {0}")]
    DuplicateAttribute(AttributeKind),

    #[error("mesh has no buffer for attribute: {0}")]
    MissingAttribute(AttributeKind),

    #[error("mesh has no attribute buffer at index {index} ({count} buffers)")]
    MissingAttributeIndex { index: usize, count: usize },

    #[error("buffer for mesh attribute {kind} holds {actual} elements, requested type is {expected}")]
    TypeMismatch {
        kind: AttributeKind,
        expected: ElementShape,
        actual: ElementShape,
    },

    #[error("{kind} assignment of {actual} elements into a buffer of {expected}")]
    SizeMismatch {
        kind: AttributeKind,
        expected: usize,
        actual: usize,
    },

    #[error("{what} destination holds {actual}, expected {expected}")]
    DestinationSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} element {index} out of range for {len} vertices")]
    ElementOutOfRange {
        kind: AttributeKind,
        index: usize,
        len: usize,
    },

    #[error("attribute {0} bound more than once in the same view")]
    DuplicateBinding(AttributeKind),

    #[error("index {value} at position {position} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        value: u32,
        vertex_count: usize,
    },

    #[error("failed to allocate {kind} storage for {count} vertices: {source}")]
    Allocation {
        kind: AttributeKind,
        count: usize,
        #[source]
        source: TryReserveError,
    },
}
