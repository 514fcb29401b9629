//! Error types for object evaluation

use crate::foundation::collections::{DataKey, ObjectKey};
use crate::transform::RotationMode;

/// Errors raised by the object node model and its evaluation
///
/// Structural violations (`CyclicParent`, `InvalidRotationChannel`) are
/// rejected before anything is cached. Binding and generation errors are
/// recoverable: the resolver falls back to an identity binding and the
/// evaluated-state cache keeps its last good payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
    /// Assigning the parent would close a loop in the hierarchy
    #[error("Parenting {child:?} to {parent:?} would create a cycle")]
    CyclicParent {
        /// Node that was being parented
        child: ObjectKey,
        /// Requested parent
        parent: ObjectKey,
    },

    /// Vertex binding references a vertex the parent geometry does not have
    #[error("Parent vertex index {index} out of range ({vertex_count} vertices)")]
    BindingIndexOutOfRange {
        /// Offending index
        index: u32,
        /// Vertex count of the parent's evaluated geometry
        vertex_count: usize,
    },

    /// Bone binding names a bone that is not in the parent's pose
    #[error("Parent bone '{bone}' not found")]
    BindingTargetMissing {
        /// Requested bone name
        bone: String,
    },

    /// Binding mode cannot be used with the parent's object type
    #[error("Parent binding '{binding}' is not supported by parent {parent:?}")]
    UnsupportedBinding {
        /// Binding mode name
        binding: &'static str,
        /// Parent node
        parent: ObjectKey,
    },

    /// Geometry collaborator failed; the previous payload is retained
    #[error("Geometry generation failed: {0}")]
    GeometryGeneration(#[from] GenerationError),

    /// Active rotation channel holds no usable rotation
    #[error("Rotation channel for mode {mode:?} is not populated")]
    InvalidRotationChannel {
        /// Active rotation mode
        mode: RotationMode,
    },

    /// Handle does not refer to a live object
    #[error("Object not found: {0:?}")]
    ObjectNotFound(ObjectKey),

    /// Handle does not refer to a live data block
    #[error("Data block not found: {0:?}")]
    DataNotFound(DataKey),

    /// Child evaluated before its parent in the current pass
    #[error("Parent {parent:?} of {child:?} has not been evaluated in this pass")]
    ParentNotEvaluated {
        /// Node being evaluated
        child: ObjectKey,
        /// Its parent
        parent: ObjectKey,
    },

    /// Object has no data block to evaluate
    #[error("Object {0:?} has no data to evaluate")]
    MissingData(ObjectKey),

    /// Object type cannot hold a data block
    #[error("Object type {0} does not carry data")]
    DataUnsupported(&'static str),

    /// Object type has no material slots
    #[error("Object type {0} does not support materials")]
    MaterialsUnsupported(&'static str),

    /// Evaluation pass was cancelled before completion
    #[error("Evaluation cancelled")]
    Cancelled,
}

/// Failure reported by a geometry generation collaborator
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    /// Human-readable reason
    pub message: String,
}

impl GenerationError {
    /// Create a new generation error
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Result alias used across the crate
pub type ObjectResult<T> = Result<T, ObjectError>;
