//! Scene graph: object arena, hierarchy and evaluation passes

mod hierarchy;
mod scene_graph;

#[cfg(test)]
mod tests;

pub use scene_graph::SceneGraph;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ObjectError, ObjectResult};
use crate::foundation::collections::ObjectKey;
use crate::parent::{NoPose, PoseProvider};

/// Collaborators and controls for one evaluation pass
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    /// Bone pose source for bone bindings
    pub pose: &'a dyn PoseProvider,
    /// Set from another thread to stop the pass between depth levels
    pub cancel: Option<&'a AtomicBool>,
}

impl Default for EvalContext<'_> {
    fn default() -> Self {
        Self {
            pose: &NoPose,
            cancel: None,
        }
    }
}

impl<'a> EvalContext<'a> {
    /// Context without poses or cancellation
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set the pose source
    pub fn with_pose(mut self, pose: &'a dyn PoseProvider) -> Self {
        self.pose = pose;
        self
    }

    /// Builder pattern: set the cancellation flag
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

/// Outcome of a full transform pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Pass number
    pub pass: u64,
    /// Nodes whose world matrices were written
    pub evaluated: usize,
    /// Nodes placed unparented because their binding failed
    pub binding_fallbacks: Vec<(ObjectKey, ObjectError)>,
    /// Nodes left at their previous world matrices
    pub failures: Vec<(ObjectKey, ObjectError)>,
    /// Pass stopped before visiting every level
    pub cancelled: bool,
}

impl PassReport {
    /// Every node evaluated without error or cancellation
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }

    /// First structural problem of the pass as an error
    ///
    /// Binding fallbacks do not count; they stay listed in
    /// [`Self::binding_fallbacks`].
    pub fn into_result(self) -> ObjectResult<Self> {
        if self.cancelled {
            return Err(ObjectError::Cancelled);
        }
        match self.failures.first() {
            Some((_, err)) => Err(err.clone()),
            None => Ok(self),
        }
    }
}
