//! Bone pose collaborator interface

use std::collections::HashMap;

use crate::foundation::collections::ObjectKey;
use crate::foundation::math::Mat4;

/// Source of evaluated bone matrices for bone-space parenting
///
/// Matrices are in the armature object's space. Implementations are shared
/// across worker threads during a parallel evaluation pass.
pub trait PoseProvider: Send + Sync {
    /// Pose-space matrix of `bone` on `armature`, if the bone exists
    fn bone_matrix(&self, armature: ObjectKey, bone: &str) -> Option<Mat4>;
}

/// Provider with no bones at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPose;

impl PoseProvider for NoPose {
    fn bone_matrix(&self, _armature: ObjectKey, _bone: &str) -> Option<Mat4> {
        None
    }
}

/// Fixed table of bone matrices
#[derive(Debug, Clone, Default)]
pub struct StaticPose {
    bones: HashMap<ObjectKey, HashMap<String, Mat4>>,
}

impl StaticPose {
    /// Create an empty pose table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add a bone matrix
    pub fn with_bone(mut self, armature: ObjectKey, bone: impl Into<String>, matrix: Mat4) -> Self {
        self.set_bone(armature, bone, matrix);
        self
    }

    /// Set or replace a bone matrix
    pub fn set_bone(&mut self, armature: ObjectKey, bone: impl Into<String>, matrix: Mat4) {
        self.bones.entry(armature).or_default().insert(bone.into(), matrix);
    }
}

impl PoseProvider for StaticPose {
    fn bone_matrix(&self, armature: ObjectKey, bone: &str) -> Option<Mat4> {
        self.bones.get(&armature)?.get(bone).copied()
    }
}
