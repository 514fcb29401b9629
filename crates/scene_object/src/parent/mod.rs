//! Parent relations and binding resolution
//!
//! A binding turns the parent's already evaluated state into the matrix the
//! child is placed in. Resolution only reads the parent, which is why world
//! evaluation must visit parents before children.

mod pose;

pub use pose::{NoPose, PoseProvider, StaticPose};

use serde::{Deserialize, Serialize};

use crate::error::{ObjectError, ObjectResult};
use crate::foundation::collections::ObjectKey;
use crate::foundation::math::{Mat3, Mat4, Point3, Vec3};
use crate::geometry::Geometry;
use crate::object::ObjectType;

/// How a child is attached to its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentBinding {
    /// Follow the parent's world matrix
    Object,
    /// Armature deform parent; placed like [`ParentBinding::Object`]
    Skeleton,
    /// Follow one vertex of the parent's evaluated geometry (translation only)
    Vertex(u32),
    /// Follow the frame spanned by three vertices of the parent's geometry
    VertexTriple([u32; 3]),
    /// Follow a named bone of the parent armature's pose
    Bone(String),
}

impl ParentBinding {
    /// Short name used in diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Skeleton => "skeleton",
            Self::Vertex(_) => "vertex",
            Self::VertexTriple(_) => "vertex_triple",
            Self::Bone(_) => "bone",
        }
    }

    /// Check that a parent of `parent_type` can provide this binding
    pub fn check_supported(&self, parent: ObjectKey, parent_type: ObjectType) -> ObjectResult<()> {
        let supported = match self {
            Self::Object => true,
            Self::Vertex(_) | Self::VertexTriple(_) => parent_type.supports_vertex_parent(),
            Self::Skeleton | Self::Bone(_) => parent_type == ObjectType::Armature,
        };
        if supported {
            Ok(())
        } else {
            Err(ObjectError::UnsupportedBinding {
                binding: self.name(),
                parent,
            })
        }
    }
}

/// Authored parent relation of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRelation {
    /// Parent node (non-owning)
    pub parent: ObjectKey,
    /// Binding mode and its indices
    pub binding: ParentBinding,
    /// Inverse correction captured when the parent was assigned
    pub correction: Mat4,
}

/// Read-only view of an evaluated parent
#[derive(Clone, Copy)]
pub struct ParentState<'a> {
    /// Parent handle
    pub key: ObjectKey,
    /// Parent type
    pub object_type: ObjectType,
    /// Parent world matrix from the current pass
    pub world: Mat4,
    /// Parent's evaluated geometry, or its authored geometry when not evaluated
    pub geometry: Option<&'a Geometry>,
    /// Bone pose source
    pub pose: &'a dyn PoseProvider,
}

/// Options for assigning a parent
#[derive(Clone, Copy)]
pub struct ParentOptions<'a> {
    /// Capture an inverse correction so the child keeps its world placement
    pub keep_transform: bool,
    /// Bone pose used to resolve a bone binding at assignment time
    pub pose: &'a dyn PoseProvider,
}

impl Default for ParentOptions<'_> {
    fn default() -> Self {
        Self {
            keep_transform: true,
            pose: &NoPose,
        }
    }
}

impl<'a> ParentOptions<'a> {
    /// Parent without inverse: the correction stays at identity
    pub fn without_inverse() -> Self {
        Self {
            keep_transform: false,
            ..Self::default()
        }
    }

    /// Builder pattern: set the pose used for bone bindings
    pub fn with_pose(mut self, pose: &'a dyn PoseProvider) -> Self {
        self.pose = pose;
        self
    }
}

fn vertex_at(geometry: Option<&Geometry>, index: u32) -> ObjectResult<Vec3> {
    geometry
        .and_then(|g| g.vertex(index))
        .ok_or_else(|| ObjectError::BindingIndexOutOfRange {
            index,
            vertex_count: geometry.map_or(0, Geometry::vertex_count),
        })
}

/// Orthonormal frame from a triangle: X along the first edge, Z along the
/// normal, origin at the centroid
///
/// A degenerate triangle keeps the identity rotation.
fn triangle_frame(a: Vec3, b: Vec3, c: Vec3) -> Mat4 {
    let center = (a + b + c) / 3.0;
    let edge = b - a;
    let normal = edge.cross(&(c - a));

    let rotation = match (edge.try_normalize(f32::EPSILON), normal.try_normalize(f32::EPSILON)) {
        (Some(x), Some(z)) => Mat3::from_columns(&[x, z.cross(&x), z]),
        _ => Mat3::identity(),
    };

    let mut frame = rotation.to_homogeneous();
    frame.fixed_view_mut::<3, 1>(0, 3).copy_from(&center);
    frame
}

/// Matrix the child is placed in for the given binding
///
/// Vertex indices are checked against the parent's current topology and a
/// missing bone is reported; callers fall back to identity on error.
pub fn resolve_binding(binding: &ParentBinding, parent: &ParentState<'_>) -> ObjectResult<Mat4> {
    let to_world = |v: Vec3| parent.world.transform_point(&Point3::from(v)).coords;

    match binding {
        ParentBinding::Object | ParentBinding::Skeleton => Ok(parent.world),
        ParentBinding::Vertex(index) => {
            let vertex = vertex_at(parent.geometry, *index)?;
            Ok(Mat4::new_translation(&to_world(vertex)))
        }
        ParentBinding::VertexTriple(indices) => {
            let [a, b, c] = indices.map(|i| vertex_at(parent.geometry, i));
            Ok(triangle_frame(to_world(a?), to_world(b?), to_world(c?)))
        }
        ParentBinding::Bone(bone) => parent
            .pose
            .bone_matrix(parent.key, bone)
            .map(|pose| parent.world * pose)
            .ok_or_else(|| ObjectError::BindingTargetMissing { bone: bone.clone() }),
    }
}
