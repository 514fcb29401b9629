//! Hierarchy traversal and per-node world computation
//!
//! Computation is split from commit: [`compute_node`] only reads the arena,
//! so every node of one depth level can be computed concurrently before the
//! results are written back.

use std::collections::VecDeque;

use crate::error::{ObjectError, ObjectResult};
use crate::eval::{self, GeometryStore};
use crate::foundation::collections::{ObjectKey, SecondaryMap, SlotMap};
use crate::foundation::math::{invert_safe, is_negative, translation_of, Mat4, Vec3};
use crate::object::Object;
use crate::parent::{resolve_binding, ParentState, PoseProvider};

/// Result of evaluating one node, ready to be committed
#[derive(Debug, Clone)]
pub(crate) struct NodeUpdate {
    pub world: Mat4,
    pub parent_matrix: Option<Mat4>,
    pub display_origin: Vec3,
    pub binding_error: Option<ObjectError>,
}

/// Whether making `parent` the parent of `child` would close a loop
///
/// Walks up from `parent`; the existing graph is acyclic, so the walk ends at
/// a root.
pub(crate) fn would_create_cycle(
    objects: &SlotMap<ObjectKey, Object>,
    child: ObjectKey,
    parent: ObjectKey,
) -> bool {
    let mut current = Some(parent);
    while let Some(key) = current {
        if key == child {
            return true;
        }
        current = objects
            .get(key)
            .and_then(Object::parent)
            .map(|relation| relation.parent);
    }
    false
}

/// Objects grouped by depth, roots first
///
/// Every node appears after its parent, and nodes of one level never depend
/// on each other.
pub(crate) fn depth_levels(
    objects: &SlotMap<ObjectKey, Object>,
    children: &SecondaryMap<ObjectKey, Vec<ObjectKey>>,
) -> Vec<Vec<ObjectKey>> {
    let mut levels = Vec::new();
    let mut current: Vec<ObjectKey> = objects
        .iter()
        .filter(|(_, object)| object.parent().is_none())
        .map(|(key, _)| key)
        .collect();

    while !current.is_empty() {
        let next = current
            .iter()
            .filter_map(|key| children.get(*key))
            .flatten()
            .copied()
            .collect();
        levels.push(std::mem::replace(&mut current, next));
    }
    levels
}

/// Every descendant of `root`, breadth first
pub(crate) fn descendants(
    children: &SecondaryMap<ObjectKey, Vec<ObjectKey>>,
    root: ObjectKey,
) -> Vec<ObjectKey> {
    let mut found = Vec::new();
    let mut queue: VecDeque<ObjectKey> = children.get(root).into_iter().flatten().copied().collect();
    while let Some(key) = queue.pop_front() {
        found.push(key);
        queue.extend(children.get(key).into_iter().flatten().copied());
    }
    found
}

/// Read-only view of a parent's last evaluated state
pub(crate) fn parent_state<'a>(
    objects: &'a SlotMap<ObjectKey, Object>,
    store: &'a GeometryStore,
    key: ObjectKey,
    pose: &'a dyn PoseProvider,
) -> ObjectResult<ParentState<'a>> {
    let parent = objects.get(key).ok_or(ObjectError::ObjectNotFound(key))?;
    Ok(ParentState {
        key,
        object_type: parent.object_type(),
        world: parent.world.object_to_world,
        geometry: eval::current_geometry(parent, store),
        pose,
    })
}

/// World matrix of `key` from its channels and its parent's state in `pass`
///
/// A binding that cannot be resolved places the node as if unparented and
/// reports the error in [`NodeUpdate::binding_error`]. A parent that was not
/// evaluated in `pass` is an ordering violation.
pub(crate) fn compute_node(
    objects: &SlotMap<ObjectKey, Object>,
    store: &GeometryStore,
    key: ObjectKey,
    pose: &dyn PoseProvider,
    pass: u64,
) -> ObjectResult<NodeUpdate> {
    let object = objects.get(key).ok_or(ObjectError::ObjectNotFound(key))?;
    let local = object.local_matrix()?;

    let mut update = NodeUpdate {
        world: Mat4::identity(),
        parent_matrix: None,
        display_origin: Vec3::zeros(),
        binding_error: None,
    };

    let parent_part = match object.parent() {
        None => Mat4::identity(),
        Some(relation) => {
            let parent = objects
                .get(relation.parent)
                .ok_or(ObjectError::ObjectNotFound(relation.parent))?;
            if parent.world.evaluated_pass != Some(pass) {
                return Err(ObjectError::ParentNotEvaluated {
                    child: key,
                    parent: relation.parent,
                });
            }

            let state = parent_state(objects, store, relation.parent, pose)?;
            match resolve_binding(&relation.binding, &state) {
                Ok(binding) => {
                    update.display_origin = translation_of(&binding);
                    let part = binding * relation.correction;
                    update.parent_matrix = Some(part);
                    part
                }
                Err(err) => {
                    update.display_origin = translation_of(&state.world);
                    update.binding_error = Some(err);
                    Mat4::identity()
                }
            }
        }
    };

    update.world = parent_part * object.constraint_correction * local;
    Ok(update)
}

/// Write an update into the node; the only writer of its world matrices
pub(crate) fn commit(object: &mut Object, update: NodeUpdate, pass: u64, epsilon: f32) {
    if let Some(err) = &update.binding_error {
        log::warn!("Parent binding of '{}' failed ({err}), placing it unparented", object.name);
    }

    object.world.object_to_world = update.world;
    object.world.world_to_object = invert_safe(&update.world, epsilon);
    object.world.evaluated_pass = Some(pass);

    object.runtime.parent_matrix = update.parent_matrix;
    object.runtime.binding_error = update.binding_error;
    object.runtime.negative_scale = is_negative(&update.world);
    object.runtime.parent_display_origin = update.display_origin;
}
