//! Object arena with parent/child edges
//!
//! Nodes live in a slot map and refer to their parent by handle. Children
//! are indexed separately so passes can walk the hierarchy top-down. Every
//! edge is cycle-checked when it is inserted, never at evaluation time.

use rayon::prelude::*;

use super::hierarchy::{self, NodeUpdate};
use super::{EvalContext, PassReport};
use crate::bounds::{Aabb, BoundingBox};
use crate::config::SceneConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::eval::{self, DataMask, EvaluatedPayload, GeometryGenerator, GeometryStore};
use crate::foundation::collections::{DataKey, ObjectKey, SecondaryMap, SlotMap};
use crate::foundation::math::{invert_safe, scale_of, Mat4, Vec3};
use crate::geometry::Geometry;
use crate::object::{Object, ObjectType, WorldMatrices};
use crate::parent::{resolve_binding, ParentBinding, ParentOptions, ParentRelation};

/// Scene of object nodes and the data blocks they reference
#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: SlotMap<ObjectKey, Object>,
    children: SecondaryMap<ObjectKey, Vec<ObjectKey>>,
    store: GeometryStore,
    config: SceneConfig,
    pass: u64,
}

impl SceneGraph {
    /// Create an empty scene
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Scene configuration
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Objects
    // ---------------------------------------------------------------------

    /// Add an object; its world matrix starts at its local placement
    ///
    /// A parent relation referring to an object that is not in the scene is
    /// dropped.
    pub fn add_object(&mut self, mut object: Object) -> ObjectResult<ObjectKey> {
        let world = object.constraint_correction * object.local_matrix()?;
        object.world = WorldMatrices {
            object_to_world: world,
            world_to_object: invert_safe(&world, self.config.inversion_epsilon),
            evaluated_pass: None,
        };

        let parent = object.parent().map(|relation| relation.parent);
        let parent = match parent {
            Some(parent) if !self.objects.contains_key(parent) => {
                log::warn!("Dropping parent of '{}': {parent:?} is not in the scene", object.name);
                object.parent = None;
                None
            }
            other => other,
        };

        let key = self.objects.insert(object);
        self.children.insert(key, Vec::new());
        if let Some(siblings) = parent.and_then(|p| self.children.get_mut(p)) {
            siblings.push(key);
        }
        Ok(key)
    }

    /// Add a copy of an object's authored state
    pub fn duplicate_object(&mut self, key: ObjectKey) -> ObjectResult<ObjectKey> {
        let copy = self.object(key)?.duplicate();
        self.add_object(copy)
    }

    /// Remove an object, releasing its evaluated data
    ///
    /// Children are unparented in place and keep their world placement. A
    /// child whose channels cannot take that placement keeps its channels
    /// instead, so removal never stops halfway.
    pub fn remove_object(&mut self, key: ObjectKey) -> ObjectResult<Object> {
        self.object(key)?;
        let children = self.children.get(key).cloned().unwrap_or_default();
        for child in children {
            if let Err(err) = self.clear_parent(child, true) {
                log::warn!("Unparenting {child:?} in local space, world placement not kept: {err}");
                self.clear_parent(child, false)?;
            }
        }

        let mut object = self.objects.remove(key).ok_or(ObjectError::ObjectNotFound(key))?;
        self.children.remove(key);
        if let Some(relation) = object.parent.take() {
            self.unlink_child(relation.parent, key);
        }
        eval::release_evaluated(&mut object, &mut self.store);
        Ok(object)
    }

    fn object(&self, key: ObjectKey) -> ObjectResult<&Object> {
        self.objects.get(key).ok_or(ObjectError::ObjectNotFound(key))
    }

    fn object_mut(&mut self, key: ObjectKey) -> ObjectResult<&mut Object> {
        self.objects.get_mut(key).ok_or(ObjectError::ObjectNotFound(key))
    }

    /// Look up an object
    pub fn get(&self, key: ObjectKey) -> Option<&Object> {
        self.objects.get(key)
    }

    /// Look up an object for editing its authored state
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut Object> {
        self.objects.get_mut(key)
    }

    /// Whether the handle refers to a live object
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// All objects
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &Object)> {
        self.objects.iter()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // ---------------------------------------------------------------------
    // Data blocks
    // ---------------------------------------------------------------------

    /// Data-block store
    pub const fn store(&self) -> &GeometryStore {
        &self.store
    }

    /// Add authored geometry
    pub fn add_data(&mut self, geometry: Geometry) -> DataKey {
        self.store.insert(geometry)
    }

    /// Edit authored geometry; users re-evaluate on their next request
    pub fn edit_data<R>(&mut self, data: DataKey, edit: impl FnOnce(&mut Geometry) -> R) -> ObjectResult<R> {
        let result = self.store.modify(data, edit)?;
        for object in self.objects.values_mut().filter(|o| o.data() == Some(data)) {
            object.runtime.bounds.mark_dirty();
        }
        Ok(result)
    }

    /// Remove authored geometry
    ///
    /// Evaluated results derived from the block are released and the bounds
    /// of every user are invalidated.
    pub fn remove_data(&mut self, data: DataKey) -> Option<Geometry> {
        let geometry = self.store.remove(data)?;
        for object in self.objects.values_mut() {
            let derived = object.runtime.payload().is_some_and(|p| p.original() == data);
            if derived {
                eval::release_evaluated(object, &mut self.store);
            } else if object.data() == Some(data) {
                object.runtime.bounds.mark_dirty();
            }
        }
        Some(geometry)
    }

    /// Link a data block to an object, or unlink it with `None`
    ///
    /// Changing the link releases the previous evaluated result.
    pub fn set_data(&mut self, key: ObjectKey, data: Option<DataKey>) -> ObjectResult<()> {
        if let Some(data) = data {
            if self.store.get(data).is_none() {
                return Err(ObjectError::DataNotFound(data));
            }
        }
        let object = self.objects.get_mut(key).ok_or(ObjectError::ObjectNotFound(key))?;
        if object.data() == data {
            return Ok(());
        }
        object.set_data(data)?;
        eval::release_evaluated(object, &mut self.store);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Parent `child` to `parent`, keeping its current world placement
    pub fn set_parent(&mut self, child: ObjectKey, parent: ObjectKey, binding: ParentBinding) -> ObjectResult<()> {
        self.set_parent_with(child, parent, binding, ParentOptions::default())
    }

    /// Parent `child` to `parent` without an inverse correction; the child
    /// jumps into the parent's space
    pub fn set_parent_without_inverse(
        &mut self,
        child: ObjectKey,
        parent: ObjectKey,
        binding: ParentBinding,
    ) -> ObjectResult<()> {
        self.set_parent_with(child, parent, binding, ParentOptions::without_inverse())
    }

    /// Parent `child` to `parent` with explicit options
    ///
    /// Cycles and unsupported bindings are rejected before anything is
    /// computed. The correction is taken against the last evaluated world
    /// matrices, so the child does not move until the parent does.
    pub fn set_parent_with(
        &mut self,
        child: ObjectKey,
        parent: ObjectKey,
        binding: ParentBinding,
        options: ParentOptions<'_>,
    ) -> ObjectResult<()> {
        self.object(child)?;
        let parent_type = self.object(parent)?.object_type();

        if hierarchy::would_create_cycle(&self.objects, child, parent) {
            log::warn!("Rejected parenting {child:?} to {parent:?}: cycle");
            return Err(ObjectError::CyclicParent { child, parent });
        }
        binding.check_supported(parent, parent_type)?;

        let correction = if options.keep_transform {
            let state = hierarchy::parent_state(&self.objects, &self.store, parent, options.pose)?;
            let bind = resolve_binding(&binding, &state).unwrap_or_else(|err| {
                log::warn!("Binding {child:?} to {parent:?} failed at assignment ({err}), using identity");
                Mat4::identity()
            });
            let current_part = self.object(child)?.runtime.parent_matrix();
            invert_safe(&bind, self.config.inversion_epsilon) * current_part
        } else {
            Mat4::identity()
        };

        let object = self.object_mut(child)?;
        let previous = object.parent.replace(ParentRelation {
            parent,
            binding,
            correction,
        });
        log::debug!("Parented '{}' to {parent:?}", object.name);

        if let Some(previous) = previous {
            self.unlink_child(previous.parent, child);
        }
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(child);
        }
        Ok(())
    }

    /// Remove the parent of `child`
    ///
    /// With `keep_transform` the last evaluated world matrix is written back
    /// into the channels; otherwise the child falls back to its local
    /// placement on the next pass.
    pub fn clear_parent(&mut self, child: ObjectKey, keep_transform: bool) -> ObjectResult<()> {
        let epsilon = self.config.inversion_epsilon;
        let object = self.object_mut(child)?;
        if object.parent.is_none() {
            return Ok(());
        }

        if keep_transform {
            let local = invert_safe(&object.constraint_correction, epsilon) * object.world.object_to_world;
            let mut transform = object.transform.clone();
            transform.apply_matrix(&local)?;
            object.transform = transform;
        }

        object.runtime.parent_matrix = None;
        object.runtime.binding_error = None;
        if let Some(relation) = object.parent.take() {
            self.unlink_child(relation.parent, child);
        }
        Ok(())
    }

    fn unlink_child(&mut self, parent: ObjectKey, child: ObjectKey) {
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|&key| key != child);
        }
    }

    /// Parent of an object
    pub fn parent_of(&self, key: ObjectKey) -> Option<ObjectKey> {
        self.objects.get(key)?.parent().map(|relation| relation.parent)
    }

    /// Direct children of an object
    pub fn children(&self, key: ObjectKey) -> &[ObjectKey] {
        self.children.get(key).map_or(&[], Vec::as_slice)
    }

    /// All descendants of an object, breadth first
    pub fn descendants(&self, key: ObjectKey) -> Vec<ObjectKey> {
        hierarchy::descendants(&self.children, key)
    }

    /// Objects without a parent
    pub fn roots(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.objects
            .iter()
            .filter(|(_, object)| object.parent().is_none())
            .map(|(key, _)| key)
    }

    // ---------------------------------------------------------------------
    // World evaluation
    // ---------------------------------------------------------------------

    /// Start a new evaluation pass and return its number
    pub fn begin_pass(&mut self) -> u64 {
        self.pass += 1;
        self.pass
    }

    /// Number of the current pass
    pub const fn current_pass(&self) -> u64 {
        self.pass
    }

    /// Evaluate one node's world matrix in the current pass
    ///
    /// The parent must already have been evaluated in this pass. A failed
    /// binding is logged and the node is placed as if unparented; the error
    /// stays available through [`crate::eval::ObjectRuntime::binding_error`].
    pub fn evaluate_world_transform(&mut self, key: ObjectKey, ctx: &EvalContext<'_>) -> ObjectResult<Mat4> {
        let pass = self.pass;
        let update = hierarchy::compute_node(&self.objects, &self.store, key, ctx.pose, pass)?;
        let world = update.world;
        let epsilon = self.config.inversion_epsilon;
        hierarchy::commit(self.object_mut(key)?, update, pass, epsilon);
        Ok(world)
    }

    /// Evaluate every world matrix in a new pass, parents first
    ///
    /// Each depth level is computed from the committed state of the levels
    /// above it; wide levels are split across the rayon pool. Cancellation is
    /// checked between levels, so every node ends up either fully updated or
    /// untouched.
    pub fn evaluate_transforms(&mut self, ctx: &EvalContext<'_>) -> PassReport {
        let pass = self.begin_pass();
        let epsilon = self.config.inversion_epsilon;
        let mut report = PassReport {
            pass,
            ..PassReport::default()
        };

        for level in hierarchy::depth_levels(&self.objects, &self.children) {
            if ctx.is_cancelled() {
                log::info!("Evaluation pass {pass} cancelled");
                report.cancelled = true;
                break;
            }

            for (key, result) in self.compute_level(&level, ctx, pass) {
                match result {
                    Ok(update) => {
                        if let Some(err) = &update.binding_error {
                            report.binding_fallbacks.push((key, err.clone()));
                        }
                        if let Some(object) = self.objects.get_mut(key) {
                            hierarchy::commit(object, update, pass, epsilon);
                            report.evaluated += 1;
                        }
                    }
                    Err(err) => {
                        log::warn!("Skipping {key:?} in pass {pass}: {err}");
                        report.failures.push((key, err));
                    }
                }
            }
        }

        log::debug!(
            "Pass {pass}: {} evaluated, {} fallbacks, {} failures",
            report.evaluated,
            report.binding_fallbacks.len(),
            report.failures.len()
        );
        report
    }

    fn compute_level(
        &self,
        level: &[ObjectKey],
        ctx: &EvalContext<'_>,
        pass: u64,
    ) -> Vec<(ObjectKey, ObjectResult<NodeUpdate>)> {
        let objects = &self.objects;
        let store = &self.store;
        let pose = ctx.pose;
        let compute = |&key: &ObjectKey| (key, hierarchy::compute_node(objects, store, key, pose, pass));

        if self.config.parallel_evaluation && level.len() >= self.config.parallel_min_level_width {
            level.par_iter().map(compute).collect()
        } else {
            level.iter().map(compute).collect()
        }
    }

    /// Object-to-world matrix from the last evaluation
    pub fn object_to_world(&self, key: ObjectKey) -> ObjectResult<Mat4> {
        Ok(*self.object(key)?.object_to_world())
    }

    /// World-to-object matrix from the last evaluation
    pub fn world_to_object(&self, key: ObjectKey) -> ObjectResult<Mat4> {
        Ok(*self.object(key)?.world_to_object())
    }

    // ---------------------------------------------------------------------
    // Evaluated data
    // ---------------------------------------------------------------------

    /// Evaluate an object's data for `mask`, memoized per authored revision
    pub fn evaluate(
        &mut self,
        key: ObjectKey,
        mask: DataMask,
        generator: &dyn GeometryGenerator,
    ) -> ObjectResult<&EvaluatedPayload> {
        let object = self.objects.get_mut(key).ok_or(ObjectError::ObjectNotFound(key))?;
        eval::evaluate_object(object, key, &mut self.store, mask, generator)
    }

    /// Geometry of the current evaluated payload
    pub fn evaluated_geometry(&self, key: ObjectKey) -> Option<&Geometry> {
        let payload = self.objects.get(key)?.runtime().payload()?;
        self.store.geometry(payload.evaluated().key())
    }

    /// Return an object to the unevaluated state, releasing owned data
    pub fn release_evaluated(&mut self, key: ObjectKey) -> ObjectResult<()> {
        let object = self.objects.get_mut(key).ok_or(ObjectError::ObjectNotFound(key))?;
        eval::release_evaluated(object, &mut self.store);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Bounds
    // ---------------------------------------------------------------------

    /// Local bounds, recomputed only when the geometry changed
    ///
    /// Empties report a cube of their display size. Objects without
    /// geometry report a cube of the configured default size; empty geometry
    /// reports a zero-size box at the origin.
    pub fn get_bounds(&mut self, key: ObjectKey) -> ObjectResult<BoundingBox> {
        let default_half_size = self.config.default_bounds_half_size;
        let object = self.objects.get_mut(key).ok_or(ObjectError::ObjectNotFound(key))?;

        if object.object_type() == ObjectType::Empty {
            return Ok(BoundingBox::cube(object.empty_display.size));
        }

        if object.runtime.bounds.is_dirty() {
            log::trace!("Recomputing bounds of '{}'", object.name);
        }
        let bounds = match eval::current_geometry(object, &self.store) {
            Some(geometry) => object.runtime.bounds.get_or_compute(|| bounds_of(geometry)),
            None => object
                .runtime
                .bounds
                .get_or_compute(|| BoundingBox::cube(default_half_size)),
        };
        Ok(bounds)
    }

    /// Local bounds extent scaled by the world scale
    pub fn dimensions(&mut self, key: ObjectKey) -> ObjectResult<Vec3> {
        let size = self.get_bounds(key)?.size();
        let scale = scale_of(self.object(key)?.object_to_world());
        Ok(size.component_mul(&scale))
    }

    /// World-space box around the local bounds
    pub fn world_bounds(&mut self, key: ObjectKey) -> ObjectResult<Aabb> {
        let bounds = self.get_bounds(key)?;
        Ok(bounds.transformed(self.object(key)?.object_to_world()))
    }

    /// Nearest selectable object whose world bounds the ray hits
    pub fn pick(&mut self, origin: Vec3, direction: Vec3) -> Option<(ObjectKey, f32)> {
        let candidates: Vec<ObjectKey> = self
            .objects
            .iter()
            .filter(|(_, object)| object.visibility.is_selectable())
            .map(|(key, _)| key)
            .collect();

        candidates
            .into_iter()
            .filter_map(|key| {
                let aabb = self.world_bounds(key).ok()?;
                aabb.intersect_ray(origin, direction).map(|distance| (key, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

fn bounds_of(geometry: &Geometry) -> BoundingBox {
    geometry.min_max().map_or_else(
        || BoundingBox::from_min_max(Vec3::zeros(), Vec3::zeros()),
        |(min, max)| BoundingBox::from_min_max(min, max),
    )
}
