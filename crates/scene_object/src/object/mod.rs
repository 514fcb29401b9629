//! Object nodes
//!
//! An [`Object`] is one placeable entity in a scene: its immutable type,
//! authored transform channels, parent relation, data link, materials,
//! modifiers and display settings. World matrices and evaluated data are
//! runtime state owned by the node but written only by the scene's
//! evaluation passes.

mod flags;
mod materials;
mod modifiers;
mod types;

pub use flags::{
    BoundsShape, DisplaySettings, DrawExtras, DrawType, EmptyDisplay, EmptyShape, TransformLocks,
    Visibility,
};
pub use materials::{MaterialLink, MaterialSlot, MaterialSlots};
pub use modifiers::{ModifierEntry, ModifierStack};
pub use types::ObjectType;

use serde::{Deserialize, Serialize};

use crate::error::{ObjectError, ObjectResult};
use crate::eval::ObjectRuntime;
use crate::foundation::collections::DataKey;
use crate::foundation::math::{Mat4, Quat, Quaternion, Vec3};
use crate::parent::ParentRelation;
use crate::transform::TransformChannels;

/// World matrices written by hierarchy evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldMatrices {
    /// Object space to world space
    pub object_to_world: Mat4,
    /// Inverse of `object_to_world`
    pub world_to_object: Mat4,
    /// Pass in which the matrices were last written
    pub evaluated_pass: Option<u64>,
}

impl Default for WorldMatrices {
    fn default() -> Self {
        Self {
            object_to_world: Mat4::identity(),
            world_to_object: Mat4::identity(),
            evaluated_pass: None,
        }
    }
}

/// Scene entity with authored state and evaluation results
#[derive(Debug, Serialize, Deserialize)]
pub struct Object {
    /// Display name
    pub name: String,
    object_type: ObjectType,

    /// Local transform channels
    pub transform: TransformChannels,
    pub(crate) parent: Option<ParentRelation>,
    /// Correction contributed by the constraint stack, applied before the local matrix
    pub constraint_correction: Mat4,

    data: Option<DataKey>,
    materials: MaterialSlots,
    /// Modifier stack, opaque to the object core
    pub modifiers: ModifierStack,

    /// Visibility flags
    pub visibility: Visibility,
    /// Transform locks
    pub locks: TransformLocks,
    /// Viewport display settings
    pub display: DisplaySettings,
    /// Shape and size of empties
    pub empty_display: EmptyDisplay,

    #[serde(skip)]
    pub(crate) world: WorldMatrices,
    #[serde(skip)]
    pub(crate) runtime: ObjectRuntime,
}

impl Object {
    /// Create an object with identity transform and default settings
    pub fn new(name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            name: name.into(),
            object_type,
            transform: TransformChannels::identity(),
            parent: None,
            constraint_correction: Mat4::identity(),
            data: None,
            materials: MaterialSlots::default(),
            modifiers: ModifierStack::default(),
            visibility: Visibility::default(),
            locks: TransformLocks::default(),
            display: DisplaySettings::default(),
            empty_display: EmptyDisplay::default(),
            world: WorldMatrices::default(),
            runtime: ObjectRuntime::default(),
        }
    }

    /// Builder pattern: set transform channels
    pub fn with_transform(mut self, transform: TransformChannels) -> Self {
        self.transform = transform;
        self
    }

    /// Copy of the authored state with fresh runtime state
    ///
    /// The copy links the same data block and parent; evaluated data is not
    /// shared.
    pub fn duplicate(&self) -> Self {
        Self {
            name: self.name.clone(),
            object_type: self.object_type,
            transform: self.transform.clone(),
            parent: self.parent.clone(),
            constraint_correction: self.constraint_correction,
            data: self.data,
            materials: self.materials.clone(),
            modifiers: self.modifiers.clone(),
            visibility: self.visibility,
            locks: self.locks,
            display: self.display,
            empty_display: self.empty_display,
            world: self.world,
            runtime: ObjectRuntime::default(),
        }
    }

    /// Object type, fixed at creation
    pub const fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Parent relation
    pub const fn parent(&self) -> Option<&ParentRelation> {
        self.parent.as_ref()
    }

    /// Linked data block
    pub const fn data(&self) -> Option<DataKey> {
        self.data
    }

    /// Link a data block; types without data reject it
    ///
    /// Goes through [`crate::scene::SceneGraph::set_data`], which also
    /// releases the evaluated result of the previous link.
    pub(crate) fn set_data(&mut self, data: Option<DataKey>) -> ObjectResult<()> {
        if data.is_some() && !self.object_type.has_data() {
            return Err(ObjectError::DataUnsupported(self.object_type.name()));
        }
        if self.data != data {
            self.data = data;
            self.runtime.bounds.mark_dirty();
        }
        Ok(())
    }

    /// Material slots
    pub const fn materials(&self) -> &MaterialSlots {
        &self.materials
    }

    /// Mutable material slots
    pub fn materials_mut(&mut self) -> &mut MaterialSlots {
        &mut self.materials
    }

    /// Add an empty material slot and make it active
    pub fn add_material_slot(&mut self) -> ObjectResult<usize> {
        if !self.object_type.supports_material() {
            return Err(ObjectError::MaterialsUnsupported(self.object_type.name()));
        }
        Ok(self.materials.add_slot())
    }

    /// Local matrix from the transform channels
    pub fn local_matrix(&self) -> ObjectResult<Mat4> {
        self.transform.compose_local_matrix()
    }

    /// World matrices from the last evaluation
    pub const fn world(&self) -> &WorldMatrices {
        &self.world
    }

    /// Object space to world space
    pub const fn object_to_world(&self) -> &Mat4 {
        &self.world.object_to_world
    }

    /// World space to object space
    pub const fn world_to_object(&self) -> &Mat4 {
        &self.world.world_to_object
    }

    /// Runtime state
    pub const fn runtime(&self) -> &ObjectRuntime {
        &self.runtime
    }

    /// Set location, keeping locked axes
    pub fn set_location(&mut self, location: Vec3) {
        self.transform.location = self.locks.filter_location(&self.transform.location, &location);
    }

    /// Set Euler angles, keeping locked axes
    pub fn set_euler(&mut self, euler: Vec3) {
        self.transform.euler = self.locks.filter_euler(&self.transform.euler, &euler);
    }

    /// Set the quaternion, keeping locked components
    pub fn set_quaternion(&mut self, quat: Quat) {
        self.transform.quaternion = self
            .locks
            .filter_quaternion(&self.transform.quaternion, &quat.into_inner());
    }

    /// Set axis and angle; the angle follows the W lock
    pub fn set_axis_angle(&mut self, axis: Vec3, angle: f32) {
        let current = Quaternion::from_parts(self.transform.angle, self.transform.axis);
        let filtered = self.locks.filter_quaternion(&current, &Quaternion::from_parts(angle, axis));
        self.transform.angle = filtered.w;
        self.transform.axis = filtered.imag();
    }

    /// Set scale, keeping locked axes
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = self.locks.filter_scale(&self.transform.scale, &scale);
    }
}
