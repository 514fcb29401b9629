//! Geometry generation collaborator interface
//!
//! The modifier stack is evaluated outside this crate. The cache hands the
//! collaborator a read-only view of the authored geometry and gets back
//! either "use the original as-is" or freshly produced geometry, plus the
//! optional by-products kept in the runtime cache.

use crate::error::GenerationError;
use crate::eval::DataMask;
use crate::foundation::math::{Mat3, Mat4, Vec3};
use crate::geometry::Geometry;
use crate::object::{ModifierStack, ObjectType};

/// Everything the collaborator may read for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Object name, for diagnostics
    pub name: &'a str,
    /// Object type
    pub object_type: ObjectType,
    /// Authored geometry
    pub original: &'a Geometry,
    /// Modifier stack to apply
    pub modifiers: &'a ModifierStack,
    /// Layers the result must carry
    pub mask: DataMask,
}

/// Main geometry result
#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    /// Nothing changed the geometry; the authored block is used directly
    Original,
    /// Newly produced geometry, owned by the evaluated object
    New(Geometry),
}

/// Per-vertex correction from deformed space back to original space
///
/// Lets edit tools apply an offset made on the deformed cage to the original
/// vertices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrazySpace {
    /// Inverse deformation matrix per vertex
    pub deform_imats: Vec<Mat3>,
    /// Deformed position per vertex
    pub deform_cos: Vec<Vec3>,
}

impl CrazySpace {
    /// Map an offset made on deformed vertex `index` back to original space
    pub fn to_original(&self, index: usize, offset: &Vec3) -> Option<Vec3> {
        self.deform_imats.get(index).map(|imat| imat * offset)
    }
}

/// Output of one geometry generation
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedData {
    /// Final evaluated geometry
    pub geometry: Derived,
    /// Geometry after deform-only modifiers
    pub deform: Option<Geometry>,
    /// Edit-mode cage
    pub cage: Option<Geometry>,
    /// Crazy-space correction for the cage
    pub crazyspace: Option<CrazySpace>,
    /// Display-only geometry (curve wires, meta surfaces)
    pub display: Option<Geometry>,
    /// Instance transforms produced by instancing modifiers
    pub instances: Vec<Mat4>,
}

impl GeneratedData {
    /// Result that reuses the authored geometry
    pub const fn original() -> Self {
        Self::with_geometry(Derived::Original)
    }

    /// Result with newly produced geometry
    pub const fn new(geometry: Geometry) -> Self {
        Self::with_geometry(Derived::New(geometry))
    }

    const fn with_geometry(geometry: Derived) -> Self {
        Self {
            geometry,
            deform: None,
            cage: None,
            crazyspace: None,
            display: None,
            instances: Vec::new(),
        }
    }

    /// Builder pattern: set deform-only geometry
    pub fn with_deform(mut self, deform: Geometry) -> Self {
        self.deform = Some(deform);
        self
    }

    /// Builder pattern: set edit cage
    pub fn with_cage(mut self, cage: Geometry) -> Self {
        self.cage = Some(cage);
        self
    }

    /// Builder pattern: set crazy-space correction
    pub fn with_crazyspace(mut self, crazyspace: CrazySpace) -> Self {
        self.crazyspace = Some(crazyspace);
        self
    }

    /// Builder pattern: set display geometry
    pub fn with_display(mut self, display: Geometry) -> Self {
        self.display = Some(display);
        self
    }

    /// Builder pattern: set instance transforms
    pub fn with_instances(mut self, instances: Vec<Mat4>) -> Self {
        self.instances = instances;
        self
    }
}

/// Modifier-stack evaluator consumed by the evaluated-state cache
pub trait GeometryGenerator {
    /// Produce derived geometry for `request`; may fail
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError>;
}

impl<F> GeometryGenerator for F
where
    F: Fn(&GenerationRequest<'_>) -> Result<GeneratedData, GenerationError>,
{
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError> {
        self(request)
    }
}

/// Generator for objects without geometry-changing modifiers
///
/// Returns the original geometry untouched, so evaluated objects borrow
/// their authored data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughGenerator;

impl GeometryGenerator for PassthroughGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError> {
        log::trace!("Passthrough evaluation for '{}'", request.name);
        Ok(GeneratedData::original())
    }
}
