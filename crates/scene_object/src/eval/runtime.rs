//! Non-persisted per-object runtime state

use crate::bounds::{BoundingBox, BoundsCache};
use crate::error::ObjectError;
use crate::eval::{CrazySpace, EvaluatedPayload, GeneratedData};
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::Geometry;

/// By-products of geometry evaluation, rebuilt from scratch every time
#[derive(Debug, Clone, Default)]
pub struct RuntimeCache {
    /// Geometry after deform-only modifiers
    pub deform: Option<Geometry>,
    /// Edit-mode cage
    pub cage: Option<Geometry>,
    /// Local bounds of the cage
    pub cage_bounds: Option<BoundingBox>,
    /// Crazy-space correction for the cage
    pub crazyspace: Option<CrazySpace>,
    /// Display-only geometry
    pub display: Option<Geometry>,
}

impl RuntimeCache {
    pub(crate) fn from_generated(generated: &mut GeneratedData) -> Self {
        let cage = generated.cage.take();
        let cage_bounds = cage
            .as_ref()
            .and_then(Geometry::min_max)
            .map(|(min, max)| BoundingBox::from_min_max(min, max));
        Self {
            deform: generated.deform.take(),
            cage,
            cage_bounds,
            crazyspace: generated.crazyspace.take(),
            display: generated.display.take(),
        }
    }

    /// Whether nothing is cached
    pub const fn is_empty(&self) -> bool {
        self.deform.is_none()
            && self.cage.is_none()
            && self.crazyspace.is_none()
            && self.display.is_none()
    }
}

/// Runtime state of an object: evaluated payload, caches and the results of
/// the last world evaluation
#[derive(Debug, Default)]
pub struct ObjectRuntime {
    pub(crate) payload: Option<EvaluatedPayload>,
    pub(crate) bounds: BoundsCache,
    pub(crate) cache: RuntimeCache,
    pub(crate) parent_matrix: Option<Mat4>,
    pub(crate) binding_error: Option<ObjectError>,
    pub(crate) negative_scale: bool,
    pub(crate) parent_display_origin: Vec3,
}

impl ObjectRuntime {
    /// Current evaluated payload
    pub const fn payload(&self) -> Option<&EvaluatedPayload> {
        self.payload.as_ref()
    }

    /// Evaluation by-products
    pub const fn cache(&self) -> &RuntimeCache {
        &self.cache
    }

    /// Local bounds cache
    pub const fn bounds(&self) -> &BoundsCache {
        &self.bounds
    }

    /// Binding failure from the last world evaluation, if it fell back
    pub const fn binding_error(&self) -> Option<&ObjectError> {
        self.binding_error.as_ref()
    }

    /// World matrix mirrors space
    pub const fn negative_scale(&self) -> bool {
        self.negative_scale
    }

    /// World-space point the parent relationship line is drawn to
    pub const fn parent_display_origin(&self) -> Vec3 {
        self.parent_display_origin
    }

    /// Combined parent binding and correction used in the last evaluation
    pub fn parent_matrix(&self) -> Mat4 {
        self.parent_matrix.unwrap_or_else(Mat4::identity)
    }
}
