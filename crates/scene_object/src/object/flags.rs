//! Grouped object settings
//!
//! Visibility, transform locks and display options are kept as named fields
//! instead of packed bit masks.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Quaternion, Vec3};

/// Per-object visibility and ray visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Visibility {
    /// Hidden in viewports
    pub hide_viewport: bool,
    /// Cannot be selected
    pub hide_select: bool,
    /// Excluded from final renders
    pub hide_render: bool,
    /// Invisible to camera rays
    pub hide_camera: bool,
    /// Invisible to diffuse rays
    pub hide_diffuse: bool,
    /// Invisible to glossy rays
    pub hide_glossy: bool,
    /// Invisible to transmission rays
    pub hide_transmission: bool,
    /// Invisible to volume scatter rays
    pub hide_volume_scatter: bool,
    /// Casts no shadow
    pub hide_shadow: bool,
    /// Renders as a holdout mask
    pub holdout: bool,
    /// Only catches shadows
    pub shadow_catcher: bool,
}

impl Visibility {
    /// Whether selection tools may pick the object
    pub const fn is_selectable(&self) -> bool {
        !self.hide_select && !self.hide_viewport
    }
}

/// Per-axis transform locks honoured by the channel setters on [`crate::object::Object`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformLocks {
    /// Locked location axes
    pub location: [bool; 3],
    /// Locked rotation axes
    pub rotation: [bool; 3],
    /// Locked quaternion W / axis-angle angle
    pub rotation_w: bool,
    /// Lock rotation as four components instead of three
    pub rotation_4d: bool,
    /// Locked scale axes
    pub scale: [bool; 3],
}

impl TransformLocks {
    /// Lock every channel
    pub const fn all() -> Self {
        Self {
            location: [true; 3],
            rotation: [true; 3],
            rotation_w: true,
            rotation_4d: true,
            scale: [true; 3],
        }
    }

    fn filter(locked: [bool; 3], current: &Vec3, proposed: &Vec3) -> Vec3 {
        Vec3::from_fn(|i, _| if locked[i] { current[i] } else { proposed[i] })
    }

    /// Proposed location with locked axes kept at their current value
    pub fn filter_location(&self, current: &Vec3, proposed: &Vec3) -> Vec3 {
        Self::filter(self.location, current, proposed)
    }

    /// Proposed Euler angles with locked axes kept
    pub fn filter_euler(&self, current: &Vec3, proposed: &Vec3) -> Vec3 {
        Self::filter(self.rotation, current, proposed)
    }

    /// Proposed scale with locked axes kept
    pub fn filter_scale(&self, current: &Vec3, proposed: &Vec3) -> Vec3 {
        Self::filter(self.scale, current, proposed)
    }

    /// Proposed quaternion with locked components kept
    ///
    /// Component locks only apply with the 4D lock enabled; otherwise any
    /// axis lock freezes the whole quaternion.
    pub fn filter_quaternion(
        &self,
        current: &Quaternion<f32>,
        proposed: &Quaternion<f32>,
    ) -> Quaternion<f32> {
        if self.rotation_4d {
            let pick = |locked: bool, c: f32, p: f32| if locked { c } else { p };
            Quaternion::new(
                pick(self.rotation_w, current.w, proposed.w),
                pick(self.rotation[0], current.i, proposed.i),
                pick(self.rotation[1], current.j, proposed.j),
                pick(self.rotation[2], current.k, proposed.k),
            )
        } else if self.rotation.iter().any(|&l| l) || self.rotation_w {
            *current
        } else {
            *proposed
        }
    }
}

/// Viewport shading used for the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawType {
    /// Bounding box only
    Bounds,
    /// Wireframe
    Wire,
    /// Solid shading
    Solid,
    /// Full material shading
    #[default]
    Textured,
}

/// Shape drawn for the bounds display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundsShape {
    /// Box
    #[default]
    Box,
    /// Sphere
    Sphere,
    /// Cylinder
    Cylinder,
    /// Cone
    Cone,
    /// Capsule
    Capsule,
}

/// Extra overlays drawn for the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DrawExtras {
    /// Draw the bounds
    pub bounds: bool,
    /// Draw the name
    pub name: bool,
    /// Draw local axes
    pub axes: bool,
    /// Draw texture space
    pub texture_space: bool,
    /// Draw the wireframe over shading
    pub wire: bool,
    /// Draw in front of other objects
    pub in_front: bool,
    /// Draw transparent
    pub transparent: bool,
    /// Draw all edges
    pub all_edges: bool,
    /// Skip shadow casting in viewport
    pub no_shadow_cast: bool,
}

/// Viewport display options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Maximum shading mode
    pub draw_type: DrawType,
    /// Shape for bounds display
    pub bounds_shape: BoundsShape,
    /// Extra overlays
    pub extras: DrawExtras,
    /// Object color (RGBA)
    pub color: [f32; 4],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            draw_type: DrawType::default(),
            bounds_shape: BoundsShape::default(),
            extras: DrawExtras::default(),
            color: [1.0; 4],
        }
    }
}

/// Shape drawn for empties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyShape {
    /// Three arrows
    Arrows,
    /// Plain axes
    #[default]
    PlainAxes,
    /// Circle
    Circle,
    /// Single arrow
    SingleArrow,
    /// Cube
    Cube,
    /// Sphere
    Sphere,
    /// Cone
    Cone,
    /// Image
    Image,
}

/// Display shape and size for empties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmptyDisplay {
    /// Shape
    pub shape: EmptyShape,
    /// Half-size of the drawn shape
    pub size: f32,
}

impl Default for EmptyDisplay {
    fn default() -> Self {
        Self {
            shape: EmptyShape::default(),
            size: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_lock_keeps_axis() {
        let locks = TransformLocks {
            location: [false, true, false],
            ..Default::default()
        };
        let filtered = locks.filter_location(&Vec3::new(1.0, 2.0, 3.0), &Vec3::new(5.0, 6.0, 7.0));
        assert_eq!(filtered, Vec3::new(5.0, 2.0, 7.0));
    }

    #[test]
    fn test_quaternion_lock_modes() {
        let current = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let proposed = Quaternion::new(0.5, 0.5, 0.5, 0.5);

        let axis_lock = TransformLocks {
            rotation: [true, false, false],
            ..Default::default()
        };
        assert_eq!(axis_lock.filter_quaternion(&current, &proposed), current);

        let component_lock = TransformLocks {
            rotation_w: true,
            rotation_4d: true,
            ..Default::default()
        };
        assert_eq!(
            component_lock.filter_quaternion(&current, &proposed),
            Quaternion::new(1.0, 0.5, 0.5, 0.5)
        );
    }

    #[test]
    fn test_hidden_objects_are_not_selectable() {
        let visibility = Visibility {
            hide_viewport: true,
            ..Default::default()
        };
        assert!(!visibility.is_selectable());
        assert!(Visibility::default().is_selectable());
    }
}
