//! Import adapter for packed object fields from old files
//!
//! Old files store parenting, rotation mode, locks, visibility and display
//! options as packed integers, plus an additive delta size that predates the
//! multiplicative delta scale. The I/O layer decodes them here once; the
//! evaluation path only ever sees the grouped settings on [`Object`].

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::object::{BoundsShape, DrawExtras, DrawType, EmptyShape, Object, TransformLocks, Visibility};
use crate::parent::ParentBinding;
use crate::transform::{EulerOrder, RotationMode};

const PARTYPE_MASK: i16 = (1 << 4) - 1;
const PARSLOW: i16 = 16;

const PAROBJECT: i16 = 0;
const PARSKEL: i16 = 4;
const PARVERT1: i16 = 5;
const PARVERT3: i16 = 6;
const PARBONE: i16 = 7;

/// Packed fields as read from an old file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegacyObjectFields {
    /// Parent type in the low four bits, slow-parent flag above
    pub partype: i16,
    /// First parent vertex index
    pub par1: i32,
    /// Second parent vertex index
    pub par2: i32,
    /// Third parent vertex index
    pub par3: i32,
    /// Parent bone name
    pub parsubstr: String,
    /// Rotation mode code
    pub rotmode: i16,
    /// Transform lock bits
    pub protectflag: u16,
    /// Visibility bits
    pub visibility_flag: u16,
    /// Display type code
    pub dt: u8,
    /// Bounds display shape code
    pub boundtype: u8,
    /// Draw-extra bits
    pub dtx: u16,
    /// Additive delta size, replaced by the multiplicative delta scale
    pub dsize: [f32; 3],
    /// Empty display shape code
    pub empty_drawtype: u8,
    /// Empty display size
    pub empty_drawsize: f32,
}

fn vertex_index(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

const fn bit(flags: u16, index: u32) -> bool {
    flags & (1 << index) != 0
}

impl LegacyObjectFields {
    /// Whether the slow-parent flag is set; slow parenting is not supported
    /// and is dropped on import
    pub const fn is_slow_parent(&self) -> bool {
        self.partype & PARSLOW != 0
    }

    /// Binding described by `partype` and the parent indices
    ///
    /// Returns `None` for unknown codes or negative vertex indices. Whether
    /// the object has a parent at all is decided by the caller.
    pub fn parent_binding(&self) -> Option<ParentBinding> {
        match self.partype & PARTYPE_MASK {
            PAROBJECT => Some(ParentBinding::Object),
            PARSKEL => Some(ParentBinding::Skeleton),
            PARVERT1 => vertex_index(self.par1).map(ParentBinding::Vertex),
            PARVERT3 => Some(ParentBinding::VertexTriple([
                vertex_index(self.par1)?,
                vertex_index(self.par2)?,
                vertex_index(self.par3)?,
            ])),
            PARBONE => Some(ParentBinding::Bone(self.parsubstr.clone())),
            other => {
                log::warn!("Unknown legacy parent type {other}");
                None
            }
        }
    }

    /// Rotation mode for `rotmode`; unknown codes fall back to XYZ Euler
    pub fn rotation_mode(&self) -> RotationMode {
        match self.rotmode {
            -1 => RotationMode::AxisAngle,
            0 => RotationMode::Quaternion,
            1 => RotationMode::Euler(EulerOrder::Xyz),
            2 => RotationMode::Euler(EulerOrder::Xzy),
            3 => RotationMode::Euler(EulerOrder::Yxz),
            4 => RotationMode::Euler(EulerOrder::Yzx),
            5 => RotationMode::Euler(EulerOrder::Zxy),
            6 => RotationMode::Euler(EulerOrder::Zyx),
            other => {
                log::warn!("Unknown legacy rotation mode {other}, using XYZ Euler");
                RotationMode::default()
            }
        }
    }

    /// Locks from `protectflag`
    pub const fn locks(&self) -> TransformLocks {
        let f = self.protectflag;
        TransformLocks {
            location: [bit(f, 0), bit(f, 1), bit(f, 2)],
            rotation: [bit(f, 3), bit(f, 4), bit(f, 5)],
            scale: [bit(f, 6), bit(f, 7), bit(f, 8)],
            rotation_w: bit(f, 9),
            rotation_4d: bit(f, 10),
        }
    }

    /// Visibility from `visibility_flag`
    pub const fn visibility(&self) -> Visibility {
        let f = self.visibility_flag;
        Visibility {
            hide_viewport: bit(f, 0),
            hide_select: bit(f, 1),
            hide_render: bit(f, 2),
            hide_camera: bit(f, 3),
            hide_diffuse: bit(f, 4),
            hide_glossy: bit(f, 5),
            hide_transmission: bit(f, 6),
            hide_volume_scatter: bit(f, 7),
            hide_shadow: bit(f, 8),
            holdout: bit(f, 9),
            shadow_catcher: bit(f, 10),
        }
    }

    /// Draw extras from `dtx`
    pub const fn draw_extras(&self) -> DrawExtras {
        let f = self.dtx;
        DrawExtras {
            bounds: bit(f, 0),
            axes: bit(f, 1),
            texture_space: bit(f, 2),
            name: bit(f, 3),
            wire: bit(f, 5),
            in_front: bit(f, 6),
            transparent: bit(f, 7),
            all_edges: bit(f, 8),
            no_shadow_cast: bit(f, 9),
        }
    }

    /// Display type from `dt`
    pub const fn draw_type(&self) -> DrawType {
        match self.dt {
            1 => DrawType::Bounds,
            2 => DrawType::Wire,
            3 => DrawType::Solid,
            _ => DrawType::Textured,
        }
    }

    /// Bounds display shape from `boundtype`
    pub const fn bounds_shape(&self) -> BoundsShape {
        match self.boundtype {
            1 => BoundsShape::Sphere,
            2 => BoundsShape::Cylinder,
            3 => BoundsShape::Cone,
            7 => BoundsShape::Capsule,
            _ => BoundsShape::Box,
        }
    }

    /// Empty shape from `empty_drawtype`
    pub const fn empty_shape(&self) -> EmptyShape {
        match self.empty_drawtype {
            1 => EmptyShape::Arrows,
            3 => EmptyShape::Circle,
            4 => EmptyShape::SingleArrow,
            5 => EmptyShape::Cube,
            6 => EmptyShape::Sphere,
            7 => EmptyShape::Cone,
            8 => EmptyShape::Image,
            _ => EmptyShape::PlainAxes,
        }
    }

    /// Multiplicative delta scale equivalent to the additive delta size
    pub fn delta_scale(&self) -> Vec3 {
        Vec3::from(self.dsize).add_scalar(1.0)
    }

    /// Write the decoded settings into `object`
    ///
    /// The rotation mode is set as-is: old files already store their rotation
    /// in the channel that mode reads. The parent is not touched; the I/O
    /// layer resolves the parent handle and calls the scene with
    /// [`Self::parent_binding`].
    pub fn migrate(&self, object: &mut Object) {
        if self.is_slow_parent() {
            log::info!("Dropping slow parent flag of '{}'", object.name);
        }

        object.transform.rotation_mode = self.rotation_mode();
        if self.dsize != [0.0; 3] {
            object.transform.delta_scale = self.delta_scale();
        }

        object.locks = self.locks();
        object.visibility = self.visibility();
        object.display.draw_type = self.draw_type();
        object.display.bounds_shape = self.bounds_shape();
        object.display.extras = self.draw_extras();
        object.empty_display.shape = self.empty_shape();
        if self.empty_drawsize > 0.0 {
            object.empty_display.size = self.empty_drawsize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectType;

    #[test]
    fn test_parent_types() {
        let fields = LegacyObjectFields {
            partype: PARVERT3 | PARSLOW,
            par1: 1,
            par2: 2,
            par3: 5,
            ..Default::default()
        };
        assert!(fields.is_slow_parent());
        assert_eq!(fields.parent_binding(), Some(ParentBinding::VertexTriple([1, 2, 5])));

        let bone = LegacyObjectFields {
            partype: PARBONE,
            parsubstr: "spine".into(),
            ..Default::default()
        };
        assert_eq!(bone.parent_binding(), Some(ParentBinding::Bone("spine".into())));

        let negative = LegacyObjectFields {
            partype: PARVERT1,
            par1: -1,
            ..Default::default()
        };
        assert_eq!(negative.parent_binding(), None);
    }

    #[test]
    fn test_rotation_modes() {
        let mode = |rotmode| LegacyObjectFields { rotmode, ..Default::default() }.rotation_mode();
        assert_eq!(mode(-1), RotationMode::AxisAngle);
        assert_eq!(mode(0), RotationMode::Quaternion);
        assert_eq!(mode(6), RotationMode::Euler(EulerOrder::Zyx));
        assert_eq!(mode(42), RotationMode::Euler(EulerOrder::Xyz));
    }

    #[test]
    fn test_packed_flags() {
        let fields = LegacyObjectFields {
            protectflag: (1 << 1) | (1 << 6) | (1 << 10),
            visibility_flag: (1 << 1) | (1 << 10),
            dtx: (1 << 3) | (1 << 6),
            ..Default::default()
        };

        let locks = fields.locks();
        assert_eq!(locks.location, [false, true, false]);
        assert_eq!(locks.scale, [true, false, false]);
        assert!(locks.rotation_4d);

        let visibility = fields.visibility();
        assert!(visibility.hide_select && visibility.shadow_catcher);
        assert!(!visibility.is_selectable());

        let extras = fields.draw_extras();
        assert!(extras.name && extras.in_front && !extras.wire);
    }

    #[test]
    fn test_migrate_converts_delta_size() {
        let fields = LegacyObjectFields {
            rotmode: 0,
            dsize: [0.5, 0.0, -0.5],
            dt: 2,
            empty_drawtype: 5,
            empty_drawsize: 2.0,
            ..Default::default()
        };
        let mut object = Object::new("Old", ObjectType::Empty);
        fields.migrate(&mut object);

        assert_eq!(object.transform.rotation_mode, RotationMode::Quaternion);
        assert_eq!(object.transform.delta_scale, Vec3::new(1.5, 1.0, 0.5));
        assert_eq!(object.display.draw_type, DrawType::Wire);
        assert_eq!(object.empty_display.shape, EmptyShape::Cube);
        assert_eq!(object.empty_display.size, 2.0);
    }
}
