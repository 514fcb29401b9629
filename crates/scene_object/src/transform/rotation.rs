//! Rotation representations and conversions
//!
//! Euler angles are applied in the order their name spells: `Xyz` rotates
//! around X first, then Y, then Z, which as a matrix is `Rz · Ry · Rx`.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat3, Quat, Unit, Vec3};

/// Order in which Euler angles are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EulerOrder {
    /// X, then Y, then Z
    #[default]
    Xyz,
    /// X, then Z, then Y
    Xzy,
    /// Y, then X, then Z
    Yxz,
    /// Y, then Z, then X
    Yzx,
    /// Z, then X, then Y
    Zxy,
    /// Z, then Y, then X
    Zyx,
}

impl EulerOrder {
    /// Axis indices in application order
    pub const fn axes(self) -> [usize; 3] {
        match self {
            Self::Xyz => [0, 1, 2],
            Self::Xzy => [0, 2, 1],
            Self::Yxz => [1, 0, 2],
            Self::Yzx => [1, 2, 0],
            Self::Zxy => [2, 0, 1],
            Self::Zyx => [2, 1, 0],
        }
    }
}

/// Active rotation representation of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationMode {
    /// Euler angles with the given application order
    Euler(EulerOrder),
    /// Unit quaternion
    Quaternion,
    /// Axis and angle
    AxisAngle,
}

impl Default for RotationMode {
    fn default() -> Self {
        Self::Euler(EulerOrder::Xyz)
    }
}

fn axis_rotation(axis: usize, angle: f32) -> Mat3 {
    let unit = match axis {
        0 => Vec3::x_axis(),
        1 => Vec3::y_axis(),
        _ => Vec3::z_axis(),
    };
    *nalgebra::Rotation3::from_axis_angle(&unit, angle).matrix()
}

/// Rotation matrix for Euler angles (radians) in the given order
pub fn euler_to_mat3(angles: &Vec3, order: EulerOrder) -> Mat3 {
    order
        .axes()
        .iter()
        .fold(Mat3::identity(), |acc, &axis| axis_rotation(axis, angles[axis]) * acc)
}

/// Euler angles (radians) reproducing a pure rotation matrix in the given order
///
/// Solves for the order-specific angles by permuting the matrix into the
/// `Xyz` layout, extracting, and mapping the angles back.
pub fn mat3_to_euler(matrix: &Mat3, order: EulerOrder) -> Vec3 {
    let [i, j, k] = order.axes();
    // Parity of the permutation (i, j, k) relative to (0, 1, 2).
    let sign = if (i + 1) % 3 == j { 1.0 } else { -1.0 };

    let m = |row: usize, col: usize| matrix[(row, col)];
    let cy = (m(i, i) * m(i, i) + m(j, i) * m(j, i)).sqrt();

    let (a, b, c) = if cy > 16.0 * f32::EPSILON {
        (
            (sign * m(k, j)).atan2(m(k, k)),
            (-sign * m(k, i)).atan2(cy),
            (sign * m(j, i)).atan2(m(i, i)),
        )
    } else {
        (
            (-sign * m(j, k)).atan2(m(j, j)),
            (-sign * m(k, i)).atan2(cy),
            0.0,
        )
    };

    let mut angles = Vec3::zeros();
    angles[i] = a;
    angles[j] = b;
    angles[k] = c;
    angles
}

/// Quaternion from axis and angle; a zero axis yields `None`
pub fn axis_angle_to_quat(axis: &Vec3, angle: f32) -> Option<Quat> {
    if axis.norm_squared() <= f32::EPSILON {
        return None;
    }
    Some(Quat::from_axis_angle(&Unit::new_normalize(*axis), angle))
}

/// Axis and angle for a quaternion; identity maps to the +Y axis with zero angle
pub fn quat_to_axis_angle(quat: &Quat) -> (Vec3, f32) {
    quat.axis_angle()
        .map_or((Vec3::y(), 0.0), |(axis, angle)| (axis.into_inner(), angle))
}
