//! Local transform channels and their composition into a local matrix
//!
//! Every channel has a base value and a delta value layered on top of it.
//! Composition is `T · R · S` with:
//!
//! ```text
//! T = translation(location + delta_location)
//! R = R_delta · R_base          (base rotation first, then delta)
//! S = scaling(scale ⊙ delta_scale)
//! ```
//!
//! The delta rotation order is the same for all three representations.

mod rotation;

pub use rotation::{
    axis_angle_to_quat, euler_to_mat3, mat3_to_euler, quat_to_axis_angle, EulerOrder,
    RotationMode,
};

use serde::{Deserialize, Serialize};

use crate::error::{ObjectError, ObjectResult};
use crate::foundation::math::{Mat3, Mat4, Quat, Quaternion, Transform, Vec3};

/// Rotation stored in a single representation
#[derive(Debug, Clone, Copy, PartialEq)]
enum RotationValue<'a> {
    Euler(&'a Vec3, EulerOrder),
    Quaternion(&'a Quaternion<f32>),
    AxisAngle(&'a Vec3, f32),
}

impl RotationValue<'_> {
    fn to_mat3(self, mode: RotationMode) -> ObjectResult<Mat3> {
        let invalid = || ObjectError::InvalidRotationChannel { mode };
        match self {
            Self::Euler(angles, order) => {
                if angles.iter().all(|v| v.is_finite()) {
                    Ok(euler_to_mat3(angles, order))
                } else {
                    Err(invalid())
                }
            }
            Self::Quaternion(quat) => {
                let norm = quat.norm();
                if norm.is_finite() && norm > f32::EPSILON {
                    Ok(*Quat::new_normalize(*quat).to_rotation_matrix().matrix())
                } else {
                    Err(invalid())
                }
            }
            Self::AxisAngle(axis, angle) => {
                if !angle.is_finite() || !axis.iter().all(|v| v.is_finite()) {
                    return Err(invalid());
                }
                if angle == 0.0 {
                    return Ok(Mat3::identity());
                }
                axis_angle_to_quat(axis, angle)
                    .map(|q| *q.to_rotation_matrix().matrix())
                    .ok_or_else(invalid)
            }
        }
    }
}

/// Authored local transform channels of an object
///
/// Only the rotation fields selected by `rotation_mode` are read during
/// composition; the other representations are inert storage updated by
/// [`TransformChannels::set_rotation_mode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformChannels {
    /// Location
    pub location: Vec3,
    /// Location added on top of `location`
    pub delta_location: Vec3,

    /// Active rotation representation
    pub rotation_mode: RotationMode,

    /// Euler angles in radians
    pub euler: Vec3,
    /// Delta Euler angles in radians
    pub delta_euler: Vec3,

    /// Quaternion (w, x, y, z); normalized on use
    pub quaternion: Quaternion<f32>,
    /// Delta quaternion
    pub delta_quaternion: Quaternion<f32>,

    /// Rotation axis
    pub axis: Vec3,
    /// Rotation angle in radians
    pub angle: f32,
    /// Delta rotation axis
    pub delta_axis: Vec3,
    /// Delta rotation angle in radians
    pub delta_angle: f32,

    /// Scale, negative values mirror
    pub scale: Vec3,
    /// Scale multiplied into `scale`
    pub delta_scale: Vec3,
}

impl Default for TransformChannels {
    fn default() -> Self {
        Self {
            location: Vec3::zeros(),
            delta_location: Vec3::zeros(),
            rotation_mode: RotationMode::default(),
            euler: Vec3::zeros(),
            delta_euler: Vec3::zeros(),
            quaternion: Quaternion::identity(),
            delta_quaternion: Quaternion::identity(),
            axis: Vec3::y(),
            angle: 0.0,
            delta_axis: Vec3::y(),
            delta_angle: 0.0,
            scale: Vec3::new(1.0, 1.0, 1.0),
            delta_scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformChannels {
    /// Identity channels
    pub fn identity() -> Self {
        Self::default()
    }

    /// Builder pattern: set location
    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = location;
        self
    }

    /// Builder pattern: set Euler rotation and switch to that Euler order
    pub fn with_euler(mut self, angles: Vec3, order: EulerOrder) -> Self {
        self.rotation_mode = RotationMode::Euler(order);
        self.euler = angles;
        self
    }

    /// Builder pattern: set quaternion rotation and switch to quaternion mode
    pub fn with_quaternion(mut self, quat: Quat) -> Self {
        self.rotation_mode = RotationMode::Quaternion;
        self.quaternion = quat.into_inner();
        self
    }

    /// Builder pattern: set axis-angle rotation and switch to axis-angle mode
    pub fn with_axis_angle(mut self, axis: Vec3, angle: f32) -> Self {
        self.rotation_mode = RotationMode::AxisAngle;
        self.axis = axis;
        self.angle = angle;
        self
    }

    /// Builder pattern: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    fn base_value(&self) -> RotationValue<'_> {
        match self.rotation_mode {
            RotationMode::Euler(order) => RotationValue::Euler(&self.euler, order),
            RotationMode::Quaternion => RotationValue::Quaternion(&self.quaternion),
            RotationMode::AxisAngle => RotationValue::AxisAngle(&self.axis, self.angle),
        }
    }

    fn delta_value(&self) -> RotationValue<'_> {
        match self.rotation_mode {
            RotationMode::Euler(order) => RotationValue::Euler(&self.delta_euler, order),
            RotationMode::Quaternion => RotationValue::Quaternion(&self.delta_quaternion),
            RotationMode::AxisAngle => RotationValue::AxisAngle(&self.delta_axis, self.delta_angle),
        }
    }

    /// Base rotation matrix of the active representation
    pub fn base_rotation(&self) -> ObjectResult<Mat3> {
        self.base_value().to_mat3(self.rotation_mode)
    }

    /// Delta rotation matrix of the active representation
    pub fn delta_rotation(&self) -> ObjectResult<Mat3> {
        self.delta_value().to_mat3(self.rotation_mode)
    }

    /// Combined rotation, base first then delta
    pub fn rotation_matrix(&self) -> ObjectResult<Mat3> {
        Ok(self.delta_rotation()? * self.base_rotation()?)
    }

    /// Total location including the delta
    pub fn total_location(&self) -> Vec3 {
        self.location + self.delta_location
    }

    /// Total scale including the delta
    pub fn total_scale(&self) -> Vec3 {
        self.scale.component_mul(&self.delta_scale)
    }

    /// Compose the local matrix `T · R · S`
    ///
    /// Zero scale produces a singular matrix. A rotation channel that does not
    /// hold a usable rotation for the active mode is rejected.
    pub fn compose_local_matrix(&self) -> ObjectResult<Mat4> {
        let rotation = self.rotation_matrix()?;
        Ok(Mat4::new_translation(&self.total_location())
            * rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.total_scale()))
    }

    /// Switch the active rotation representation, converting base and delta
    /// values so the composed rotation does not change
    pub fn set_rotation_mode(&mut self, mode: RotationMode) -> ObjectResult<()> {
        if mode == self.rotation_mode {
            return Ok(());
        }
        let base = self.base_rotation()?;
        let delta = self.delta_rotation()?;
        self.rotation_mode = mode;
        self.store_base_rotation(&base);
        self.store_delta_rotation(&delta);
        Ok(())
    }

    fn store_base_rotation(&mut self, rotation: &Mat3) {
        let quat = Quat::from_matrix(rotation);
        match self.rotation_mode {
            RotationMode::Euler(order) => self.euler = mat3_to_euler(rotation, order),
            RotationMode::Quaternion => self.quaternion = quat.into_inner(),
            RotationMode::AxisAngle => (self.axis, self.angle) = quat_to_axis_angle(&quat),
        }
    }

    fn store_delta_rotation(&mut self, rotation: &Mat3) {
        let quat = Quat::from_matrix(rotation);
        match self.rotation_mode {
            RotationMode::Euler(order) => self.delta_euler = mat3_to_euler(rotation, order),
            RotationMode::Quaternion => self.delta_quaternion = quat.into_inner(),
            RotationMode::AxisAngle => {
                (self.delta_axis, self.delta_angle) = quat_to_axis_angle(&quat);
            }
        }
    }

    /// Solve base channels so that the composed matrix equals `matrix`
    ///
    /// Delta channels are kept as they are. A zero delta scale axis leaves
    /// the matching base scale untouched.
    pub fn apply_matrix(&mut self, matrix: &Mat4) -> ObjectResult<()> {
        let decomposed = Transform::from_matrix(matrix);
        let delta = self.delta_rotation()?;

        self.location = decomposed.position - self.delta_location;

        let total = *decomposed.rotation.to_rotation_matrix().matrix();
        let base = delta.transpose() * total;
        self.store_base_rotation(&base);

        for axis in 0..3 {
            if self.delta_scale[axis] != 0.0 {
                self.scale[axis] = decomposed.scale[axis] / self.delta_scale[axis];
            }
        }
        Ok(())
    }
}

/// Compose the local matrix for a set of channels
pub fn compose_local_matrix(channels: &TransformChannels) -> ObjectResult<Mat4> {
    channels.compose_local_matrix()
}
