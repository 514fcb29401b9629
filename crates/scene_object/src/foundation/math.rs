//! Math utilities and types
//!
//! Provides the fundamental math types used by transform composition and
//! hierarchy evaluation. Matrices are column-major with column vectors, so a
//! translation lives in the fourth column (`m14`, `m24`, `m34`).

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Decomposed position, rotation, and scale
///
/// Used when a world or local matrix has to be written back into transform
/// channels (clearing a parent while keeping the world placement).
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Translation
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors, negative on X when the matrix mirrors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Convert to a transformation matrix (T · R · S)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into translation, rotation and scale
    ///
    /// Axes with zero length keep a zero scale and contribute an identity
    /// column to the rotation, so degenerate matrices decompose without NaN.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = translation_of(matrix);

        let mut axes = [
            Vec3::new(matrix.m11, matrix.m21, matrix.m31),
            Vec3::new(matrix.m12, matrix.m22, matrix.m32),
            Vec3::new(matrix.m13, matrix.m23, matrix.m33),
        ];
        let mut scale = Vec3::new(axes[0].norm(), axes[1].norm(), axes[2].norm());

        if is_negative(matrix) {
            scale.x = -scale.x;
        }

        for (i, axis) in axes.iter_mut().enumerate() {
            if scale[i].abs() > f32::EPSILON {
                *axis /= scale[i];
            } else {
                *axis = Vec3::zeros();
                axis[i] = 1.0;
            }
        }

        let rotation_matrix = Mat3::from_columns(&axes);
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Translation column of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Upper-left 3x3 block of an affine matrix
pub fn linear_part(matrix: &Mat4) -> Mat3 {
    matrix.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Per-axis scale of an affine matrix (column lengths)
pub fn scale_of(matrix: &Mat4) -> Vec3 {
    let linear = linear_part(matrix);
    Vec3::new(
        linear.column(0).norm(),
        linear.column(1).norm(),
        linear.column(2).norm(),
    )
}

/// Whether the matrix mirrors space (negative determinant of the 3x3 part)
pub fn is_negative(matrix: &Mat4) -> bool {
    linear_part(matrix).determinant() < 0.0
}

/// Invert a matrix, falling back to a pseudo-inverse when it is singular
///
/// Zero scale is legal on transform channels and must propagate as a singular
/// world matrix. Its inverse is then the closest well-defined matrix rather
/// than a matrix full of infinities.
pub fn invert_safe(matrix: &Mat4, epsilon: f32) -> Mat4 {
    let owned = *matrix;
    if let Some(inverse) = owned.try_inverse() {
        if inverse.iter().all(|v| v.is_finite()) {
            return inverse;
        }
    }

    match owned.pseudo_inverse(epsilon) {
        Ok(inverse) => {
            log::debug!("Singular matrix inverted through pseudo-inverse");
            inverse
        }
        Err(reason) => {
            log::warn!("Failed to invert singular matrix ({reason}), using identity");
            Mat4::identity()
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}
