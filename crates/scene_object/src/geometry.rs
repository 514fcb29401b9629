//! Geometry data blocks
//!
//! The object core only needs vertex positions, for vertex parenting and
//! bounds. Everything else is owned by the geometry collaborator.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Vertex positions of a data block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Vertex positions in object-local space
    pub positions: Vec<Vec3>,
}

impl Geometry {
    /// Geometry from vertex positions only
    pub const fn from_positions(positions: Vec<Vec3>) -> Self {
        Self { positions }
    }

    /// Corners of an axis-aligned cube centered at the origin, in bounding
    /// box corner order
    pub fn cube(half_size: f32) -> Self {
        let h = half_size;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(-h, h, h),
            Vec3::new(-h, h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(h, h, -h),
        ];
        Self::from_positions(positions)
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Position of one vertex
    pub fn vertex(&self, index: u32) -> Option<Vec3> {
        self.positions.get(index as usize).copied()
    }

    /// Component-wise minimum and maximum of all positions
    pub fn min_max(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().skip(1).fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    /// Copy with every position offset by `offset`
    pub fn translated(&self, offset: Vec3) -> Self {
        Self::from_positions(self.positions.iter().map(|p| p + offset).collect())
    }
}
