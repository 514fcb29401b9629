//! Bounding volumes
//!
//! [`BoundingBox`] stores the eight local-space corners of an object's
//! evaluated geometry. [`BoundsCache`] keeps it together with a dirty flag so
//! it is only recomputed on the first query after the geometry changed.
//! [`Aabb`] is the world-space min/max form used by selection queries.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Eight corners of a local-space box
///
/// Corner layout (x, y, z as min `-` / max `+`):
///
/// ```text
///   0: - - -   1: - - +   2: - + +   3: - + -
///   4: + - -   5: + - +   6: + + +   7: + + -
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Corner points
    pub corners: [Vec3; 8],
}

impl BoundingBox {
    /// Box spanning `min` to `max`
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let pick = |x: bool, y: bool, z: bool| {
            Vec3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };
        Self {
            corners: [
                pick(false, false, false),
                pick(false, false, true),
                pick(false, true, true),
                pick(false, true, false),
                pick(true, false, false),
                pick(true, false, true),
                pick(true, true, true),
                pick(true, true, false),
            ],
        }
    }

    /// Cube centered at the origin
    pub fn cube(half_size: f32) -> Self {
        let h = Vec3::new(half_size, half_size, half_size);
        Self::from_min_max(-h, h)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.corners[0]
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.corners[6]
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Edge lengths along each axis
    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }

    /// World-space axis-aligned box enclosing the corners under `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let mut corners = self
            .corners
            .iter()
            .map(|c| matrix.transform_point(&Point3::from(*c)).coords);
        // Eight corners are always present.
        let first = corners.next().unwrap_or_else(Vec3::zeros);
        let (min, max) = corners.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));
        Aabb::new(min, max)
    }
}

/// Lazily recomputed local bounds with an explicit dirty flag
#[derive(Debug, Clone, Default)]
pub struct BoundsCache {
    bounds: Option<BoundingBox>,
    dirty: bool,
}

impl BoundsCache {
    /// Flag the cached box as stale
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the next query recomputes
    pub const fn is_dirty(&self) -> bool {
        self.dirty || self.bounds.is_none()
    }

    /// Cached box, or `None` when it must not be trusted
    pub const fn cached(&self) -> Option<&BoundingBox> {
        if self.dirty {
            None
        } else {
            self.bounds.as_ref()
        }
    }

    /// Return the cached box, recomputing it first when dirty
    pub fn get_or_compute(&mut self, compute: impl FnOnce() -> BoundingBox) -> BoundingBox {
        match self.bounds {
            Some(bounds) if !self.dirty => bounds,
            _ => {
                let bounds = compute();
                self.bounds = Some(bounds);
                self.dirty = false;
                bounds
            }
        }
    }
}

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the distance to the entry point if the ray intersects, None otherwise
    ///
    /// An axis the ray does not move along is a plain containment test on
    /// that axis; the slab boundaries count as inside.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray_origin[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            if ray_dir[axis] == 0.0 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv_dir = 1.0 / ray_dir[axis];
            let t1 = (min - origin) * inv_dir;
            let t2 = (max - origin) * inv_dir;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        // Ray intersects if t_far >= t_near and t_far >= 0
        if t_far >= t_near && t_far >= 0.0 {
            // Entry distance, or 0 when starting inside the box
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}
