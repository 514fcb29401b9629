//! Object type tags

use serde::{Deserialize, Serialize};

/// Closed set of object kinds
///
/// The type of an object never changes after creation; converting an object
/// to another representation creates a new object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Transform-only placeholder without data
    Empty,
    /// Polygon mesh
    Mesh,
    /// Legacy curve
    Curve,
    /// NURBS surface
    Surface,
    /// Text object
    Font,
    /// Metaball
    Metaball,
    /// Light source
    Lamp,
    /// Camera
    Camera,
    /// Sound emitter
    Speaker,
    /// Light probe
    LightProbe,
    /// Lattice deformer cage
    Lattice,
    /// Bone hierarchy
    Armature,
    /// Legacy grease pencil
    GreasePencilLegacy,
    /// Hair/curves
    Curves,
    /// Point cloud
    PointCloud,
    /// Volume grid
    Volume,
}

impl ObjectType {
    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Mesh => "Mesh",
            Self::Curve => "Curve",
            Self::Surface => "Surface",
            Self::Font => "Font",
            Self::Metaball => "Metaball",
            Self::Lamp => "Lamp",
            Self::Camera => "Camera",
            Self::Speaker => "Speaker",
            Self::LightProbe => "LightProbe",
            Self::Lattice => "Lattice",
            Self::Armature => "Armature",
            Self::GreasePencilLegacy => "GreasePencilLegacy",
            Self::Curves => "Curves",
            Self::PointCloud => "PointCloud",
            Self::Volume => "Volume",
        }
    }

    /// Whether the object carries a data block at all
    pub const fn has_data(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Whether material slots are allowed
    pub const fn supports_material(self) -> bool {
        matches!(
            self,
            Self::Mesh
                | Self::Curve
                | Self::Surface
                | Self::Font
                | Self::Metaball
                | Self::GreasePencilLegacy
                | Self::Curves
                | Self::PointCloud
                | Self::Volume
        )
    }

    /// Whether children may bind to individual vertices of this object
    pub const fn supports_vertex_parent(self) -> bool {
        matches!(self, Self::Mesh | Self::Surface | Self::Curve | Self::Lattice)
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_parent_support() {
        assert!(ObjectType::Mesh.supports_vertex_parent());
        assert!(ObjectType::Lattice.supports_vertex_parent());
        assert!(!ObjectType::Armature.supports_vertex_parent());
        assert!(!ObjectType::Empty.supports_vertex_parent());
    }

    #[test]
    fn test_material_support() {
        assert!(ObjectType::Mesh.supports_material());
        assert!(ObjectType::Volume.supports_material());
        assert!(!ObjectType::Camera.supports_material());
        assert!(!ObjectType::Lattice.supports_material());
    }
}
