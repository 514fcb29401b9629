//! Evaluation data masks

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Attribute layers requested from evaluated geometry
    ///
    /// A cached payload satisfies a request when its mask contains every
    /// requested layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DataMask: u32 {
        /// Vertex positions
        const POSITIONS = 1 << 0;
        /// Vertex and face normals
        const NORMALS = 1 << 1;
        /// UV maps
        const UV = 1 << 2;
        /// Color attributes
        const COLOR = 1 << 3;
        /// Vertex group weights
        const WEIGHTS = 1 << 4;
        /// Index back into the original geometry
        const ORIGINAL_INDEX = 1 << 5;
        /// Shape keys
        const SHAPE_KEYS = 1 << 6;
        /// Edge and vertex creases
        const CREASE = 1 << 7;
        /// Tangent space
        const TANGENTS = 1 << 8;
        /// Mapping from evaluated to original elements (edit-mode selection)
        const MAPPING = 1 << 9;
    }
}

impl DataMask {
    /// Layers needed for drawing in a viewport
    pub const VIEWPORT: Self = Self::POSITIONS.union(Self::NORMALS).union(Self::UV).union(Self::COLOR);

    /// Whether a payload computed with `self` also satisfies `request`
    pub const fn satisfies(self, request: Self) -> bool {
        self.contains(request)
    }
}
