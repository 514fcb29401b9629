//! Handle types for the object arena and the data-block store

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Stable handle to an object node inside a [`crate::scene::SceneGraph`]
    pub struct ObjectKey;

    /// Stable handle to a data block inside a [`crate::eval::GeometryStore`]
    pub struct DataKey;
}
