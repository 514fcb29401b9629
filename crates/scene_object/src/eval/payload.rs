//! Evaluated payload and its ownership of derived data

use std::sync::atomic::{AtomicU64, Ordering};

use crate::eval::{DataMask, GeometryStore};
use crate::foundation::collections::DataKey;
use crate::foundation::math::Mat4;

static NEXT_PAYLOAD_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one built payload; a cache hit returns the same id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayloadId(u64);

impl PayloadId {
    fn next() -> Self {
        Self(NEXT_PAYLOAD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Evaluated geometry reference with explicit ownership
///
/// `Borrowed` points at the authored block and must never be released by
/// the object. `Owned` was produced by evaluation and is released exactly
/// once, when the payload is superseded or the object goes away.
#[derive(Debug, PartialEq, Eq)]
pub enum EvaluatedData {
    /// Authored data used as-is
    Borrowed(DataKey),
    /// Evaluation result owned by the object
    Owned(DataKey),
}

impl EvaluatedData {
    /// Block holding the evaluated geometry
    pub const fn key(&self) -> DataKey {
        match self {
            Self::Borrowed(key) | Self::Owned(key) => *key,
        }
    }

    /// Whether the object is responsible for releasing the block
    pub const fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub(crate) fn release(self, store: &mut GeometryStore) {
        match self {
            Self::Borrowed(_) => {}
            Self::Owned(key) => store.release(key),
        }
    }
}

/// Instances produced alongside the evaluated geometry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometrySet {
    /// Instance transforms relative to the object
    pub instances: Vec<Mat4>,
}

/// Result of evaluating an object's data for a data-mask request
#[derive(Debug)]
pub struct EvaluatedPayload {
    id: PayloadId,
    original: DataKey,
    evaluated: EvaluatedData,
    mask: DataMask,
    data_revision: u64,
    modifier_revision: u64,
    geometry_set: GeometrySet,
}

impl EvaluatedPayload {
    pub(crate) fn new(
        original: DataKey,
        evaluated: EvaluatedData,
        mask: DataMask,
        data_revision: u64,
        modifier_revision: u64,
        geometry_set: GeometrySet,
    ) -> Self {
        Self {
            id: PayloadId::next(),
            original,
            evaluated,
            mask,
            data_revision,
            modifier_revision,
            geometry_set,
        }
    }

    /// Payload identity
    pub const fn id(&self) -> PayloadId {
        self.id
    }

    /// Authored block this payload was built from
    pub const fn original(&self) -> DataKey {
        self.original
    }

    /// Evaluated geometry reference
    pub const fn evaluated(&self) -> &EvaluatedData {
        &self.evaluated
    }

    /// Mask the payload was built with
    pub const fn mask(&self) -> DataMask {
        self.mask
    }

    /// Authored data revision at build time
    pub const fn data_revision(&self) -> u64 {
        self.data_revision
    }

    /// Modifier stack revision at build time
    pub const fn modifier_revision(&self) -> u64 {
        self.modifier_revision
    }

    /// Instances produced with this payload
    pub const fn geometry_set(&self) -> &GeometrySet {
        &self.geometry_set
    }

    /// Whether the payload was built from the current authored state
    pub fn is_current(&self, original: DataKey, data_revision: u64, modifier_revision: u64) -> bool {
        self.original == original
            && self.data_revision == data_revision
            && self.modifier_revision == modifier_revision
    }

    pub(crate) fn release(self, store: &mut GeometryStore) {
        self.evaluated.release(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn test_only_owned_data_is_released() {
        let mut store = GeometryStore::new();
        let authored = store.insert(Geometry::cube(1.0));
        let evaluated = store.insert_evaluated(Geometry::cube(2.0));

        EvaluatedData::Borrowed(authored).release(&mut store);
        assert!(store.get(authored).is_some());

        EvaluatedData::Owned(evaluated).release(&mut store);
        assert!(store.get(evaluated).is_none());
        assert_eq!(store.released_count(), 1);
    }

    #[test]
    fn test_payload_ids_are_unique() {
        let mut store = GeometryStore::new();
        let key = store.insert(Geometry::default());
        let a = EvaluatedPayload::new(key, EvaluatedData::Borrowed(key), DataMask::POSITIONS, 0, 0, GeometrySet::default());
        let b = EvaluatedPayload::new(key, EvaluatedData::Borrowed(key), DataMask::POSITIONS, 0, 0, GeometrySet::default());
        assert_ne!(a.id(), b.id());
        assert!(a.is_current(key, 0, 0));
        assert!(!a.is_current(key, 1, 0));
    }
}
