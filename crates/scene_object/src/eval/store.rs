//! Data-block store shared by authored and evaluated geometry
//!
//! Every block is allocated here and released explicitly. Authored blocks
//! belong to whoever created them; evaluated blocks produced by modifiers are
//! released by the object that owns them (see [`super::EvaluatedData`]).

use crate::error::{ObjectError, ObjectResult};
use crate::foundation::collections::{DataKey, SlotMap};
use crate::geometry::Geometry;

/// Who created a data block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Authored by the user or the I/O layer
    Authored,
    /// Produced by geometry evaluation
    Evaluated,
}

/// Geometry plus its edit revision
#[derive(Debug, Clone)]
pub struct DataBlock {
    geometry: Geometry,
    revision: u64,
    origin: DataOrigin,
}

impl DataBlock {
    /// Stored geometry
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Edit counter, bumped by every modification
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Creator of the block
    pub const fn origin(&self) -> DataOrigin {
        self.origin
    }
}

/// Arena of data blocks with allocation tracking
#[derive(Debug, Default)]
pub struct GeometryStore {
    blocks: SlotMap<DataKey, DataBlock>,
    released: u64,
}

impl GeometryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add authored geometry
    pub fn insert(&mut self, geometry: Geometry) -> DataKey {
        self.blocks.insert(DataBlock {
            geometry,
            revision: 0,
            origin: DataOrigin::Authored,
        })
    }

    pub(crate) fn insert_evaluated(&mut self, geometry: Geometry) -> DataKey {
        self.blocks.insert(DataBlock {
            geometry,
            revision: 0,
            origin: DataOrigin::Evaluated,
        })
    }

    /// Look up a block
    pub fn get(&self, key: DataKey) -> Option<&DataBlock> {
        self.blocks.get(key)
    }

    /// Look up the geometry of a block
    pub fn geometry(&self, key: DataKey) -> Option<&Geometry> {
        self.blocks.get(key).map(DataBlock::geometry)
    }

    /// Edit authored geometry in place, bumping its revision
    pub fn modify<R>(&mut self, key: DataKey, edit: impl FnOnce(&mut Geometry) -> R) -> ObjectResult<R> {
        let block = self.blocks.get_mut(key).ok_or(ObjectError::DataNotFound(key))?;
        let result = edit(&mut block.geometry);
        block.revision += 1;
        Ok(result)
    }

    /// Remove an authored block
    ///
    /// Objects still referencing it report [`ObjectError::DataNotFound`] on
    /// their next evaluation.
    pub fn remove(&mut self, key: DataKey) -> Option<Geometry> {
        match self.blocks.get(key)?.origin {
            DataOrigin::Authored => self.blocks.remove(key).map(|b| b.geometry),
            DataOrigin::Evaluated => None,
        }
    }

    pub(crate) fn release(&mut self, key: DataKey) {
        match self.blocks.remove(key) {
            Some(_) => self.released += 1,
            None => log::error!("Evaluated data block {key:?} released twice"),
        }
    }

    /// Number of live blocks
    pub fn live_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of live blocks created by evaluation
    pub fn evaluated_count(&self) -> usize {
        self.blocks
            .values()
            .filter(|b| b.origin == DataOrigin::Evaluated)
            .count()
    }

    /// Total number of evaluated blocks released so far
    pub const fn released_count(&self) -> u64 {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_modify_bumps_revision() {
        let mut store = GeometryStore::new();
        let key = store.insert(Geometry::cube(1.0));
        assert_eq!(store.get(key).unwrap().revision(), 0);

        let count = store
            .modify(key, |g| {
                g.positions.push(Vec3::zeros());
                g.vertex_count()
            })
            .unwrap();
        assert_eq!(count, 9);
        assert_eq!(store.get(key).unwrap().revision(), 1);
    }

    #[test]
    fn test_evaluated_blocks_cannot_be_removed_as_authored() {
        let mut store = GeometryStore::new();
        let evaluated = store.insert_evaluated(Geometry::cube(1.0));
        assert!(store.remove(evaluated).is_none());
        assert_eq!(store.evaluated_count(), 1);

        store.release(evaluated);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.released_count(), 1);
    }
}
