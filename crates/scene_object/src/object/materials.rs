//! Material slots

use serde::{Deserialize, Serialize};

/// Where a slot's material is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaterialLink {
    /// Shared through the object's data block
    #[default]
    Data,
    /// Overridden on this object only
    Object,
}

/// One material slot; the material itself is referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialSlot {
    /// Referenced material, if any
    pub material: Option<String>,
    /// Storage location of the reference
    pub link: MaterialLink,
}

/// Ordered material slots with an active slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialSlots {
    slots: Vec<MaterialSlot>,
    active: Option<usize>,
}

impl MaterialSlots {
    /// Append an empty slot and make it active, returning its index
    pub fn add_slot(&mut self) -> usize {
        self.slots.push(MaterialSlot::default());
        let index = self.slots.len() - 1;
        self.active = Some(index);
        index
    }

    /// Assign a material to a slot; returns `false` if the slot does not exist
    pub fn assign(&mut self, index: usize, material: impl Into<String>, link: MaterialLink) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.material = Some(material.into());
                slot.link = link;
                true
            }
            None => false,
        }
    }

    /// Remove a slot, keeping the active index pointing at a valid slot
    pub fn remove_slot(&mut self, index: usize) -> Option<MaterialSlot> {
        if index >= self.slots.len() {
            return None;
        }
        let removed = self.slots.remove(index);
        self.active = match self.active {
            _ if self.slots.is_empty() => None,
            Some(active) if active >= index && active > 0 => Some(active - 1),
            other => other,
        };
        Some(removed)
    }

    /// Select the active slot
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.slots.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }

    /// Active slot index
    pub const fn active(&self) -> Option<usize> {
        self.active
    }

    /// All slots
    pub fn slots(&self) -> &[MaterialSlot] {
        &self.slots
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_remove() {
        let mut slots = MaterialSlots::default();
        let first = slots.add_slot();
        let second = slots.add_slot();
        assert_eq!(slots.active(), Some(second));

        assert!(slots.assign(first, "Steel", MaterialLink::Object));
        assert!(!slots.assign(7, "Missing", MaterialLink::Data));
        assert_eq!(slots.slots()[first].material.as_deref(), Some("Steel"));

        slots.remove_slot(first);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.active(), Some(0));

        slots.remove_slot(0);
        assert!(slots.is_empty());
        assert_eq!(slots.active(), None);
    }
}
