//! Modifier stack entries
//!
//! Modifiers are opaque to the object core: it only tracks which entries
//! exist and bumps a revision whenever the stack changes, so evaluated
//! geometry is regenerated.

use serde::{Deserialize, Serialize};

/// One modifier in the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    /// Unique name within the stack
    pub name: String,
    /// Modifier kind understood by the geometry collaborator
    pub kind: String,
    /// Evaluated in viewports
    pub show_viewport: bool,
    /// Evaluated for renders
    pub show_render: bool,
}

impl ModifierEntry {
    /// Create an enabled modifier entry
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            show_viewport: true,
            show_render: true,
        }
    }
}

/// Ordered modifier stack with a change revision
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierStack {
    entries: Vec<ModifierEntry>,
    #[serde(skip)]
    revision: u64,
}

impl ModifierStack {
    /// Append a modifier
    pub fn push(&mut self, entry: ModifierEntry) {
        self.entries.push(entry);
        self.revision += 1;
    }

    /// Remove a modifier by name
    pub fn remove(&mut self, name: &str) -> Option<ModifierEntry> {
        let index = self.entries.iter().position(|m| m.name == name)?;
        self.revision += 1;
        Some(self.entries.remove(index))
    }

    /// Toggle viewport evaluation of a modifier; returns `false` if not found
    pub fn set_viewport_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|m| m.name == name) {
            Some(entry) => {
                if entry.show_viewport != enabled {
                    entry.show_viewport = enabled;
                    self.revision += 1;
                }
                true
            }
            None => false,
        }
    }

    /// Modifiers evaluated in viewports, in stack order
    pub fn viewport_enabled(&self) -> impl Iterator<Item = &ModifierEntry> {
        self.entries.iter().filter(|m| m.show_viewport)
    }

    /// All entries
    pub fn entries(&self) -> &[ModifierEntry] {
        &self.entries
    }

    /// Change counter, bumped by every edit
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_bump_revision() {
        let mut stack = ModifierStack::default();
        stack.push(ModifierEntry::new("Subdivision", "subsurf"));
        assert_eq!(stack.revision(), 1);

        assert!(stack.set_viewport_enabled("Subdivision", false));
        assert_eq!(stack.revision(), 2);
        assert_eq!(stack.viewport_enabled().count(), 0);

        // Same value again is not an edit.
        assert!(stack.set_viewport_enabled("Subdivision", false));
        assert_eq!(stack.revision(), 2);

        assert!(stack.remove("Subdivision").is_some());
        assert!(stack.remove("Subdivision").is_none());
        assert_eq!(stack.revision(), 3);
    }
}
