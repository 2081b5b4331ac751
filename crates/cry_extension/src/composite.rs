//! Named aggregation of independently created sub-objects

use std::fmt;

use parking_lot::RwLock;

use crate::unknown::CryUnknownPtr;

/// Table of named parts answering [`CryUnknown::query_composite`]
///
/// Slots can be declared up front and filled later, so an aggregate can be
/// built from parts that are created through their own factories.
///
/// [`CryUnknown::query_composite`]: crate::CryUnknown::query_composite
#[derive(Default)]
pub struct CompositeMap {
    slots: RwLock<Vec<(String, Option<CryUnknownPtr>)>>,
}

impl CompositeMap {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with empty slots for each name
    pub fn with_slots(names: &[&str]) -> Self {
        let map = Self::new();
        for name in names {
            map.declare(name);
        }
        map
    }

    /// Declare an empty slot. Existing slots are left alone.
    pub fn declare(&self, name: &str) {
        let mut slots = self.slots.write();
        if !slots.iter().any(|(n, _)| n == name) {
            slots.push((name.to_string(), None));
        }
    }

    /// Put a part into a slot, declaring it if needed. Returns the previous part.
    pub fn set(&self, name: &str, part: CryUnknownPtr) -> Option<CryUnknownPtr> {
        let mut slots = self.slots.write();
        match slots.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => slot.replace(part),
            None => {
                slots.push((name.to_string(), Some(part)));
                None
            }
        }
    }

    /// Empty a slot, keeping it declared
    pub fn clear(&self, name: &str) -> Option<CryUnknownPtr> {
        self.slots
            .write()
            .iter_mut()
            .find(|(n, _)| n == name)
            .and_then(|(_, slot)| slot.take())
    }

    /// The part in a slot. Unknown names and empty slots yield `None`.
    pub fn query(&self, name: &str) -> Option<CryUnknownPtr> {
        self.slots
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, slot)| slot.clone())
    }

    /// Declared slot names, in declaration order
    pub fn names(&self) -> Vec<String> {
        self.slots.read().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Number of declared slots
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if no slots are declared
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl fmt::Debug for CompositeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        f.debug_map()
            .entries(slots.iter().map(|(n, slot)| (n, slot.is_some())))
            .finish()
    }
}
