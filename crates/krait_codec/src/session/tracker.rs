use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::value::Handle;

// -----------------------------------------------------------------------------
// ReferenceTracker

/// Per-graph object identity tables.
///
/// Writes map pointer identity to the id the object was first written
/// under; reads index objects by the order they appeared in the stream;
/// copies map originals to their clones. The write and copy tables pin a
/// clone of every tracked handle so the pointer keys stay stable for the
/// lifetime of the tables.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    write_ids: HashMap<usize, u32>,
    write_pins: Vec<Handle>,
    read_objects: Vec<Handle>,
    copies: HashMap<usize, Handle>,
    copy_pins: Vec<Handle>,
}

impl ReferenceTracker {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id `handle` was first written under, if it was.
    #[inline]
    pub fn write_id(&self, handle: &Handle) -> Option<u32> {
        self.write_ids.get(&handle.key()).copied()
    }

    /// Assign `handle` the next write id and return it.
    pub fn track_write(&mut self, handle: &Handle) -> u32 {
        let id = self.write_pins.len() as u32;
        self.write_ids.insert(handle.key(), id);
        self.write_pins.push(handle.clone());
        id
    }

    /// The object read under `id`, if the stream has produced it already.
    #[inline]
    pub fn read_object(&self, id: u32) -> Option<Handle> {
        self.read_objects.get(id as usize).cloned()
    }

    /// Record a freshly decoded object and return its id.
    pub fn track_read(&mut self, handle: &Handle) -> u32 {
        let id = self.read_objects.len() as u32;
        self.read_objects.push(handle.clone());
        id
    }

    /// The clone already made for `original`, if any.
    #[inline]
    pub fn copy_of(&self, original: &Handle) -> Option<Handle> {
        self.copies.get(&original.key()).cloned()
    }

    /// Record `clone` as the copy of `original`.
    pub fn track_copy(&mut self, original: &Handle, clone: &Handle) {
        self.copies.insert(original.key(), clone.clone());
        self.copy_pins.push(original.clone());
    }

    /// Forget all identities; starts the next object graph.
    pub fn clear(&mut self) {
        self.write_ids.clear();
        self.write_pins.clear();
        self.read_objects.clear();
        self.copies.clear();
        self.copy_pins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_ids_are_first_seen_order() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(1i32);
        let b = Handle::new(2i32);
        assert_eq!(tracker.write_id(&a), None);
        assert_eq!(tracker.track_write(&a), 0);
        assert_eq!(tracker.track_write(&b), 1);
        assert_eq!(tracker.write_id(&a), Some(0));
        assert_eq!(tracker.write_id(&b), Some(1));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(1i32);
        tracker.track_write(&a);
        tracker.track_read(&a);
        tracker.track_copy(&a, &Handle::new(1i32));
        tracker.clear();
        assert_eq!(tracker.write_id(&a), None);
        assert_eq!(tracker.read_object(0), None);
        assert!(tracker.copy_of(&a).is_none());
    }

    #[test]
    fn distinct_objects_with_equal_values_stay_distinct() {
        let mut tracker = ReferenceTracker::new();
        let a = Handle::new(5i32);
        let b = Handle::new(5i32);
        tracker.track_write(&a);
        assert_eq!(tracker.write_id(&b), None);
    }
}
