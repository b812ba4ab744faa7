//! Page-scoped scratch registry for cross-node accumulation

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

type Slot = Box<dyn Any + Send + Sync>;

/// Untyped key → value storage shared by all nodes of one page.
///
/// Values are stored type-erased; readers name the type they expect and
/// get `None` on a mismatch rather than a panic.
#[derive(Default)]
pub struct WorkingStorage {
    slots: HashMap<String, Slot>,
}

impl fmt::Debug for WorkingStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.slots.keys().collect();
        keys.sort();
        f.debug_struct("WorkingStorage").field("keys", &keys).finish()
    }
}

impl WorkingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.slots.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.slots.get_mut(key)?.downcast_mut()
    }

    pub fn put<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.slots.insert(key.into(), Box::new(value));
    }

    /// Removes and returns the value under `key` if it has type `T`.
    /// A value of another type is left in place.
    pub fn take<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.slots.get(key)?.is::<T>() {
            return None;
        }
        let slot = self.slots.remove(key)?;
        slot.downcast::<T>().ok().map(|b| *b)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Get-or-create the ordered list under `key`.
    ///
    /// If the key holds a value of another type it is replaced.
    pub fn list_mut<T: Any + Send + Sync>(&mut self, key: &str) -> &mut Vec<T> {
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Box::new(Vec::<T>::new()));
        if !slot.is::<Vec<T>>() {
            *slot = Box::new(Vec::<T>::new());
        }
        slot.downcast_mut::<Vec<T>>()
            .expect("slot was just ensured to hold Vec<T>")
    }

    /// Appends `record` to the list under `key`, creating it if needed.
    pub fn push<T: Any + Send + Sync>(&mut self, key: &str, record: T) {
        self.list_mut(key).push(record);
    }

    /// Drains the list under `key`, leaving nothing behind.
    pub fn drain_list<T: Any>(&mut self, key: &str) -> Vec<T> {
        self.take::<Vec<T>>(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_records_pushed_when_draining_then_order_kept_and_slot_cleared() {
        let mut storage = WorkingStorage::new();
        storage.push("records", "a".to_string());
        storage.push("records", "b".to_string());

        let drained: Vec<String> = storage.drain_list("records");
        assert_eq!(drained, vec!["a", "b"]);
        assert!(!storage.contains("records"));
    }

    #[test]
    fn given_wrong_type_when_get_then_none() {
        let mut storage = WorkingStorage::new();
        storage.put("count", 3_u32);
        assert_eq!(storage.get::<u32>("count"), Some(&3));
        assert!(storage.get::<String>("count").is_none());
        assert!(storage.take::<String>("count").is_none());
        assert!(storage.contains("count"));
    }
}
