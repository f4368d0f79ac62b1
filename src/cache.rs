use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Well-known cache keys shared between the shell and its collaborators.
pub mod keys {
    pub const DATA_PATH: &str = "data_path";
    pub const CAMPAIGN_NAME: &str = "campaign_name";
    pub const DATE: &str = "date";
    pub const LOCATION: &str = "location";
    pub const LEVEL: &str = "level";
    pub const COMBAT_ROUND: &str = "combat_round";
}

/// Shared, mutable key/value store handed to every shell context.
///
/// Values are opaque to the shell: each key holds whatever its owner put there,
/// and readers ask for it back by type. Cloning a `Cache` clones the handle, not
/// the store, so every context built from one `Cache` observes the same writes.
#[derive(Clone, Default)]
pub struct Cache {
    values: Rc<RefCell<HashMap<String, Rc<dyn Any>>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the value stored under `key`.
    ///
    /// Returns `None` when the key is absent or holds a value of another type.
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.values
            .borrow()
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Set or override the value stored under `key`.
    pub fn set<T: Any>(&self, key: impl Into<String>, value: T) {
        self.values.borrow_mut().insert(key.into(), Rc::new(value));
    }

    /// True when both handles point at the same store.
    pub fn same_store(&self, other: &Cache) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.values.borrow();
        let mut keys: Vec<&String> = values.keys().collect();
        keys.sort();
        f.debug_struct("Cache").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_and_get() {
        let cache = Cache::new();

        // initially absent
        assert_eq!(cache.get::<String>(keys::LOCATION), None);

        cache.set(keys::LOCATION, "Vale of Shadows".to_string());

        assert_eq!(
            cache.get::<String>(keys::LOCATION),
            Some("Vale of Shadows".to_string())
        );
    }

    #[test]
    fn test_cache_get_with_wrong_type_is_none() {
        let cache = Cache::new();
        cache.set(keys::LEVEL, 3u8);
        assert_eq!(cache.get::<String>(keys::LEVEL), None);
        assert_eq!(cache.get::<u8>(keys::LEVEL), Some(3));
    }

    #[test]
    fn test_cloned_handles_share_writes() {
        let root = Cache::new();
        let sub = root.clone();

        root.set(keys::LEVEL, 4u8);
        assert_eq!(sub.get::<u8>(keys::LEVEL), Some(4));

        sub.set(keys::LEVEL, 5u8);
        assert_eq!(root.get::<u8>(keys::LEVEL), Some(5));
        assert!(root.same_store(&sub));
        assert!(!root.same_store(&Cache::new()));
    }
}
