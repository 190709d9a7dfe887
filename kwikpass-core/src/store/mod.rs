//! Layered key-value session cache.
//!
//! [`KeyValueStore`] fronts the host's [`DurableStore`] with an in-process
//! map. Reads hit memory first and fall through to durable storage, writes
//! land in memory before durable storage, so callers always read their own
//! writes even while the backend is slow or failing. Durable-layer errors
//! are logged and swallowed; the cache never propagates them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

mod error;
pub mod keys;
mod traits;

pub use error::{StoreError, StoreResult};
pub use traits::{DeviceInfoProvider, DurableStore};

/// How long a cached Snowplow user id stays valid.
const SNOWPLOW_USER_ID_TTL_MS: u128 = 24 * 60 * 60 * 1000;

/// In-memory cache layered over host-provided durable storage.
#[derive(uniffi::Object)]
pub struct KeyValueStore {
    memory: Mutex<HashMap<String, String>>,
    durable: Arc<dyn DurableStore>,
}

#[uniffi::export]
impl KeyValueStore {
    /// Creates a cache over the given durable backend.
    #[uniffi::constructor]
    #[must_use]
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            durable,
        }
    }

    /// Reads the value stored under `key`.
    ///
    /// A memory miss falls through to the durable backend; a durable hit is
    /// promoted into memory for subsequent reads.
    #[must_use]
    pub fn get(&self, key: String) -> Option<String> {
        self.get_ref(&key)
    }

    /// Stores `value` under `key` in both layers.
    pub fn set(&self, key: String, value: String) {
        self.set_ref(&key, &value);
    }

    /// Deletes `key` from both layers.
    pub fn remove(&self, key: String) {
        self.remove_ref(&key);
    }

    /// Drops every in-memory entry, keeping durable storage intact.
    ///
    /// Subsequent reads repopulate from the durable backend. Used when the
    /// host app is backgrounded or trimmed.
    pub fn clear_volatile_cache(&self) {
        self.lock_memory().clear();
    }

    /// Stores the Snowplow session user id together with the current time.
    pub fn set_snowplow_user_id(&self, user_id: String) {
        self.set_ref(keys::SNOWPLOW_USER_ID, &user_id);
        self.set_ref(keys::SNOWPLOW_USER_ID_TIMESTAMP, &now_millis().to_string());
    }

    /// Returns the Snowplow session user id if one was stored within the
    /// last 24 hours. Older or unparseable timestamps yield `None`.
    #[must_use]
    pub fn get_snowplow_user_id(&self) -> Option<String> {
        let user_id = self.get_ref(keys::SNOWPLOW_USER_ID)?;
        let stored_at: u128 = self
            .get_ref(keys::SNOWPLOW_USER_ID_TIMESTAMP)?
            .parse()
            .ok()?;
        if now_millis().saturating_sub(stored_at) >= SNOWPLOW_USER_ID_TTL_MS {
            return None;
        }
        Some(user_id)
    }
}

impl KeyValueStore {
    pub(crate) fn get_ref(&self, key: &str) -> Option<String> {
        if let Some(value) = self.lock_memory().get(key) {
            return Some(value.clone());
        }
        match self.durable.get(key.to_string()) {
            Ok(Some(value)) => {
                // A write that landed while the durable read was in flight
                // is fresher than the durable value; keep it.
                let mut memory = self.lock_memory();
                Some(memory.entry(key.to_string()).or_insert(value).clone())
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("durable read failed for {key}: {e}");
                None
            }
        }
    }

    pub(crate) fn set_ref(&self, key: &str, value: &str) {
        self.lock_memory()
            .insert(key.to_string(), value.to_string());
        if let Err(e) = self.durable.set(key.to_string(), value.to_string()) {
            log::warn!("durable write failed for {key}: {e}");
        }
    }

    pub(crate) fn remove_ref(&self, key: &str) {
        self.lock_memory().remove(key);
        if let Err(e) = self.durable.remove(key.to_string()) {
            log::warn!("durable remove failed for {key}: {e}");
        }
    }

    fn lock_memory(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_support::{FailingDurableStore, InMemoryDurableStore};
    use super::*;

    fn store_with_backend() -> (KeyValueStore, Arc<InMemoryDurableStore>) {
        let backend = Arc::new(InMemoryDurableStore::default());
        (KeyValueStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_read_your_writes_survives_volatile_clear() {
        let (store, backend) = store_with_backend();

        store.set("gk-user-phone".to_string(), "9876543210".to_string());
        assert!(backend.contains("gk-user-phone"));

        store.clear_volatile_cache();
        assert_eq!(
            store.get("gk-user-phone".to_string()).as_deref(),
            Some("9876543210")
        );
    }

    #[test]
    fn test_durable_failures_are_tolerated() {
        let store = KeyValueStore::new(Arc::new(FailingDurableStore));

        store.set("gk-merchant-id".to_string(), "m123".to_string());
        // Memory still serves the value even though the backend rejected it.
        assert_eq!(
            store.get("gk-merchant-id".to_string()).as_deref(),
            Some("m123")
        );
        assert_eq!(store.get("never-written".to_string()), None);
    }

    #[test]
    fn test_remove_clears_both_layers() {
        let (store, backend) = store_with_backend();

        store.set("gk-auth-token".to_string(), "tok".to_string());
        store.remove("gk-auth-token".to_string());

        assert_eq!(store.get("gk-auth-token".to_string()), None);
        assert!(!backend.contains("gk-auth-token"));
    }

    #[test]
    fn test_snowplow_user_id_round_trip_and_expiry() {
        let (store, _backend) = store_with_backend();

        assert_eq!(store.get_snowplow_user_id(), None);

        store.set_snowplow_user_id("user-42".to_string());
        assert_eq!(store.get_snowplow_user_id().as_deref(), Some("user-42"));

        // Age the stored timestamp past the 24h window.
        let expired = now_millis() - SNOWPLOW_USER_ID_TTL_MS - 1;
        store.set(
            keys::SNOWPLOW_USER_ID_TIMESTAMP.to_string(),
            expired.to_string(),
        );
        assert_eq!(store.get_snowplow_user_id(), None);
    }

    #[test]
    fn test_promotion_keeps_value_written_during_durable_read() {
        use std::sync::OnceLock;

        // Backend whose read overlaps a write to the same key, as a
        // concurrent set would.
        struct WriteDuringReadStore {
            cache: OnceLock<Arc<KeyValueStore>>,
        }

        impl DurableStore for WriteDuringReadStore {
            fn get(&self, key: String) -> StoreResult<Option<String>> {
                if let Some(cache) = self.cache.get() {
                    cache.set_ref(&key, "fresh");
                }
                Ok(Some("stale".to_string()))
            }

            fn set(&self, _key: String, _value: String) -> StoreResult<()> {
                Ok(())
            }

            fn remove(&self, _key: String) -> StoreResult<()> {
                Ok(())
            }
        }

        let backend = Arc::new(WriteDuringReadStore {
            cache: OnceLock::new(),
        });
        let store = Arc::new(KeyValueStore::new(backend.clone()));
        backend.cache.set(store.clone()).ok();

        // The promotion must not clobber the fresher in-memory value.
        assert_eq!(
            store.get("gk-user-phone".to_string()).as_deref(),
            Some("fresh")
        );
        assert_eq!(
            store.get("gk-user-phone".to_string()).as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn test_garbage_timestamp_invalidates_snowplow_user_id() {
        let (store, _backend) = store_with_backend();

        store.set(keys::SNOWPLOW_USER_ID.to_string(), "user-42".to_string());
        store.set(
            keys::SNOWPLOW_USER_ID_TIMESTAMP.to_string(),
            "not-a-number".to_string(),
        );
        assert_eq!(store.get_snowplow_user_id(), None);
    }
}
