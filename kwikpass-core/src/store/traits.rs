use std::collections::HashMap;

use super::error::StoreResult;

/// Durable key-value storage provided by the host application.
///
/// Backed by `SharedPreferences`/`EncryptedSharedPreferences` on Android and
/// the keychain or `UserDefaults` on iOS. Implementations must be safe to
/// call from any thread.
#[uniffi::export(with_foreign)]
pub trait DurableStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: String) -> StoreResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: String, value: String) -> StoreResult<()>;

    /// Deletes the value stored under `key`. Deleting a missing key is not
    /// an error.
    fn remove(&self, key: String) -> StoreResult<()>;
}

/// Supplies device metadata captured by the host platform.
///
/// The returned map is stored as the device snapshot and feeds the analytics
/// device context. Expected entries include the keys listed in
/// [`super::keys`] (device model, OS, screen resolution, carrier, app
/// version and so on); missing entries are tolerated.
#[uniffi::export(with_foreign)]
pub trait DeviceInfoProvider: Send + Sync {
    /// Returns the current device metadata as flat string pairs.
    fn device_info(&self) -> HashMap<String, String>;
}
