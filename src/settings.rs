//! Verifier preferences and the transport configuration derived from them.
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to persist preference: {0}")]
    Store(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefGroup {
    General,
    RetrievalOptions,
    RetrievalMethods,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
)]
pub enum PrefKey {
    RetainData,
    UseL2cap,
    ClearTransportCache,
    CentralClientMode,
    PeripheralServerMode,
}

impl PrefKey {
    pub fn group(&self) -> PrefGroup {
        match self {
            Self::RetainData => PrefGroup::General,
            Self::UseL2cap | Self::ClearTransportCache => PrefGroup::RetrievalOptions,
            Self::CentralClientMode | Self::PeripheralServerMode => PrefGroup::RetrievalMethods,
        }
    }

    /// Storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::RetainData => "retain_data",
            Self::UseL2cap => "use_l2cap",
            Self::ClearTransportCache => "clear_transport_cache",
            Self::CentralClientMode => "ble_central_client_mode",
            Self::PeripheralServerMode => "ble_peripheral_server_mode",
        }
    }

    /// Value assumed while nothing has been persisted. At least one retrieval
    /// method is on by default.
    pub fn default_value(&self) -> bool {
        matches!(self, Self::PeripheralServerMode)
    }

    pub fn all() -> Vec<PrefKey> {
        Self::iter().collect()
    }

    pub fn in_group(group: PrefGroup) -> Vec<PrefKey> {
        Self::iter().filter(|k| k.group() == group).collect()
    }

    pub fn retrieval_methods() -> Vec<PrefKey> {
        Self::in_group(PrefGroup::RetrievalMethods)
    }
}

/// Typed key-value persistence for preferences.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: PrefKey) -> Option<bool>;
    fn put_bool(&self, key: PrefKey, value: bool) -> anyhow::Result<()>;

    fn get_i32(&self, key: PrefKey) -> Option<i32>;
    fn put_i32(&self, key: PrefKey, value: i32) -> anyhow::Result<()>;

    fn get_i64(&self, key: PrefKey) -> Option<i64>;
    fn put_i64(&self, key: PrefKey, value: i64) -> anyhow::Result<()>;

    fn get_f32(&self, key: PrefKey) -> Option<f32>;
    fn put_f32(&self, key: PrefKey, value: f32) -> anyhow::Result<()>;

    fn get_f64(&self, key: PrefKey) -> Option<f64>;
    fn put_f64(&self, key: PrefKey, value: f64) -> anyhow::Result<()>;

    fn get_string(&self, key: PrefKey) -> Option<String>;
    fn put_string(&self, key: PrefKey, value: String) -> anyhow::Result<()>;

    fn get_bytes(&self, key: PrefKey) -> Option<Vec<u8>>;
    fn put_bytes(&self, key: PrefKey, value: Vec<u8>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
}

/// A local in-memory store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<&'static str, PrefValue>>,
}

macro_rules! memory_accessors {
    ($get:ident, $put:ident, $variant:ident, $ty:ty) => {
        fn $get(&self, key: PrefKey) -> Option<$ty> {
            match self.values().get(key.key()) {
                Some(PrefValue::$variant(value)) => Some(value.clone()),
                _ => None,
            }
        }

        fn $put(&self, key: PrefKey, value: $ty) -> anyhow::Result<()> {
            self.values().insert(key.key(), PrefValue::$variant(value));
            Ok(())
        }
    };
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<&'static str, PrefValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every persisted value, keyed by storage key.
    pub fn snapshot(&self) -> BTreeMap<&'static str, PrefValue> {
        self.values().clone()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    memory_accessors!(get_bool, put_bool, Bool, bool);
    memory_accessors!(get_i32, put_i32, I32, i32);
    memory_accessors!(get_i64, put_i64, I64, i64);
    memory_accessors!(get_f32, put_f32, F32, f32);
    memory_accessors!(get_f64, put_f64, F64, f64);
    memory_accessors!(get_string, put_string, String, String);
    memory_accessors!(get_bytes, put_bytes, Bytes, Vec<u8>);
}

/// Transport setup derived from the preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfig {
    pub central_client_mode: bool,
    pub peripheral_server_mode: bool,
    pub use_l2cap: bool,
    pub clear_ble_cache: bool,
    pub intent_to_retain: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            central_client_mode: PrefKey::CentralClientMode.default_value(),
            peripheral_server_mode: PrefKey::PeripheralServerMode.default_value(),
            use_l2cap: PrefKey::UseL2cap.default_value(),
            clear_ble_cache: PrefKey::ClearTransportCache.default_value(),
            intent_to_retain: PrefKey::RetainData.default_value(),
        }
    }
}

/// Boolean preferences on top of a [PreferenceStore].
///
/// Toggles are read-modify-write without a lock; two concurrent toggles of
/// different retrieval methods can both pass the floor check.
#[derive(Debug)]
pub struct Settings<S> {
    store: S,
}

impl<S: PreferenceStore> Settings<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_enabled(&self, key: PrefKey) -> bool {
        self.store
            .get_bool(key)
            .unwrap_or_else(|| key.default_value())
    }

    pub fn set(&self, key: PrefKey, value: bool) -> Result<(), Error> {
        self.store
            .put_bool(key, value)
            .map_err(|e| Error::Store(e.to_string()))
    }

    /// Flip `key` and return the value now in effect.
    ///
    /// Turning off the last enabled retrieval method is ignored and the
    /// current value is returned unchanged.
    pub fn toggle_preference(&self, key: PrefKey) -> Result<bool, Error> {
        let value = !self.is_enabled(key);
        if key.group() == PrefGroup::RetrievalMethods && !value {
            let other_enabled = PrefKey::retrieval_methods()
                .into_iter()
                .filter(|other| *other != key)
                .any(|other| self.is_enabled(other));
            if !other_enabled {
                info!(?key, "keeping last retrieval method enabled");
                return Ok(true);
            }
        }
        self.set(key, value)?;
        debug!(?key, value, "preference toggled");
        Ok(value)
    }

    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig::from_settings(self)
    }
}

impl TransferConfig {
    pub fn from_settings<S: PreferenceStore>(settings: &Settings<S>) -> Self {
        Self {
            central_client_mode: settings.is_enabled(PrefKey::CentralClientMode),
            peripheral_server_mode: settings.is_enabled(PrefKey::PeripheralServerMode),
            use_l2cap: settings.is_enabled(PrefKey::UseL2cap),
            clear_ble_cache: settings.is_enabled(PrefKey::ClearTransportCache),
            intent_to_retain: settings.is_enabled(PrefKey::RetainData),
        }
    }
}
