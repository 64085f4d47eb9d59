use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::KeyValueStore;

pub const OPEN_SECTION_KEY: &str = "openSection";

/// Fail-soft JSON layer over a [`KeyValueStore`]. Reads fall back to the
/// default on any failure; writes log and swallow errors.
pub struct PersistentStore<S> {
    backend: S,
}

impl<S: KeyValueStore> PersistentStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(error) => {
                log::error!("error loading {key} from storage: {error}");
                return default;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(error) => {
                log::error!("error decoding {key} from storage: {error}");
                default
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(error) => {
                log::error!("error encoding {key} for storage: {error}");
                return false;
            }
        };
        match self.backend.set_item(key, &json) {
            Ok(()) => {
                log::debug!("saved {key} bytes={}", json.len());
                true
            }
            Err(error) => {
                log::error!("error saving {key} to storage: {error}");
                false
            }
        }
    }
}
