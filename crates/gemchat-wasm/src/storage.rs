use gemchat_chat::PreferenceStore;
use web_sys::Storage;

/// Preference store backed by the browser's `localStorage`.
///
/// Storage can be unavailable (private browsing, sandboxed frames); in
/// that case reads come back empty and writes are dropped, which leaves
/// the session in the simulated-reply mode.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable; preferences will not persist");
        }
        Self { storage }
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage
            .as_ref()
            .and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if storage.set_item(key, value).is_err() {
                log::warn!("failed to persist preference: {}", key);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}
