use std::cell::RefCell;
use std::collections::HashMap;

/// Preference key for the provider API key.
pub const API_KEY_PREF: &str = "ai_api_key";

/// Preference key for the selected model name.
pub const MODEL_PREF: &str = "ai_model";

/// Model used when no preference is stored.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Synchronous string key/value storage for user preferences.
///
/// The browser build backs this with `localStorage`; tests and native
/// embedders use [`MemoryStore`].
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory preference store.
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}
