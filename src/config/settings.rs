//! Process-wide settings and the cached `DOCS_*` resolver
//!
//! `SettingsStore` is the single source of truth for runtime settings. Writes
//! notify every subscribed `SettingListener` with the changed key.
//! `DocsSettings` reads the three `DOCS_*` values through a per-key cache and
//! drops the whole cache whenever a key with its prefix changes.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use thiserror::Error;

use super::types::DocsConfig;

/// Prefix shared by every documentation setting key
pub const DOCS_PREFIX: &str = "DOCS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("'{owner}' has no setting named '{name}'")]
    UnknownSetting { owner: &'static str, name: String },
}

/// Receives a callback after a setting key was written or removed
pub trait SettingListener: Send + Sync {
    fn setting_changed(&self, key: &str);
}

/// Process-wide key/value settings
#[derive(Default)]
pub struct SettingsStore {
    values: RwLock<HashMap<String, Value>>,
    listeners: RwLock<Vec<Weak<dyn SettingListener>>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from the `[docs]` config table
    pub fn from_docs_config(docs: &DocsConfig) -> Self {
        let store = Self::new();
        store.apply_docs_config(docs);
        store
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Snapshot of every stored key
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        self.notify(key);
    }

    /// Remove a key; returns whether it was present
    pub fn remove(&self, key: &str) -> bool {
        let removed = self
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        self.notify(key);
        removed
    }

    /// Write the `[docs]` table into the store.
    ///
    /// Absent fields remove their key so the resolver falls back to defaults.
    pub fn apply_docs_config(&self, docs: &DocsConfig) {
        let entries = [
            ("ROOT", docs.root.clone().map(Value::String)),
            ("ACCESS", docs.access.clone().map(Value::String)),
            ("DIRHTML", docs.dirhtml.map(Value::Bool)),
        ];

        for (name, value) in entries {
            let key = format!("{DOCS_PREFIX}_{name}");
            match value {
                Some(v) => self.set(&key, v),
                None => {
                    self.remove(&key);
                }
            }
        }
    }

    /// Register a listener. Only a weak reference is kept.
    pub fn subscribe(&self, listener: Weak<dyn SettingListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    fn notify(&self, key: &str) {
        let live: Vec<Arc<dyn SettingListener>> = {
            let mut listeners = self
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in live {
            listener.setting_changed(key);
        }
    }
}

/// Names accepted by `DocsSettings::get`, with their defaults
const DOCS_DEFAULTS: [(&str, fn() -> Value); 3] = [
    ("ROOT", default_root),
    ("ACCESS", default_access),
    ("DIRHTML", default_dirhtml),
];

const fn default_root() -> Value {
    Value::Null
}

fn default_access() -> Value {
    Value::String("public".to_string())
}

const fn default_dirhtml() -> Value {
    Value::Bool(false)
}

/// Cached resolver for the `DOCS_ROOT`, `DOCS_ACCESS` and `DOCS_DIRHTML` settings
pub struct DocsSettings {
    prefix: &'static str,
    store: Arc<SettingsStore>,
    cache: RwLock<HashMap<&'static str, Value>>,
}

impl DocsSettings {
    /// Create the resolver and subscribe it to change notifications
    pub fn new(store: &Arc<SettingsStore>) -> Arc<Self> {
        let settings = Arc::new(Self {
            prefix: DOCS_PREFIX,
            store: Arc::clone(store),
            cache: RwLock::new(HashMap::new()),
        });
        let listener: Arc<dyn SettingListener> = settings.clone();
        store.subscribe(Arc::downgrade(&listener));
        settings
    }

    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Look up a setting by name (`ROOT`, `ACCESS`, `DIRHTML`)
    pub fn get(&self, name: &str) -> Result<Value, SettingsError> {
        let Some(&(name, default)) = DOCS_DEFAULTS.iter().find(|(n, _)| *n == name) else {
            return Err(SettingsError::UnknownSetting {
                owner: "DocsSettings",
                name: name.to_string(),
            });
        };

        if let Some(value) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(value.clone());
        }

        let key = format!("{}_{name}", self.prefix);
        let value = self.store.get(&key).unwrap_or_else(default);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value.clone());
        Ok(value)
    }

    /// Configured document root, `None` when unset or null
    pub fn root(&self) -> Option<String> {
        match self.lookup("ROOT") {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Raw access policy name; may be outside the recognised choices
    pub fn access(&self) -> String {
        match self.lookup("ACCESS") {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// Directory-style URL mode
    pub fn dirhtml(&self) -> bool {
        is_truthy(&self.lookup("DIRHTML"))
    }

    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached entries
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn lookup(&self, name: &'static str) -> Value {
        // Every accessor passes a name from DOCS_DEFAULTS
        self.get(name).unwrap_or(Value::Null)
    }
}

impl SettingListener for DocsSettings {
    fn setting_changed(&self, key: &str) {
        if key.starts_with(self.prefix) {
            self.clear_cache();
        }
    }
}

/// Truthiness of a JSON value: null, false, 0, "" and empty containers are false
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
