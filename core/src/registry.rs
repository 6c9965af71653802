//! String-keyed plugin registries.

use crate::action::ActionRegistry;
use crate::animation::AnimationRegistry;
use crate::error::FactoryError;
use crate::params::ParamsRegistry;
use core::fmt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Constructs a plugin instance from a shared context object.
pub type Factory<T, C> = Arc<dyn Fn(&C) -> Result<T, FactoryError> + Send + Sync>;

/// Maps case-insensitive keys to plugin factories.
///
/// Registration and resolution may happen concurrently (e.g. while several screens are being
/// parsed); the map sits behind a read-write lock and factories are always called with the lock
/// released.
pub struct Registry<T, C> {
    family: &'static str,
    entries: RwLock<HashMap<String, Factory<T, C>>>,
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

impl<T, C> Registry<T, C> {
    /// Creates an empty registry. `family` only shows up in logs.
    pub fn new(family: &'static str) -> Registry<T, C> {
        Registry {
            family,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a factory, replacing any existing entry with the same key.
    pub fn register<F>(&self, key: &str, factory: F)
    where
        F: Fn(&C) -> Result<T, FactoryError> + Send + Sync + 'static,
    {
        let key = normalize(key);
        let previous = self.entries.write().insert(key.clone(), Arc::new(factory));
        if previous.is_some() {
            debug!(family = self.family, %key, "replaced registry entry");
        }
    }

    /// Runs a fallible population step and registers its factory.
    ///
    /// If `build` fails, the failure is logged and the key stays absent; the rest of the registry
    /// is unaffected. Returns whether the entry was registered.
    pub fn try_register<F, B>(&self, key: &str, build: B) -> bool
    where
        B: FnOnce() -> Result<F, FactoryError>,
        F: Fn(&C) -> Result<T, FactoryError> + Send + Sync + 'static,
    {
        match build() {
            Ok(factory) => {
                self.register(key, factory);
                true
            }
            Err(err) => {
                warn!(family = self.family, key, %err, "failed to populate registry entry");
                false
            }
        }
    }

    /// Constructs an instance for `key`.
    ///
    /// Returns `None` if no factory is registered or if the factory fails.
    pub fn resolve(&self, key: &str, context: &C) -> Option<T> {
        let key = normalize(key);
        let factory = self.entries.read().get(&key).cloned()?;
        match factory(context) {
            Ok(instance) => Some(instance),
            Err(err) => {
                warn!(family = self.family, %key, %err, "plugin construction failed");
                None
            }
        }
    }

    /// Returns true if a factory is registered for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(&normalize(key))
    }

    /// Returns all registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T, C> fmt::Debug for Registry<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("family", &self.family)
            .field("keys", &self.keys())
            .finish()
    }
}

/// The three plugin families used while parsing and loading a screen.
///
/// Built once at startup and shared by everything that parses markup.
#[derive(Debug)]
pub struct Registries {
    pub actions: ActionRegistry,
    pub animations: AnimationRegistry,
    pub params: ParamsRegistry,
}

impl Registries {
    /// Creates registries with no actions or animations and the builtin layout parameter kinds.
    pub fn new() -> Registries {
        Registries {
            actions: ActionRegistry::new("action"),
            animations: AnimationRegistry::new("animation"),
            params: ParamsRegistry::new(),
        }
    }
}

impl Default for Registries {
    fn default() -> Registries {
        Registries::new()
    }
}
