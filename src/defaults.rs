use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lazy_static::lazy_static;
use tracing::debug;

use crate::datatype::Value;
use crate::registry::KeyHasher;

lazy_static! {
    static ref GLOBAL: Arc<DefaultStore> = Arc::new(DefaultStore::new());
}

// ------------- DefaultProvider -------------
/// Supplies an attribute's value when construction does not.
#[derive(Clone)]
pub enum DefaultProvider {
    Fixed(Value),
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultProvider {
    pub fn fixed(value: impl Into<Value>) -> Self {
        DefaultProvider::Fixed(value.into())
    }
    pub fn generator<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultProvider::Generator(Arc::new(f))
    }
    /// Produces a fresh value. A `Value` owns everything it holds, so handing
    /// out a clone of a fixed default never lets two instances share it.
    pub fn resolve(&self) -> Value {
        match self {
            DefaultProvider::Fixed(value) => value.clone(),
            DefaultProvider::Generator(generate) => generate(),
        }
    }
}

impl fmt::Debug for DefaultProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DefaultProvider::Fixed(value) => write!(f, "Fixed({:?})", value),
            DefaultProvider::Generator(_) => write!(f, "Generator(..)"),
        }
    }
}

// ------------- DefaultStore -------------
type Entries = HashMap<String, Vec<(String, DefaultProvider)>, KeyHasher>;

/// Default providers per owner and attribute, kept in declaration order.
#[derive(Debug, Default)]
pub struct DefaultStore {
    kept: RwLock<Entries>,
}

impl DefaultStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn global() -> Arc<DefaultStore> {
        Arc::clone(&GLOBAL)
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.kept.read().unwrap_or_else(PoisonError::into_inner)
    }
    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.kept.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, owner: &str, name: &str, provider: DefaultProvider) {
        debug!(owner, attribute = name, "storing default");
        let mut kept = self.write();
        let entries = kept.entry(owner.to_string()).or_default();
        match entries.iter_mut().find(|(kept_name, _)| kept_name == name) {
            Some((_, kept_provider)) => *kept_provider = provider,
            None => entries.push((name.to_string(), provider)),
        }
    }
    pub fn get(&self, owner: &str, name: &str) -> Option<Value> {
        let provider = self
            .read()
            .get(owner)?
            .iter()
            .find(|(kept_name, _)| kept_name == name)
            .map(|(_, provider)| provider.clone())?;
        // the guard is gone by now, a generator may use the store itself
        Some(provider.resolve())
    }
    /// Every default of an owner, freshly resolved.
    pub fn defaults_for(&self, owner: &str) -> Vec<(String, Value)> {
        // resolve outside the lock, generators may be arbitrary code
        let providers: Vec<(String, DefaultProvider)> = match self.read().get(owner) {
            Some(entries) => entries.clone(),
            None => return Vec::new(),
        };
        providers
            .into_iter()
            .map(|(name, provider)| {
                let value = provider.resolve();
                (name, value)
            })
            .collect()
    }
    pub fn has_defaults(&self, owner: &str) -> bool {
        self.read().get(owner).is_some_and(|entries| !entries.is_empty())
    }
    pub fn clear(&self, owner: &str) {
        self.write().remove(owner);
    }
}
