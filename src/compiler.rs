use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::datatype::Value;
use crate::defaults::{DefaultProvider, DefaultStore};
use crate::error::{CastError, Result};
use crate::model::Model;
use crate::registry::{KeyHasher, TypeRegistry};
use crate::rule::{Coercion, CoercionRule};
use crate::typekey::TypeRef;

// ------------- Declarations -------------
#[derive(Clone, Debug, Default)]
pub struct AttributeOptions {
    pub default: Option<DefaultProvider>,
}

/// One or more attribute names sharing a type and options.
#[derive(Clone, Debug)]
pub struct Declaration {
    names: Vec<String>,
    type_ref: TypeRef,
    options: AttributeOptions,
}

impl Declaration {
    pub fn new<I, S>(names: I, type_ref: TypeRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            type_ref,
            options: AttributeOptions::default(),
        }
    }
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.options.default = Some(DefaultProvider::fixed(value));
        self
    }
    pub fn with_default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options.default = Some(DefaultProvider::generator(f));
        self
    }
    pub fn with_options(mut self, options: AttributeOptions) -> Self {
        self.options = options;
        self
    }
    pub fn names(&self) -> &[String] {
        &self.names
    }
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAccessor {
    #[default]
    Off,
    /// reads stored values
    Storage,
    /// reads through the getters, overrides included
    Getters,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub synthesize_constructor: bool,
    pub bulk_accessor: BulkAccessor,
    pub ignore_unrecognized_keys: bool,
}

impl CompilerOptions {
    pub fn with_constructor(mut self) -> Self {
        self.synthesize_constructor = true;
        self
    }
    pub fn with_bulk_accessor(mut self, mode: BulkAccessor) -> Self {
        self.bulk_accessor = mode;
        self
    }
    pub fn ignoring_unrecognized_keys(mut self) -> Self {
        self.ignore_unrecognized_keys = true;
        self
    }
}

// ------------- AttributeSet -------------
#[derive(Clone, Debug)]
pub struct AttributeDescriptor {
    name: String,
    type_ref: TypeRef,
    options: AttributeOptions,
    coercion: Coercion,
}

impl AttributeDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }
    pub fn options(&self) -> &AttributeOptions {
        &self.options
    }
    pub fn coercion(&self) -> &Coercion {
        &self.coercion
    }
}

/// Descriptors in declaration order. Declaring a name twice replaces the
/// descriptor but keeps its original position.
#[derive(Clone, Debug, Default)]
pub struct AttributeSet {
    descriptors: Vec<AttributeDescriptor>,
    index: HashMap<String, usize, KeyHasher>,
}

impl AttributeSet {
    fn insert(&mut self, descriptor: AttributeDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&position) => self.descriptors[position] = descriptor,
            None => {
                self.index.insert(descriptor.name.clone(), self.descriptors.len());
                self.descriptors.push(descriptor);
            }
        }
    }
    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.position(name).map(|position| &self.descriptors[position])
    }
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
    pub fn descriptors(&self) -> &[AttributeDescriptor] {
        &self.descriptors
    }
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeDescriptor> {
        self.descriptors.iter()
    }
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

// ------------- Compiler -------------
/// Turns declarations into a [`Model`] against an explicit registry and
/// default store.
#[derive(Clone, Debug)]
pub struct Compiler {
    registry: Arc<TypeRegistry>,
    defaults: Arc<DefaultStore>,
}

impl Compiler {
    pub fn new(registry: Arc<TypeRegistry>, defaults: Arc<DefaultStore>) -> Self {
        Self { registry, defaults }
    }
    /// A compiler over the process-wide registry and default store.
    pub fn global() -> Self {
        Self::new(TypeRegistry::global(), DefaultStore::global())
    }
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }
    pub fn defaults(&self) -> &Arc<DefaultStore> {
        &self.defaults
    }

    /// Every declared type must be registered; the first one that is not
    /// fails the whole compilation before any default is recorded.
    pub fn compile_attributes<I>(&self, owner: &str, declarations: I, options: CompilerOptions) -> Result<Model>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let mut attributes = AttributeSet::default();
        let mut defaults: Vec<(String, DefaultProvider)> = Vec::new();
        for declaration in declarations {
            if declaration.names.is_empty() {
                return Err(CastError::InvalidDeclaration {
                    owner: owner.to_string(),
                    message: format!("no attribute names given for type {}", declaration.type_ref),
                });
            }
            let rule = self.resolve(&declaration.type_ref)?;
            for name in &declaration.names {
                if name.is_empty() {
                    return Err(CastError::InvalidDeclaration {
                        owner: owner.to_string(),
                        message: "attribute names cannot be empty".to_string(),
                    });
                }
                if let Some(provider) = &declaration.options.default {
                    defaults.push((name.clone(), provider.clone()));
                }
                attributes.insert(AttributeDescriptor {
                    name: name.clone(),
                    type_ref: declaration.type_ref.clone(),
                    options: declaration.options.clone(),
                    coercion: rule.compile(name, &declaration.type_ref),
                });
            }
        }
        // recompiling an owner replaces all of its defaults
        self.defaults.clear(owner);
        for (name, provider) in defaults {
            self.defaults.put(owner, &name, provider);
        }
        info!(owner, attributes = attributes.len(), constructor = options.synthesize_constructor, "compiled attributes");
        Ok(Model::new(
            owner,
            attributes,
            options,
            Arc::clone(&self.registry),
            Arc::clone(&self.defaults),
        ))
    }

    // Element types are checked here too, although their rules are looked up
    // again on every coercion.
    fn resolve(&self, type_ref: &TypeRef) -> Result<Arc<CoercionRule>> {
        let rule = self.registry.lookup(type_ref).ok_or_else(|| CastError::UnsupportedType {
            type_name: type_ref.to_string(),
        })?;
        if let Some(element) = type_ref.element() {
            self.resolve(element)?;
        }
        Ok(rule)
    }
}
