use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use crate::compiler::{AttributeSet, BulkAccessor, CompilerOptions};
use crate::datatype::{Value, ValueMap};
use crate::defaults::DefaultStore;
use crate::error::{CastError, Result};
use crate::registry::TypeRegistry;
use crate::template::Template;

/// A getter installed over the generated one. It reads storage itself
/// through [`Instance::raw`].
pub type Getter = Arc<dyn Fn(&Instance) -> Result<Value> + Send + Sync>;
/// A setter installed over the generated one. It stores through
/// [`Instance::assign`]; calling [`Instance::set`] from inside would recurse.
pub type Setter = Arc<dyn Fn(&mut Instance, Value) -> Result<()> + Send + Sync>;

/// Builds a name to value mapping for construction.
pub fn attributes<K, V, I>(pairs: I) -> ValueMap
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

// ------------- Model -------------
/// The compiled form of a value type: its attributes, their coercions, and
/// whichever members the compiler options asked for.
pub struct Model {
    name: String,
    attributes: AttributeSet,
    options: CompilerOptions,
    registry: Arc<TypeRegistry>,
    defaults: Arc<DefaultStore>,
    getters: Vec<Option<Getter>>,
    setters: Vec<Option<Setter>>,
}

impl Model {
    pub(crate) fn new(
        name: &str,
        attributes: AttributeSet,
        options: CompilerOptions,
        registry: Arc<TypeRegistry>,
        defaults: Arc<DefaultStore>,
    ) -> Self {
        let count = attributes.len();
        Self {
            name: name.to_string(),
            attributes,
            options,
            registry,
            defaults,
            getters: vec![None; count],
            setters: vec![None; count],
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attribute_set(&self) -> &AttributeSet {
        &self.attributes
    }
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.attributes.position(name).ok_or_else(|| CastError::UnknownAttribute {
            owner: self.name.clone(),
            attribute: name.to_string(),
        })
    }
    fn require(&self, synthesized: bool, member: &'static str) -> Result<()> {
        if synthesized {
            Ok(())
        } else {
            Err(CastError::NotSynthesized { owner: self.name.clone(), member })
        }
    }

    pub fn override_getter<F>(mut self, name: &str, getter: F) -> Result<Self>
    where
        F: Fn(&Instance) -> Result<Value> + Send + Sync + 'static,
    {
        let position = self.position(name)?;
        self.getters[position] = Some(Arc::new(getter));
        Ok(self)
    }
    pub fn override_setter<F>(mut self, name: &str, setter: F) -> Result<Self>
    where
        F: Fn(&mut Instance, Value) -> Result<()> + Send + Sync + 'static,
    {
        let position = self.position(name)?;
        self.setters[position] = Some(Arc::new(setter));
        Ok(self)
    }

    /// An instance with every attribute absent and no defaults applied.
    pub fn new_instance(self: &Arc<Self>) -> Instance {
        Instance {
            model: Arc::clone(self),
            values: vec![Value::Nil; self.attributes.len()],
        }
    }
    /// The synthesized constructor.
    pub fn construct(self: &Arc<Self>, supplied: ValueMap) -> Result<Instance> {
        let mut instance = self.new_instance();
        self.populate(&mut instance, supplied)?;
        Ok(instance)
    }
    /// The body of the synthesized constructor, for types that run their own
    /// code around it. Defaults are merged under the supplied values and every
    /// pair goes through the public setter.
    pub fn populate(&self, instance: &mut Instance, mut supplied: ValueMap) -> Result<()> {
        self.require(self.options.synthesize_constructor, "constructor")?;
        let mut merged: Vec<(String, Value)> = Vec::new();
        for (name, default) in self.defaults.defaults_for(&self.name) {
            let value = supplied.remove(&name).unwrap_or(default);
            merged.push((name, value));
        }
        merged.extend(supplied);
        for (name, value) in merged {
            if !self.attributes.contains(&name) {
                if self.options.ignore_unrecognized_keys {
                    debug!(owner = %self.name, attribute = %name, "dropping unrecognized key");
                    continue;
                }
                return Err(CastError::UnknownAttribute { owner: self.name.clone(), attribute: name });
            }
            instance.set(&name, value)?;
        }
        Ok(())
    }
    /// Builds an instance from a map, the way a nested value arrives.
    pub fn instantiate(self: &Arc<Self>, value: &Value) -> Result<Value> {
        match value {
            Value::Map(map) => self.construct(map.clone()).map(Value::Object),
            Value::Object(instance) if instance.model.name == self.name => Ok(value.clone()),
            other => Err(CastError::Unconvertible(format!("cannot build {} from {} `{}`", self.name, other.type_name(), other))),
        }
    }
    /// A conversion template that lets this model be registered as a type.
    /// The registry only keeps a weak handle, so the model still drops.
    pub fn conversion(self: &Arc<Self>) -> Template {
        let model = Arc::downgrade(self);
        let name = self.name.clone();
        Template::convert(move |value, _| match model.upgrade() {
            // errors of the nested attributes are reported against the outer one
            Some(model) => model.instantiate(value).map_err(|e| CastError::Unconvertible(e.to_string())),
            None => Err(CastError::Unconvertible(format!("{} is no longer available", name))),
        })
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name, self.attributes.names().join(", "))
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("attributes", &self.attributes.names())
            .field("options", &self.options)
            .finish()
    }
}

// ------------- Instance -------------
#[derive(Clone)]
pub struct Instance {
    model: Arc<Model>,
    values: Vec<Value>,
}

impl Instance {
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }
    /// The generated getter: the stored value, unchanged.
    pub fn raw(&self, name: &str) -> Result<&Value> {
        let position = self.model.position(name)?;
        Ok(&self.values[position])
    }
    pub fn raw_mut(&mut self, name: &str) -> Result<&mut Value> {
        let position = self.model.position(name)?;
        Ok(&mut self.values[position])
    }
    /// The public getter, which is the generated one unless overridden.
    pub fn get(&self, name: &str) -> Result<Value> {
        let position = self.model.position(name)?;
        match self.model.getters[position].clone() {
            Some(getter) => getter(self),
            None => Ok(self.values[position].clone()),
        }
    }
    /// The generated setter: coerces and stores.
    pub fn assign(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let position = self.model.position(name)?;
        let model = Arc::clone(&self.model);
        let descriptor = &model.attributes.descriptors()[position];
        self.values[position] = descriptor.coercion().apply(value.into(), &model.registry)?;
        Ok(())
    }
    /// The public setter, which is the generated one unless overridden.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let position = self.model.position(name)?;
        match self.model.setters[position].clone() {
            Some(setter) => setter(self, value.into()),
            None => self.assign(name, value),
        }
    }
    /// The synthesized bulk accessor, in declaration order.
    pub fn attributes(&self) -> Result<Vec<(String, Value)>> {
        let mode = self.model.options.bulk_accessor;
        self.model.require(mode != BulkAccessor::Off, "attributes accessor")?;
        self.model
            .attributes
            .iter()
            .zip(&self.values)
            .map(|(descriptor, stored)| {
                let value = match mode {
                    BulkAccessor::Getters => self.get(descriptor.name())?,
                    _ => stored.clone(),
                };
                Ok((descriptor.name().to_string(), value))
            })
            .collect()
    }
    /// Stored values paired with their names, in declaration order.
    pub fn storage(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.model.attributes.iter().map(|d| d.name()).zip(&self.values)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.model.name == other.model.name && self.values == other.values
    }
}
impl Eq for Instance {}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.name.hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<String> = self.storage().map(|(name, value)| format!("{}: {}", name, value)).collect();
        write!(f, "{} {{{}}}", self.model.name, fields.join(", "))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut debug = f.debug_struct(&self.model.name);
        for (name, value) in self.storage() {
            debug.field(name, value);
        }
        debug.finish()
    }
}
