use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lazy_static::lazy_static;
use seahash::SeaHasher;
use tracing::debug;

use crate::conversion;
use crate::error::{CastError, Result};
use crate::rule::{Coercion, CoercionRule};
use crate::template::{Guard, Template};
use crate::typekey::{TypeKey, TypeRef, ARRAY_KEY, SET_KEY};

pub type KeyHasher = BuildHasherDefault<SeaHasher>;

pub const TRUE_VALUES: [&str; 7] = ["1", "t", "T", "true", "TRUE", "on", "ON"];
pub const FALSE_VALUES: [&str; 7] = ["0", "f", "F", "false", "FALSE", "off", "OFF"];

lazy_static! {
    static ref GLOBAL: Arc<TypeRegistry> = Arc::new(TypeRegistry::with_builtins());
}

// ------------- TypeRegistry -------------
/// Maps type keys to coercion rules. Every operation acts on both the key a
/// type is written as and its normalized key, so `Named("DateTime")` and
/// `Tag("date_time")` find the same rule.
///
/// Mutation is expected while the program sets itself up; the lock only keeps
/// concurrent readers from observing a half-written map.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    kept: RwLock<HashMap<TypeKey, Arc<CoercionRule>, KeyHasher>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.seed();
        registry
    }
    /// The process-wide registry, seeded with the built-in rules.
    pub fn global() -> Arc<TypeRegistry> {
        Arc::clone(&GLOBAL)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeKey, Arc<CoercionRule>, KeyHasher>> {
        self.kept.read().unwrap_or_else(PoisonError::into_inner)
    }
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeKey, Arc<CoercionRule>, KeyHasher>> {
        self.kept.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a rule as given.
    pub fn register(&self, type_ref: &TypeRef, rule: CoercionRule) {
        let rule = Arc::new(rule);
        let (key, normalized) = (type_ref.key(), type_ref.normalized());
        debug!(%key, %normalized, "registering coercion rule");
        let mut kept = self.write();
        kept.insert(key, Arc::clone(&rule));
        kept.insert(normalized, rule);
    }
    /// Stores a rule derived from a conversion: absence stays absent, values
    /// already of the named type pass through unchanged, everything else goes
    /// through the conversion.
    pub fn register_type(&self, type_ref: &TypeRef, conversion: Template) {
        let mut rule = CoercionRule::new(conversion).when(Guard::Absent, Template::Absent);
        if let TypeRef::Named(name) = type_ref {
            rule = rule.when(Guard::kind(name.as_str()), Template::Input);
        }
        self.register(type_ref, rule);
    }
    pub fn lookup(&self, type_ref: &TypeRef) -> Option<Arc<CoercionRule>> {
        let kept = self.read();
        kept.get(&type_ref.key())
            .or_else(|| kept.get(&type_ref.normalized()))
            .cloned()
    }
    pub fn exists(&self, type_ref: &TypeRef) -> bool {
        let kept = self.read();
        kept.contains_key(&type_ref.key()) || kept.contains_key(&type_ref.normalized())
    }
    pub fn remove(&self, type_ref: &TypeRef) {
        let (key, normalized) = (type_ref.key(), type_ref.normalized());
        debug!(%key, %normalized, "removing coercion rule");
        let mut kept = self.write();
        kept.remove(&key);
        kept.remove(&normalized);
    }
    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }
    pub fn len(&self) -> usize {
        self.read().len()
    }
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
    /// Looks up and compiles the rule for one attribute.
    pub fn coercion(&self, attribute: &str, type_ref: &TypeRef) -> Result<Coercion> {
        self.lookup(type_ref)
            .map(|rule| rule.compile(attribute, type_ref))
            .ok_or_else(|| CastError::UnsupportedType { type_name: type_ref.to_string() })
    }

    fn seed(&self) {
        let builtin = |name: &str| match conversion::builtin(name) {
            Some(conversion) => Template::Convert(conversion),
            None => Template::Reject,
        };
        self.register_type(&TypeRef::named("String"), builtin("text"));
        self.register_type(&TypeRef::named("Integer"), builtin("integer"));
        self.register_type(&TypeRef::named("Float"), builtin("float"));
        self.register_type(&TypeRef::named("Array"), builtin("list"));
        self.register_type(&TypeRef::named("Date"), builtin("date"));
        self.register_type(&TypeRef::named("Time"), builtin("time"));
        self.register_type(&TypeRef::named("DateTime"), builtin("date_time"));
        self.register_type(&TypeRef::named("Decimal"), builtin("decimal"));

        self.register(
            &TypeRef::tag(ARRAY_KEY),
            CoercionRule::new(builtin("array_of")).when(Guard::Absent, Template::Absent),
        );
        self.register(
            &TypeRef::tag(SET_KEY),
            CoercionRule::new(builtin("set_of")).when(Guard::Absent, Template::Absent),
        );
        self.register(&TypeRef::tag("boolean"), boolean_rule());
    }
}

/// Literal sets only: anything outside them that is not absent is rejected.
pub fn boolean_rule() -> CoercionRule {
    let mut rule = CoercionRule::new(Template::Reject)
        .when(Guard::literal(true), Template::constant(true))
        .when(Guard::literal(1), Template::constant(true))
        .when(Guard::literal(1.0), Template::constant(true));
    for text in TRUE_VALUES {
        rule = rule.when(Guard::literal(text), Template::constant(true));
    }
    rule = rule
        .when(Guard::literal(false), Template::constant(false))
        .when(Guard::literal(0), Template::constant(false))
        .when(Guard::literal(0.0), Template::constant(false))
        .when(Guard::literal(-0.0), Template::constant(false));
    for text in FALSE_VALUES {
        rule = rule.when(Guard::literal(text), Template::constant(false));
    }
    rule.when(Guard::Absent, Template::Absent)
}
