// used to canonicalize type names (DateTime -> date_time)
use regex::Regex;
use lazy_static::lazy_static;

// used to print out readable forms of a type reference
use std::fmt;
use std::str::FromStr;

use crate::error::{CastError, Result};

pub const ARRAY_KEY: &str = "collection_array";
pub const SET_KEY: &str = "collection_set";

lazy_static! {
    static ref WORD_BOUNDARY: Regex = Regex::new(r"([a-z])([A-Z])").expect("valid regex");
}

// ------------- TypeRef -------------
/// How an attribute declares its type: a concrete type name, a symbolic tag,
/// or a collection of some element type.
#[derive(Eq, PartialEq, Hash, Clone, Debug)]
pub enum TypeRef {
    Named(String),
    Tag(String),
    ArrayOf(Box<TypeRef>),
    SetOf(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }
    pub fn tag(name: impl Into<String>) -> Self {
        TypeRef::Tag(name.into())
    }
    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::ArrayOf(Box::new(element))
    }
    pub fn set_of(element: TypeRef) -> Self {
        TypeRef::SetOf(Box::new(element))
    }
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::ArrayOf(element) | TypeRef::SetOf(element) => Some(element),
            _ => None,
        }
    }
    /// The key this reference is stored under as written.
    pub fn key(&self) -> TypeKey {
        match self {
            TypeRef::Named(name) => TypeKey::Named(name.clone()),
            _ => normalize(self),
        }
    }
    /// The canonical key, shared by a type and its tag.
    pub fn normalized(&self) -> TypeKey {
        normalize(self)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Tag(tag) => write!(f, ":{}", tag),
            TypeRef::ArrayOf(element) => write!(f, "Array<{}>", element),
            TypeRef::SetOf(element) => write!(f, "Set<{}>", element),
        }
    }
}

// Accepts the same forms Display produces: `:tag`, `Array<T>`, `Set<T>`, `Name`.
impl FromStr for TypeRef {
    type Err = CastError;
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || CastError::UnsupportedType { type_name: s.to_string() };
        if let Some(tag) = s.strip_prefix(':') {
            if tag.is_empty() {
                return Err(invalid());
            }
            return Ok(TypeRef::tag(tag));
        }
        if let Some(inner) = s.strip_prefix("Array<").and_then(|r| r.strip_suffix('>')) {
            return Ok(TypeRef::array_of(inner.parse()?));
        }
        if let Some(inner) = s.strip_prefix("Set<").and_then(|r| r.strip_suffix('>')) {
            return Ok(TypeRef::set_of(inner.parse()?));
        }
        if s.is_empty() || !s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':') {
            return Err(invalid());
        }
        Ok(TypeRef::named(s))
    }
}

// ------------- TypeKey -------------
#[derive(Eq, PartialEq, Hash, PartialOrd, Ord, Clone, Debug)]
pub enum TypeKey {
    Named(String),
    Tag(String),
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeKey::Named(name) => write!(f, "{}", name),
            TypeKey::Tag(tag) => write!(f, ":{}", tag),
        }
    }
}

/// Canonicalizes a type reference. Never fails; whether a rule exists for the
/// key is the registry's business.
pub fn normalize(type_ref: &TypeRef) -> TypeKey {
    match type_ref {
        TypeRef::Tag(tag) => TypeKey::Tag(tag.clone()),
        TypeRef::ArrayOf(_) => TypeKey::Tag(ARRAY_KEY.to_string()),
        TypeRef::SetOf(_) => TypeKey::Tag(SET_KEY.to_string()),
        TypeRef::Named(name) => TypeKey::Tag(underscore(name)),
    }
}

/// `UserForm` -> `user_form`
///
/// Only a lowercase letter followed by an uppercase one starts a new word,
/// so runs of capitals stay together: `HTTPServer` -> `httpserver`.
pub fn underscore(name: &str) -> String {
    WORD_BOUNDARY.replace_all(name, "${1}_${2}").to_lowercase()
}
