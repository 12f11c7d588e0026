//! Attrcast – typed attributes for dynamically typed values.
//!
//! Attrcast compiles attribute declarations into a [`model::Model`]: every
//! attribute gets a getter and a setter, and the setter coerces whatever it is
//! given into the declared type. The pieces are:
//! * A [`typekey::TypeRef`] names a declared type: a concrete name (`DateTime`),
//!   a symbolic tag (`:boolean`), or a collection (`Array<Integer>`,
//!   `Set<:string>`). Each one normalizes to a [`typekey::TypeKey`].
//! * A [`rule::CoercionRule`] is an ordered list of guard/template clauses plus
//!   a fallback (see [`template`]).
//! * The [`registry::TypeRegistry`] maps type keys to rules. Every rule is kept
//!   under both the key it was written with and its normalized key.
//! * The [`defaults::DefaultStore`] keeps per owner default values, handed out
//!   as fresh copies on every construction.
//! * The [`compiler::Compiler`] turns [`compiler::Declaration`]s into a model,
//!   optionally with a synthesized constructor and a bulk accessor.
//!
//! ## Built-in types
//! `String`, `Integer`, `Float`, `Array`, `Date`, `Time`, `DateTime` and
//! `Decimal` are registered by name, `:boolean` by tag, and collections of any
//! registered element type are available out of the box. Values already of
//! the declared type pass through unchanged and `Nil` always stays `Nil`.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use attrcast::compiler::{Compiler, CompilerOptions, Declaration};
//! use attrcast::defaults::DefaultStore;
//! use attrcast::model::attributes;
//! use attrcast::registry::TypeRegistry;
//! use attrcast::typekey::TypeRef;
//!
//! let compiler = Compiler::new(Arc::new(TypeRegistry::with_builtins()), Arc::new(DefaultStore::new()));
//! let book = Arc::new(compiler.compile_attributes(
//!     "Book",
//!     vec![
//!         Declaration::new(["pages"], TypeRef::named("Integer")),
//!         Declaration::new(["rate"], TypeRef::named("Float")),
//!     ],
//!     CompilerOptions::default().with_constructor(),
//! ).unwrap());
//! let instance = book.construct(attributes([("pages", "250"), ("rate", "4.1")])).unwrap();
//! assert_eq!(instance.get("pages").unwrap().as_integer(), Some(250));
//! assert_eq!(instance.get("rate").unwrap().as_float(), Some(4.1));
//! ```
//!
//! ## Command line
//! The `attrcast` binary reads a JSON schema and a JSON input object and prints
//! the coerced attributes. See [`schema`] and [`settings`].

pub mod compiler;
pub mod conversion;
pub mod datatype;
pub mod defaults;
pub mod error;
pub mod model;
pub mod registry;
pub mod rule;
pub mod schema;
pub mod settings;
pub mod template;
pub mod typekey;

pub use compiler::{BulkAccessor, Compiler, CompilerOptions, Declaration};
pub use datatype::Value;
pub use error::{CastError, Result};
pub use model::{Instance, Model};
pub use registry::TypeRegistry;
pub use rule::CoercionRule;
pub use template::{Guard, Template};
pub use typekey::{TypeKey, TypeRef};

// ------------- Process-wide registry -------------
/// Registers a conversion for a type in the process-wide registry.
pub fn register_type(type_ref: &TypeRef, conversion: Template) {
    TypeRegistry::global().register_type(type_ref, conversion);
}

/// Registers a full rule in the process-wide registry.
pub fn register_rule(type_ref: &TypeRef, rule: CoercionRule) {
    TypeRegistry::global().register(type_ref, rule);
}

pub fn type_exists(type_ref: &TypeRef) -> bool {
    TypeRegistry::global().exists(type_ref)
}

pub fn remove_type(type_ref: &TypeRef) {
    TypeRegistry::global().remove(type_ref);
}

/// Compiles against the process-wide registry and default store.
pub fn compile_attributes<I>(owner: &str, declarations: I, options: CompilerOptions) -> Result<Model>
where
    I: IntoIterator<Item = Declaration>,
{
    Compiler::global().compile_attributes(owner, declarations, options)
}
