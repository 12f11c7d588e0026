use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::datatype::Value;
use crate::error::{CastError, Result};
use crate::registry::TypeRegistry;
use crate::template::{Guard, Template};
use crate::typekey::TypeRef;

/// What a conversion gets to see besides the input: which attribute is being
/// assigned, the attribute's full declared type, and the registry to resolve
/// element types against.
pub struct CastContext<'a> {
    pub attribute: &'a str,
    pub declared: &'a TypeRef,
    pub registry: &'a TypeRegistry,
}

impl<'a> CastContext<'a> {
    pub fn element(&self) -> Result<&'a TypeRef> {
        self.declared.element().ok_or_else(|| CastError::UnsupportedType {
            type_name: self.declared.to_string(),
        })
    }
}

// ------------- CoercionRule -------------
/// Ordered guard clauses plus a fallback. The first clause whose guard
/// matches decides the template, otherwise the fallback applies.
#[derive(Clone, Debug)]
pub struct CoercionRule {
    clauses: Vec<(Guard, Template)>,
    otherwise: Template,
}

impl CoercionRule {
    pub fn new(otherwise: Template) -> Self {
        Self {
            clauses: Vec::new(),
            otherwise,
        }
    }
    pub fn when(mut self, guard: Guard, template: Template) -> Self {
        self.clauses.push((guard, template));
        self
    }
    /// Builds a rule from its textual form, e.g.
    /// `parse(&[("\"yes\"", "true"), ("\"no\"", "false")], "nil")`.
    pub fn parse(clauses: &[(&str, &str)], otherwise: &str) -> Result<Self> {
        let mut rule = CoercionRule::new(Template::parse(otherwise)?);
        for (guard, template) in clauses {
            rule = rule.when(Guard::parse(guard)?, Template::parse(template)?);
        }
        Ok(rule)
    }
    pub fn clauses(&self) -> &[(Guard, Template)] {
        &self.clauses
    }
    pub fn otherwise(&self) -> &Template {
        &self.otherwise
    }
    pub fn compile(&self, attribute: &str, declared: &TypeRef) -> Coercion {
        let bind = |template: &Template| match template {
            Template::Text(pattern) => Template::Text(pattern.bind(attribute)),
            other => other.clone(),
        };
        Coercion {
            attribute: Arc::from(attribute),
            declared: declared.clone(),
            clauses: self.clauses.iter().map(|(guard, template)| (guard.clone(), bind(template))).collect(),
            otherwise: bind(&self.otherwise),
        }
    }
}

// ------------- Coercion -------------
/// A rule compiled for one attribute.
#[derive(Clone)]
pub struct Coercion {
    attribute: Arc<str>,
    declared: TypeRef,
    clauses: Arc<[(Guard, Template)]>,
    otherwise: Template,
}

impl Coercion {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
    pub fn declared(&self) -> &TypeRef {
        &self.declared
    }
    pub fn apply(&self, value: Value, registry: &TypeRegistry) -> Result<Value> {
        let template = self
            .clauses
            .iter()
            .find(|(guard, _)| guard.matches(&value))
            .map(|(_, template)| template)
            .unwrap_or(&self.otherwise);
        match template {
            Template::Absent => Ok(Value::Nil),
            Template::Input => Ok(value),
            Template::Constant(constant) => Ok(constant.clone()),
            Template::Text(pattern) => Ok(Value::Text(pattern.render(&self.attribute, &value))),
            Template::Reject => Err(self.invalid(&value)),
            Template::Convert(conversion) => {
                let context = CastContext {
                    attribute: &self.attribute,
                    declared: &self.declared,
                    registry,
                };
                conversion(&value, &context).map_err(|e| match e {
                    e @ (CastError::InvalidValue { .. } | CastError::UnsupportedType { .. }) => e,
                    other => {
                        debug!(attribute = %self.attribute, declared = %self.declared, reason = %other, "conversion rejected value");
                        self.invalid(&value)
                    }
                })
            }
        }
    }
    fn invalid(&self, value: &Value) -> CastError {
        CastError::InvalidValue {
            attribute: self.attribute.to_string(),
            type_name: self.declared.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Coercion")
            .field("attribute", &self.attribute)
            .field("declared", &self.declared)
            .field("clauses", &self.clauses.len())
            .finish()
    }
}
