//! Guards and replacement templates that make up a coercion rule.
//!
//! A text pattern knows three placeholders: `%s` renders the input value,
//! `%a` the attribute name and `%%` a literal percent sign. Every other `%`
//! is kept as is. `%a` is resolved when a rule is compiled for an attribute,
//! `%s` on every call.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use lazy_static::lazy_static;

use crate::conversion;
use crate::datatype::Value;
use crate::error::{CastError, Result};
use crate::rule::CastContext;

lazy_static! {
    static ref CALL: Regex = Regex::new(r"^([a-z_]+)\(%s\)$").expect("valid regex");
    static ref INTEGER_LITERAL: Regex = Regex::new(r"^-?\d+$").expect("valid regex");
    static ref FLOAT_LITERAL: Regex = Regex::new(r"^-?\d+\.\d+$").expect("valid regex");
    static ref TYPE_NAME: Regex = Regex::new(r"^[A-Z][A-Za-z0-9_]*$").expect("valid regex");
}

/// A conversion from raw input to a typed value. Failures are reported as
/// [`CastError::Unconvertible`] and turned into `InvalidValue` by the caller.
pub type Conversion = Arc<dyn Fn(&Value, &CastContext<'_>) -> Result<Value> + Send + Sync>;

// ------------- Pattern -------------
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Piece {
    Literal(String),
    Input,
    Attribute,
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Pattern {
    pieces: Vec<Piece>,
}

impl Pattern {
    pub fn parse(source: &str) -> Pattern {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let placeholder = match chars.peek() {
                Some('s') => Some(Piece::Input),
                Some('a') => Some(Piece::Attribute),
                Some('%') => {
                    chars.next();
                    literal.push('%');
                    continue;
                }
                _ => None,
            };
            match placeholder {
                Some(piece) => {
                    chars.next();
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(piece);
                }
                None => literal.push('%'),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Pattern { pieces }
    }
    /// Resolves `%a`, leaving only input references behind.
    pub fn bind(&self, attribute: &str) -> Pattern {
        let mut pieces: Vec<Piece> = Vec::with_capacity(self.pieces.len());
        for piece in &self.pieces {
            let piece = match piece {
                Piece::Attribute => Piece::Literal(attribute.to_string()),
                other => other.clone(),
            };
            if let (Piece::Literal(next), Some(Piece::Literal(previous))) = (&piece, pieces.last_mut()) {
                previous.push_str(next);
                continue;
            }
            pieces.push(piece);
        }
        Pattern { pieces }
    }
    pub fn references_input(&self) -> bool {
        self.pieces.contains(&Piece::Input)
    }
    /// Renders with the input rendered once and spliced into each `%s`.
    pub fn render(&self, attribute: &str, input: &Value) -> String {
        let rendered_input = if self.references_input() { input.to_string() } else { String::new() };
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Input => out.push_str(&rendered_input),
                Piece::Attribute => out.push_str(attribute),
            }
        }
        out
    }
}

// ------------- Guard -------------
/// The condition of a rule clause. Guards compare against constant literals
/// or the exact type of the input; they are not a general pattern language.
#[derive(PartialEq, Clone, Debug)]
pub enum Guard {
    Absent,
    Literal(Value),
    Kind(String),
}

impl Guard {
    pub fn literal(value: impl Into<Value>) -> Self {
        Guard::Literal(value.into())
    }
    pub fn kind(name: impl Into<String>) -> Self {
        Guard::Kind(name.into())
    }
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Guard::Absent => value.is_nil(),
            Guard::Literal(literal) => literal == value,
            Guard::Kind(name) => value.type_name() == name,
        }
    }
    /// `nil`, `true`, `42`, `4.2`, `:sym`, `"text"` or a capitalized type name.
    pub fn parse(source: &str) -> Result<Guard> {
        let source = source.trim();
        if source == "nil" {
            return Ok(Guard::Absent);
        }
        if TYPE_NAME.is_match(source) {
            return Ok(Guard::Kind(source.to_string()));
        }
        parse_literal(source)
            .map(Guard::Literal)
            .ok_or_else(|| CastError::Template { message: format!("unrecognized guard `{}`", source) })
    }
}

// ------------- Template -------------
#[derive(Clone)]
pub enum Template {
    Absent,
    Input,
    Constant(Value),
    Text(Pattern),
    Convert(Conversion),
    Reject,
}

impl Template {
    pub fn constant(value: impl Into<Value>) -> Self {
        Template::Constant(value.into())
    }
    pub fn text(pattern: &str) -> Self {
        Template::Text(Pattern::parse(pattern))
    }
    pub fn convert<F>(f: F) -> Self
    where
        F: Fn(&Value, &CastContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Template::Convert(Arc::new(f))
    }
    /// `nil`, `%s`, `reject`, a literal, a quoted pattern such as `"%a-%s"`,
    /// or a call to a built-in conversion such as `integer(%s)`.
    pub fn parse(source: &str) -> Result<Template> {
        let source = source.trim();
        match source {
            "nil" => return Ok(Template::Absent),
            "%s" => return Ok(Template::Input),
            "reject" => return Ok(Template::Reject),
            _ => (),
        }
        if let Some(inner) = source.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            return Ok(Template::text(inner));
        }
        if let Some(captures) = CALL.captures(source) {
            let name = &captures[1];
            return conversion::builtin(name)
                .map(Template::Convert)
                .ok_or_else(|| CastError::Template { message: format!("unknown conversion `{}`", name) });
        }
        parse_literal(source)
            .map(Template::Constant)
            .ok_or_else(|| CastError::Template { message: format!("unrecognized template `{}`", source) })
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Template::Absent => write!(f, "Absent"),
            Template::Input => write!(f, "Input"),
            Template::Constant(value) => write!(f, "Constant({:?})", value),
            Template::Text(pattern) => write!(f, "Text({:?})", pattern),
            Template::Convert(_) => write!(f, "Convert(..)"),
            Template::Reject => write!(f, "Reject"),
        }
    }
}

fn parse_literal(source: &str) -> Option<Value> {
    match source {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => (),
    }
    if let Some(text) = source.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Some(Value::Text(text.to_string()));
    }
    if let Some(symbol) = source.strip_prefix(':') {
        return (!symbol.is_empty()).then(|| Value::symbol(symbol));
    }
    if INTEGER_LITERAL.is_match(source) {
        return source.parse().ok().map(Value::Integer);
    }
    if FLOAT_LITERAL.is_match(source) {
        return source.parse().ok().map(Value::Float);
    }
    None
}
