
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("Unsupported attribute type \"{type_name}\"")]
    UnsupportedType { type_name: String },
    #[error("Invalid value \"{value}\" for attribute \"{attribute}\" of type \"{type_name}\"")]
    InvalidValue { attribute: String, type_name: String, value: String },
    #[error("Unknown attribute \"{attribute}\" for {owner}")]
    UnknownAttribute { owner: String, attribute: String },
    #[error("{owner} has no synthesized {member}")]
    NotSynthesized { owner: String, member: &'static str },
    #[error("Invalid declaration for {owner}: {message}")]
    InvalidDeclaration { owner: String, message: String },
    #[error("Template error: {message}")]
    Template { message: String },
    // raised by conversions, turned into InvalidValue by the compiled coercion
    #[error("Unconvertible value: {0}")]
    Unconvertible(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, CastError>;

// Helper conversions
impl From<config::ConfigError> for CastError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for CastError {
    fn from(e: serde_json::Error) -> Self { Self::Json(e.to_string()) }
}
impl From<std::io::Error> for CastError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
