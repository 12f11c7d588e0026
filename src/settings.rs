//! Settings for the command line tool: the compiler options a schema gets
//! when it does not bring its own, and the log filter.
//!
//! Values come from an optional `attrcast.{toml,json,yaml}` file, then from
//! `ATTRCAST__*` environment variables, e.g.
//! `ATTRCAST__COMPILER__IGNORE_UNRECOGNIZED_KEYS=true`.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::compiler::CompilerOptions;
use crate::error::Result;

pub const DEFAULT_SETTINGS_FILE: &str = "attrcast";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerOptions,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compiler: CompilerOptions::default(),
            log_filter: String::from("warn"),
        }
    }
}

impl Settings {
    /// An explicitly named file must exist, the default one may be missing.
    pub fn load(path: Option<&str>) -> Result<Settings> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_SETTINGS_FILE)).required(path.is_some()))
            .add_source(Environment::with_prefix("ATTRCAST").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
