//! Attribute declarations read from JSON, as used by the command line tool:
//!
//! ```json
//! { "owner": "Book",
//!   "options": { "bulk_accessor": "storage" },
//!   "attributes": [
//!     { "names": ["title", "name"], "type": "String" },
//!     { "names": ["pages"], "type": "Integer", "default": 100 },
//!     { "names": ["tags"], "type": "Set<:string>" } ] }
//! ```

use serde::Deserialize;

use crate::compiler::{Compiler, CompilerOptions, Declaration};
use crate::datatype::Value;
use crate::error::Result;
use crate::model::Model;
use crate::typekey::TypeRef;

#[derive(Clone, Debug, Deserialize)]
pub struct AttributeSpec {
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Schema {
    pub owner: String,
    #[serde(default)]
    pub options: Option<CompilerOptions>,
    pub attributes: Vec<AttributeSpec>,
}

impl Schema {
    pub fn from_json(text: &str) -> Result<Schema> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn declarations(&self) -> Result<Vec<Declaration>> {
        self.attributes
            .iter()
            .map(|spec| {
                let type_ref: TypeRef = spec.type_name.parse()?;
                let declaration = Declaration::new(spec.names.iter().cloned(), type_ref);
                Ok(match &spec.default {
                    Some(default) => declaration.with_default(Value::from(default.clone())),
                    None => declaration,
                })
            })
            .collect()
    }
    /// The schema's own options win over the ones passed in.
    pub fn compile(&self, compiler: &Compiler, fallback: CompilerOptions) -> Result<Model> {
        let options = self.options.clone().unwrap_or(fallback);
        compiler.compile_attributes(&self.owner, self.declarations()?, options)
    }
}
