use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::ParamType;

/// Typed view of an algorithms document, used to write example configs.
///
/// Reading goes through [`super::parse_document`] instead, which walks the
/// raw TOML tree so that every malformed entry can be reported on its own.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub algorithms: Vec<AlgorithmEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlgorithmEntry {
    pub name: String,
    pub module: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<toml::Value>,
}

impl AlgorithmEntry {
    pub fn new(name: &str, module: &str, method: &str) -> Self {
        Self {
            name: name.to_string(),
            module: module.to_string(),
            method: method.to_string(),
            params: Vec::new(),
        }
    }

    pub fn param(
        mut self,
        name: &str,
        param_type: ParamType,
        description: &str,
        default: Option<toml::Value>,
    ) -> Self {
        self.params.push(ParamEntry {
            name: Some(name.to_string()),
            param_type,
            description: Some(description.to_string()),
            default,
        });
        self
    }
}

impl ConfigDocument {
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
