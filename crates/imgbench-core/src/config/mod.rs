//! Algorithm config parsing.
//!
//! The document is walked as a raw TOML tree rather than deserialized into
//! typed structs: a bad entry must not hide the entries after it, and every
//! problem is reported with the algorithm it belongs to.

pub mod document;

use std::path::Path;

use toml::{Table, Value as TomlValue};
use tracing::{debug, info, warn};

use crate::consts::{ALGORITHMS_KEY, ARRAY_BUILDER};
use crate::params::{ParamType, ParameterDeclaration};
use crate::report::{ErrorKind, ErrorRecord};
use crate::value::float_repr;

pub use document::{AlgorithmEntry, ConfigDocument, ParamEntry};

const MISSING_KEY: &str = "Could not find config key";

/// A structurally valid algorithm entry. Its module and method are not
/// resolved yet.
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmDeclaration {
    pub name: String,
    pub module: String,
    pub method: String,
    pub params: Vec<ParameterDeclaration>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseOutcome {
    /// Clean entries in document order.
    pub declarations: Vec<AlgorithmDeclaration>,
    pub errors: Vec<ErrorRecord>,
}

impl ParseOutcome {
    fn document_error(detail: &str, error: impl Into<String>) -> Self {
        Self {
            declarations: Vec::new(),
            errors: vec![ErrorRecord::single(detail, error)],
        }
    }

    pub fn kind(&self) -> ErrorKind {
        if self.errors.is_empty() {
            ErrorKind::None
        } else {
            ErrorKind::Parsing
        }
    }
}

/// Read and parse the config file at `path`. Never fails: unreadable files
/// come back as a single `Config file error:` record.
pub fn parse_config_file(path: &Path) -> ParseOutcome {
    info!(path = %path.display(), "Reading algorithm config");
    match std::fs::read_to_string(path) {
        Ok(text) => parse_config_str(&text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Config file unreadable");
            ParseOutcome::document_error("Config file error:", format!("{}: {e}", path.display()))
        }
    }
}

pub fn parse_config_str(text: &str) -> ParseOutcome {
    match toml::from_str::<Table>(text) {
        Ok(table) => parse_document(&table),
        Err(e) => ParseOutcome::document_error("Config file error:", e.message()),
    }
}

pub fn parse_document(table: &Table) -> ParseOutcome {
    let Some(algorithms) = table.get(ALGORITHMS_KEY) else {
        return ParseOutcome::document_error(
            "Config file key error:",
            format!("{MISSING_KEY} '{ALGORITHMS_KEY}'."),
        );
    };
    let Some(entries) = algorithms.as_array() else {
        return ParseOutcome::document_error(
            "Config file algorithms error:",
            format!("Configure key '{ALGORITHMS_KEY}' is not a list."),
        );
    };

    let mut outcome = ParseOutcome::default();
    for (i, entry) in entries.iter().enumerate() {
        match parse_algorithm(i + 1, entry) {
            Ok(declaration) => {
                debug!(index = i + 1, name = %declaration.name, "Algorithm declaration parsed");
                outcome.declarations.push(declaration);
            }
            Err(record) => {
                warn!(index = i + 1, name = %record.detail, errors = record.errors.len(), "Algorithm declaration rejected");
                outcome.errors.push(record);
            }
        }
    }

    info!(
        declarations = outcome.declarations.len(),
        errors = outcome.errors.len(),
        "Config parsed"
    );
    outcome
}

fn parse_algorithm(index: usize, entry: &TomlValue) -> Result<AlgorithmDeclaration, ErrorRecord> {
    let fallback_name = format!("Algorithm #{index}");
    let Some(table) = entry.as_table() else {
        let message = format!("{fallback_name} is not an object.");
        return Err(ErrorRecord::single(fallback_name, message));
    };

    let mut errors = Vec::new();
    let mut required = |key: &str| {
        let found = table.get(key).map(value_text);
        if found.is_none() {
            errors.push(format!("{MISSING_KEY} '{key}'."));
        }
        found
    };
    let name = required("name");
    let module = required("module");
    let method = required("method");

    let params = match table.get("params") {
        None => Vec::new(),
        Some(TomlValue::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(j, item)| parse_param(j + 1, item, &mut errors))
            .collect(),
        Some(_) => {
            errors.push("Configure key 'params' is not a list.".to_string());
            Vec::new()
        }
    };

    let name = name.unwrap_or(fallback_name);
    match (module, method) {
        (Some(module), Some(method)) if errors.is_empty() => Ok(AlgorithmDeclaration {
            name,
            module,
            method,
            params,
        }),
        _ => Err(ErrorRecord::new(name, errors)),
    }
}

fn parse_param(
    index: usize,
    entry: &TomlValue,
    errors: &mut Vec<String>,
) -> Option<ParameterDeclaration> {
    let Some(table) = entry.as_table() else {
        errors.push(format!("Parameter #{index} is not an object."));
        return None;
    };

    let param_type = match table.get("type") {
        None => {
            errors.push(format!("Parameter #{index} - {MISSING_KEY} 'type'."));
            None
        }
        Some(TomlValue::Integer(code)) => {
            let resolved = ParamType::from_code(*code);
            if resolved.is_none() {
                errors.push(format!(
                    "Parameter #{index} - Type is not a valid type from integer value."
                ));
            }
            resolved
        }
        Some(other) => {
            let resolved = ParamType::from_name(&value_text(other));
            if resolved.is_none() {
                errors.push(format!(
                    "Parameter #{index} - Type is not a valid type from string value."
                ));
            }
            resolved
        }
    }?;

    let default = table.get("default").map(|v| {
        let text = value_text(v);
        if param_type == ParamType::Array {
            format!("{ARRAY_BUILDER}({text})")
        } else {
            text
        }
    });

    Some(ParameterDeclaration {
        name: table
            .get("name")
            .map(value_text)
            .unwrap_or_else(|| format!("Parameter #{index}")),
        param_type,
        description: table.get("description").map(value_text),
        default,
    })
}

/// Text of a config value: strings as-is, anything else as an expression
/// literal.
pub fn value_text(value: &TomlValue) -> String {
    match value {
        TomlValue::String(s) => s.clone(),
        other => literal_text(other),
    }
}

fn literal_text(value: &TomlValue) -> String {
    match value {
        TomlValue::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        TomlValue::Integer(i) => i.to_string(),
        TomlValue::Float(f) if f.is_nan() => "math.nan".to_string(),
        TomlValue::Float(f) if *f == f64::INFINITY => "math.inf".to_string(),
        TomlValue::Float(f) if *f == f64::NEG_INFINITY => "-math.inf".to_string(),
        TomlValue::Float(f) => float_repr(*f),
        TomlValue::Boolean(true) => "True".to_string(),
        TomlValue::Boolean(false) => "False".to_string(),
        TomlValue::Array(items) => {
            let parts: Vec<String> = items.iter().map(literal_text).collect();
            format!("[{}]", parts.join(", "))
        }
        TomlValue::Table(table) => {
            let parts: Vec<String> = table
                .iter()
                .map(|(k, v)| format!("'{k}': {}", literal_text(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        TomlValue::Datetime(d) => d.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_literals_as_expressions() {
        let doc: Table = toml::from_str(
            r#"
            a = 1.5
            b = true
            c = [[1, 2], [3, 4]]
            d = "math.pi"
            e = inf
            "#,
        )
        .unwrap();
        assert_eq!(value_text(&doc["a"]), "1.5");
        assert_eq!(value_text(&doc["b"]), "True");
        assert_eq!(value_text(&doc["c"]), "[[1, 2], [3, 4]]");
        assert_eq!(value_text(&doc["d"]), "math.pi");
        assert_eq!(value_text(&doc["e"]), "math.inf");
    }

    #[test]
    fn whole_floats_keep_their_point() {
        assert_eq!(value_text(&TomlValue::Float(2.0)), "2.0");
    }
}
