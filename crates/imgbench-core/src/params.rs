use std::fmt;

use serde::{Deserialize, Serialize};

use crate::array::NdArray;
use crate::consts::{
    FALLBACK_ARRAY_SIZE, FALLBACK_BOOL, FALLBACK_FLOAT, FALLBACK_INT, PARAM_NAME_MAX_LENGTH,
};
use crate::expr::EvalError;
use crate::value::Value;

/// Declared type of an algorithm parameter.
///
/// In a config document a type is written either as its integer code or as
/// its name: `0 | "int"`, `1 | "float"`, `2 | "bool"`, `3 | "array"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int = 0,
    Float = 1,
    Bool = 2,
    Array = 3,
}

impl ParamType {
    pub const ALL: [ParamType; 4] = [Self::Int, Self::Float, Self::Bool, Self::Array];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Canonical name used in config documents.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Array => "array",
        }
    }

    /// Name of the runtime type a value of this parameter must have.
    pub fn native_name(self) -> &'static str {
        match self {
            Self::Array => "ndarray",
            other => other.name(),
        }
    }

    /// Self-test argument for a parameter that declares no default.
    pub fn fallback_default(self) -> Value {
        match self {
            Self::Int => Value::Int(FALLBACK_INT),
            Self::Float => Value::Float(FALLBACK_FLOAT),
            Self::Bool => Value::Bool(FALLBACK_BOOL),
            Self::Array => Value::Array(NdArray::zeros(&[FALLBACK_ARRAY_SIZE, FALLBACK_ARRAY_SIZE])),
        }
    }

    /// Whether `value` already has this parameter's runtime type. `bool`
    /// counts as `int`.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Int => matches!(value, Value::Int(_) | Value::Bool(_)),
            Self::Float => matches!(value, Value::Float(_)),
            Self::Bool => matches!(value, Value::Bool(_)),
            Self::Array => matches!(value, Value::Array(_)),
        }
    }

    /// Apply this type's constructor: `int(v)`, `float(v)`, `bool(v)` or
    /// `asarray(v)`.
    pub fn coerce(self, value: &Value) -> Result<Value, EvalError> {
        match self {
            Self::Int => value.to_int(),
            Self::Float => value.to_float(),
            Self::Bool => value.truthy().map(Value::Bool),
            Self::Array => value.to_ndarray().map(Value::Array),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One declared parameter of an algorithm, as read from the config.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDeclaration {
    pub name: String,
    pub param_type: ParamType,
    pub description: Option<String>,
    /// Default value as expression text. Array defaults are already wrapped
    /// in the array builder.
    pub default: Option<String>,
}

impl ParameterDeclaration {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Name shortened to fit a parameter label.
    pub fn display_name(&self) -> String {
        if self.name.chars().count() <= PARAM_NAME_MAX_LENGTH {
            return self.name.clone();
        }
        let head: String = self.name.chars().take(PARAM_NAME_MAX_LENGTH - 3).collect();
        format!("{head}...")
    }

    /// Full name followed by the description, when there is one.
    pub fn tooltip(&self) -> Option<String> {
        self.description
            .as_ref()
            .map(|d| format!("{}:\n{d}", self.name))
    }

    /// Text a parameter field starts out with: the default, with boolean
    /// literals shown as `1`/`0`.
    pub fn initial_text(&self) -> String {
        match self.default.as_deref() {
            Some("True") | Some("true") => "1".to_string(),
            Some("False") | Some("false") => "0".to_string(),
            Some(text) => text.to_string(),
            None => String::new(),
        }
    }

    /// `Parameter #<i> (<name>)`, with `index` zero-based.
    pub fn label(&self, index: usize) -> String {
        format!("Parameter #{} ({})", index + 1, self.name)
    }
}
