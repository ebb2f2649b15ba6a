use std::fmt;

use ndarray::{ArrayD, IxDyn};

use crate::array::NdArray;
use crate::expr::EvalError;

/// Dynamically typed value exchanged with algorithms and produced by the
/// expression evaluator.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Array(NdArray),
}

impl Value {
    /// Type name as shown in user-facing messages (`int`, `ndarray`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Array(_) => "ndarray",
        }
    }

    /// Number of scalars held, counting array elements and nested items.
    /// Every sequence item counts at least once, empty or not.
    pub fn element_count(&self) -> usize {
        match self {
            Self::List(items) | Self::Tuple(items) => items
                .iter()
                .fold(0usize, |n, item| n.saturating_add(item.element_count().max(1))),
            Self::Array(a) => a.len(),
            _ => 1,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<NdArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Numeric view of a scalar (`bool`, `int`, `float`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integral view of a scalar (`bool`, `int`).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(*b as i64),
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Int(_) | Self::Float(_))
    }

    /// `int(x)`: truncates floats, unwraps size-1 arrays.
    pub fn to_int(&self) -> Result<Value, EvalError> {
        match self {
            Self::Bool(b) => Ok(Self::Int(*b as i64)),
            Self::Int(i) => Ok(Self::Int(*i)),
            Self::Float(f) => float_to_int(*f).map(Self::Int),
            Self::Array(a) => size_one_item(a)?.to_int(),
            other => Err(EvalError::Type(format!(
                "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                other.type_name()
            ))),
        }
    }

    /// `float(x)`: widens integers, unwraps size-1 arrays.
    pub fn to_float(&self) -> Result<Value, EvalError> {
        match self {
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => {
                Ok(Self::Float(self.as_f64().unwrap_or_default()))
            }
            Self::Array(a) => size_one_item(a)?.to_float(),
            other => Err(EvalError::Type(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))),
        }
    }

    /// `bool(x)`: zero and empty values are false; arrays with more than one
    /// element are ambiguous.
    pub fn truthy(&self) -> Result<bool, EvalError> {
        match self {
            Self::None => Ok(false),
            Self::Bool(b) => Ok(*b),
            Self::Int(i) => Ok(*i != 0),
            Self::Float(f) => Ok(*f != 0.0),
            Self::List(items) | Self::Tuple(items) => Ok(!items.is_empty()),
            Self::Array(a) => match a.len() {
                0 => Ok(false),
                1 => array_item(a).map_or(Ok(false), |item| item.truthy()),
                _ => Err(EvalError::Value(
                    "The truth value of an array with more than one element is ambiguous. \
                     Use a.any() or a.all()"
                        .to_string(),
                )),
            },
        }
    }

    /// `asarray(x)`: arrays pass through, scalars become 0-d arrays, nested
    /// sequences must be rectangular.
    pub fn to_ndarray(&self) -> Result<NdArray, EvalError> {
        if let Self::Array(a) = self {
            return Ok(a.clone());
        }

        let mut elements = Vec::new();
        let shape = flatten(self, &mut elements)?;

        let has_float = elements.iter().any(|e| matches!(e, Scalar::Float(_)));
        let has_int = elements.iter().any(|e| matches!(e, Scalar::Int(_)));
        let dim = IxDyn(&shape);

        let array = if elements.is_empty() || has_float {
            let data = elements.iter().map(Scalar::as_f64).collect();
            NdArray::F64(ArrayD::from_shape_vec(dim, data).map_err(|_| EvalError::InhomogeneousShape)?)
        } else if has_int {
            let data = elements.iter().map(Scalar::as_i64).collect();
            NdArray::I64(ArrayD::from_shape_vec(dim, data).map_err(|_| EvalError::InhomogeneousShape)?)
        } else {
            let data = elements.iter().map(|e| e.as_i64() != 0).collect();
            NdArray::Bool(ArrayD::from_shape_vec(dim, data).map_err(|_| EvalError::InhomogeneousShape)?)
        };

        Ok(array)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<NdArray> for Value {
    fn from(v: NdArray) -> Self {
        Self::Array(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{}", float_repr(*v)),
            Self::List(items) => write!(f, "[{}]", join(items)),
            Self::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Self::Tuple(items) => write!(f, "({})", join(items)),
            Self::Array(a) => write!(f, "{a}"),
        }
    }
}

/// Shortest round-trip text of a float that always carries a decimal point
/// or exponent, so it reads back as a float.
pub fn float_repr(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{v:?}")
    }
}

/// The single element of a size-1 array as a scalar value.
pub fn array_item(array: &NdArray) -> Option<Value> {
    if array.len() != 1 {
        return None;
    }
    let item = match array {
        NdArray::Bool(a) => Value::Bool(*a.iter().next()?),
        NdArray::U8(a) => Value::Int(*a.iter().next()? as i64),
        NdArray::U16(a) => Value::Int(*a.iter().next()? as i64),
        NdArray::I32(a) => Value::Int(*a.iter().next()? as i64),
        NdArray::I64(a) => Value::Int(*a.iter().next()?),
        NdArray::F32(a) => Value::Float(*a.iter().next()? as f64),
        NdArray::F64(a) => Value::Float(*a.iter().next()?),
    };
    Some(item)
}

fn size_one_item(array: &NdArray) -> Result<Value, EvalError> {
    array_item(array).ok_or_else(|| {
        EvalError::Type("only size-1 arrays can be converted to scalars".to_string())
    })
}

pub(crate) fn float_to_int(v: f64) -> Result<i64, EvalError> {
    if v.is_nan() {
        return Err(EvalError::Value("cannot convert float NaN to integer".to_string()));
    }
    if v.is_infinite() {
        return Err(EvalError::Value(
            "cannot convert float infinity to integer".to_string(),
        ));
    }
    let truncated = v.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(EvalError::Overflow);
    }
    Ok(truncated as i64)
}

fn join(items: &[Value]) -> String {
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Copy)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn as_f64(&self) -> f64 {
        match *self {
            Self::Bool(b) => b as i64 as f64,
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn as_i64(&self) -> i64 {
        match *self {
            Self::Bool(b) => b as i64,
            Self::Int(i) => i,
            Self::Float(f) => f as i64,
        }
    }
}

/// Append the scalars of `value` in row-major order and return its shape.
fn flatten(value: &Value, out: &mut Vec<Scalar>) -> Result<Vec<usize>, EvalError> {
    match value {
        Value::Bool(b) => {
            out.push(Scalar::Bool(*b));
            Ok(vec![])
        }
        Value::Int(i) => {
            out.push(Scalar::Int(*i));
            Ok(vec![])
        }
        Value::Float(f) => {
            out.push(Scalar::Float(*f));
            Ok(vec![])
        }
        Value::Array(a) => {
            match a {
                NdArray::Bool(d) => out.extend(d.iter().map(|&v| Scalar::Bool(v))),
                NdArray::F32(d) => out.extend(d.iter().map(|&v| Scalar::Float(v as f64))),
                NdArray::F64(d) => out.extend(d.iter().map(|&v| Scalar::Float(v))),
                other => out.extend(other.to_f64().iter().map(|&v| Scalar::Int(v as i64))),
            }
            Ok(a.shape().to_vec())
        }
        Value::List(items) | Value::Tuple(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = flatten(item, out)?;
                match &inner {
                    None => inner = Some(shape),
                    Some(prev) if *prev != shape => return Err(EvalError::InhomogeneousShape),
                    Some(_) => {}
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        Value::None => Err(EvalError::Type(
            "could not convert 'NoneType' to an array".to_string(),
        )),
    }
}
