use ndarray::{Array2, ArrayD, IxDyn, Zip};

use super::parser::{BinaryOp, Expr, UnaryOp};
use super::EvalError;
use crate::array::{DType, NdArray};
use crate::consts::MAX_ARRAY_ELEMENTS;
use crate::value::{float_to_int, Value};

/// Anything a name can evaluate to. Modules and functions only exist while
/// evaluating; they never escape as values.
enum Object {
    Value(Value),
    Module(Module),
    Builtin(Builtin),
}

impl Object {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Value(v) => v.type_name(),
            Self::Module(_) => "module",
            Self::Builtin(_) => "builtin_function_or_method",
        }
    }

    fn into_value(self) -> Result<Value, EvalError> {
        match self {
            Self::Value(v) => Ok(v),
            other => Err(EvalError::Type(format!(
                "'{}' object cannot be used as a value",
                other.type_name()
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Module {
    Math,
    Numpy,
}

impl Module {
    fn name(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Numpy => "numpy",
        }
    }

    fn attribute(self, name: &str) -> Result<Object, EvalError> {
        use std::f64::consts;

        let constant = match name {
            "pi" => Some(consts::PI),
            "e" => Some(consts::E),
            "tau" if self == Self::Math => Some(consts::TAU),
            "inf" => Some(f64::INFINITY),
            "nan" => Some(f64::NAN),
            _ => None,
        };
        if let Some(c) = constant {
            return Ok(Object::Value(Value::Float(c)));
        }

        let builtin = match (self, name) {
            (_, "sqrt") => Some(Builtin::Sqrt),
            (_, "exp") => Some(Builtin::Exp),
            (_, "log") => Some(Builtin::Log),
            (_, "log10") => Some(Builtin::Log10),
            (_, "sin") => Some(Builtin::Sin),
            (_, "cos") => Some(Builtin::Cos),
            (_, "tan") => Some(Builtin::Tan),
            (_, "floor") => Some(Builtin::Floor),
            (_, "ceil") => Some(Builtin::Ceil),
            (Self::Math, "fabs") => Some(Builtin::Fabs),
            (Self::Math, "pow") => Some(Builtin::Pow),
            (Self::Numpy, "abs") => Some(Builtin::Abs),
            (Self::Numpy, "array") => Some(Builtin::Array),
            (Self::Numpy, "asarray") => Some(Builtin::Array),
            (Self::Numpy, "zeros") => Some(Builtin::Zeros),
            (Self::Numpy, "ones") => Some(Builtin::Ones),
            (Self::Numpy, "eye") => Some(Builtin::Eye),
            (Self::Numpy, "full") => Some(Builtin::Full),
            _ => None,
        };

        builtin.map(Object::Builtin).ok_or_else(|| EvalError::UnknownAttribute {
            module: self.name(),
            name: name.to_string(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Builtin {
    Abs,
    Min,
    Max,
    Round,
    Int,
    Float,
    Bool,
    Array,
    Zeros,
    Ones,
    Eye,
    Full,
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Fabs,
    Pow,
}

impl Builtin {
    fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Round => "round",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Zeros => "zeros",
            Self::Ones => "ones",
            Self::Eye => "eye",
            Self::Full => "full",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Log10 => "log10",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Fabs => "fabs",
            Self::Pow => "pow",
        }
    }
}

fn lookup_global(name: &str) -> Result<Object, EvalError> {
    let object = match name {
        "math" => Object::Module(Module::Math),
        "np" | "numpy" => Object::Module(Module::Numpy),
        "abs" => Object::Builtin(Builtin::Abs),
        "min" => Object::Builtin(Builtin::Min),
        "max" => Object::Builtin(Builtin::Max),
        "round" => Object::Builtin(Builtin::Round),
        "int" => Object::Builtin(Builtin::Int),
        "float" => Object::Builtin(Builtin::Float),
        "bool" => Object::Builtin(Builtin::Bool),
        "array" | "asarray" => Object::Builtin(Builtin::Array),
        "zeros" => Object::Builtin(Builtin::Zeros),
        "ones" => Object::Builtin(Builtin::Ones),
        "eye" => Object::Builtin(Builtin::Eye),
        "full" => Object::Builtin(Builtin::Full),
        _ => return Err(EvalError::UndefinedName(name.to_string())),
    };
    Ok(object)
}

pub(super) fn eval(expr: &Expr) -> Result<Value, EvalError> {
    eval_object(expr)?.into_value()
}

fn eval_object(expr: &Expr) -> Result<Object, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(Object::Value(v.clone())),
        Expr::Name(name) => lookup_global(name),
        Expr::Attribute { target, name } => match eval_object(target)? {
            Object::Module(module) => module.attribute(name),
            other => Err(EvalError::NoAttribute {
                type_name: other.type_name(),
                name: name.clone(),
            }),
        },
        Expr::Call { func, args } => {
            let builtin = match eval_object(func)? {
                Object::Builtin(b) => b,
                other => return Err(EvalError::NotCallable(other.type_name())),
            };
            let args = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            call(builtin, &args).map(Object::Value)
        }
        Expr::List(items) => {
            let values = items.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            sized(Value::List(values)).map(Object::Value)
        }
        Expr::Tuple(items) => {
            let values = items.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            sized(Value::Tuple(values)).map(Object::Value)
        }
        Expr::Unary { op, operand } => unary(*op, eval(operand)?).map(Object::Value),
        Expr::Binary { op, left, right } => {
            binary(*op, eval(left)?, eval(right)?).map(Object::Value)
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Plus, Value::Bool(b)) => Ok(Value::Int(b as i64)),
        (UnaryOp::Plus, v @ (Value::Int(_) | Value::Float(_) | Value::Array(_))) => Ok(v),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-(b as i64))),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, Value::Array(a)) => {
            let dtype = signed_dtype(a.dtype());
            Ok(Value::Array(NdArray::from_f64(a.to_f64().mapv(|v| -v), dtype)))
        }
        (op, other) => Err(EvalError::BadUnaryOperand {
            op: op.symbol(),
            operand: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let unsupported = |l: &Value, r: &Value| EvalError::UnsupportedOperand {
        op: op.symbol(),
        left: l.type_name(),
        right: r.type_name(),
    };

    match (&left, &right) {
        (Value::Array(_), _) | (_, Value::Array(_)) => {
            if matches!(left, Value::None) || matches!(right, Value::None) {
                return Err(unsupported(&left, &right));
            }
            array_binary(op, &left, &right)
        }
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            check_size(left.element_count().checked_add(right.element_count()))?;
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (Value::Tuple(a), Value::Tuple(b)) if op == BinaryOp::Add => {
            check_size(left.element_count().checked_add(right.element_count()))?;
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (Value::List(items), n) | (n, Value::List(items))
            if op == BinaryOp::Mul && n.as_i64().is_some() =>
        {
            repeat(items, n.as_i64().unwrap_or(0)).map(Value::List)
        }
        (Value::Tuple(items), n) | (n, Value::Tuple(items))
            if op == BinaryOp::Mul && n.as_i64().is_some() =>
        {
            repeat(items, n.as_i64().unwrap_or(0)).map(Value::Tuple)
        }
        (l, r) if l.is_number() && r.is_number() => match (l.as_i64(), r.as_i64()) {
            (Some(x), Some(y)) => int_binary(op, x, y),
            _ => float_binary(
                op,
                l.as_f64().unwrap_or_default(),
                r.as_f64().unwrap_or_default(),
            ),
        },
        (l, r) => Err(unsupported(l, r)),
    }
}

fn repeat(items: &[Value], times: i64) -> Result<Vec<Value>, EvalError> {
    let times = usize::try_from(times).unwrap_or(0);
    let weight = items
        .iter()
        .fold(0usize, |n, item| n.saturating_add(item.element_count().max(1)));
    check_size(weight.checked_mul(times))?;
    Ok(items.iter().cloned().cycle().take(items.len() * times).collect())
}

/// Reject anything above `MAX_ARRAY_ELEMENTS`; `None` means the count overflowed.
fn check_size(count: Option<usize>) -> Result<usize, EvalError> {
    count
        .filter(|&n| n <= MAX_ARRAY_ELEMENTS)
        .ok_or_else(|| EvalError::Value("array is too big".to_string()))
}

/// Zero-length axes are counted as one so a zero never masks an oversized
/// remainder.
fn sized(value: Value) -> Result<Value, EvalError> {
    check_size(Some(value.element_count()))?;
    Ok(value)
}

fn checked_len(shape: &[usize]) -> Result<usize, EvalError> {
    check_size(shape.iter().try_fold(1usize, |n, &d| n.checked_mul(d.max(1))))
}

fn int_binary(op: BinaryOp, x: i64, y: i64) -> Result<Value, EvalError> {
    const INT_ZERO_DIVISION: &str = "integer division or modulo by zero";

    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => {
            if y == 0 {
                return Err(EvalError::ZeroDivision("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(EvalError::ZeroDivision(INT_ZERO_DIVISION));
            }
            x.checked_div(y).map(|q| {
                if x % y != 0 && ((x < 0) != (y < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(EvalError::ZeroDivision(INT_ZERO_DIVISION));
            }
            x.checked_rem(y).map(|r| if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r })
        }
        BinaryOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(EvalError::ZeroDivision(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            u32::try_from(y).ok().and_then(|e| x.checked_pow(e))
        }
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_binary(op: BinaryOp, x: f64, y: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision("float division by zero"));
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision("float modulo"));
            }
            floored_mod(x, y)
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(EvalError::ZeroDivision(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            if x < 0.0 && y.fract() != 0.0 {
                return Err(EvalError::Value(
                    "negative number cannot be raised to a fractional power".to_string(),
                ));
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(result))
}

fn floored_mod(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
        r + y
    } else {
        r
    }
}

/// Element-wise arithmetic with numpy broadcasting. Integer inputs keep an
/// integer result except for true division.
fn array_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let la = left.to_ndarray()?;
    let ra = right.to_ndarray()?;

    let broadcast_error = || EvalError::Broadcast {
        left: la.shape_string(),
        right: ra.shape_string(),
    };
    let shape = broadcast_shape(la.shape(), ra.shape()).ok_or_else(broadcast_error)?;
    checked_len(&shape)?;

    let a = la.to_f64();
    let b = ra.to_f64();
    let av = a.broadcast(IxDyn(&shape)).ok_or_else(broadcast_error)?;
    let bv = b.broadcast(IxDyn(&shape)).ok_or_else(broadcast_error)?;

    let result: ArrayD<f64> = Zip::from(&av).and(&bv).map_collect(|&x, &y| match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod => floored_mod(x, y),
        BinaryOp::Pow => x.powf(y),
    });

    let integral = !la.dtype().is_float() && !ra.dtype().is_float();
    let dtype = if integral && op != BinaryOp::Div {
        DType::I64
    } else {
        DType::F64
    };
    Ok(Value::Array(NdArray::from_f64(result, dtype)))
}

fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let n = a.len().max(b.len());
    let dim = |shape: &[usize], i: usize| {
        let offset = n - shape.len();
        if i < offset {
            1
        } else {
            shape[i - offset]
        }
    };
    (0..n)
        .map(|i| match (dim(a, i), dim(b, i)) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        })
        .collect()
}

fn signed_dtype(dtype: DType) -> DType {
    match dtype {
        DType::Bool | DType::U8 | DType::U16 => DType::I64,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Builtin functions
// ---------------------------------------------------------------------------

fn call(builtin: Builtin, args: &[Value]) -> Result<Value, EvalError> {
    match builtin {
        Builtin::Abs => {
            expect_args(builtin, args, 1, 1)?;
            abs(&args[0])
        }
        Builtin::Min | Builtin::Max => min_max(builtin, args),
        Builtin::Round => {
            expect_args(builtin, args, 1, 2)?;
            round(&args[0], args.get(1))
        }
        Builtin::Int => {
            expect_args(builtin, args, 0, 1)?;
            args.first().map_or(Ok(Value::Int(0)), Value::to_int)
        }
        Builtin::Float => {
            expect_args(builtin, args, 0, 1)?;
            args.first().map_or(Ok(Value::Float(0.0)), Value::to_float)
        }
        Builtin::Bool => {
            expect_args(builtin, args, 0, 1)?;
            args.first()
                .map_or(Ok(false), Value::truthy)
                .map(Value::Bool)
        }
        Builtin::Array => {
            expect_args(builtin, args, 1, 1)?;
            args[0].to_ndarray().map(Value::Array)
        }
        Builtin::Zeros | Builtin::Ones => {
            expect_args(builtin, args, 1, 1)?;
            let shape = shape_of(&args[0])?;
            let fill = if builtin == Builtin::Ones { 1.0 } else { 0.0 };
            Ok(Value::Array(NdArray::F64(ArrayD::from_elem(IxDyn(&shape), fill))))
        }
        Builtin::Eye => {
            expect_args(builtin, args, 1, 1)?;
            let n = single_dim(&args[0])?;
            checked_len(&[n, n])?;
            Ok(Value::Array(NdArray::F64(Array2::<f64>::eye(n).into_dyn())))
        }
        Builtin::Full => {
            expect_args(builtin, args, 2, 2)?;
            let shape = IxDyn(&shape_of(&args[0])?);
            let array = match &args[1] {
                Value::Bool(b) => NdArray::Bool(ArrayD::from_elem(shape, *b)),
                Value::Int(i) => NdArray::I64(ArrayD::from_elem(shape, *i)),
                Value::Float(f) => NdArray::F64(ArrayD::from_elem(shape, *f)),
                other => {
                    return Err(EvalError::Type(format!(
                        "full() fill value must be a number, not '{}'",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Array(array))
        }
        Builtin::Sqrt
        | Builtin::Exp
        | Builtin::Log10
        | Builtin::Sin
        | Builtin::Cos
        | Builtin::Tan
        | Builtin::Fabs => {
            expect_args(builtin, args, 1, 1)?;
            float_function(builtin, &args[0])
        }
        Builtin::Log => {
            expect_args(builtin, args, 1, 2)?;
            let value = float_function(builtin, &args[0])?;
            match args.get(1) {
                None => Ok(value),
                Some(base) => {
                    let base = float_function(builtin, base)?;
                    binary(BinaryOp::Div, value, base)
                }
            }
        }
        Builtin::Floor | Builtin::Ceil => {
            expect_args(builtin, args, 1, 1)?;
            floor_ceil(builtin, &args[0])
        }
        Builtin::Pow => {
            expect_args(builtin, args, 2, 2)?;
            let x = scalar_f64(builtin, &args[0])?;
            let y = scalar_f64(builtin, &args[1])?;
            if x < 0.0 && y.fract() != 0.0 {
                return Err(EvalError::MathDomain);
            }
            Ok(Value::Float(x.powf(y)))
        }
    }
}

fn expect_args(builtin: Builtin, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        format!("exactly {min} argument{}", if min == 1 { "" } else { "s" })
    } else {
        format!("from {min} to {max} arguments")
    };
    Err(EvalError::Type(format!(
        "{}() takes {expected} ({} given)",
        builtin.name(),
        args.len()
    )))
}

fn scalar_f64(builtin: Builtin, value: &Value) -> Result<f64, EvalError> {
    value.as_f64().ok_or_else(|| {
        EvalError::Type(format!(
            "{}() argument must be a real number, not '{}'",
            builtin.name(),
            value.type_name()
        ))
    })
}

fn abs(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Int(i) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Array(a) => Ok(Value::Array(NdArray::from_f64(
            a.to_f64().mapv(f64::abs),
            signed_dtype(a.dtype()),
        ))),
        other => Err(EvalError::Type(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn min_max(builtin: Builtin, args: &[Value]) -> Result<Value, EvalError> {
    let candidates: Vec<Value> = match args {
        [] => {
            return Err(EvalError::Type(format!(
                "{} expected at least 1 argument, got 0",
                builtin.name()
            )))
        }
        [Value::List(items)] | [Value::Tuple(items)] => items.clone(),
        [Value::Array(a)] => {
            let is_float = a.dtype().is_float();
            a.to_f64()
                .iter()
                .map(|&v| if is_float { Value::Float(v) } else { Value::Int(v as i64) })
                .collect()
        }
        [single] => {
            return Err(EvalError::Type(format!(
                "'{}' object is not iterable",
                single.type_name()
            )))
        }
        many => many.to_vec(),
    };

    let mut best: Option<(f64, Value)> = None;
    for candidate in candidates {
        let key = candidate.as_f64().ok_or_else(|| {
            EvalError::Type(format!(
                "'{}' not supported for '{}' values",
                builtin.name(),
                candidate.type_name()
            ))
        })?;
        let better = match &best {
            None => true,
            Some((current, _)) if builtin == Builtin::Min => key < *current,
            Some((current, _)) => key > *current,
        };
        if better {
            best = Some((key, candidate));
        }
    }

    best.map(|(_, v)| v).ok_or_else(|| {
        EvalError::Value(format!("{}() arg is an empty sequence", builtin.name()))
    })
}

fn round(value: &Value, ndigits: Option<&Value>) -> Result<Value, EvalError> {
    let digits = match ndigits {
        None | Some(Value::None) => None,
        Some(d) => Some(d.as_i64().ok_or_else(|| {
            EvalError::Type(format!(
                "'{}' object cannot be interpreted as an integer",
                d.type_name()
            ))
        })?),
    };

    match (value, digits) {
        (Value::Bool(_) | Value::Int(_), None) => value.to_int(),
        (Value::Bool(_) | Value::Int(_), Some(_)) => value.to_int(),
        (Value::Float(f), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Value::Float(f), Some(d)) => round_float(*f, d).map(Value::Float),
        (other, _) => Err(EvalError::Type(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

/// Round to `digits` decimals. Digits past the precision of an f64 leave the
/// value alone; digits below its exponent range round to a signed zero.
fn round_float(f: f64, digits: i64) -> Result<f64, EvalError> {
    if !f.is_finite() || digits > 308 {
        return Ok(f);
    }
    if digits < -308 {
        return Ok(0.0_f64.copysign(f));
    }
    let scale = 10f64.powi(digits.unsigned_abs() as i32);
    let rounded = if digits >= 0 {
        let scaled = f * scale;
        if !scaled.is_finite() {
            return Ok(f);
        }
        scaled.round_ties_even() / scale
    } else {
        (f / scale).round_ties_even() * scale
    };
    if rounded.is_finite() {
        Ok(rounded)
    } else {
        Err(EvalError::Value("rounded value too large to represent".to_string()))
    }
}

fn float_function(builtin: Builtin, value: &Value) -> Result<Value, EvalError> {
    let f: fn(f64) -> f64 = match builtin {
        Builtin::Sqrt => f64::sqrt,
        Builtin::Exp => f64::exp,
        Builtin::Log => f64::ln,
        Builtin::Log10 => f64::log10,
        Builtin::Sin => f64::sin,
        Builtin::Cos => f64::cos,
        Builtin::Tan => f64::tan,
        _ => f64::abs,
    };

    if let Value::Array(a) = value {
        return Ok(Value::Array(NdArray::F64(a.to_f64().mapv(f))));
    }

    let x = scalar_f64(builtin, value)?;
    let out_of_domain = match builtin {
        Builtin::Sqrt => x < 0.0,
        Builtin::Log | Builtin::Log10 => x <= 0.0,
        _ => false,
    };
    if out_of_domain {
        return Err(EvalError::MathDomain);
    }
    Ok(Value::Float(f(x)))
}

fn floor_ceil(builtin: Builtin, value: &Value) -> Result<Value, EvalError> {
    let f: fn(f64) -> f64 = if builtin == Builtin::Floor {
        f64::floor
    } else {
        f64::ceil
    };
    match value {
        Value::Array(a) => Ok(Value::Array(NdArray::F64(a.to_f64().mapv(f)))),
        Value::Bool(_) | Value::Int(_) => value.to_int(),
        other => float_to_int(f(scalar_f64(builtin, other)?)).map(Value::Int),
    }
}

fn single_dim(value: &Value) -> Result<usize, EvalError> {
    let n = value.as_i64().ok_or_else(|| {
        EvalError::Type(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })?;
    usize::try_from(n).map_err(|_| EvalError::Value("negative dimensions are not allowed".to_string()))
}

fn shape_of(value: &Value) -> Result<Vec<usize>, EvalError> {
    let shape = match value {
        Value::List(items) | Value::Tuple(items) => {
            items.iter().map(single_dim).collect::<Result<Vec<_>, _>>()?
        }
        other => vec![single_dim(other)?],
    };
    checked_len(&shape)?;
    Ok(shape)
}
