//! Restricted expression language for parameter values.
//!
//! Parameter defaults and user-entered parameter text are small expressions:
//! numeric and boolean literals, arithmetic, list/tuple literals, array
//! builders and a fixed `math` namespace. Nothing else can be named, so an
//! expression can never reach the filesystem or run arbitrary code.
//!
//! ```text
//! 3                    -> int
//! math.pi / 4          -> float
//! True                 -> bool
//! array([[0, -1, 0], [-1, 5, -1], [0, -1, 0]])
//! np.ones((5, 5)) / 25 -> ndarray
//! ```

mod eval;
mod lexer;
mod parser;

use thiserror::Error;

use crate::value::Value;

pub use parser::{BinaryOp, Expr, UnaryOp};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("invalid syntax at position {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("module '{module}' has no attribute '{name}'")]
    UnknownAttribute { module: &'static str, name: String },

    #[error("'{type_name}' object has no attribute '{name}'")]
    NoAttribute {
        type_name: &'static str,
        name: String,
    },

    #[error("'{0}' object is not callable")]
    NotCallable(&'static str),

    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperand {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("bad operand type for unary {op}: '{operand}'")]
    BadUnaryOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("{0}")]
    ZeroDivision(&'static str),

    #[error("operands could not be broadcast together with shapes {left} {right}")]
    Broadcast { left: String, right: String },

    #[error(
        "setting an array element with a sequence. The requested array has an inhomogeneous shape"
    )]
    InhomogeneousShape,

    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Value(String),

    #[error("math domain error")]
    MathDomain,

    #[error("integer overflow")]
    Overflow,
}

/// Parse and evaluate `source` in the restricted namespace.
pub fn evaluate(source: &str) -> Result<Value, EvalError> {
    let expr = parse(source)?;
    eval::eval(&expr)
}

/// Parse `source` into an expression tree without evaluating it.
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).parse_all()
}
