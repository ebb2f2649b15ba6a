//! Algorithm binding and invocation.
//!
//! A config names an algorithm by `(module, method)`. An [`AlgorithmProvider`]
//! turns that pair into a callable [`Algorithm`]; [`ModuleRegistry`] is the
//! provider used in practice and comes pre-filled with the built-in modules.

pub mod builtin;
mod context;
mod registry;

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;

use crate::array::NdArray;
use crate::value::Value;

pub use builtin::{builtin_registry, example_document};
pub use context::{CallContext, CancelToken};
pub use registry::{Module, ModuleRegistry};

/// Error an algorithm reports from inside its body.
#[derive(Error, Debug)]
pub enum AlgorithmError {
    #[error("{0}")]
    Invalid(String),

    #[error("argument '{name}' must be {expected}, not '{got}'")]
    ArgumentType {
        name: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("invocation cancelled")]
    Cancelled,

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AlgorithmError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn failed(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    #[error("module '{module}' has no attribute '{method}'")]
    MethodNotFound { module: String, method: String },
}

/// Failure of a single call through [`call_algorithm`].
#[derive(Error, Debug)]
pub enum CallError {
    #[error("{0}")]
    Arity(String),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    #[error("algorithm panicked: {0}")]
    Panicked(String),
}

impl CallError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Algorithm(AlgorithmError::Cancelled))
    }
}

/// Positional parameters of an algorithm. The image is always the first
/// argument and is not listed in `params`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<String>,
    /// How many of `params` must be supplied; the rest are optional.
    pub required: usize,
}

impl Signature {
    pub fn new(name: &str, params: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            required: params.len(),
        }
    }

    pub fn with_required(mut self, required: usize) -> Self {
        self.required = required.min(self.params.len());
        self
    }

    /// Check that `given` arguments (not counting the image) fit this
    /// signature. Counts in the message include the image.
    pub fn check_arity(&self, given: usize) -> Result<(), String> {
        if given < self.required {
            let missing: Vec<String> = self.params[given..self.required]
                .iter()
                .map(|p| format!("'{p}'"))
                .collect();
            let plural = if missing.len() == 1 { "" } else { "s" };
            return Err(format!(
                "{}() missing {} required positional argument{plural}: {}",
                self.name,
                missing.len(),
                join_names(&missing)
            ));
        }

        if given > self.params.len() {
            let max = self.params.len() + 1;
            let min = self.required + 1;
            let takes = if min == max {
                format!("{max} positional argument{}", if max == 1 { "" } else { "s" })
            } else {
                format!("from {min} to {max} positional arguments")
            };
            return Err(format!(
                "{}() takes {takes} but {} were given",
                self.name,
                given + 1
            ));
        }

        Ok(())
    }
}

/// `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`.
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// An image algorithm: `f(image, *args) -> value`.
pub trait Algorithm: Send + Sync {
    fn signature(&self) -> &Signature;

    fn call(&self, image: &NdArray, args: &[Value], ctx: &CallContext)
        -> Result<Value, AlgorithmError>;
}

type AlgorithmFn = dyn Fn(&NdArray, &[Value], &CallContext) -> Result<Value, AlgorithmError>
    + Send
    + Sync;

/// [`Algorithm`] backed by a closure.
pub struct FnAlgorithm {
    signature: Signature,
    func: Box<AlgorithmFn>,
}

impl FnAlgorithm {
    pub fn new<F>(signature: Signature, func: F) -> Self
    where
        F: Fn(&NdArray, &[Value], &CallContext) -> Result<Value, AlgorithmError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            signature,
            func: Box::new(func),
        }
    }
}

impl Algorithm for FnAlgorithm {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(
        &self,
        image: &NdArray,
        args: &[Value],
        ctx: &CallContext,
    ) -> Result<Value, AlgorithmError> {
        (self.func)(image, args, ctx)
    }
}

impl fmt::Debug for FnAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAlgorithm")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Shorthand for a shared closure algorithm whose parameters are all required.
pub fn algorithm<F>(name: &str, params: &[&str], func: F) -> Arc<dyn Algorithm>
where
    F: Fn(&NdArray, &[Value], &CallContext) -> Result<Value, AlgorithmError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnAlgorithm::new(Signature::new(name, params), func))
}

/// Resolves `(module, method)` pairs from a config to algorithms.
pub trait AlgorithmProvider {
    fn resolve(&self, module: &str, method: &str) -> Result<Arc<dyn Algorithm>, ResolveError>;
}

/// Call `algorithm` after checking arity. Panics inside the algorithm are
/// caught and reported as [`CallError::Panicked`].
pub fn call_algorithm(
    algorithm: &dyn Algorithm,
    image: &NdArray,
    args: &[Value],
    ctx: &CallContext,
) -> Result<Value, CallError> {
    algorithm
        .signature()
        .check_arity(args.len())
        .map_err(CallError::Arity)?;

    match catch_unwind(AssertUnwindSafe(|| algorithm.call(image, args, ctx))) {
        Ok(result) => Ok(result?),
        Err(payload) => Err(CallError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Render an error and its source chain, one cause per line.
pub fn render_trace(error: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("Caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_arguments_are_listed() {
        let sig = Signature::new("f", &["a", "b", "c"]);
        assert_eq!(
            sig.check_arity(0).unwrap_err(),
            "f() missing 3 required positional arguments: 'a', 'b', and 'c'"
        );
        assert_eq!(
            sig.check_arity(1).unwrap_err(),
            "f() missing 2 required positional arguments: 'b' and 'c'"
        );
        assert_eq!(
            sig.check_arity(2).unwrap_err(),
            "f() missing 1 required positional argument: 'c'"
        );
        assert!(sig.check_arity(3).is_ok());
    }

    #[test]
    fn extra_arguments_count_the_image() {
        let sig = Signature::new("f", &["k"]);
        assert_eq!(
            sig.check_arity(3).unwrap_err(),
            "f() takes 2 positional arguments but 4 were given"
        );

        let unary = Signature::new("g", &[]);
        assert_eq!(
            unary.check_arity(1).unwrap_err(),
            "g() takes 1 positional argument but 2 were given"
        );

        let optional = Signature::new("h", &["a", "b"]).with_required(1);
        assert!(optional.check_arity(1).is_ok());
        assert_eq!(
            optional.check_arity(3).unwrap_err(),
            "h() takes from 2 to 3 positional arguments but 4 were given"
        );
    }

    #[test]
    fn panics_are_captured() {
        let alg = algorithm("boom", &[], |_, _, _| panic!("kaboom"));
        let err = call_algorithm(alg.as_ref(), &NdArray::probe(), &[], &CallContext::default())
            .unwrap_err();
        assert!(matches!(err, CallError::Panicked(ref m) if m == "kaboom"), "got: {err:?}");
    }

    #[test]
    fn trace_includes_sources() {
        let io = std::io::Error::other("disk on fire");
        let err = CallError::from(AlgorithmError::failed("could not read kernel", io));
        assert_eq!(render_trace(&err), "could not read kernel\nCaused by: disk on fire");
    }
}
