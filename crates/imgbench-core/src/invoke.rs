use thiserror::Error;
use tracing::{debug, info};

use crate::array::NdArray;
use crate::contract::{check_array, ImageContractError};
use crate::expr::{evaluate, EvalError};
use crate::loader::ValidatedAlgorithm;
use crate::params::ParameterDeclaration;
use crate::provider::{call_algorithm, render_trace, CallContext};
use crate::value::Value;

/// Why a runtime invocation produced no image. Messages are shown to the
/// user as-is.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Parameter #{index} ({name}) is null.")]
    NullParameter { index: usize, name: String },

    #[error("Parameter #{index} ({name}): {source}")]
    InvalidParameter {
        index: usize,
        name: String,
        #[source]
        source: EvalError,
    },

    #[error("Algorithm '{algorithm}' takes {expected} parameters but {given} values were supplied.")]
    ParameterCount {
        algorithm: String,
        expected: usize,
        given: usize,
    },

    #[error("Error while processing input image with algorithm '{algorithm}':\n{trace}")]
    Failed { algorithm: String, trace: String },

    #[error("Processing with algorithm '{0}' was cancelled.")]
    Cancelled(String),

    #[error("Processing with algorithm '{0}' stopped without a result.")]
    WorkerLost(String),

    #[error("{0}")]
    Contract(#[from] ImageContractError),
}

/// Evaluate the text of parameter `index` (zero-based) and apply its type's
/// constructor. `None` means the field was never set.
pub fn coerce_parameter(
    index: usize,
    param: &ParameterDeclaration,
    text: Option<&str>,
) -> Result<Value, InvocationError> {
    let text = text.ok_or_else(|| InvocationError::NullParameter {
        index: index + 1,
        name: param.name.clone(),
    })?;
    evaluate(text)
        .and_then(|value| param.param_type.coerce(&value))
        .map_err(|source| InvocationError::InvalidParameter {
            index: index + 1,
            name: param.name.clone(),
            source,
        })
}

pub fn coerce_parameters(
    algorithm: &ValidatedAlgorithm,
    texts: &[Option<String>],
) -> Result<Vec<Value>, InvocationError> {
    if texts.len() != algorithm.params.len() {
        return Err(InvocationError::ParameterCount {
            algorithm: algorithm.name.clone(),
            expected: algorithm.params.len(),
            given: texts.len(),
        });
    }
    algorithm
        .params
        .iter()
        .zip(texts)
        .enumerate()
        .map(|(i, (param, text))| coerce_parameter(i, param, text.as_deref()))
        .collect()
}

/// Run `algorithm` on `image` with parameters given as text. The output
/// must satisfy the image contract.
pub fn invoke(
    algorithm: &ValidatedAlgorithm,
    image: &NdArray,
    texts: &[Option<String>],
    ctx: &CallContext,
) -> Result<NdArray, InvocationError> {
    let args = coerce_parameters(algorithm, texts)?;
    invoke_with_values(algorithm, image, &args, ctx)
}

/// Like [`invoke`] with already coerced arguments.
pub fn invoke_with_values(
    algorithm: &ValidatedAlgorithm,
    image: &NdArray,
    args: &[Value],
    ctx: &CallContext,
) -> Result<NdArray, InvocationError> {
    info!(
        algorithm = %algorithm.name,
        shape = %image.shape_string(),
        dtype = %image.dtype(),
        "Invoking algorithm"
    );

    let result = match call_algorithm(algorithm.method.as_ref(), image, args, ctx) {
        Ok(value) => value,
        Err(e) if e.is_cancelled() => return Err(InvocationError::Cancelled(algorithm.name.clone())),
        Err(e) => {
            return Err(InvocationError::Failed {
                algorithm: algorithm.name.clone(),
                trace: render_trace(&e),
            })
        }
    };

    if ctx.is_cancelled() {
        debug!(algorithm = %algorithm.name, "Discarding result of cancelled invocation");
        return Err(InvocationError::Cancelled(algorithm.name.clone()));
    }

    match result {
        Value::Array(array) => {
            check_array(&array)?;
            Ok(array)
        }
        other => Err(ImageContractError::NotAnArray(other.type_name()).into()),
    }
}
