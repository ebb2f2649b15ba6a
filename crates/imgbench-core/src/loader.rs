use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::array::NdArray;
use crate::config::{parse_config_file, parse_config_str, AlgorithmDeclaration, ParseOutcome};
use crate::contract::check_image;
use crate::expr::evaluate;
use crate::params::ParameterDeclaration;
use crate::provider::{
    call_algorithm, render_trace, Algorithm, AlgorithmProvider, CallContext,
};
use crate::report::{ErrorKind, ErrorRecord, ErrorReport};
use crate::value::Value;

/// An algorithm that passed its self-test, bound to its implementation.
#[derive(Clone)]
pub struct ValidatedAlgorithm {
    pub name: String,
    pub module: String,
    pub method_name: String,
    pub method: Arc<dyn Algorithm>,
    pub params: Vec<ParameterDeclaration>,
}

impl fmt::Debug for ValidatedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedAlgorithm")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("method_name", &self.method_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationOutcome {
    pub algorithms: Vec<ValidatedAlgorithm>,
    pub errors: Vec<ErrorRecord>,
}

impl ValidationOutcome {
    pub fn kind(&self) -> ErrorKind {
        if self.errors.is_empty() {
            ErrorKind::None
        } else {
            ErrorKind::Validation
        }
    }
}

/// Result of a full load: parse, then validate.
#[derive(Clone, Debug, Default)]
pub struct LoadOutcome {
    /// Declarations that parsed cleanly.
    pub declarations: Vec<AlgorithmDeclaration>,
    /// Algorithms ready to call. Empty when parsing failed, unless the load
    /// was lenient.
    pub algorithms: Vec<ValidatedAlgorithm>,
    pub report: ErrorReport,
}

/// Self-tests declarations against a provider.
pub struct Validator<'a> {
    provider: &'a dyn AlgorithmProvider,
    probe: NdArray,
}

impl<'a> Validator<'a> {
    pub fn new(provider: &'a dyn AlgorithmProvider) -> Self {
        Self {
            provider,
            probe: NdArray::probe(),
        }
    }

    /// Replace the self-test image.
    pub fn with_probe(mut self, probe: NdArray) -> Self {
        self.probe = probe;
        self
    }

    pub fn validate_all(&self, declarations: &[AlgorithmDeclaration]) -> ValidationOutcome {
        info!(count = declarations.len(), "Validating algorithms");
        let mut outcome = ValidationOutcome::default();
        for declaration in declarations {
            match self.validate(declaration) {
                Ok(algorithm) => outcome.algorithms.push(algorithm),
                Err(record) => outcome.errors.push(record),
            }
        }
        info!(
            valid = outcome.algorithms.len(),
            rejected = outcome.errors.len(),
            "Validation complete"
        );
        outcome
    }

    /// Check defaults, then self-test. Default errors suppress the self-test.
    pub fn validate(
        &self,
        declaration: &AlgorithmDeclaration,
    ) -> Result<ValidatedAlgorithm, ErrorRecord> {
        let mut errors = check_defaults(&declaration.params);
        let mut method = None;
        if errors.is_empty() {
            match self.self_test(declaration) {
                Ok(m) => method = Some(m),
                Err(e) => errors.push(e),
            }
        }

        match method {
            Some(method) if errors.is_empty() => {
                debug!(name = %declaration.name, "Algorithm validated");
                Ok(ValidatedAlgorithm {
                    name: declaration.name.clone(),
                    module: declaration.module.clone(),
                    method_name: declaration.method.clone(),
                    method,
                    params: declaration.params.clone(),
                })
            }
            _ => {
                warn!(name = %declaration.name, errors = ?errors, "Algorithm rejected");
                Err(ErrorRecord::new(declaration.name.clone(), errors))
            }
        }
    }

    /// Resolve the algorithm and run it once on the probe image with its
    /// default (or fallback) arguments. The output must be an image.
    pub fn self_test(&self, declaration: &AlgorithmDeclaration) -> Result<Arc<dyn Algorithm>, String> {
        let args = self_test_args(&declaration.params)?;

        let method = self
            .provider
            .resolve(&declaration.module, &declaration.method)
            .map_err(|e| with_period(e.to_string()))?;

        let result = call_algorithm(method.as_ref(), &self.probe, &args, &CallContext::default())
            .map_err(|e| {
                with_period(format!(
                    "Error while testing algorithm execution with default values:\n{}",
                    render_trace(&e)
                ))
            })?;

        check_image(&result).map_err(|e| e.to_string())?;
        Ok(method)
    }
}

/// Evaluate every declared default and check its runtime type.
pub fn check_defaults(params: &[ParameterDeclaration]) -> Vec<String> {
    params
        .iter()
        .enumerate()
        .filter_map(|(i, param)| {
            let text = param.default.as_deref()?;
            match evaluate(text) {
                Err(e) => Some(format!(
                    "{} - Default value error ('{text}'): {e}.",
                    param.label(i)
                )),
                Ok(value) if !param.param_type.matches(&value) => Some(format!(
                    "{} - Default value type error: expected '{}', got '{}'.",
                    param.label(i),
                    param.param_type.native_name(),
                    value.type_name()
                )),
                Ok(_) => None,
            }
        })
        .collect()
}

fn self_test_args(params: &[ParameterDeclaration]) -> Result<Vec<Value>, String> {
    params
        .iter()
        .enumerate()
        .map(|(i, param)| match param.default.as_deref() {
            Some(text) => evaluate(text).map_err(|e| {
                format!("{} - Default value error ('{text}'): {e}.", param.label(i))
            }),
            None => Ok(param.param_type.fallback_default()),
        })
        .collect()
}

fn with_period(message: String) -> String {
    let trimmed = message.trim_end();
    if trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse and validate the config at `path`. Any parse error skips validation.
pub fn load_algorithms(path: &Path, provider: &dyn AlgorithmProvider) -> LoadOutcome {
    finish_load(parse_config_file(path), provider, false)
}

pub fn load_algorithms_str(text: &str, provider: &dyn AlgorithmProvider) -> LoadOutcome {
    finish_load(parse_config_str(text), provider, false)
}

/// Like [`load_algorithms`], but validates the clean declarations even when
/// other entries failed to parse. The report stays `Parsing` in that case and
/// lists validation records after the parse records.
pub fn load_algorithms_lenient(path: &Path, provider: &dyn AlgorithmProvider) -> LoadOutcome {
    finish_load(parse_config_file(path), provider, true)
}

pub fn load_algorithms_str_lenient(text: &str, provider: &dyn AlgorithmProvider) -> LoadOutcome {
    finish_load(parse_config_str(text), provider, true)
}

fn finish_load(parsed: ParseOutcome, provider: &dyn AlgorithmProvider, lenient: bool) -> LoadOutcome {
    let parse_kind = parsed.kind();
    let ParseOutcome {
        declarations,
        errors: parse_errors,
    } = parsed;

    if parse_kind == ErrorKind::Parsing && !lenient {
        warn!(errors = parse_errors.len(), "Config has parse errors, skipping validation");
        return LoadOutcome {
            declarations,
            algorithms: Vec::new(),
            report: ErrorReport::new(ErrorKind::Parsing, parse_errors),
        };
    }

    let validated = Validator::new(provider).validate_all(&declarations);
    let kind = match parse_kind {
        ErrorKind::Parsing => ErrorKind::Parsing,
        _ => validated.kind(),
    };
    let mut records = parse_errors;
    records.extend(validated.errors);

    LoadOutcome {
        declarations,
        algorithms: validated.algorithms,
        report: ErrorReport::new(kind, records),
    }
}
