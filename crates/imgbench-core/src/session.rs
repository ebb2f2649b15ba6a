use thiserror::Error;
use tracing::{debug, info};

use crate::array::NdArray;
use crate::contract::{check_array, ImageContractError};
use crate::invoke::{coerce_parameter, InvocationError};
use crate::loader::ValidatedAlgorithm;
use crate::params::ParameterDeclaration;
use crate::worker::{spawn_invocation, InvocationHandle};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No valid algorithms found in config file.")]
    NoAlgorithms,

    #[error("Unknown algorithm '{0}'.")]
    UnknownAlgorithm(String),

    #[error("No algorithm selected.")]
    NoAlgorithmSelected,

    #[error("No image selected.")]
    NoImage,

    #[error("Algorithm '{0}' is still running.")]
    Busy(String),

    #[error("Nothing is running.")]
    NotRunning,

    #[error("{0}")]
    Image(#[from] ImageContractError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("Could not start processing thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// State of one interactive workbench: the loaded algorithms, the current
/// selection and its parameter texts, the input and output images, and the
/// invocation in flight.
pub struct Session {
    algorithms: Vec<ValidatedAlgorithm>,
    selected: Option<usize>,
    parameters: Vec<Option<String>>,
    input: Option<NdArray>,
    output: Option<NdArray>,
    running: Option<InvocationHandle>,
}

impl Session {
    pub fn new(algorithms: Vec<ValidatedAlgorithm>) -> Result<Self, SessionError> {
        if algorithms.is_empty() {
            return Err(SessionError::NoAlgorithms);
        }
        Ok(Self {
            algorithms,
            selected: None,
            parameters: Vec::new(),
            input: None,
            output: None,
            running: None,
        })
    }

    pub fn algorithms(&self) -> &[ValidatedAlgorithm] {
        &self.algorithms
    }

    pub fn selected(&self) -> Option<&ValidatedAlgorithm> {
        self.selected.map(|i| &self.algorithms[i])
    }

    /// Select an algorithm by name and reset its parameter texts to their
    /// defaults.
    pub fn select(&mut self, name: &str) -> Result<&ValidatedAlgorithm, SessionError> {
        let index = self
            .algorithms
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| SessionError::UnknownAlgorithm(name.to_string()))?;
        self.selected = Some(index);
        self.parameters = initial_texts(&self.algorithms[index].params);
        debug!(algorithm = name, "Algorithm selected");
        Ok(&self.algorithms[index])
    }

    pub fn parameter_texts(&self) -> &[Option<String>] {
        &self.parameters
    }

    /// Replace the parameter texts of the selected algorithm. Every text must
    /// evaluate to a value of its declared type, otherwise nothing changes.
    pub fn set_parameters(&mut self, texts: Vec<String>) -> Result<(), SessionError> {
        let algorithm = self.selected().ok_or(SessionError::NoAlgorithmSelected)?;
        if texts.len() != algorithm.params.len() {
            return Err(InvocationError::ParameterCount {
                algorithm: algorithm.name.clone(),
                expected: algorithm.params.len(),
                given: texts.len(),
            }
            .into());
        }
        for (i, (param, text)) in algorithm.params.iter().zip(&texts).enumerate() {
            coerce_parameter(i, param, Some(text.as_str()))?;
        }
        self.parameters = texts.into_iter().map(Some).collect();
        Ok(())
    }

    /// Replace a single parameter text (zero-based `index`) after checking it.
    pub fn set_parameter(&mut self, index: usize, text: String) -> Result<(), SessionError> {
        let algorithm = self.selected().ok_or(SessionError::NoAlgorithmSelected)?;
        let param = algorithm.params.get(index).ok_or_else(|| {
            InvocationError::ParameterCount {
                algorithm: algorithm.name.clone(),
                expected: algorithm.params.len(),
                given: index + 1,
            }
        })?;
        coerce_parameter(index, param, Some(text.as_str()))?;
        self.parameters[index] = Some(text);
        Ok(())
    }

    pub fn set_input(&mut self, image: NdArray) -> Result<(), SessionError> {
        check_array(&image)?;
        info!(shape = %image.shape_string(), dtype = %image.dtype(), "Input image set");
        self.input = Some(image);
        self.output = None;
        Ok(())
    }

    pub fn input(&self) -> Option<&NdArray> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&NdArray> {
        self.output.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start the selected algorithm on the input image in the background.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if let Some(handle) = &self.running {
            return Err(SessionError::Busy(handle.algorithm_name().to_string()));
        }
        let image = self.input.clone().ok_or(SessionError::NoImage)?;
        let algorithm = self
            .selected()
            .cloned()
            .ok_or(SessionError::NoAlgorithmSelected)?;

        self.output = None;
        self.running = Some(spawn_invocation(algorithm, image, self.parameters.clone())?);
        Ok(())
    }

    /// Collect the outcome of the running invocation, if it has finished.
    pub fn poll(&mut self) -> Option<Result<&NdArray, SessionError>> {
        let result = self.running.as_mut()?.try_result()?;
        self.running = None;
        Some(self.store(result))
    }

    /// Block until the running invocation finishes.
    pub fn wait(&mut self) -> Result<&NdArray, SessionError> {
        let handle = self.running.take().ok_or(SessionError::NotRunning)?;
        let result = handle.wait();
        self.store(result)
    }

    /// Cancel any running invocation and drop images and parameter texts.
    pub fn clear(&mut self) {
        if let Some(handle) = self.running.take() {
            handle.cancel();
        }
        self.input = None;
        self.output = None;
        self.parameters = self
            .selected()
            .map(|a| initial_texts(&a.params))
            .unwrap_or_default();
    }

    fn store(&mut self, result: Result<NdArray, InvocationError>) -> Result<&NdArray, SessionError> {
        let image = result?;
        Ok(self.output.insert(image))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = &self.running {
            handle.cancel();
        }
    }
}

/// Parameter texts an algorithm starts with: its defaults, `None` where a
/// parameter has none.
pub fn initial_texts(params: &[ParameterDeclaration]) -> Vec<Option<String>> {
    params
        .iter()
        .map(|p| p.default.as_ref().map(|_| p.initial_text()))
        .collect()
}
