use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Algorithm, AlgorithmProvider, ResolveError};

/// A named group of algorithms, keyed by their signature names.
#[derive(Clone, Default)]
pub struct Module {
    name: String,
    methods: BTreeMap<String, Arc<dyn Algorithm>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
        }
    }

    pub fn with(mut self, algorithm: Arc<dyn Algorithm>) -> Self {
        self.register(algorithm);
        self
    }

    pub fn register(&mut self, algorithm: Arc<dyn Algorithm>) {
        self.methods
            .insert(algorithm.signature().name.clone(), algorithm);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, method: &str) -> Option<&Arc<dyn Algorithm>> {
        self.methods.get(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &Arc<dyn Algorithm>)> {
        self.methods.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lookup table from module names to modules.
#[derive(Clone, Debug, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Module>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `module`, merging into an existing module of the same name.
    pub fn add_module(&mut self, module: Module) {
        match self.modules.get_mut(module.name()) {
            Some(existing) => existing.methods.extend(module.methods),
            None => {
                self.modules.insert(module.name.clone(), module);
            }
        }
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.add_module(module);
        self
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

impl AlgorithmProvider for ModuleRegistry {
    fn resolve(&self, module: &str, method: &str) -> Result<Arc<dyn Algorithm>, ResolveError> {
        let found = self
            .module(module)
            .ok_or_else(|| ResolveError::ModuleNotFound(module.to_string()))?;
        found
            .get(method)
            .cloned()
            .ok_or_else(|| ResolveError::MethodNotFound {
                module: module.to_string(),
                method: method.to_string(),
            })
    }
}
