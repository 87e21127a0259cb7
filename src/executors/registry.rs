//! Executor registry
//!
//! Maps a step's `type` to a factory decoding the step into a runnable
//! executor.

use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Executor, ExecutorError};
use crate::models::TestStep;

/// Builds an executor instance from a step's parameters
pub type ExecutorFactory =
    Arc<dyn Fn(&TestStep) -> Result<Arc<dyn Executor>, ExecutorError> + Send + Sync>;

/// Decode a step into an executor's parameter struct
pub fn decode_step<T: DeserializeOwned>(executor: &str, step: &TestStep) -> Result<T, ExecutorError> {
    serde_yaml::from_value(Value::Mapping(step.as_mapping().clone())).map_err(|e| {
        ExecutorError::Decode {
            executor: executor.to_string(),
            message: e.to_string(),
        }
    })
}

#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    factories: BTreeMap<String, ExecutorFactory>,
}

impl ExecutorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `exec`, `http` and `readfile`
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_decoded::<super::ExecExecutor>(super::exec::NAME);
        registry.register_decoded::<super::HttpExecutor>(super::http::NAME);
        registry.register_decoded::<super::ReadFileExecutor>(super::readfile::NAME);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ExecutorFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Register an executor whose instance is the step decoded into `T`
    pub fn register_decoded<T>(&mut self, name: &str)
    where
        T: Executor + DeserializeOwned + 'static,
    {
        let executor = name.to_string();
        self.register(
            name,
            Arc::new(move |step: &TestStep| {
                let instance: T = decode_step(&executor, step)?;
                Ok(Arc::new(instance) as Arc<dyn Executor>)
            }),
        );
    }

    /// Register a shared instance handed to every step of that type
    #[cfg(test)]
    pub fn register_instance(&mut self, name: impl Into<String>, executor: Arc<dyn Executor>) {
        self.register(name, Arc::new(move |_: &TestStep| Ok(Arc::clone(&executor))));
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the executor a step declares
    pub fn instantiate(&self, step: &TestStep) -> Result<Arc<dyn Executor>, ExecutorError> {
        let type_name = step.type_name();
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ExecutorError::UnknownType(type_name.to_string()))?;
        factory(step)
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.names())
            .finish()
    }
}
