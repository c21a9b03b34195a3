use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::parser::ConfigError;

/// The store from which environment variable fallbacks are read.
///
/// [`ProcessEnvironment`] reads the process environment.
/// Any `HashMap<String, String>` may also serve as a store, which is convenient for tests.
pub trait EnvironmentStore {
    /// Get the value of the variable `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process (via [`std::env::var`]).
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentStore for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        // Variables that are not valid unicode are treated as unset.
        std::env::var(name).ok()
    }
}

impl<S: BuildHasher> EnvironmentStore for HashMap<String, String, S> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// An environment variable, resolved against an [`EnvironmentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    name: String,
    value: Option<String>,
}

impl EnvVar {
    pub(crate) fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Resolve the variable for the destination `dest` under `prefix` (ex: `APP` & `max_count` is `APP_MAX_COUNT`).
    pub fn resolve(
        prefix: &str,
        dest: &str,
        store: &(impl EnvironmentStore + ?Sized),
    ) -> Self {
        let name = format!("{prefix}_{base}", base = dest.to_uppercase());
        let value = store.var(&name);
        Self { name, value }
    }

    /// The name of the variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of the variable, if set.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

pub(crate) fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() || prefix.contains('=') || prefix.contains('\0') {
        Err(ConfigError::InvalidPrefix(prefix.to_string()))
    } else {
        Ok(())
    }
}
