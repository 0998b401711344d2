//! Explicit dialect registry.
//!
//! Applications build one registry at startup and hand it to the execution
//! context; nothing registers itself behind the application's back.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Dialect, GenericDialect, PostgresDialect};
use crate::error::{Error, Result};

/// A name-to-dialect lookup table.
#[derive(Clone, Default)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `generic` and `postgres` dialects.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("generic", GenericDialect::new());
        registry.register("postgres", PostgresDialect::new());
        registry
    }

    /// Registers a dialect under `name`.
    ///
    /// # Panics
    ///
    /// Panics if a dialect is already registered under `name`.
    pub fn register<D>(&mut self, name: impl Into<String>, dialect: D)
    where
        D: Dialect + 'static,
    {
        let name = name.into();
        assert!(
            !self.dialects.contains_key(&name),
            "sqlpatch: register called twice for dialect {name}"
        );
        self.dialects.insert(name, Arc::new(dialect));
    }

    /// Looks up the dialect registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.dialects
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownDialect(name.to_string()))
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.dialects.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = DialectRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["generic", "postgres"]);
        assert_eq!(registry.get("postgres").unwrap().name(), "postgres");
    }

    #[test]
    fn test_unknown_dialect() {
        let registry = DialectRegistry::new();
        let err = registry.get("mysql").err().unwrap();
        assert!(matches!(err, Error::UnknownDialect(name) if name == "mysql"));
    }

    #[test]
    #[should_panic(expected = "register called twice")]
    fn test_duplicate_registration_panics() {
        let mut registry = DialectRegistry::with_defaults();
        registry.register("generic", GenericDialect::new());
    }
}
