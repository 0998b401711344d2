//! Execution context configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlpatch_core::compiler::{BulkCompiler, DefaultCompiler, PatchCompiler};
use sqlpatch_core::include::DEFAULT_MAX_INCLUDE_DEPTH;

use crate::error::Result;

/// Tuning knobs of a [`DbContext`](crate::DbContext).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use sqlpatch_orm::ContextConfig;
///
/// let config = ContextConfig::from_json_str(r#"{ "bulk": true, "max_patches": 100 }"#).unwrap();
/// assert!(config.bulk);
/// assert_eq!(config.max_include_depth, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Depth limit of include traversals. `0` never traverses, a negative
    /// value is unbounded.
    pub max_include_depth: i32,
    /// Merge adjacent compatible patches when saving.
    pub bulk: bool,
    /// Upper bound of patches merged into one statement, `0` for no bound.
    /// Only used with `bulk`.
    pub max_patches: usize,
    /// Log every executed statement at INFO instead of DEBUG.
    pub debug: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            bulk: false,
            max_patches: 0,
            debug: false,
        }
    }
}

impl ContextConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`](crate::OrmError::Config) on malformed
    /// JSON or mistyped fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the compiler this configuration selects.
    #[must_use]
    pub fn compiler(&self) -> Arc<dyn PatchCompiler> {
        if self.bulk {
            Arc::new(BulkCompiler::new().max_patches(self.max_patches))
        } else {
            Arc::new(DefaultCompiler::new())
        }
    }
}
