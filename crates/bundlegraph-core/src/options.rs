use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read build options: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse build options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Knobs for [`build_catalog_with`](crate::build_catalog_with).
///
/// ```toml
/// normalize = true
/// validate_heads = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Canonicalize bundle properties before returning the catalog.
    pub normalize: bool,
    /// Fail the build unless every non-empty channel has exactly one head.
    pub validate_heads: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            validate_heads: false,
        }
    }
}

impl BuildOptions {
    #[must_use]
    pub fn with_head_validation(mut self, enabled: bool) -> Self {
        self.validate_heads = enabled;
        self
    }

    #[must_use]
    pub fn with_normalization(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
