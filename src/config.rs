//! Scheme configuration store.
//!
//! A *scheme* pairs a container image with a command-argument template. The
//! store is loaded once from a YAML file and stays immutable for the life of
//! the process; the orchestrator receives it by reference and resolves
//! schemes per run.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default scheme file, relative to the process working directory.
pub const DEFAULT_SCHEME_FILE: &str = "service-config.yaml";

/// Placeholder substituted with the runtime target in argument templates.
const HOST_PLACEHOLDER: &str = "{host}";

/// Scheme configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    /// Requested scheme is not present in the loaded configuration
    #[error("unknown scheme: {0}")]
    UnknownScheme(String),

    /// Scheme file could not be read
    #[error("failed to read scheme config {path}: {source}")]
    Read {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Scheme file content is not a valid scheme mapping
    #[error("malformed scheme config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for scheme store operations.
pub type Result<T> = std::result::Result<T, SchemeError>;

/// A single named scheme: which image to run and with what arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct Scheme {
    /// Container image reference
    pub image: String,
    /// Argument template; every `{host}` occurrence is replaced by the target
    pub arguments: String,
}

/// Immutable mapping from scheme id to [`Scheme`].
///
/// Construct once (at startup) and share by reference; all accessors take
/// `&self`, so concurrent readers need no synchronization.
#[derive(Debug, Clone)]
pub struct SchemeStore {
    schemes: HashMap<String, Scheme>,
}

impl SchemeStore {
    /// Load the store from `path`, or from [`DEFAULT_SCHEME_FILE`] in the
    /// current working directory when no override is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as a
    /// two-level `scheme -> {image, arguments}` mapping.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(|| PathBuf::from(DEFAULT_SCHEME_FILE), Path::to_path_buf);
        debug!("loading scheme config from {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|source| SchemeError::Read {
            path: path.clone(),
            source,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse the store from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scheme mapping.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let schemes: HashMap<String, Scheme> = serde_yaml::from_str(content)?;
        Ok(Self { schemes })
    }

    /// Look up a scheme by id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeError::UnknownScheme`] if the id is not configured.
    pub fn resolve(&self, scheme_id: &str) -> Result<&Scheme> {
        self.schemes
            .get(scheme_id)
            .ok_or_else(|| SchemeError::UnknownScheme(scheme_id.to_string()))
    }

    /// Render the launch command for a scheme against a runtime target.
    ///
    /// Every `{host}` occurrence in the scheme's argument template is
    /// replaced with `target`, then the result is split on whitespace into
    /// launch tokens. No shell quoting is applied; whitespace inside `target`
    /// fragments into separate tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeError::UnknownScheme`] if the id is not configured.
    pub fn render_command(&self, scheme_id: &str, target: &str) -> Result<Vec<String>> {
        let scheme = self.resolve(scheme_id)?;
        let rendered = scheme.arguments.replace(HOST_PLACEHOLDER, target);
        Ok(rendered.split_whitespace().map(String::from).collect())
    }

    /// Iterate over configured scheme ids.
    pub fn scheme_ids(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    /// Number of configured schemes.
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    /// Whether the store holds no schemes.
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}
