//! JSON configuration for building a [`TemplateSet`].
//!
//! ```json
//! {
//!   "base_dir": "templates",
//!   "shared_context_keys": ["csrf_token"],
//!   "component_dirs": [{ "dir": "components" }, { "dir": "icons", "prefix": "icon." }],
//!   "remove_patterns": ["<!--.*?-->"]
//! }
//! ```
//!
//! Relative `base_dir` values are resolved against the config file's directory.

use crate::preprocess::{RegexRemove, DEFAULT_TAG_PREFIX};
use crate::template::{FileSystemLoader, Options, TemplateSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid remove pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to scan component directory '{dir}': {source}")]
    ComponentDir {
        dir: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComponentDir {
    pub dir: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub base_dir: PathBuf,
    /// `null` disables the component tag preprocessor
    pub tag_prefix: Option<String>,
    pub default_extension: Option<String>,
    pub shared_context_keys: Vec<String>,
    pub max_component_depth: usize,
    pub component_dirs: Vec<ComponentDir>,
    pub remove_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let options = Options::default();
        Self {
            base_dir: PathBuf::from("."),
            tag_prefix: Some(DEFAULT_TAG_PREFIX.to_string()),
            default_extension: options.default_extension,
            shared_context_keys: options.shared_context_keys,
            max_component_depth: options.max_component_depth,
            component_dirs: Vec::new(),
            remove_patterns: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if config.base_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.base_dir = parent.join(&config.base_dir);
            }
        }
        Ok(config)
    }

    pub fn options(&self) -> Options {
        Options {
            tag_prefix: self.tag_prefix.clone(),
            default_extension: self.default_extension.clone(),
            shared_context_keys: self.shared_context_keys.clone(),
            max_component_depth: self.max_component_depth,
        }
    }

    /// Template set over `base_dir` with the configured preprocessors and
    /// component directories registered
    pub fn build(&self) -> Result<TemplateSet, ConfigError> {
        let mut set = TemplateSet::new(FileSystemLoader::new(&self.base_dir), self.options());

        if !self.remove_patterns.is_empty() {
            set.add_preprocessor(RegexRemove::new(&self.remove_patterns)?);
        }

        for component_dir in &self.component_dirs {
            set.register_components_directory(&component_dir.dir, &component_dir.prefix)
                .map_err(|source| ConfigError::ComponentDir {
                    dir: component_dir.dir.clone(),
                    source,
                })?;
        }

        Ok(set)
    }
}
