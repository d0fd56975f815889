//! Pipeline configuration loaded once at application start.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::asset_paths::module_base_directory;
use crate::models::ModuleRecord;

/// File looked up by [`PipelineConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "placeholder.config.json";

/// Startup failure caused by invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// Failed to parse a JSON configuration file.
  #[error("failed to parse {}: {source}", path.display())]
  Json {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },
  /// Failed to parse a YAML configuration file.
  #[error("failed to parse {}: {source}", path.display())]
  Yaml {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_yaml::Error,
  },
  /// The file extension is neither JSON nor YAML.
  #[error("unsupported configuration format for {}", path.display())]
  UnsupportedFormat {
    /// Path that caused the error.
    path: PathBuf,
  },
  /// A configured directory does not exist.
  #[error("configured directory {} does not exist", path.display())]
  MissingDirectory {
    /// Directory that could not be found.
    path: PathBuf,
  },
  /// Optimised output needs a version to build cache-busting URLs.
  #[error("a non-empty version is required when output is optimized")]
  EmptyVersion,
}

/// Settings consumed by [`crate::RewritePipeline`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
  /// Whether response bodies are rewritten. When disabled values are resolved eagerly.
  pub html_rewriting_enabled: bool,
  /// Whether bundle URLs point at optimised, versioned output.
  pub output_optimized: bool,
  /// Cache-busting version appended to optimised bundle URLs.
  pub version: String,
  /// Directory holding the module directories, relative to the configuration directory.
  pub asset_root: String,
  /// URL prefix for optimised bundles.
  pub url_prefix: String,
  /// Bundles the application may reference.
  pub modules: Vec<ModuleRecord>,
  /// Media types whose bodies are rewritten. Empty admits every type.
  pub rewrite_content_types: Vec<String>,
  /// Media types never rewritten, even when included above.
  pub skip_content_types: Vec<String>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      html_rewriting_enabled: true,
      output_optimized: true,
      version: "1".into(),
      asset_root: ".".into(),
      url_prefix: "/_assets".into(),
      modules: Vec::new(),
      rewrite_content_types: Vec::new(),
      skip_content_types: Vec::new(),
    }
  }
}

impl PipelineConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing file yields the defaults. A file that exists but cannot be read or parsed is an
  /// error, since silently ignoring it would hide a broken deployment.
  pub fn discover(config_dir: &Path) -> Result<Self, ConfigError> {
    let candidate = config_dir.join(DEFAULT_CONFIG_FILE);
    if !candidate.exists() {
      return Ok(Self::default());
    }
    Self::from_path(&candidate)
  }

  /// Read configuration from a JSON (`.json`) or YAML (`.yaml`, `.yml`) file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let extension = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_ascii_lowercase);
    match extension.as_deref() {
      Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
      }),
      Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
      }),
      _ => Err(ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
      }),
    }
  }

  /// Absolute location of the asset root.
  pub fn asset_root_path(&self, config_dir: &Path) -> PathBuf {
    config_dir.join(&self.asset_root)
  }

  /// Check that every directory the pipeline depends on exists.
  pub fn validate(&self, config_dir: &Path) -> Result<(), ConfigError> {
    if self.output_optimized && self.version.trim().is_empty() {
      return Err(ConfigError::EmptyVersion);
    }

    let asset_root = self.asset_root_path(config_dir);
    if !asset_root.is_dir() {
      return Err(ConfigError::MissingDirectory { path: asset_root });
    }

    for module in &self.modules {
      if let Some(directory) = module_base_directory(&module.path) {
        let path = asset_root.join(directory);
        if !path.is_dir() {
          return Err(ConfigError::MissingDirectory { path });
        }
      }
    }

    Ok(())
  }
}
