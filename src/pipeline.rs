//! Request lifecycle hooks tying trackers, builders and the rewrite stage together.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use same_file::is_same_file;
use tracing::{debug, info};

use crate::asset_paths::{VersionedUrlGenerator, module_base_directory};
use crate::builder::{AssetResolver, BundleAssets, ReferenceBuilder};
use crate::config::{ConfigError, PipelineConfig};
use crate::error::RewriteError;
use crate::models::{BuilderKind, PipelineSummary};
use crate::response::Response;
use crate::rewrite::{Charset, RewriteStage, StageMode};
use crate::scope::{RequestScope, ScopeState};
use crate::selection::ContentTypeSelection;
use crate::static_paths::StaticPathRegistry;
use crate::tracker::{NullTracker, PlaceholderTracker, TokenFormat, TokenTracker};

/// Application-wide pipeline, shared by every request.
pub struct RewritePipeline {
  config: PipelineConfig,
  asset_root: PathBuf,
  assets: Arc<dyn AssetResolver>,
  selection: ContentTypeSelection,
  token_format: TokenFormat,
}

impl RewritePipeline {
  /// Validate `config` and build a pipeline.
  ///
  /// Relative paths in the configuration are resolved against `config_dir`. Invalid
  /// configuration aborts startup instead of failing individual requests later.
  pub fn new(config: PipelineConfig, config_dir: &Path) -> Result<Self, ConfigError> {
    config.validate(config_dir)?;

    let urls = Arc::new(VersionedUrlGenerator::from_config(&config));
    let selection = ContentTypeSelection::new(
      config.rewrite_content_types.iter().cloned(),
      config.skip_content_types.iter().cloned(),
    );

    Ok(Self {
      asset_root: config.asset_root_path(config_dir),
      assets: Arc::new(BundleAssets::new(urls)),
      selection,
      token_format: TokenFormat::default(),
      config,
    })
  }

  /// Use `assets` to create reference builders.
  pub fn with_assets(mut self, assets: Arc<dyn AssetResolver>) -> Self {
    self.assets = assets;
    self
  }

  /// Issue placeholders in `format`.
  pub fn with_token_format(mut self, format: TokenFormat) -> Self {
    self.token_format = format;
    self
  }

  /// Configuration the pipeline was built from.
  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// Pre-request hook: create the request scope and start tracking.
  pub fn before_request(&self, path: &str) -> Result<Arc<RequestScope>, RewriteError> {
    let tracker: Box<dyn PlaceholderTracker> = if self.config.html_rewriting_enabled {
      Box::new(TokenTracker::with_format(self.token_format.clone()))
    } else {
      Box::new(NullTracker)
    };

    let scope = Arc::new(RequestScope::new(path, tracker));
    scope.advance(ScopeState::Tracking)?;
    debug!(scope = %scope.id(), path, deferring = self.config.html_rewriting_enabled, "request scope created");
    Ok(scope)
  }

  /// Builder for `kind` within `scope`, created on first use.
  pub fn reference_builder(
    &self,
    scope: &RequestScope,
    kind: BuilderKind,
  ) -> Arc<dyn ReferenceBuilder> {
    scope
      .builders()
      .get_or_create(kind, || self.assets.create_builder(kind))
  }

  /// Post-request hook: install the rewrite stage around the handler's body.
  ///
  /// Responses whose media type is not selected, and every response when rewriting is
  /// disabled, pass through unchanged.
  pub fn after_request(
    &self,
    scope: &Arc<RequestScope>,
    response: Response,
  ) -> Result<Response, RewriteError> {
    let mode = if scope.tracker().is_deferring() && self.selection.is_included(&response.content_type)
    {
      StageMode::Rewrite(Charset::from_content_type(&response.content_type)?)
    } else {
      StageMode::PassThrough
    };

    debug!(scope = %scope.id(), content_type = %response.content_type, ?mode, "installing rewrite stage");
    let stage = RewriteStage::new(Arc::clone(scope), mode);
    Ok(response.map_body(|body| stage.wrap(body)))
  }

  /// Run one request end to end and write its body into `sink`.
  ///
  /// Returns the response status. The request scope is dropped before returning.
  pub fn serve<H>(&self, path: &str, handler: H, sink: &mut dyn Write) -> Result<u16, RewriteError>
  where
    H: FnOnce(&Arc<RequestScope>) -> Result<Response, RewriteError>,
  {
    let scope = self.before_request(path)?;
    let response = handler(&scope)?;
    let response = self.after_request(&scope, response)?;
    let status = response.status;
    response.write_body(sink)?;
    Ok(status)
  }

  /// Base directories of every local module, de-duplicated by name and on-disk identity.
  pub fn static_directories(&self) -> Vec<String> {
    let mut seen_names = BTreeSet::new();
    let mut seen_paths: Vec<PathBuf> = Vec::new();
    let mut directories = Vec::new();

    for kind in BuilderKind::ALL {
      for module in self.config.modules.iter().filter(|module| module.kind == kind) {
        let Some(directory) = module_base_directory(&module.path) else {
          continue;
        };
        if !seen_names.insert(directory.clone()) {
          continue;
        }

        let path = self.asset_root.join(&directory);
        if seen_paths
          .iter()
          .any(|existing| is_same_file(existing, &path).unwrap_or(false))
        {
          debug!(directory = %directory, "static path aliases an existing directory");
          continue;
        }

        seen_paths.push(path);
        directories.push(directory);
      }
    }

    directories
  }

  /// Register the module base directories for static serving. Returns how many were added.
  pub fn install_static_paths(&self, registry: &mut StaticPathRegistry) -> usize {
    let mut added = 0;
    for directory in self.static_directories() {
      if registry.add_directory(directory.clone()) {
        info!(directory = %directory, "registered static path");
        added += 1;
      }
    }
    added
  }

  /// Serializable overview of the pipeline.
  pub fn summary(&self) -> PipelineSummary {
    PipelineSummary {
      html_rewriting_enabled: self.config.html_rewriting_enabled,
      output_optimized: self.config.output_optimized,
      version: self.config.version.clone(),
      modules: self.config.modules.clone(),
      static_paths: self.static_directories(),
    }
  }
}

impl fmt::Debug for RewritePipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RewritePipeline")
      .field("config", &self.config)
      .field("asset_root", &self.asset_root)
      .field("selection", &self.selection)
      .field("token_format", &self.token_format)
      .finish_non_exhaustive()
  }
}
