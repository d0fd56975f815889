use std::collections::BTreeSet;
use std::fmt;

use super::directories::normalise_module_path;
use super::filters::is_url;
use crate::config::PipelineConfig;
use crate::models::{BuilderKind, ModuleRecord};
use crate::tracker::ResolveError;

/// Computes the final URL of a bundle.
pub trait UrlGenerator: Send + Sync + fmt::Debug {
    /// URL for the bundle of `kind` at the normalised module `path`.
    fn bundle_url(&self, kind: BuilderKind, path: &str) -> Result<String, ResolveError>;
}

/// URL generator for the bundles declared in a [`PipelineConfig`].
///
/// Optimised output is addressed as `{prefix}/{kind}/{path}_{version}` so every release gets a
/// fresh URL. Unoptimised output points at the raw module directory, which is served through the
/// registered static paths.
#[derive(Debug, Clone)]
pub struct VersionedUrlGenerator {
    url_prefix: String,
    version: String,
    output_optimized: bool,
    modules: BTreeSet<(BuilderKind, String)>,
}

impl VersionedUrlGenerator {
    /// Create a generator for the given bundle declarations.
    pub fn new<I>(url_prefix: &str, version: &str, output_optimized: bool, modules: I) -> Self
    where
        I: IntoIterator<Item = ModuleRecord>,
    {
        Self {
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            version: version.trim().to_string(),
            output_optimized,
            modules: modules
                .into_iter()
                .map(|module| (module.kind, normalise_module_path(&module.path)))
                .collect(),
        }
    }

    /// Create a generator from configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            &config.url_prefix,
            &config.version,
            config.output_optimized,
            config.modules.iter().cloned(),
        )
    }
}

impl UrlGenerator for VersionedUrlGenerator {
    fn bundle_url(&self, kind: BuilderKind, path: &str) -> Result<String, ResolveError> {
        let path = normalise_module_path(path);
        if !self.modules.contains(&(kind, path.clone())) {
            return Err(ResolveError::MissingBundle { kind, path });
        }

        if is_url(&path) {
            return Ok(path);
        }

        let url = if self.output_optimized {
            format!(
                "{}/{}/{}_{}",
                self.url_prefix,
                kind.url_segment(),
                path,
                self.version
            )
        } else {
            format!("/{path}")
        };
        Ok(url)
    }
}
