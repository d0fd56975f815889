//! Reference builders collect the bundles a page needs and emit the markup that loads them.
//!
//! Markup is produced through the request's [`PlaceholderTracker`], so a builder rendered in
//! the page head still includes bundles that are referenced further down the page.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::asset_paths::{UrlGenerator, normalise_module_path};
use crate::error::RewriteError;
use crate::models::BuilderKind;
use crate::tracker::{PlaceholderTracker, ResolveError, Resolver};

/// Emits references to bundles of a single [`BuilderKind`].
pub trait ReferenceBuilder: Send + Sync + fmt::Debug {
  /// Kind of bundle this builder handles.
  fn kind(&self) -> BuilderKind;

  /// Record that the current page needs the bundle at `path`.
  fn reference(&self, path: &str);

  /// Bundles referenced so far, in first-reference order.
  fn references(&self) -> Vec<String>;

  /// Markup loading every bundle referenced by the time the response is rewritten.
  fn render(&self, tracker: &dyn PlaceholderTracker) -> Result<String, RewriteError>;

  /// URL of the bundle at `path`, resolved when the response is rewritten.
  fn url(&self, path: &str, tracker: &dyn PlaceholderTracker) -> Result<String, RewriteError>;
}

/// Produces the builder for a kind on its first use within a request.
pub trait AssetResolver: Send + Sync {
  /// Create a new, empty builder for `kind`.
  fn create_builder(&self, kind: BuilderKind) -> Arc<dyn ReferenceBuilder>;
}

/// Asset resolver handing out [`BundleReferenceBuilder`]s backed by one URL generator.
#[derive(Clone)]
pub struct BundleAssets {
  urls: Arc<dyn UrlGenerator>,
}

impl BundleAssets {
  /// Create a resolver using `urls` for every builder it creates.
  pub fn new(urls: Arc<dyn UrlGenerator>) -> Self {
    Self { urls }
  }
}

impl AssetResolver for BundleAssets {
  fn create_builder(&self, kind: BuilderKind) -> Arc<dyn ReferenceBuilder> {
    Arc::new(BundleReferenceBuilder::new(kind, Arc::clone(&self.urls)))
  }
}

/// Builder that records bundle paths and renders `<script>`/`<link>` tags for them.
pub struct BundleReferenceBuilder {
  kind: BuilderKind,
  urls: Arc<dyn UrlGenerator>,
  references: Arc<Mutex<Vec<String>>>,
}

impl BundleReferenceBuilder {
  /// Create an empty builder for `kind`.
  pub fn new(kind: BuilderKind, urls: Arc<dyn UrlGenerator>) -> Self {
    Self {
      kind,
      urls,
      references: Arc::new(Mutex::new(Vec::new())),
    }
  }
}

impl fmt::Debug for BundleReferenceBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BundleReferenceBuilder")
      .field("kind", &self.kind)
      .field("references", &*self.references.lock())
      .finish_non_exhaustive()
  }
}

impl ReferenceBuilder for BundleReferenceBuilder {
  fn kind(&self) -> BuilderKind {
    self.kind
  }

  fn reference(&self, path: &str) {
    let path = normalise_module_path(path);
    let mut references = self.references.lock();
    if !references.contains(&path) {
      references.push(path);
    }
  }

  fn references(&self) -> Vec<String> {
    self.references.lock().clone()
  }

  fn render(&self, tracker: &dyn PlaceholderTracker) -> Result<String, RewriteError> {
    let kind = self.kind;
    let urls = Arc::clone(&self.urls);
    let references = Arc::clone(&self.references);
    tracker.create_token(Resolver::deferred(move || {
      let paths = references.lock().clone();
      render_tags(kind, &paths, urls.as_ref())
    }))
  }

  fn url(&self, path: &str, tracker: &dyn PlaceholderTracker) -> Result<String, RewriteError> {
    let kind = self.kind;
    let urls = Arc::clone(&self.urls);
    let path = normalise_module_path(path);
    tracker.create_token(Resolver::deferred(move || urls.bundle_url(kind, &path)))
  }
}

fn render_tags(
  kind: BuilderKind,
  paths: &[String],
  urls: &dyn UrlGenerator,
) -> Result<String, ResolveError> {
  let mut tags = Vec::with_capacity(paths.len());
  for path in paths {
    let url = urls.bundle_url(kind, path)?;
    tags.push(match kind {
      BuilderKind::Stylesheet => {
        format!(r#"<link href="{url}" type="text/css" rel="stylesheet"/>"#)
      }
      BuilderKind::Script | BuilderKind::HtmlTemplate => {
        format!(r#"<script src="{url}" type="text/javascript"></script>"#)
      }
    });
  }
  Ok(tags.join("\n"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tracker::{NullTracker, TokenTracker};

  #[derive(Debug)]
  struct PrefixUrls;

  impl UrlGenerator for PrefixUrls {
    fn bundle_url(&self, kind: BuilderKind, path: &str) -> Result<String, ResolveError> {
      if path.contains("missing") {
        return Err(ResolveError::MissingBundle {
          kind,
          path: path.to_string(),
        });
      }
      Ok(format!("/_assets/{}/{path}", kind.url_segment()))
    }
  }

  fn builder(kind: BuilderKind) -> Arc<dyn ReferenceBuilder> {
    BundleAssets::new(Arc::new(PrefixUrls)).create_builder(kind)
  }

  #[test]
  fn render_includes_references_added_after_the_placeholder() {
    let tracker = TokenTracker::new();
    let scripts = builder(BuilderKind::Script);

    scripts.reference("~/scripts/app");
    let head = scripts.render(&tracker).unwrap();
    scripts.reference("~/scripts/late");
    scripts.reference("~/scripts/app");

    let output = tracker.replace_placeholders(&head).unwrap();
    assert_eq!(
      output,
      "<script src=\"/_assets/scripts/scripts/app\" type=\"text/javascript\"></script>\n\
<script src=\"/_assets/scripts/scripts/late\" type=\"text/javascript\"></script>"
    );
  }

  #[test]
  fn stylesheets_render_link_tags() {
    let tracker = NullTracker;
    let styles = builder(BuilderKind::Stylesheet);
    styles.reference("styles/site");

    let markup = styles.render(&tracker).unwrap();
    assert_eq!(
      markup,
      r#"<link href="/_assets/stylesheets/styles/site" type="text/css" rel="stylesheet"/>"#
    );
  }

  #[test]
  fn url_defers_until_rewrite() {
    let tracker = TokenTracker::new();
    let scripts = builder(BuilderKind::Script);
    let token = scripts.url("~/scripts/app", &tracker).unwrap();

    assert_ne!(token, "/_assets/scripts/scripts/app");
    assert_eq!(
      tracker.replace_placeholders(&token).unwrap(),
      "/_assets/scripts/scripts/app"
    );
  }

  #[test]
  fn missing_bundles_fail_the_rewrite() {
    let tracker = TokenTracker::new();
    let scripts = builder(BuilderKind::Script);
    let head = scripts.render(&tracker).unwrap();
    scripts.reference("~/scripts/missing");

    let err = tracker.replace_placeholders(&head).unwrap_err();
    assert!(matches!(err, RewriteError::Resolve {
      source: ResolveError::MissingBundle { .. },
      ..
    }));
  }

  #[test]
  fn records_each_reference_once() {
    let scripts = builder(BuilderKind::Script);
    scripts.reference("~/scripts/app");
    scripts.reference("scripts/app");
    scripts.reference("/scripts/vendor");
    assert_eq!(scripts.references(), vec![
      "scripts/app".to_string(),
      "scripts/vendor".to_string()
    ]);
  }
}
