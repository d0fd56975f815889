use super::{PlaceholderTracker, Resolver};
use crate::error::RewriteError;

/// Tracker used when response rewriting is disabled.
///
/// Values are resolved as soon as they are requested, so builders always embed final markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracker;

impl PlaceholderTracker for NullTracker {
  fn create_token(&self, resolver: Resolver) -> Result<String, RewriteError> {
    resolver.resolve().map_err(|source| RewriteError::Resolve {
      token: "<inline>".to_string(),
      source,
    })
  }

  fn replace_placeholders(&self, text: &str) -> Result<String, RewriteError> {
    Ok(text.to_string())
  }

  fn is_deferring(&self) -> bool {
    false
  }
}
