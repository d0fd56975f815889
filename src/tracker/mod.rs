//! Placeholder trackers hand out opaque tokens for values that are only known once the
//! response body has been fully produced, and later substitute those tokens in place.
//!
//! Two implementations exist:
//!
//! - [`TokenTracker`] records a [`Resolver`] per token and resolves them in
//!   [`PlaceholderTracker::replace_placeholders`].
//! - [`NullTracker`] is used when rewriting is disabled. It resolves values as soon as they are
//!   requested, so the markup it returns is already final and replacement is the identity.

mod null;
mod tokens;
mod tracking;

use std::fmt;

use crate::error::RewriteError;
use crate::models::BuilderKind;

pub use null::NullTracker;
pub use tokens::{PlaceholderToken, TokenFormat};
pub use tracking::TokenTracker;

/// Registry of deferred values for one request.
pub trait PlaceholderTracker: Send + Sync + fmt::Debug {
  /// Register `resolver` and return the markup that should be embedded in the page.
  ///
  /// Deferring trackers return a placeholder token and never evaluate the resolver here.
  fn create_token(&self, resolver: Resolver) -> Result<String, RewriteError>;

  /// Substitute every token issued by this tracker that occurs in `text`.
  fn replace_placeholders(&self, text: &str) -> Result<String, RewriteError>;

  /// Returns `true` when [`create_token`](Self::create_token) hands out real placeholders.
  fn is_deferring(&self) -> bool;
}

/// Reason a deferred value could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
  /// The referenced bundle is not part of the configured modules.
  #[error("no {kind} bundle is configured for `{path}`")]
  MissingBundle {
    /// Kind of bundle that was referenced.
    kind: BuilderKind,
    /// Path that was referenced.
    path: String,
  },
  /// Any other failure reported by a collaborator.
  #[error("{0}")]
  Failed(String),
}

type DeferredFn = dyn Fn() -> Result<String, ResolveError> + Send + Sync;

/// How the final value of a placeholder is obtained.
pub enum Resolver {
  /// Value already known when the placeholder was created.
  Literal(String),
  /// Value computed at substitution time.
  Deferred(Box<DeferredFn>),
}

impl Resolver {
  /// Wrap a closure that computes the value when the placeholder is substituted.
  pub fn deferred<F>(resolve: F) -> Self
  where
    F: Fn() -> Result<String, ResolveError> + Send + Sync + 'static,
  {
    Self::Deferred(Box::new(resolve))
  }

  /// Produce the value.
  pub fn resolve(&self) -> Result<String, ResolveError> {
    match self {
      Self::Literal(value) => Ok(value.clone()),
      Self::Deferred(resolve) => resolve(),
    }
  }
}

impl From<String> for Resolver {
  fn from(value: String) -> Self {
    Self::Literal(value)
  }
}

impl From<&str> for Resolver {
  fn from(value: &str) -> Self {
    Self::Literal(value.to_string())
  }
}

impl fmt::Debug for Resolver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
      Self::Deferred(_) => f.write_str("Deferred(..)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn literal_resolver_returns_value() {
    let resolver = Resolver::from("/assets/app.js");
    assert_eq!(resolver.resolve().unwrap(), "/assets/app.js");
  }

  #[test]
  fn deferred_resolver_runs_on_demand() {
    let resolver = Resolver::deferred(|| Err(ResolveError::Failed("bundle not built".into())));
    assert_eq!(
      resolver.resolve(),
      Err(ResolveError::Failed("bundle not built".into()))
    );
    assert_eq!(format!("{resolver:?}"), "Deferred(..)");
  }
}
