//! Errors raised while a single request is tracked and rewritten.

use crate::scope::ScopeState;
use crate::tracker::ResolveError;

/// Failure of the per-request rewrite pipeline.
///
/// Every variant is local to the request that produced it; nothing here is shared between
/// requests.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
  /// A deferred value could not be produced when its placeholder was substituted.
  #[error("failed to resolve placeholder {token}: {source}")]
  Resolve {
    /// Token whose resolver failed.
    token: String,
    /// Underlying resolver failure.
    #[source]
    source: ResolveError,
  },
  /// Writing or producing the response body failed.
  #[error("response body I/O failed: {0}")]
  Io(#[from] std::io::Error),
  /// The buffered body was not valid for the declared charset.
  #[error("response body is not valid {charset}")]
  Decode {
    /// Charset label used for decoding.
    charset: &'static str,
  },
  /// The rewritten body contains characters the declared charset cannot represent.
  #[error("rewritten body contains {character:?}, which {charset} cannot encode")]
  Encode {
    /// Charset label used for encoding.
    charset: &'static str,
    /// First character that could not be encoded.
    character: char,
  },
  /// The response declared a charset the rewrite stage does not understand.
  #[error("unsupported response charset `{0}`")]
  UnsupportedCharset(String),
  /// A request scope was asked to skip or repeat a lifecycle state.
  #[error("invalid request state transition from {from:?} to {to:?}")]
  InvalidTransition {
    /// State the scope was in.
    from: ScopeState,
    /// State that was requested.
    to: ScopeState,
  },
}
