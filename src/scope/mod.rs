//! Per-request state: the placeholder tracker, the builder cache and the lifecycle state.

mod cache;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::RewriteError;
use crate::tracker::PlaceholderTracker;

pub use cache::BuilderCache;

/// Lifecycle of a single request.
///
/// States only ever advance to their immediate successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
  /// Scope created by the pre-request hook.
  Created,
  /// Handler is running and may issue placeholders.
  Tracking,
  /// Body has been materialised and placeholders are being substituted.
  Rewriting,
  /// Rewritten body has been written out.
  Completed,
}

impl ScopeState {
  /// The state that follows this one, if any.
  pub fn next(self) -> Option<Self> {
    match self {
      Self::Created => Some(Self::Tracking),
      Self::Tracking => Some(Self::Rewriting),
      Self::Rewriting => Some(Self::Completed),
      Self::Completed => None,
    }
  }
}

/// Isolation boundary for everything a request tracks.
///
/// A scope is never shared between requests and is dropped once the response is written.
#[derive(Debug)]
pub struct RequestScope {
  id: Uuid,
  path: String,
  tracker: Box<dyn PlaceholderTracker>,
  builders: BuilderCache,
  state: Mutex<ScopeState>,
}

impl RequestScope {
  /// Create a scope in the [`ScopeState::Created`] state.
  pub fn new(path: impl Into<String>, tracker: Box<dyn PlaceholderTracker>) -> Self {
    Self {
      id: Uuid::new_v4(),
      path: path.into(),
      tracker,
      builders: BuilderCache::default(),
      state: Mutex::new(ScopeState::Created),
    }
  }

  /// Unique identifier of this request.
  pub fn id(&self) -> Uuid {
    self.id
  }

  /// Request path the scope was created for.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Tracker owned by this request.
  pub fn tracker(&self) -> &dyn PlaceholderTracker {
    self.tracker.as_ref()
  }

  /// Builders created during this request.
  pub fn builders(&self) -> &BuilderCache {
    &self.builders
  }

  /// Current lifecycle state.
  pub fn state(&self) -> ScopeState {
    *self.state.lock()
  }

  /// Move to `next`, which must be the immediate successor of the current state.
  pub fn advance(&self, next: ScopeState) -> Result<(), RewriteError> {
    let mut state = self.state.lock();
    let current = *state;
    if current.next() != Some(next) {
      return Err(RewriteError::InvalidTransition {
        from: current,
        to: next,
      });
    }
    debug!(scope = %self.id, path = %self.path, from = ?current, to = ?next, "request state changed");
    *state = next;
    Ok(())
  }
}
