use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::tokens::{PlaceholderToken, TokenFormat, token_pattern};
use super::{PlaceholderTracker, Resolver};
use crate::error::RewriteError;

/// Tracker that defers every value until [`PlaceholderTracker::replace_placeholders`].
#[derive(Debug)]
pub struct TokenTracker {
  id: Uuid,
  format: TokenFormat,
  state: Mutex<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
  issued: u64,
  resolvers: HashMap<String, Arc<Resolver>>,
}

impl TokenTracker {
  /// Tracker issuing tokens that are unique across all trackers.
  pub fn new() -> Self {
    Self::with_format(TokenFormat::Scoped)
  }

  /// Tracker issuing tokens in the given format.
  pub fn with_format(format: TokenFormat) -> Self {
    Self {
      id: Uuid::new_v4(),
      format,
      state: Mutex::new(TrackerState::default()),
    }
  }

  /// Register `resolver` and return a fresh token for it.
  pub fn issue(&self, resolver: Resolver) -> PlaceholderToken {
    let mut state = self.state.lock();
    state.issued += 1;
    let token = self.format.render(&self.id, state.issued);
    debug!(tracker = %self.id, token = %token, "issued placeholder");
    state
      .resolvers
      .insert(token.as_str().to_string(), Arc::new(resolver));
    token
  }

  /// Number of tokens issued so far.
  pub fn len(&self) -> usize {
    self.state.lock().resolvers.len()
  }

  /// Returns `true` when no token has been issued.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn resolver(&self, token: &str) -> Option<Arc<Resolver>> {
    self.state.lock().resolvers.get(token).cloned()
  }
}

impl Default for TokenTracker {
  fn default() -> Self {
    Self::new()
  }
}

impl PlaceholderTracker for TokenTracker {
  fn create_token(&self, resolver: Resolver) -> Result<String, RewriteError> {
    Ok(self.issue(resolver).into())
  }

  fn replace_placeholders(&self, text: &str) -> Result<String, RewriteError> {
    if self.is_empty() {
      return Ok(text.to_string());
    }

    // The registry lock is not held while resolvers run so they may issue tokens themselves.
    let mut resolved: HashMap<&str, String> = HashMap::new();
    let mut output = String::with_capacity(text.len());
    let mut copied_to = 0;

    for found in token_pattern().find_iter(text) {
      let token = found.as_str();
      if !resolved.contains_key(token) {
        let Some(resolver) = self.resolver(token) else {
          continue;
        };
        let value = resolver.resolve().map_err(|source| {
          warn!(tracker = %self.id, token, error = %source, "placeholder resolver failed");
          RewriteError::Resolve {
            token: token.to_string(),
            source,
          }
        })?;
        resolved.insert(token, value);
      }

      output.push_str(&text[copied_to..found.start()]);
      output.push_str(&resolved[token]);
      copied_to = found.end();
    }

    output.push_str(&text[copied_to..]);
    debug!(tracker = %self.id, replaced = resolved.len(), "replaced placeholders");
    Ok(output)
  }

  fn is_deferring(&self) -> bool {
    true
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::tracker::ResolveError;

  #[test]
  fn replaces_every_occurrence_and_keeps_surrounding_text() {
    let tracker = TokenTracker::new();
    let script = tracker.issue(Resolver::from("/assets/app.js"));
    let style = tracker.issue(Resolver::from("/assets/site.css"));

    let text = format!("<a {script}> and {style}\n<b {script}/>");
    let output = tracker.replace_placeholders(&text).unwrap();

    assert_eq!(
      output,
      "<a /assets/app.js> and /assets/site.css\n<b /assets/app.js/>"
    );
  }

  #[test]
  fn resolves_each_token_once_per_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let tracker = TokenTracker::new();
    let token = tracker.issue(Resolver::deferred(move || {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok("value".into())
    }));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let output = tracker
      .replace_placeholders(&format!("{token}{token}{token}"))
      .unwrap();

    assert_eq!(output, "valuevaluevalue");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn leaves_text_without_tokens_unchanged() {
    let tracker = TokenTracker::new();
    let text = "<p>{{ template }} and {{unknown:token}}</p>";
    assert_eq!(tracker.replace_placeholders(text).unwrap(), text);

    tracker.issue(Resolver::from("unused"));
    assert_eq!(tracker.replace_placeholders(text).unwrap(), text);
  }

  #[test]
  fn rewriting_twice_is_idempotent() {
    let tracker = TokenTracker::new();
    let token = tracker.issue(Resolver::from("/bundle.js"));
    let once = tracker
      .replace_placeholders(&format!("src='{token}'"))
      .unwrap();
    let twice = tracker.replace_placeholders(&once).unwrap();
    assert_eq!(once, "src='/bundle.js'");
    assert_eq!(twice, once);
  }

  #[test]
  fn trackers_never_resolve_each_others_tokens() {
    let first = TokenTracker::new();
    let second = TokenTracker::new();
    let first_token = first.issue(Resolver::from("first"));
    let second_token = second.issue(Resolver::from("second"));

    assert_eq!(
      second
        .replace_placeholders(first_token.as_str())
        .unwrap(),
      first_token.as_str()
    );
    assert_eq!(
      first
        .replace_placeholders(second_token.as_str())
        .unwrap(),
      second_token.as_str()
    );
    assert_eq!(
      first.replace_placeholders(first_token.as_str()).unwrap(),
      "first"
    );
    assert_eq!(
      second
        .replace_placeholders(second_token.as_str())
        .unwrap(),
      "second"
    );
  }

  #[test]
  fn sequential_trackers_only_replace_their_own_registry() {
    let tracker = TokenTracker::with_format(TokenFormat::sequential("T"));
    let token = tracker.issue(Resolver::from("/assets/app.abc123.js"));
    assert_eq!(token.as_str(), "{{T1}}");

    let output = tracker
      .replace_placeholders("<script src='{{T1}}'></script>{{T2}}")
      .unwrap();
    assert_eq!(output, "<script src='/assets/app.abc123.js'></script>{{T2}}");
  }

  #[test]
  fn tokens_are_never_reused() {
    let tracker = TokenTracker::new();
    let tokens: std::collections::HashSet<_> = (0..50)
      .map(|_| tracker.issue(Resolver::from("x")))
      .collect();
    assert_eq!(tokens.len(), 50);
    assert_eq!(tracker.len(), 50);
  }

  #[test]
  fn surfaces_resolver_failures() {
    let tracker = TokenTracker::new();
    let token = tracker.issue(Resolver::deferred(|| {
      Err(ResolveError::Failed("missing asset".into()))
    }));

    let err = tracker
      .replace_placeholders(&format!("<script src='{token}'>"))
      .unwrap_err();
    match err {
      RewriteError::Resolve {
        token: failed,
        source,
      } => {
        assert_eq!(failed, token.as_str());
        assert_eq!(source, ResolveError::Failed("missing asset".into()));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn resolvers_may_issue_tokens_while_replacing() {
    let tracker = Arc::new(TokenTracker::new());
    let inner = Arc::clone(&tracker);
    let token = tracker.issue(Resolver::deferred(move || {
      inner.issue(Resolver::from("late"));
      Ok("outer".into())
    }));

    let output = tracker.replace_placeholders(token.as_str()).unwrap();
    assert_eq!(output, "outer");
    assert_eq!(tracker.len(), 2);
  }
}
