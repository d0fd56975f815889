use std::fmt;

use regex::Regex;
use uuid::Uuid;

/// Matches anything shaped like a placeholder, issued by any tracker or none.
pub(crate) fn token_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"\{\{[A-Za-z0-9_:\-]+\}\}").expect("invalid token regex"))
}

/// Opaque placeholder embedded in markup until the response is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderToken(String);

impl PlaceholderToken {
  /// Borrow the token text.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for PlaceholderToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<PlaceholderToken> for String {
  fn from(token: PlaceholderToken) -> Self {
    token.0
  }
}

/// Shape of the tokens a tracker hands out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenFormat {
  /// `{{placeholder:<tracker id>:<n>}}`, unique across every tracker instance.
  #[default]
  Scoped,
  /// `{{<prefix><n>}}`, unique only within one tracker.
  Sequential {
    /// Text placed before the counter.
    prefix: String,
  },
}

impl TokenFormat {
  /// Sequential tokens such as `{{T1}}`, `{{T2}}`.
  ///
  /// Characters that cannot appear in a token are dropped from `prefix`.
  pub fn sequential(prefix: &str) -> Self {
    let prefix = prefix
      .chars()
      .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-'))
      .collect::<String>();
    Self::Sequential { prefix }
  }

  pub(crate) fn render(&self, tracker_id: &Uuid, sequence: u64) -> PlaceholderToken {
    let text = match self {
      Self::Scoped => format!("{{{{placeholder:{}:{sequence}}}}}", tracker_id.simple()),
      Self::Sequential { prefix } => format!("{{{{{prefix}{sequence}}}}}"),
    };
    PlaceholderToken(text)
  }
}
