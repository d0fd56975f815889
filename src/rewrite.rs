//! Response rewrite stage.
//!
//! The stage materialises the whole body, substitutes the request's placeholders and writes the
//! result in one go. Bodies are therefore held in memory in full; streaming or unbounded bodies
//! are not supported.

use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::error::RewriteError;
use crate::response::BodyProducer;
use crate::scope::{RequestScope, ScopeState};

/// Character encoding declared by a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
  /// UTF-8, assumed when no charset is declared.
  #[default]
  Utf8,
  /// ISO-8859-1.
  Latin1,
  /// US-ASCII.
  Ascii,
}

impl Charset {
  /// Parse a charset label such as `utf-8` or `ISO-8859-1`.
  pub fn from_label(label: &str) -> Result<Self, RewriteError> {
    let normalised = label.trim().trim_matches('"').to_ascii_lowercase();
    match normalised.as_str() {
      "utf-8" | "utf8" => Ok(Self::Utf8),
      "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Ok(Self::Latin1),
      "us-ascii" | "ascii" => Ok(Self::Ascii),
      _ => Err(RewriteError::UnsupportedCharset(label.trim().to_string())),
    }
  }

  /// Charset declared by the `charset` parameter of `content_type`, UTF-8 when absent.
  pub fn from_content_type(content_type: &str) -> Result<Self, RewriteError> {
    let declared = content_type.split(';').skip(1).find_map(|parameter| {
      let (name, value) = parameter.split_once('=')?;
      name.trim().eq_ignore_ascii_case("charset").then_some(value)
    });

    match declared {
      Some(label) => Self::from_label(label),
      None => Ok(Self::Utf8),
    }
  }

  /// Canonical label.
  pub fn label(self) -> &'static str {
    match self {
      Self::Utf8 => "utf-8",
      Self::Latin1 => "iso-8859-1",
      Self::Ascii => "us-ascii",
    }
  }

  /// Decode a complete body.
  pub fn decode(self, bytes: Vec<u8>) -> Result<String, RewriteError> {
    let invalid = || RewriteError::Decode {
      charset: self.label(),
    };
    match self {
      Self::Utf8 => String::from_utf8(bytes).map_err(|_| invalid()),
      Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
      Self::Ascii => {
        if bytes.is_ascii() {
          String::from_utf8(bytes).map_err(|_| invalid())
        } else {
          Err(invalid())
        }
      }
    }
  }

  /// Encode a complete body.
  pub fn encode(self, text: String) -> Result<Vec<u8>, RewriteError> {
    let limit = match self {
      Self::Utf8 => return Ok(text.into_bytes()),
      Self::Latin1 => 0xFF,
      Self::Ascii => 0x7F,
    };

    text
      .chars()
      .map(|character| {
        u8::try_from(u32::from(character))
          .ok()
          .filter(|byte| u32::from(*byte) <= limit)
          .ok_or_else(|| RewriteError::Encode {
            charset: self.label(),
            character,
          })
      })
      .collect()
  }
}

/// How the stage treats the body it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
  /// Buffer, substitute placeholders and re-encode with the given charset.
  Rewrite(Charset),
  /// Forward the body untouched.
  PassThrough,
}

/// Wraps a body producer so placeholders are substituted after the body is complete.
#[derive(Debug)]
pub struct RewriteStage {
  scope: Arc<RequestScope>,
  mode: StageMode,
}

impl RewriteStage {
  /// Create a stage for `scope`.
  pub fn new(scope: Arc<RequestScope>, mode: StageMode) -> Self {
    Self { scope, mode }
  }

  /// Return a producer that runs `body` to completion before anything reaches the sink.
  ///
  /// Nothing is written when producing, decoding, resolving or encoding fails.
  pub fn wrap(self, body: BodyProducer) -> BodyProducer {
    Box::new(move |sink: &mut dyn Write| -> Result<(), RewriteError> {
      let Self { scope, mode } = self;
      scope.advance(ScopeState::Rewriting)?;

      match mode {
        StageMode::PassThrough => body(sink)?,
        StageMode::Rewrite(charset) => {
          let mut buffer = Vec::new();
          body(&mut buffer)?;
          let original_len = buffer.len();

          let text = charset.decode(buffer)?;
          let rewritten = scope.tracker().replace_placeholders(&text)?;
          let bytes = charset.encode(rewritten)?;

          sink.write_all(&bytes)?;
          sink.flush()?;
          debug!(
            scope = %scope.id(),
            path = scope.path(),
            original_len,
            rewritten_len = bytes.len(),
            "rewrote response body"
          );
        }
      }

      scope.advance(ScopeState::Completed)
    })
  }
}
