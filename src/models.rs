//! Data structures shared between configuration, builders and the request pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of bundle a reference builder emits markup for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuilderKind {
  /// JavaScript bundles.
  Script,
  /// CSS bundles.
  Stylesheet,
  /// Client-side HTML template bundles.
  HtmlTemplate,
}

impl BuilderKind {
  /// Every kind, in static path registration order.
  pub const ALL: [BuilderKind; 3] = [Self::Script, Self::Stylesheet, Self::HtmlTemplate];

  /// URL segment used when generating optimised bundle URLs.
  pub fn url_segment(self) -> &'static str {
    match self {
      Self::Script => "scripts",
      Self::Stylesheet => "stylesheets",
      Self::HtmlTemplate => "htmltemplates",
    }
  }
}

impl fmt::Display for BuilderKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Script => "script",
      Self::Stylesheet => "stylesheet",
      Self::HtmlTemplate => "html-template",
    })
  }
}

/// A bundle declared in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleRecord {
  /// Kind of content the bundle holds.
  pub kind: BuilderKind,
  /// Application-relative path such as `~/scripts/app`, or an absolute URL.
  pub path: String,
}

/// Serializable overview of a validated pipeline, printed by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
  /// Whether responses are rewritten.
  pub html_rewriting_enabled: bool,
  /// Whether bundle URLs point at optimised output.
  pub output_optimized: bool,
  /// Cache-busting version string.
  pub version: String,
  /// Declared bundles.
  pub modules: Vec<ModuleRecord>,
  /// Directories that would be registered for static serving.
  pub static_paths: Vec<String>,
}
