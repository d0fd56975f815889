//! Decides which responses the rewrite stage is allowed to touch.

use std::collections::BTreeSet;

/// Media types included in, or excluded from, response rewriting.
///
/// Rules are matched against the media type essence (`text/html` in
/// `text/html; charset=utf-8`). A rule of the form `text/*` matches every subtype.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeSelection {
  include: Option<BTreeSet<String>>,
  exclude: BTreeSet<String>,
}

impl ContentTypeSelection {
  /// Build a selection from raw include and exclude lists.
  ///
  /// An empty include list admits every media type that is not excluded.
  pub fn new(
    include: impl IntoIterator<Item = String>,
    exclude: impl IntoIterator<Item = String>,
  ) -> Self {
    let include = normalise_list(include);
    let exclude = normalise_list(exclude);

    Self {
      include: (!include.is_empty()).then_some(include),
      exclude,
    }
  }

  /// Determine whether a response with `content_type` should be rewritten.
  pub fn is_included(&self, content_type: &str) -> bool {
    let essence = media_type_essence(content_type);
    if essence.is_empty() {
      return false;
    }

    if self
      .exclude
      .iter()
      .any(|rule| media_type_matches(rule, &essence))
    {
      return false;
    }

    match &self.include {
      Some(include) => include
        .iter()
        .any(|rule| media_type_matches(rule, &essence)),
      None => true,
    }
  }
}

/// Lower-cased media type without parameters.
pub(crate) fn media_type_essence(content_type: &str) -> String {
  content_type
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase()
}

/// Convert a list of raw media types into a sorted, de-duplicated set.
fn normalise_list(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
  values
    .into_iter()
    .map(|value| media_type_essence(&value))
    .filter(|value| !value.is_empty())
    .collect()
}

fn media_type_matches(rule: &str, essence: &str) -> bool {
  if rule == essence || rule == "*/*" {
    return true;
  }

  rule
    .strip_suffix("/*")
    .and_then(|top_level| essence.strip_prefix(top_level))
    .is_some_and(|rest| rest.starts_with('/'))
}
