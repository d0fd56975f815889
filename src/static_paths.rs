//! Registry of directories served as static content.

/// Directories registered for static file serving, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPathRegistry {
  directories: Vec<String>,
}

impl StaticPathRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `directory`. Returns `false` when it was already registered.
  pub fn add_directory(&mut self, directory: impl Into<String>) -> bool {
    let directory = directory.into();
    if self.contains(&directory) {
      return false;
    }
    self.directories.push(directory);
    true
  }

  /// Returns `true` when `directory` has been registered.
  pub fn contains(&self, directory: &str) -> bool {
    self.directories.iter().any(|existing| existing == directory)
  }

  /// Registered directories.
  pub fn directories(&self) -> &[String] {
    &self.directories
  }
}
