use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::builder::ReferenceBuilder;
use crate::models::BuilderKind;

type BuilderCell = Arc<OnceLock<Arc<dyn ReferenceBuilder>>>;

/// One reference builder per [`BuilderKind`] for the lifetime of a request.
///
/// Construction happens at most once per kind, even when several threads ask for the same kind
/// at the same time. The map lock is only held while the per-kind cell is looked up, so a slow
/// factory does not block lookups of other kinds.
#[derive(Debug, Default)]
pub struct BuilderCache {
  cells: Mutex<HashMap<BuilderKind, BuilderCell>>,
}

impl BuilderCache {
  /// Return the builder for `kind`, creating it with `factory` on first access.
  pub fn get_or_create<F>(&self, kind: BuilderKind, factory: F) -> Arc<dyn ReferenceBuilder>
  where
    F: FnOnce() -> Arc<dyn ReferenceBuilder>,
  {
    let cell = Arc::clone(self.cells.lock().entry(kind).or_default());
    Arc::clone(cell.get_or_init(factory))
  }

  /// Return the builder for `kind` if it has already been created.
  pub fn get(&self, kind: BuilderKind) -> Option<Arc<dyn ReferenceBuilder>> {
    let cell = self.cells.lock().get(&kind).cloned()?;
    cell.get().cloned()
  }

  /// Number of builders created so far.
  pub fn len(&self) -> usize {
    self
      .cells
      .lock()
      .values()
      .filter(|cell| cell.get().is_some())
      .count()
  }

  /// Returns `true` when no builder has been created.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Barrier;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::thread;
  use std::time::Duration;

  use super::*;
  use crate::error::RewriteError;
  use crate::tracker::PlaceholderTracker;

  #[derive(Debug)]
  struct StubBuilder(BuilderKind);

  impl ReferenceBuilder for StubBuilder {
    fn kind(&self) -> BuilderKind {
      self.0
    }

    fn reference(&self, _path: &str) {}

    fn references(&self) -> Vec<String> {
      Vec::new()
    }

    fn render(&self, _tracker: &dyn PlaceholderTracker) -> Result<String, RewriteError> {
      Ok(String::new())
    }

    fn url(&self, _path: &str, _tracker: &dyn PlaceholderTracker) -> Result<String, RewriteError> {
      Ok(String::new())
    }
  }

  #[test]
  fn returns_identical_instance_and_calls_factory_once() {
    let cache = BuilderCache::default();
    let calls = AtomicUsize::new(0);
    let factory = || -> Arc<dyn ReferenceBuilder> {
      calls.fetch_add(1, Ordering::SeqCst);
      Arc::new(StubBuilder(BuilderKind::Script))
    };

    let first = cache.get_or_create(BuilderKind::Script, factory);
    let second = cache.get_or_create(BuilderKind::Script, factory);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn kinds_are_cached_independently() {
    let cache = BuilderCache::default();
    assert!(cache.get(BuilderKind::Stylesheet).is_none());

    let scripts = cache.get_or_create(BuilderKind::Script, || {
      Arc::new(StubBuilder(BuilderKind::Script))
    });
    let styles = cache.get_or_create(BuilderKind::Stylesheet, || {
      Arc::new(StubBuilder(BuilderKind::Stylesheet))
    });

    assert!(!Arc::ptr_eq(&scripts, &styles));
    assert_eq!(
      cache.get(BuilderKind::Stylesheet).map(|b| b.kind()),
      Some(BuilderKind::Stylesheet)
    );
    assert!(cache.get(BuilderKind::HtmlTemplate).is_none());
    assert_eq!(cache.len(), 2);
  }

  #[test]
  fn concurrent_first_access_constructs_once() {
    const THREADS: usize = 8;

    let cache = BuilderCache::default();
    let calls = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    let builders: Vec<Arc<dyn ReferenceBuilder>> = thread::scope(|s| {
      let handles: Vec<_> = (0..THREADS)
        .map(|_| {
          s.spawn(|| {
            barrier.wait();
            cache.get_or_create(BuilderKind::HtmlTemplate, || {
              calls.fetch_add(1, Ordering::SeqCst);
              thread::sleep(Duration::from_millis(20));
              Arc::new(StubBuilder(BuilderKind::HtmlTemplate))
            })
          })
        })
        .collect();
      handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(builders.iter().all(|b| Arc::ptr_eq(b, &builders[0])));
  }
}
