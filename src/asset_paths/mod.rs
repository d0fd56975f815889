//! Helpers for normalising module paths and turning bundle references into URLs.
//!
//! Filtering external references, deriving static directories and generating versioned URLs
//! live in separate submodules so each can be tested on its own.

mod bundle;
mod directories;
mod filters;

pub use bundle::{UrlGenerator, VersionedUrlGenerator};
pub use directories::{module_base_directory, normalise_module_path};
pub use filters::is_url;
