#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod response;
pub mod rewrite;
pub mod scope;
pub mod selection;
pub mod static_paths;
pub mod tracker;

pub use builder::{AssetResolver, BundleAssets, BundleReferenceBuilder, ReferenceBuilder};
pub use config::{ConfigError, PipelineConfig};
pub use error::RewriteError;
pub use models::BuilderKind;
pub use pipeline::RewritePipeline;
pub use response::{BodyProducer, Response};
pub use scope::{RequestScope, ScopeState};
pub use tracker::{NullTracker, PlaceholderTracker, Resolver, TokenTracker};
