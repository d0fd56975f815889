//! Command line helper for checking a pipeline configuration before deploying it.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use placeholder_rewrite::{PipelineConfig, RewritePipeline};
use placeholder_rewrite::static_paths::StaticPathRegistry;

#[derive(Debug, Parser)]
#[command(name = "placeholder-rewrite", version, about)]
struct Cli {
  /// Configuration file (JSON or YAML). Defaults to `placeholder.config.json` in the
  /// current directory, falling back to built-in defaults when absent.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Validate the configuration and print a summary.
  Check {
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
  },
  /// List the directories that would be registered for static serving.
  StaticPaths,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let pipeline = load_pipeline(cli.config.as_deref())?;

  match cli.command {
    Command::Check { json } => {
      let summary = pipeline.summary();
      if json {
        println!(
          "{}",
          serde_json::to_string_pretty(&summary).context("failed to serialise summary")?
        );
      } else {
        println!(
          "rewriting: {}, optimized: {}, version: {}, modules: {}, static paths: {}",
          summary.html_rewriting_enabled,
          summary.output_optimized,
          summary.version,
          summary.modules.len(),
          summary.static_paths.len()
        );
      }
    }
    Command::StaticPaths => {
      let mut registry = StaticPathRegistry::new();
      pipeline.install_static_paths(&mut registry);
      for directory in registry.directories() {
        println!("{directory}");
      }
    }
  }

  Ok(())
}

fn load_pipeline(config_path: Option<&Path>) -> Result<RewritePipeline> {
  let (config, config_dir) = match config_path {
    Some(path) => {
      let config = PipelineConfig::from_path(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
      let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
      (config, dir)
    }
    None => {
      let dir = env::current_dir().context("failed to determine the current directory")?;
      let config = PipelineConfig::discover(&dir)
        .with_context(|| format!("failed to load configuration from {}", dir.display()))?;
      (config, dir)
    }
  };

  RewritePipeline::new(config, &config_dir)
    .with_context(|| format!("invalid configuration in {}", config_dir.display()))
}
