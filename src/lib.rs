//! minroll - bundle a library entry point into a single minified file
//!
//! This crate wraps Rollup: it derives the output path and global name from
//! the entry file, assembles the plugin pipeline (TypeScript, Babel, Terser,
//! Uglify) from a handful of switches, and stamps the rendered bundle with a
//! banner. Module resolution, transpiling and minifying are left to Rollup
//! and its plugins.
//!
//! # Features
//!
//! - Output path and library name defaults derived from the entry
//! - Type stripping for `.ts` entries
//! - Babel with a throwaway `.babelrc` when the project has none
//! - Terser and Uglify minification, `drop_console` / `drop_debugger`
//! - Optional self-extracting eval packing
//!
//! # Example
//!
//! ```rust,no_run
//! use minroll::{BuildOptions, Bundler, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bundler = Bundler::new(Config::default())?;
//!
//!     let options = BuildOptions {
//!         enable_uglify: true,
//!         drop_console: true,
//!         ..BuildOptions::new("./lib/bar.js")
//!     };
//!
//!     let report = bundler.bundle(&options).await?;
//!     println!("Bundled! Output: {}", report.output_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod banner;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod options;
pub mod output;
pub mod packer;
pub mod pipeline;
pub mod scaffold;

// Re-export main types for convenience
pub use banner::{format_timestamp, Banner};
pub use bundler::{BuildPlan, BundleReport, Bundler};
pub use cli::ModuleFormat;
pub use config::Config;
pub use engine::{BundleEngine, BundleRequest, RollupEngine};
pub use errors::{MinrollError, Result};
pub use options::BuildOptions;
pub use packer::pack;
pub use pipeline::{Pipeline, Stage};

/// Current version of minroll
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bundle `options` with rollup from `./node_modules`
pub async fn bundle(options: &BuildOptions) -> Result<BundleReport> {
    Bundler::new(Config::default())?.bundle(options).await
}

/// Module formats the `--format` switch accepts
pub fn supported_formats() -> Vec<&'static str> {
    vec!["umd", "es", "cjs", "iife", "amd", "system"]
}
