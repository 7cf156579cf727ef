//! Build options and the defaults derived from the entry path.

use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::info;

use crate::cli::ModuleFormat;
use crate::errors::{MinrollError, Result};

/// Options for a single bundle run, as supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Entry source file
    pub input: PathBuf,

    /// Where to write the bundle; defaults to `<input dir>/<input stem>.min.js`
    pub output: Option<PathBuf>,

    /// Global export name and banner title; defaults to the entry file name before its first `.`
    pub library_name: Option<String>,

    pub enable_terser: bool,
    pub enable_babel: bool,
    pub enable_uglify: bool,

    /// Passed to uglify's `compress.drop_console`
    pub drop_console: bool,

    /// Passed to uglify's `compress.drop_debugger`
    pub drop_debugger: bool,

    /// Module format, `umd` when unset
    pub module: Option<ModuleFormat>,

    /// Pack the rendered bundle into a self-executing eval wrapper
    pub eval: bool,
}

/// Kind of source the entry file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    JavaScript,
    TypeScript,
}

impl SourceKind {
    pub fn detect(input: &Path) -> Self {
        match input.extension().and_then(|e| e.to_str()) {
            Some("ts") => Self::TypeScript,
            _ => Self::JavaScript,
        }
    }
}

/// Options with every default filled in
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub library_name: String,
    pub format: ModuleFormat,
    pub source_kind: SourceKind,
    pub enable_terser: bool,
    pub enable_babel: bool,
    pub enable_uglify: bool,
    pub drop_console: bool,
    pub drop_debugger: bool,
    pub eval: bool,
}

impl BuildOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Fail unless the entry names an existing file
    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() || !self.input.exists() {
            return Err(MinrollError::invalid_entry(&self.input));
        }
        Ok(())
    }

    /// Validate and fill in the defaults
    pub fn resolve(&self) -> Result<ResolvedOptions> {
        self.validate()?;

        let output = match &self.output {
            Some(output) => output.clone(),
            None => {
                let output = default_output_path(&self.input);
                info!("default output path: {}", output.display());
                output
            }
        };

        let library_name = self
            .library_name
            .clone()
            .unwrap_or_else(|| default_library_name(&self.input));

        Ok(ResolvedOptions {
            input: self.input.clone(),
            output,
            library_name,
            format: self.module.unwrap_or_default(),
            source_kind: SourceKind::detect(&self.input),
            enable_terser: self.enable_terser,
            enable_babel: self.enable_babel,
            enable_uglify: self.enable_uglify,
            drop_console: self.drop_console,
            drop_debugger: self.drop_debugger,
            eval: self.eval,
        })
    }
}

/// `<dir>/<stem>.min.js` next to the entry
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{stem}.min.js"))
}

/// Entry file name up to its first `.`
pub fn default_library_name(input: &Path) -> String {
    let file_name = input.file_name().unwrap_or_default().to_string_lossy();
    file_name.split('.').next().unwrap_or_default().to_string()
}

/// Directory holding the entry, `.` for bare file names
pub fn entry_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
