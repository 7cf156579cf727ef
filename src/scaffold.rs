//! RAII guard for the `.babelrc` written next to the entry
//!
//! Babel only picks up a preset when a config file sits beside the sources.
//! When none exists, one is generated for the duration of a build and removed
//! again when the guard drops. A file that was already there is never touched.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{MinrollError, Result};

pub const BABELRC: &str = ".babelrc";

/// Owns a `.babelrc` this process created
#[derive(Debug)]
pub struct BabelRcGuard {
    path: PathBuf,
    created: bool,
}

impl BabelRcGuard {
    /// Path of the babel config babel would read for sources in `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(BABELRC)
    }

    /// Check once whether `dir` has a `.babelrc`, writing one that loads
    /// `preset_env` when it does not
    pub fn acquire(dir: &Path, preset_env: &Path) -> Result<Self> {
        let path = Self::path_in(dir);

        if path.exists() {
            debug!("Using existing {}", path.display());
            return Ok(Self { path, created: false });
        }

        std::fs::write(&path, render_babelrc(preset_env))
            .map_err(|source| MinrollError::Scaffold { path: path.clone(), source })?;
        debug!("Created {}", path.display());

        Ok(Self { path, created: true })
    }
}

impl Drop for BabelRcGuard {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        // Best effort: a failed removal must not mask the build result
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Babel config using preset-env without module transforms, in loose mode
pub fn render_babelrc(preset_env: &Path) -> String {
    let preset = preset_env.to_string_lossy().replace('\\', "/");
    format!(
        r#"{{"presets": [[{}, {{"modules": false, "loose": true}}]]}}"#,
        serde_json::Value::String(preset)
    )
}
