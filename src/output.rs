use std::path::Path;
use tracing::debug;

use crate::banner::Banner;
use crate::errors::{MinrollError, Result};

/// Final file contents: the banner once, then the code
pub fn compose(banner: &Banner, code: &str) -> String {
    let mut contents = banner.render();
    contents.push_str(code);
    contents
}

/// Write the bundle to `path`, creating its directory when missing.
/// Returns the number of bytes written.
pub async fn write_bundle(path: &Path, banner: &Banner, code: &str) -> Result<usize> {
    let write_error = |source| MinrollError::Write { path: path.to_path_buf(), source };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(write_error)?;
    }

    let contents = compose(banner, code);
    tokio::fs::write(path, &contents).await.map_err(write_error)?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());

    Ok(contents.len())
}
