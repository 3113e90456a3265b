use std::path::{Path, PathBuf};

/// Expand `~` and environment variables in a user-supplied path.
///
/// Expansion failures (e.g. an unset variable) keep the path as given;
/// the subsequent file open reports the real problem.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}
