//! Path helpers: home-directory expansion and platform directories.

use std::path::{Path, PathBuf};

/// Errors that can occur while resolving paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Get the user's home directory
pub fn home_dir() -> Result<PathBuf, PathError> {
    dirs::home_dir().ok_or(PathError::NoHomeDir)
}

/// Expand a leading `~` to the given home directory.
///
/// Only `~` on its own or `~/...` is expanded; `~user` forms are left alone.
///
/// # Arguments
/// * `path` - The path to expand
/// * `home` - The home directory to substitute
///
/// # Examples
/// ```
/// use std::path::Path;
/// use vmfixed::utils::paths::expand_tilde_with;
///
/// let home = Path::new("/home/alice");
/// assert_eq!(expand_tilde_with(Path::new("~/vmware"), home), Path::new("/home/alice/vmware"));
/// assert_eq!(expand_tilde_with(Path::new("/srv/vms"), home), Path::new("/srv/vms"));
/// ```
pub fn expand_tilde_with(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Expand a leading `~` using the current user's home directory
pub fn expand_tilde(path: &Path) -> Result<PathBuf, PathError> {
    if path.starts_with("~") {
        Ok(expand_tilde_with(path, &home_dir()?))
    } else {
        Ok(path.to_path_buf())
    }
}
