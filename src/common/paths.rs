//! Install, configuration and test page paths
//!
//! The test page is always located relative to the install root, which
//! defaults to the directory holding the running executable. The caller's
//! working directory never takes part in the lookup.

use std::path::{Path, PathBuf};

use reqwest::Url;

use super::{Error, Result};

/// Name used for the configuration directory
const APP_NAME: &str = "jstests";

/// Default test page location, relative to the install root
pub const DEFAULT_TEST_PAGE: &str = "war/test.html";

/// Directory containing the running executable
pub fn install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::Config(format!("Failed to get current executable path: {}", e)))?;

    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Config(format!("Executable has no parent directory: {}", exe.display())))
}

/// Resolve the absolute test page path
///
/// A relative `page` is joined to `root`. The root itself is canonicalized
/// when it exists so that symlinked install locations yield one URL.
pub fn resolve_test_page(root: &Path, page: &Path) -> Result<PathBuf> {
    if page.is_absolute() {
        return Ok(page.to_path_buf());
    }

    let root = if root.exists() {
        root.canonicalize()?
    } else {
        root.to_path_buf()
    };

    if !root.is_absolute() {
        return Err(Error::Config(format!(
            "Install root must be an absolute path, got '{}'",
            root.display()
        )));
    }

    Ok(root.join(page))
}

/// Convert an absolute file path into a `file://` URL
pub fn file_url(path: &Path) -> Result<Url> {
    Url::from_file_path(path)
        .map_err(|_| Error::Config(format!("Cannot build a file URL for '{}'", path.display())))
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/jstests/`
/// - macOS: `~/Library/Application Support/jstests/`
/// - Windows: `%APPDATA%\jstests\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_dir_is_absolute() {
        let dir = install_dir().unwrap();
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_relative_page_joins_root() {
        let root = tempfile::tempdir().unwrap();
        let page = resolve_test_page(root.path(), Path::new(DEFAULT_TEST_PAGE)).unwrap();
        assert_eq!(
            page,
            root.path().canonicalize().unwrap().join("war").join("test.html")
        );
    }

    #[test]
    fn test_absolute_page_is_kept() {
        let page = resolve_test_page(Path::new("/unused"), Path::new("/srv/suite/test.html")).unwrap();
        assert_eq!(page, PathBuf::from("/srv/suite/test.html"));
    }

    #[test]
    fn test_relative_missing_root_is_rejected() {
        let err = resolve_test_page(Path::new("no/such/root"), Path::new("test.html")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url() {
        let url = file_url(Path::new("/srv/suite/war/test.html")).unwrap();
        assert_eq!(url.as_str(), "file:///srv/suite/war/test.html");
    }
}
