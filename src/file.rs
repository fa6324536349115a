//! Config file discovery and loading.
//!
//! There is at most one config file per run:
//!
//! - an **explicit** path given by the user (`--config`), which must exist, or
//! - the **conventional** path `{home}/.{app_name}/config.toml`, which is
//!   silently skipped when absent.
//!
//! Only actual I/O errors (permissions, etc.) are propagated for the
//! conventional path.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ZtatError;

/// File name looked up inside the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Where the config file comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// `{home}/.{app_name}/config.toml`.
    Home,
    /// A path the user named explicitly.
    Path(PathBuf),
}

/// The per-user config directory, e.g. `~/.ztat`.
pub fn config_dir(home: &Path, app_name: &str) -> PathBuf {
    home.join(format!(".{app_name}"))
}

/// Resolve a [`ConfigSource`] to a concrete file path.
pub fn resolve_source(source: &ConfigSource, home: &Path, app_name: &str) -> PathBuf {
    match source {
        ConfigSource::Home => config_dir(home, app_name).join(CONFIG_FILE_NAME),
        ConfigSource::Path(p) => p.clone(),
    }
}

/// Read the config file, if there is one.
///
/// Returns `Ok(None)` when the conventional file does not exist. A missing
/// explicit file is an error.
pub fn load_config_file(
    source: &ConfigSource,
    home: &Path,
    app_name: &str,
) -> Result<Option<(PathBuf, String)>, ZtatError> {
    let path = resolve_source(source, home, app_name);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some((path, content))),
        Err(e) if e.kind() == ErrorKind::NotFound => match source {
            ConfigSource::Home => Ok(None),
            ConfigSource::Path(_) => Err(ZtatError::ConfigFileNotFound(path)),
        },
        Err(e) => Err(ZtatError::IoError { path, source: e }),
    }
}

/// The current user's home directory.
pub fn home_dir() -> Result<PathBuf, ZtatError> {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ZtatError::HomeDirUnavailable)
}
