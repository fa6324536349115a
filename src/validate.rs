//! Unknown-key detection for the config file.
//!
//! The file's (key-normalized) table is deserialized into `C::Layer` through
//! `serde_ignored`, which reports every key the layer skips. Unknown keys do
//! not stop resolution: each becomes an [`UnknownKey`] that the caller can
//! report once logging is up.

use std::fmt;
use std::path::{Path, PathBuf};

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};

use crate::overrides::snake_case;

/// A config file key that the config type does not define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey {
    pub key: String,
    pub path: PathBuf,
    /// 1-indexed line, or 0 when it could not be located.
    pub line: usize,
}

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown key '{}' in {} (line {})",
            self.key,
            self.path.display(),
            self.line
        )
    }
}

/// Keys of `table` (parsed from `content`) that config type `C` does not define.
///
/// A table that does not fit `C::Layer` at all yields no keys here; the
/// resolver reports that shape error when it decodes the merged layers.
pub fn unknown_keys<C: Config>(table: &Table, content: &str, path: &Path) -> Vec<UnknownKey>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut ignored: Vec<String> = Vec::new();
    let decoded: Result<C::Layer, toml::de::Error> =
        serde_ignored::deserialize(Value::Table(table.clone()), |key| {
            ignored.push(key.to_string());
        });
    if decoded.is_err() {
        return Vec::new();
    }

    ignored
        .into_iter()
        .map(|key| UnknownKey {
            line: locate_key(content, &key),
            key,
            path: path.to_path_buf(),
        })
        .collect()
}

/// 1-indexed line of `dotted_key` in `content`, or 0 when not found.
///
/// Tracks `[section]` headers so `logger.typo` only matches a `typo = ...`
/// line inside `[logger]`. An unknown section matches its own header.
/// Also matches the inline spelling `logger.typo = ...` at top level. Keys
/// are compared after snake-casing, like the resolver does. Quoted keys and
/// inline tables are not handled.
fn locate_key(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (section, leaf),
        None => ("", dotted_key),
    };
    let nested = format!("{dotted_key}.");

    let mut current = String::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if let Some(header) = trimmed
            .strip_prefix('[')
            .filter(|rest| !rest.starts_with('['))
            .and_then(|rest| rest.split(']').next())
        {
            current = normalize_dotted(header);
            if current == dotted_key || current.starts_with(&nested) {
                return i + 1;
            }
            continue;
        }

        let Some((name, _)) = trimmed.split_once('=') else {
            continue;
        };
        let name = normalize_dotted(name);
        if (current == section && name == leaf) || (current.is_empty() && name == dotted_key) {
            return i + 1;
        }
    }
    0
}

fn normalize_dotted(key: &str) -> String {
    key.split('.')
        .map(|segment| snake_case(segment.trim()))
        .collect::<Vec<_>>()
        .join(".")
}
