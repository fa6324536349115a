use std::collections::{HashMap, HashSet};

use toml::{Table, Value};

use crate::overrides::set_nested;

/// Build a `toml::Table` from environment variables named `{PREFIX}_{KEY}`.
///
/// `KEY` is a dotted config key with `.` replaced by `_`, so `server.addr`
/// is read from `ZTAT_SERVER_ADDR` and `logger.file_path` from
/// `ZTAT_LOGGER_FILE_PATH`. Only names that map onto one of `keys` are
/// used; the match is case-insensitive. When several spellings map onto the
/// same key, the all-uppercase one wins.
///
/// Values are inserted as strings and decoded by the config type. A variable
/// that is set but empty does not count as set.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_table(
    prefix: &str,
    keys: &HashSet<String>,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Table {
    let by_name: HashMap<String, &str> = keys
        .iter()
        .map(|key| (env_name(prefix, key), key.as_str()))
        .collect();

    let mut picked: HashMap<&str, (bool, String)> = HashMap::new();
    for (name, value) in vars {
        if value.is_empty() {
            continue;
        }
        let Some(&key) = by_name.get(&name.to_uppercase()) else {
            continue;
        };
        let exact = name == name.to_uppercase();
        match picked.get(key) {
            Some((true, _)) if !exact => {}
            _ => {
                picked.insert(key, (exact, value));
            }
        }
    }

    let mut table = Table::new();
    for (key, (_, value)) in picked {
        set_nested(&mut table, key, Value::String(value));
    }
    table
}

/// The environment variable name for a dotted key, e.g. `ZTAT_SERVER_ADDR`.
pub fn env_name(prefix: &str, dotted_key: &str) -> String {
    format!("{prefix}_{}", dotted_key.replace('.', "_")).to_uppercase()
}
