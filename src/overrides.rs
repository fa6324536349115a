//! Key helpers shared by the file, env and flag layers.
//!
//! A flag or environment variable names a single leaf such as
//! `"server.addr"`; [`overrides_to_table`] expands such pairs into the nested
//! `toml::Table` shape the merge pipeline works on.

use std::collections::HashSet;

use confique::meta::{FieldKind, Meta};
use toml::{Table, Value};

/// Convert dotted-key overrides into a nested `toml::Table`.
///
/// `("server.addr", Value::String(":80"))` becomes `{server = {addr = ":80"}}`.
/// If multiple entries target the same key, the last one wins.
pub fn overrides_to_table(entries: &[(String, Value)]) -> Table {
    let mut table = Table::new();
    for (dotted_key, value) in entries {
        set_nested(&mut table, dotted_key, value.clone());
    }
    table
}

/// Insert `value` at `dotted_key`, creating intermediate tables.
///
/// A non-table value sitting on the path is replaced by a table.
pub fn set_nested(table: &mut Table, dotted_key: &str, value: Value) {
    let mut segments = dotted_key.split('.').peekable();
    let mut current = table;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        let Value::Table(next) = slot else {
            unreachable!("slot was just made a table");
        };
        current = next;
    }
}

/// Rewrite every key of `table` (recursively) with [`snake_case`], so the
/// camelCase spelling `filePath` reaches the field `file_path`. When both
/// spellings are present the later one in key order wins.
pub fn normalize_keys(table: Table) -> Table {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Table(inner) => Value::Table(normalize_keys(inner)),
                other => other,
            };
            (snake_case(&key), value)
        })
        .collect()
}

/// `filePath` → `file_path`, `DBName` → `dbname`, `file_path` unchanged.
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Collect all leaf key paths from a confique `Meta` tree.
///
/// Returns dotted paths like `"console"` or `"logger.file_path"`; section
/// names are excluded.
pub fn valid_keys(meta: &Meta) -> HashSet<String> {
    let mut keys = HashSet::new();
    collect_keys(meta, "", &mut keys);
    keys
}

fn collect_keys(meta: &Meta, prefix: &str, keys: &mut HashSet<String>) {
    for field in meta.fields {
        let dotted = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf { .. } => {
                keys.insert(dotted);
            }
            FieldKind::Nested { meta, .. } => {
                collect_keys(meta, &dotted, keys);
            }
        }
    }
}
