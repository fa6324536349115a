//! Core resolution pipeline: merge all config layers and produce a typed config.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Layers, lowest to highest:
//!
//! 1. Defaults table (platform-dependent values)
//! 2. The config file, with keys snake-cased
//! 3. Environment variables
//! 4. CLI overrides
//!
//! The merged table is deserialized into `C::Layer` and confique fills any
//! compiled `#[config(default)]` still missing. Unknown config file keys are
//! returned next to the config instead of failing the run.

use std::collections::HashSet;
use std::path::PathBuf;

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};

use crate::env;
use crate::error::ZtatError;
use crate::merge::deep_merge;
use crate::overrides;
use crate::validate::{self, UnknownKey};

/// All pre-loaded data needed to resolve a config. No I/O happens here.
pub struct ResolveInput {
    /// Lowest layer, e.g. platform defaults.
    pub defaults: Table,
    /// The config file path and contents, if one was found.
    pub file: Option<(PathBuf, String)>,
    /// Raw environment variable pairs (pass `std::env::vars()` or synthetic data).
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix, e.g. `"ZTAT"`.
    pub env_prefix: String,
    /// CLI overrides as `(dotted_key, value)` pairs.
    pub cli_overrides: Vec<(String, Value)>,
}

/// Resolve configuration from pre-loaded inputs.
pub fn resolve<C: Config>(input: ResolveInput) -> Result<(C, Vec<UnknownKey>), ZtatError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut merged = input.defaults;
    let mut unknown = Vec::new();

    if let Some((path, content)) = &input.file {
        let table: Table = toml::from_str(content).map_err(|e| ZtatError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        let table = overrides::normalize_keys(table);
        unknown = validate::unknown_keys::<C>(&table, content, path);
        deep_merge(&mut merged, table);
    }

    let keys: HashSet<String> = overrides::valid_keys(&C::META);
    deep_merge(
        &mut merged,
        env::env_to_table(&input.env_prefix, &keys, input.env_vars),
    );

    if !input.cli_overrides.is_empty() {
        deep_merge(&mut merged, overrides::overrides_to_table(&input.cli_overrides));
    }

    let layer: C::Layer = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ZtatError::InvalidValue {
            key: "<merged>".into(),
            reason: e.to_string(),
        })?;

    let config = C::builder().preloaded(layer).load()?;
    Ok((config, unknown))
}
