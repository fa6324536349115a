//! Startup plumbing for `ztat`, a command-line tool for pharmacy statistical
//! data: layered configuration and structured JSON logging.
//!
//! The binary does three things before any real work would start:
//!
//! ```ignore
//! let Resolved { mut config, file, unknown_keys } = app::load_config(&cli)?;
//! let log = app::init_log(&mut config)?;
//! log.debugf(format_args!("Load config success: {config:?}"));
//! ```
//!
//! # Layer precedence
//!
//! ```text
//! Compiled defaults     #[config(default = ...)] on Config
//!        ↑ overridden by
//! Platform defaults     logger.level / logger.file_path for this OS
//!        ↑ overridden by
//! Config file           ~/.ztat/config.toml, or --config <FILE>
//!        ↑ overridden by
//! Environment vars      ZTAT_SERVER_ADDR, ZTAT_LOGGER_FILE_PATH, ...
//!        ↑ overridden by
//! Flags                 --server, --metrics, --console
//! ```
//!
//! Every layer is sparse: it only names the keys it sets, and unset keys
//! fall through to the layer below. A flag the user did not pass is not an
//! override.
//!
//! # Environment variables
//!
//! Each leaf key maps to one variable: the prefix `ZTAT_` followed by the
//! dotted key with `.` replaced by `_`. Matching is case-insensitive and
//! driven by the fields of [`Config`], so `ZTAT_LOGGER_FILE_PATH` reaches
//! `logger.file_path` without ambiguity. Values stay strings until
//! [`Config`] decodes them; `database.port` and `console` accept `"3306"`
//! or `"true"` as well as native TOML values.
//!
//! # Config file keys
//!
//! Keys are snake-cased before matching, so `filePath` and `file_path` name
//! the same field. Keys that [`Config`] does not define are ignored; each
//! one comes back as an [`UnknownKey`] and is logged as a warning with the
//! file path and line number:
//!
//! ```text
//! Unknown key 'server.adr' in /home/ann/.ztat/config.toml (line 2) ignored
//! ```
//!
//! An environment variable that is set but empty counts as unset.
//!
//! # Logging
//!
//! [`logger::new`] writes one JSON object per line to standard output, or to
//! a file rotated at 100 MiB with ten gzip-compressed backups kept for at
//! most thirty days. See the [`logger`] module.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod platform;

mod builder;
mod env;
mod file;
pub(crate) mod merge;
mod overrides;
mod resolve;
mod validate;

pub use builder::{Resolved, Resolver, ResolverBuilder};
pub use config::Config;
pub use error::ZtatError;
pub use validate::UnknownKey;
