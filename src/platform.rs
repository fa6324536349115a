//! Platform-specific defaults, fixed at build time.
//!
//! Each supported target gets one constant row; [`PlatformDefaults::current`]
//! returns the row compiled into this binary. The row is turned into the
//! lowest resolver layer by [`PlatformDefaults::to_table`].

use std::path::Path;

use toml::{Table, Value};

/// Default logger settings for one target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDefaults {
    /// Default `logger.level`.
    pub logger_level: &'static str,
    /// Default `logger.file_path`, relative to the user's home directory.
    pub logger_file: &'static str,
}

#[cfg(target_os = "macos")]
const CURRENT: PlatformDefaults = PlatformDefaults {
    logger_level: "debug",
    logger_file: ".ztat/logs/core.log",
};

#[cfg(target_os = "linux")]
const CURRENT: PlatformDefaults = PlatformDefaults {
    logger_level: "debug",
    logger_file: ".ztat/logs/core.log",
};

#[cfg(target_os = "windows")]
const CURRENT: PlatformDefaults = PlatformDefaults {
    logger_level: "debug",
    logger_file: ".ztat\\logs\\core.log",
};

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const CURRENT: PlatformDefaults = PlatformDefaults {
    logger_level: "debug",
    logger_file: ".ztat/logs/core.log",
};

impl PlatformDefaults {
    pub const fn current() -> Self {
        CURRENT
    }

    /// Build the `[logger]` defaults layer for a given home directory.
    pub fn to_table(&self, home: &Path) -> Table {
        let mut logger = Table::new();
        logger.insert("level".into(), Value::String(self.logger_level.into()));
        logger.insert(
            "file_path".into(),
            Value::String(home.join(self.logger_file).to_string_lossy().into_owned()),
        );

        let mut table = Table::new();
        table.insert("logger".into(), Value::Table(logger));
        table
    }
}
