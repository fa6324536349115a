use std::fmt;

/// Logging priority, from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl Level {
    /// Parse a level name, ignoring case. Unknown names give [`Level::Debug`].
    pub fn parse_lenient(name: &str) -> Level {
        match name.trim().to_ascii_lowercase().as_str() {
            "info" => Level::Info,
            "warn" => Level::Warn,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
            "panic" => Level::Panic,
            _ => Level::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Panic => "panic",
        }
    }

    pub(crate) fn from_tracing(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            _ => Level::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names() {
        assert_eq!(Level::parse_lenient("debug"), Level::Debug);
        assert_eq!(Level::parse_lenient("info"), Level::Info);
        assert_eq!(Level::parse_lenient("warn"), Level::Warn);
        assert_eq!(Level::parse_lenient("error"), Level::Error);
        assert_eq!(Level::parse_lenient("fatal"), Level::Fatal);
        assert_eq!(Level::parse_lenient("panic"), Level::Panic);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(Level::parse_lenient("WARN"), Level::Warn);
        assert_eq!(Level::parse_lenient("Error"), Level::Error);
    }

    #[test]
    fn unknown_falls_back_to_debug() {
        assert_eq!(Level::parse_lenient("verbose"), Level::Debug);
        assert_eq!(Level::parse_lenient(""), Level::Debug);
        assert_eq!(Level::parse_lenient("warning"), Level::Debug);
    }

    #[test]
    fn ordering_follows_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Fatal < Level::Panic);
    }

    #[test]
    fn display_round_trips_names() {
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error, Level::Fatal] {
            assert_eq!(Level::parse_lenient(&level.to_string()), level);
        }
    }

    #[test]
    fn tracing_levels_map() {
        assert_eq!(Level::from_tracing(&tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from_tracing(&tracing::Level::WARN), Level::Warn);
    }
}
