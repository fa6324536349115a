//! Command-line interface of the `ztat` binary.
//!
//! Flags are declared as `Option`s so that only values the user actually
//! passed reach the resolver as overrides; an absent flag leaves the value
//! from the file or environment layer in place.

use std::path::PathBuf;

use clap::Parser;

/// A command line tool to display pharmacy statistical data.
#[derive(Debug, Parser)]
#[command(
    name = "ztat",
    version,
    about = "pharmacy statistical system",
    long_about = "A command line tool to display pharmacy statistical data.\n\
                  Complete documentation is available at https://github.com/ztock/ztat"
)]
pub struct Cli {
    /// Action to run.
    #[arg(value_name = "ACTION")]
    pub action: String,

    /// Set the address for server.
    #[arg(long, value_name = "ADDR")]
    pub server: Option<String>,

    /// Set the address for metrics server.
    #[arg(long, value_name = "ADDR")]
    pub metrics: Option<String>,

    /// Whether logger output records to the stdout.
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub console: Option<bool>,

    /// Read configuration from this file instead of ~/.ztat/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Explicitly passed flags as `(dotted_key, value)` overrides.
    pub fn overrides(&self) -> Vec<(&'static str, Option<toml::Value>)> {
        vec![
            ("server.addr", self.server.clone().map(toml::Value::String)),
            ("metrics.addr", self.metrics.clone().map(toml::Value::String)),
            ("console", self.console.map(toml::Value::Boolean)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn action_only() {
        let cli = parse(&["ztat", "report"]);
        assert_eq!(cli.action, "report");
        assert_eq!(cli.server, None);
        assert_eq!(cli.metrics, None);
        assert_eq!(cli.console, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn address_flags() {
        let cli = parse(&["ztat", "--server", ":8000", "--metrics=:9000", "report"]);
        assert_eq!(cli.server.as_deref(), Some(":8000"));
        assert_eq!(cli.metrics.as_deref(), Some(":9000"));
    }

    #[test]
    fn bare_console_is_true() {
        let cli = parse(&["ztat", "--console", "report"]);
        assert_eq!(cli.console, Some(true));
        assert_eq!(cli.action, "report");
    }

    #[test]
    fn explicit_console_false() {
        let cli = parse(&["ztat", "--console=false", "report"]);
        assert_eq!(cli.console, Some(false));
    }

    #[test]
    fn console_rejects_non_bool() {
        let err = Cli::try_parse_from(["ztat", "--console=maybe", "report"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_path_flag() {
        let cli = parse(&["ztat", "--config", "/etc/ztat.toml", "report"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ztat.toml")));
    }

    #[test]
    fn missing_action_is_usage_error() {
        let err = Cli::try_parse_from(["ztat"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn two_actions_is_usage_error() {
        let err = Cli::try_parse_from(["ztat", "report", "extra"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn version_flag() {
        let err = Cli::try_parse_from(["ztat", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn overrides_only_carry_passed_flags() {
        let cli = parse(&["ztat", "--metrics", ":9", "report"]);
        let passed: Vec<_> = cli
            .overrides()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        assert_eq!(passed, vec![("metrics.addr", toml::Value::String(":9".into()))]);
    }

    #[test]
    fn overrides_keep_explicit_false() {
        let cli = parse(&["ztat", "--console=false", "report"]);
        let console = cli
            .overrides()
            .into_iter()
            .find(|(key, _)| *key == "console")
            .and_then(|(_, value)| value);
        assert_eq!(console, Some(toml::Value::Boolean(false)));
    }
}
