//! The `ztat` command: resolve the configuration, bring up logging, run.

use crate::builder::{Resolved, Resolver, ResolverBuilder};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::ZtatError;
use crate::logger::{self, JsonLogger, Logger, LoggerError, Settings};
use crate::platform::PlatformDefaults;

pub const APP_NAME: &str = "ztat";

/// Resolve the configuration for `cli`: platform defaults, config file,
/// `ZTAT_*` environment and the flags the user passed, in rising priority.
pub fn load_config(cli: &Cli) -> Result<Resolved<Config>, ZtatError> {
    resolver(cli).load()
}

fn resolver(cli: &Cli) -> ResolverBuilder<Config> {
    let builder = Resolver::builder::<Config>(APP_NAME)
        .config_file(cli.config.clone())
        .defaults(|home| PlatformDefaults::current().to_table(home));

    cli.overrides()
        .into_iter()
        .fold(builder, |builder, (key, value)| builder.cli_override(key, value))
}

/// Start the logger described by `config`.
///
/// With `console` set, the file path is cleared in `config` itself, so
/// records go to standard output and later readers of `config` see that.
pub fn init_log(config: &mut Config) -> Result<JsonLogger, LoggerError> {
    if config.console {
        config.logger.file_path.clear();
    }
    logger::new(Settings {
        level: config.logger.level.clone(),
        file_path: config.logger.file_path.clone(),
    })
}

/// Run the command. The action itself has no behavior yet.
pub fn run(cli: Cli) -> Result<(), ZtatError> {
    let Resolved {
        mut config,
        file,
        unknown_keys,
    } = load_config(&cli)?;
    let log = init_log(&mut config)?;

    log.debugf(format_args!("Load config success: {config:?}"));
    if let Some(path) = file {
        log.infof(format_args!("Using config file: {}", path.display()));
    }
    for key in &unknown_keys {
        log.warnf(format_args!("{key} ignored"));
    }

    log.sync()?;
    Ok(())
}
