use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use confique::Config;
use serde::Deserialize;
use toml::Table;

use crate::error::ZtatError;
use crate::file::{self, ConfigSource};
use crate::resolve::{self, ResolveInput};
use crate::validate::UnknownKey;

/// Entry point for resolving layered configuration.
pub struct Resolver;

impl Resolver {
    /// Start resolving config type `C` for the application `app_name`.
    ///
    /// The name derives the config file `~/.{app_name}/config.toml` and the
    /// env prefix `{APP_NAME}`.
    pub fn builder<C: Config>(app_name: &str) -> ResolverBuilder<C> {
        ResolverBuilder::new(app_name)
    }
}

/// A resolved config together with the file it was read from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<C> {
    pub config: C,
    pub file: Option<PathBuf>,
    /// Keys in the config file that `C` does not define. They were ignored.
    pub unknown_keys: Vec<UnknownKey>,
}

/// Builder for configuring and loading layered configuration.
pub struct ResolverBuilder<C: Config> {
    app_name: String,
    config_file: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    defaults: Option<Box<dyn FnOnce(&Path) -> Table>>,
    env_vars: Option<Vec<(String, String)>>,
    cli_overrides: Vec<(String, toml::Value)>,
    _phantom: PhantomData<C>,
}

impl<C: Config> ResolverBuilder<C> {
    fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            config_file: None,
            home_dir: None,
            defaults: None,
            env_vars: None,
            cli_overrides: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Read this file instead of the conventional one. `None` keeps the
    /// conventional lookup. An explicit file that does not exist is an error.
    pub fn config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Use this home directory instead of asking the OS.
    pub fn home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(path.into());
        self
    }

    /// Seed the lowest layer. The closure receives the home directory, so
    /// defaults can point below it.
    pub fn defaults(mut self, f: impl FnOnce(&Path) -> Table + 'static) -> Self {
        self.defaults = Some(Box::new(f));
        self
    }

    /// Read variables from this list instead of the process environment.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Add a CLI override. `None` values are ignored, so a clap `Option`
    /// field the user did not pass leaves the lower layers untouched.
    pub fn cli_override<V: Into<toml::Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli_overrides.push((key.to_string(), v.into()));
        }
        self
    }

    fn env_prefix(&self) -> String {
        self.app_name.to_uppercase()
    }

    fn source(&self) -> ConfigSource {
        match &self.config_file {
            Some(path) => ConfigSource::Path(path.clone()),
            None => ConfigSource::Home,
        }
    }

    fn build_input(self) -> Result<ResolveInput, ZtatError> {
        let env_prefix = self.env_prefix();
        let source = self.source();
        let home = match self.home_dir {
            Some(home) => home,
            None => file::home_dir()?,
        };

        let file = file::load_config_file(&source, &home, &self.app_name)?;
        let defaults = self.defaults.map(|f| f(&home)).unwrap_or_default();
        let env_vars = self.env_vars.unwrap_or_else(process_env);

        Ok(ResolveInput {
            defaults,
            file,
            env_vars,
            env_prefix,
            cli_overrides: self.cli_overrides,
        })
    }

    /// Load and resolve the configuration through all layers.
    pub fn load(self) -> Result<Resolved<C>, ZtatError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let input = self.build_input()?;
        let file = input.file.as_ref().map(|(path, _)| path.clone());
        let (config, unknown_keys) = resolve::resolve(input)?;
        Ok(Resolved {
            config,
            file,
            unknown_keys,
        })
    }
}

/// Process environment, skipping entries that are not valid UTF-8.
fn process_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
