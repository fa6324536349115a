//! Structured JSON logging.
//!
//! [`new`] turns [`Settings`] into a [`JsonLogger`]: records go to standard
//! output when `file_path` is empty, otherwise to a size-rotated file.
//! Each record is one JSON object per line:
//!
//! ```json
//! {"level":"info","ts":"2026-10-19T08:30:00.000+0200","caller":"src/app.rs:41","msg":"Using config file: /home/ann/.ztat/config.toml"}
//! ```
//!
//! Records at `warn` and above also carry a `stacktrace`. Fields attached
//! with [`Logger::with_fields`] follow `msg`.
//!
//! Every `JsonLogger` owns its own `tracing` dispatcher, so loggers built
//! from different settings can live side by side in one process without
//! touching the global subscriber.

mod layer;
mod level;
mod rotate;
mod writer;

use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::Dispatch;
use tracing::dispatcher;
use tracing_subscriber::layer::SubscriberExt;

pub use layer::JsonLayer;
pub use level::Level;
pub use rotate::{RotatingFile, RotationPolicy};
pub use writer::SharedWriter;

/// Key/value pairs attached to every record of a derived logger.
pub type Fields = HashMap<String, Value>;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to flush log output: {0}")]
    Sync(io::Error),
}

/// What the logger bootstrapper needs from the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Minimum level name. Unknown names mean `debug`.
    pub level: String,
    /// Log file. Empty means standard output.
    pub file_path: String,
}

/// A leveled structured logger.
///
/// The `*f` variants take preformatted arguments (`format_args!`); the
/// others take a plain message. `fatal*` exits the process with status 1
/// after the record is flushed, `panic*` panics with the message.
pub trait Logger: Send + Sync {
    /// Emit one record. `caller` is reported as the record's origin.
    fn log(&self, level: Level, args: fmt::Arguments<'_>, caller: &'static Location<'static>);

    /// A logger that adds `fields` to every record. `self` is unchanged.
    ///
    /// A field named `level`, `ts`, `caller`, `msg` or `stacktrace` is
    /// written as `fields.<name>` so the record's own keys stay intact.
    fn with_fields(&self, fields: Fields) -> Box<dyn Logger>;

    /// Flush buffered output.
    fn sync(&self) -> Result<(), LoggerError>;

    #[track_caller]
    fn debug(&self, msg: &str) {
        self.log(Level::Debug, format_args!("{msg}"), Location::caller());
    }

    #[track_caller]
    fn info(&self, msg: &str) {
        self.log(Level::Info, format_args!("{msg}"), Location::caller());
    }

    #[track_caller]
    fn warn(&self, msg: &str) {
        self.log(Level::Warn, format_args!("{msg}"), Location::caller());
    }

    #[track_caller]
    fn error(&self, msg: &str) {
        self.log(Level::Error, format_args!("{msg}"), Location::caller());
    }

    #[track_caller]
    fn fatal(&self, msg: &str) -> ! {
        self.fatalf(format_args!("{msg}"))
    }

    #[track_caller]
    fn panic(&self, msg: &str) -> ! {
        self.panicf(format_args!("{msg}"))
    }

    #[track_caller]
    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args, Location::caller());
    }

    #[track_caller]
    fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args, Location::caller());
    }

    #[track_caller]
    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args, Location::caller());
    }

    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args, Location::caller());
    }

    #[track_caller]
    fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.log(Level::Fatal, args, Location::caller());
        if let Err(e) = self.sync() {
            eprintln!("ztat: {e}");
        }
        std::process::exit(1)
    }

    #[track_caller]
    fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.log(Level::Panic, args, Location::caller());
        if let Err(e) = self.sync() {
            eprintln!("ztat: {e}");
        }
        panic!("{args}")
    }
}

// `tracing` has no level above ERROR; fatal and panic records ride on it
// and carry their real name in the `severity` field.
macro_rules! dispatch_event {
    ($level:expr, $($fields:tt)+) => {
        match $level {
            Level::Debug => tracing::event!(tracing::Level::DEBUG, $($fields)+),
            Level::Info => tracing::event!(tracing::Level::INFO, $($fields)+),
            Level::Warn => tracing::event!(tracing::Level::WARN, $($fields)+),
            Level::Error | Level::Fatal | Level::Panic => {
                tracing::event!(tracing::Level::ERROR, $($fields)+)
            }
        }
    };
}

/// [`Logger`] writing JSON lines through a private `tracing` dispatcher.
#[derive(Clone)]
pub struct JsonLogger {
    level: Level,
    dispatch: Dispatch,
    writer: SharedWriter,
    context: Arc<Map<String, Value>>,
}

impl JsonLogger {
    /// A logger emitting records at `level` and above to `writer`.
    pub fn from_writer(level: Level, writer: SharedWriter) -> Self {
        let subscriber = tracing_subscriber::registry().with(JsonLayer::new(writer.clone()));
        Self {
            level,
            dispatch: Dispatch::new(subscriber),
            writer,
            context: Arc::new(Map::new()),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Same as [`Logger::with_fields`], without boxing.
    pub fn with_context(&self, fields: Fields) -> JsonLogger {
        let mut context = (*self.context).clone();
        context.extend(fields);
        JsonLogger {
            context: Arc::new(context),
            ..self.clone()
        }
    }
}

impl fmt::Debug for JsonLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLogger")
            .field("level", &self.level)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Logger for JsonLogger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>, caller: &'static Location<'static>) {
        if level < self.level {
            return;
        }
        let caller = format!("{}:{}", caller.file(), caller.line());
        let stacktrace = (level >= Level::Warn).then(Backtrace::force_capture);

        let emit = || {
            dispatcher::with_default(&self.dispatch, || {
                dispatch_event!(
                    level,
                    severity = level.as_str(),
                    caller = caller.as_str(),
                    stacktrace = stacktrace.as_ref().map(tracing::field::display),
                    "{}",
                    args
                )
            })
        };
        if self.context.is_empty() {
            emit();
        } else {
            layer::with_context(&self.context, emit);
        }
    }

    fn with_fields(&self, fields: Fields) -> Box<dyn Logger> {
        Box::new(self.with_context(fields))
    }

    fn sync(&self) -> Result<(), LoggerError> {
        self.writer.flush().map_err(LoggerError::Sync)
    }
}

/// Build the process logger from `settings`.
///
/// The sink is flushed once before returning, so an unwritable destination
/// is reported here rather than on the first record.
pub fn new(settings: Settings) -> Result<JsonLogger, LoggerError> {
    let level = Level::parse_lenient(&settings.level);
    let writer = if settings.file_path.is_empty() {
        SharedWriter::stdout()
    } else {
        let path = PathBuf::from(settings.file_path);
        let file = RotatingFile::open(&path, RotationPolicy::default())
            .map_err(|source| LoggerError::Open { path, source })?;
        SharedWriter::new(file)
    };

    let logger = JsonLogger::from_writer(level, writer);
    logger.sync()?;
    Ok(logger)
}
