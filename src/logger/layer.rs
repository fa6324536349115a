//! A `tracing-subscriber` layer that encodes every event as one JSON line.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{self, Layer};

use super::level::Level;
use super::writer::SharedWriter;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

// Fields with a fixed place in the record rather than a free-form one.
const SEVERITY_FIELD: &str = "severity";
const CALLER_FIELD: &str = "caller";
const STACKTRACE_FIELD: &str = "stacktrace";
const MESSAGE_FIELD: &str = "message";

/// Prefix given to a free-form field whose name is taken by a fixed key.
const RENAMED_PREFIX: &str = "fields.";

type Context = Arc<Map<String, Value>>;

thread_local! {
    static CONTEXT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// Run `f` with `context` attached to every event it emits on this thread.
pub(crate) fn with_context<R>(context: &Context, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Context>);

    impl Drop for Restore {
        fn drop(&mut self) {
            let previous = self.0.take();
            CONTEXT.with(|slot| *slot.borrow_mut() = previous);
        }
    }

    let previous = CONTEXT.with(|slot| slot.replace(Some(Arc::clone(context))));
    let _restore = Restore(previous);
    f()
}

/// Writes `{"level", "ts", "caller", "msg", ...fields, "stacktrace"}` records.
pub struct JsonLayer {
    writer: SharedWriter,
}

impl JsonLayer {
    pub fn new(writer: SharedWriter) -> Self {
        Self { writer }
    }
}

impl<S: Subscriber> Layer<S> for JsonLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let context = CONTEXT.with(|slot| slot.borrow().clone());

        let record = visitor.into_record(event.metadata(), context.as_deref());
        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("ztat: failed to encode log record: {e}");
                return;
            }
        };
        line.push(b'\n');

        if let Err(e) = self.writer.write_record(&line) {
            eprintln!("ztat: failed to write log record: {e}");
        }
    }
}

#[derive(Default)]
struct RecordVisitor {
    severity: Option<String>,
    caller: Option<String>,
    stacktrace: Option<String>,
    message: String,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn into_record(
        self,
        meta: &tracing::Metadata<'_>,
        context: Option<&Map<String, Value>>,
    ) -> Map<String, Value> {
        let level = self
            .severity
            .unwrap_or_else(|| Level::from_tracing(meta.level()).to_string());
        let caller = self.caller.unwrap_or_else(|| match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => format!("{file}:{line}"),
            _ => meta.target().to_string(),
        });

        let mut record = Map::new();
        record.insert("level".into(), Value::String(level));
        record.insert(
            "ts".into(),
            Value::String(Local::now().format(TIME_FORMAT).to_string()),
        );
        record.insert("caller".into(), Value::String(caller));
        record.insert("msg".into(), Value::String(self.message));

        let context = context
            .into_iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value.clone()));
        for (key, value) in context.chain(self.fields) {
            if is_fixed_key(&key) {
                record.insert(format!("{RENAMED_PREFIX}{key}"), value);
            } else {
                record.insert(key, value);
            }
        }

        if let Some(stacktrace) = self.stacktrace {
            record.insert(STACKTRACE_FIELD.into(), Value::String(stacktrace));
        }
        record
    }

    fn put(&mut self, field: &Field, text: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = text,
            SEVERITY_FIELD => self.severity = Some(text),
            CALLER_FIELD => self.caller = Some(text),
            STACKTRACE_FIELD => self.stacktrace = Some(text),
            name => {
                self.fields.insert(name.to_string(), Value::String(text));
            }
        }
    }
}

fn is_fixed_key(key: &str) -> bool {
    matches!(key, "level" | "ts" | "caller" | "msg" | STACKTRACE_FIELD)
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Map<String, Value>> {
        let buffer = Buffer::default();
        let layer = JsonLayer::new(SharedWriter::new(buffer.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);

        let out = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        out.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn plain_event_uses_metadata() {
        let records = capture(|| tracing::warn!("disk almost full"));
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["level"], "warn");
        assert_eq!(record["msg"], "disk almost full");
        assert!(record["caller"].as_str().unwrap().starts_with("src/logger/layer.rs:"));
        assert!(record.get("stacktrace").is_none());
    }

    #[test]
    fn key_order() {
        let records = capture(|| tracing::info!(user = "ann", "hello"));
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["level", "ts", "caller", "msg", "user"]);
    }

    fn context(pairs: &[(&str, Value)]) -> Context {
        Arc::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn explicit_fields_take_their_slots() {
        let ctx = context(&[("request", "r1".into()), ("attempt", 2.into())]);
        let records = capture(|| {
            with_context(&ctx, || {
                tracing::error!(
                    severity = "fatal",
                    caller = "src/app.rs:7",
                    stacktrace = "frame 0",
                    "stopping"
                )
            })
        });
        let record = &records[0];
        assert_eq!(record["level"], "fatal");
        assert_eq!(record["caller"], "src/app.rs:7");
        assert_eq!(record["request"], "r1");
        assert_eq!(record["attempt"], 2);
        assert_eq!(record["stacktrace"], "frame 0");
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["level", "ts", "caller", "msg", "request", "attempt", "stacktrace"]
        );
    }

    #[test]
    fn typed_fields_keep_their_type() {
        let records = capture(|| tracing::info!(count = 3_u64, ok = true, ratio = 0.5, "typed"));
        let record = &records[0];
        assert_eq!(record["count"], 3);
        assert_eq!(record["ok"], true);
        assert_eq!(record["ratio"], 0.5);
    }

    #[test]
    fn colliding_context_keys_are_renamed() {
        let ctx = context(&[
            ("level", "tenant-level".into()),
            ("msg", "ctx".into()),
            ("shop", "north".into()),
        ]);
        let records = capture(|| with_context(&ctx, || tracing::info!("x")));
        let record = &records[0];
        assert_eq!(record["level"], "info");
        assert_eq!(record["msg"], "x");
        assert_eq!(record["fields.level"], "tenant-level");
        assert_eq!(record["fields.msg"], "ctx");
        assert_eq!(record["shop"], "north");
    }

    #[test]
    fn colliding_event_fields_are_renamed() {
        let records = capture(|| tracing::info!(ts = 5_u64, "x"));
        assert_eq!(records[0]["fields.ts"], 5);
        assert!(records[0]["ts"].is_string());
    }

    #[test]
    fn context_ends_with_scope() {
        let ctx = context(&[("request", "r1".into())]);
        let records = capture(|| {
            with_context(&ctx, || tracing::info!("inside"));
            tracing::info!("outside");
        });
        assert_eq!(records[0]["request"], "r1");
        assert!(records[1].get("request").is_none());
    }

    #[test]
    fn context_restored_after_panic() {
        let ctx = context(&[("request", "r1".into())]);
        let records = capture(|| {
            let result = std::panic::catch_unwind(|| with_context(&ctx, || panic!("boom")));
            assert!(result.is_err());
            tracing::info!("after");
        });
        assert!(records[0].get("request").is_none());
    }

    #[test]
    fn timestamp_format() {
        let records = capture(|| tracing::info!("tick"));
        let ts = records[0]["ts"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_str(ts, TIME_FORMAT).is_ok(), "ts: {ts}");
    }
}
