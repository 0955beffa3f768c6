//! Structured logging collaborators.
//!
//! A [`Source`](crate::Source) reports failed requests to an optional
//! [`Logger`]. Two implementations ship with the crate: [`JsonLogger`]
//! writes one JSON document per line to any writer, [`TracingLogger`]
//! forwards entries to the `tracing` subscriber installed by the process.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Context attached to a log entry.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Sink for structured log entries.
pub trait Logger: Send + Sync {
    fn log(&self, msg: &str, context: &Fields);
    fn debug(&self, msg: &str, context: &Fields);
}

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.6f";

#[derive(Serialize)]
struct Entry<'a, T> {
    lvl: &'a str,
    msg: &'a str,
    context: &'a T,
}

/// Writes `<timestamp> {"lvl":..,"msg":..,"context":{..}}` lines.
///
/// `lvl` is empty for [`Logger::log`] and `"Debug"` for [`Logger::debug`].
/// An entry that cannot be serialized is replaced by a plain-text line, so
/// the event is never lost silently.
pub struct JsonLogger<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLogger<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entry<T: Serialize>(&self, lvl: &str, msg: &str, context: &T) {
        let line = match serde_json::to_string(&Entry { lvl, msg, context }) {
            Ok(json) => json,
            Err(e) => format!("unable to marshal log entry: {e}"),
        };
        let ts = chrono::Local::now().format(TIMESTAMP_FORMAT);

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{ts} {line}") {
            tracing::warn!(error = %e, "failed to write log entry");
        }
    }
}

impl<W: Write + Send> Logger for JsonLogger<W> {
    fn log(&self, msg: &str, context: &Fields) {
        self.write_entry("", msg, context);
    }

    fn debug(&self, msg: &str, context: &Fields) {
        self.write_entry("Debug", msg, context);
    }
}

/// Forwards entries to `tracing` at `info` / `debug` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, msg: &str, context: &Fields) {
        tracing::info!(context = %serde_json::Value::from(context.clone()), "{msg}");
    }

    fn debug(&self, msg: &str, context: &Fields) {
        tracing::debug!(context = %serde_json::Value::from(context.clone()), "{msg}");
    }
}
