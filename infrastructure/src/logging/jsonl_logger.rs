//! JSONL journal of bus messages.
//!
//! Each [`Message`] is serialized as a single JSON line: the payload's
//! fields plus `type`, `topic`, `source`, `correlation_id` and `timestamp`,
//! appended to the file via a buffered writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use tribunal_application::MessageSink;
use tribunal_domain::{CorrelationId, Message};

/// JSONL message logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and
/// on `Drop`.
pub struct JsonlMessageLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlMessageLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create message journal directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not create message journal file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Create a logger for one run at `<dir>/<correlation_id>.messages.jsonl`
    pub fn for_run(dir: impl AsRef<Path>, correlation_id: &CorrelationId) -> Option<Self> {
        Self::new(Self::run_path(dir, correlation_id))
    }

    /// Journal path used by [`for_run`](Self::for_run)
    pub fn run_path(dir: impl AsRef<Path>, correlation_id: &CorrelationId) -> PathBuf {
        dir.as_ref()
            .join(format!("{}.messages.jsonl", correlation_id))
    }

    /// Get the path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_record(message: &Message) -> serde_json::Value {
        let timestamp = message
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let payload = serde_json::to_value(&message.payload).unwrap_or(serde_json::Value::Null);

        // Merge the payload with the envelope fields
        let mut map = match payload {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert(
            "topic".to_string(),
            serde_json::Value::String(message.topic().to_string()),
        );
        map.insert(
            "source".to_string(),
            serde_json::Value::String(message.source.to_string()),
        );
        map.insert(
            "correlation_id".to_string(),
            serde_json::Value::String(message.correlation_id.to_string()),
        );
        map.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );
        serde_json::Value::Object(map)
    }
}

impl MessageSink for JsonlMessageLogger {
    fn record(&self, message: &Message) {
        let Ok(line) = serde_json::to_string(&Self::to_record(message)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }

    fn finish(&self, correlation_id: &CorrelationId) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
        debug!(
            "Message journal for run {} written to {}",
            correlation_id.short(),
            self.path.display()
        );
    }
}

impl Drop for JsonlMessageLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
