use crate::logs::context::{Context, ContextValue};
use crate::logs::level::LogLevel;
use crate::logs::logger::CHANNEL_TARGET;
use crate::logs::sink::{FileLogSink, DIAGNOSTICS_TARGET};
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context as LayerContext;
use tracing_subscriber::Layer;

/// Targets that must not be mirrored: the sink's diagnostics would feed
/// back into it, and `TracingLogger` events were already written by the
/// `FileLogSink` wrapping it.
const SKIPPED_TARGETS: [&str; 2] = [DIAGNOSTICS_TARGET, CHANNEL_TARGET];

/// A tracing layer mirroring the process's events into the log file
///
/// The subscriber already fans events out to every other layer, so records
/// go straight to [`FileLogSink::append`] without delegation.
pub struct DblogLayer {
    sink: Arc<FileLogSink>,
}

impl DblogLayer {
    pub fn new(sink: Arc<FileLogSink>) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for DblogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let metadata = event.metadata();
        if SKIPPED_TARGETS.contains(&metadata.target()) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        // An explicit `severity` field overrides the tracing level
        let level = visitor
            .severity
            .as_deref()
            .and_then(|s| s.parse::<LogLevel>().ok())
            .unwrap_or_else(|| LogLevel::from(metadata.level()));

        self.sink.append(level, &visitor.message, &visitor.context);
    }
}

/// Collects the message and the remaining fields of one event
#[derive(Default)]
struct RecordVisitor {
    message: String,
    severity: Option<String>,
    context: Context,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: ContextValue) {
        self.context.insert(field.name(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.insert(field, ContextValue::String(format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "severity" => self.severity = Some(value.to_string()),
            _ => self.insert(field, value.into()),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::file::LogFile;
    use crate::logs::logger::{Logger, NullLogger};
    use crate::logs::scope::AnonymousScope;
    use crate::logs::sink::SinkServices;
    use crate::settings::{MemorySettings, SinkSettings};
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;

    fn sink(temp_dir: &TempDir, types: Vec<LogLevel>) -> Arc<FileLogSink> {
        let services = SinkServices::new(
            Arc::new(LogFile::new(temp_dir.path().join("dblog-file.log"))),
            Arc::new(MemorySettings::new(SinkSettings {
                enabled: true,
                count: 50,
                types,
            })),
            Arc::new(AnonymousScope),
        );
        Arc::new(FileLogSink::new(Arc::new(NullLogger), services))
    }

    #[test]
    fn test_layer_mirrors_events() {
        let temp_dir = TempDir::new().unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(DblogLayer::new(sink(&temp_dir, vec![LogLevel::Warning])));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app::jobs", job = "import", attempts = 3, "Retrying job");
            tracing::info!(target: "app::jobs", "Not allowed");
        });

        let content = std::fs::read_to_string(temp_dir.path().join("dblog-file.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[warning] [Anonymous] [[NONE]] Retrying job"));
        assert!(lines[0].ends_with(r#"Original context: {"job":"import","attempts":3}"#));
    }

    #[test]
    fn test_layer_honours_severity_field() {
        let temp_dir = TempDir::new().unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(DblogLayer::new(sink(&temp_dir, vec![LogLevel::Critical])));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "app", severity = "critical", "Database down");
        });

        let content = std::fs::read_to_string(temp_dir.path().join("dblog-file.log")).unwrap();
        assert!(content.contains("[critical]"));
        assert!(content.contains("Original context: [NONE]"));
    }

    #[test]
    fn test_layer_skips_sink_diagnostics_and_channel_loggers() {
        let temp_dir = TempDir::new().unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(DblogLayer::new(sink(&temp_dir, LogLevel::ALL.to_vec())));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "dblog_file::sink", "Skipped log file write");
            crate::logs::TracingLogger::new("cron").error("already written", &Context::new());
        });

        assert!(!temp_dir.path().join("dblog-file.log").exists());
    }

    #[test]
    fn test_layer_mirrors_server_events() {
        let temp_dir = TempDir::new().unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(DblogLayer::new(sink(&temp_dir, LogLevel::ALL.to_vec())));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: "dblog_file::server",
                addr = "127.0.0.1:8080",
                "Download server listening"
            );
        });

        let content = std::fs::read_to_string(temp_dir.path().join("dblog-file.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("[info] [Anonymous] [[NONE]] Download server listening"));
        assert!(content.contains(r#"Original context: {"addr":"127.0.0.1:8080"}"#));
    }

    #[test]
    fn test_sink_failure_does_not_recurse() {
        let temp_dir = TempDir::new().unwrap();
        // A directory at the log path makes every append fail and emit a diagnostic
        let path = temp_dir.path().join("dblog-file.log");
        std::fs::create_dir(&path).unwrap();

        let services = SinkServices::new(
            Arc::new(LogFile::new(&path)),
            Arc::new(MemorySettings::new(SinkSettings {
                enabled: true,
                count: 5,
                types: LogLevel::ALL.to_vec(),
            })),
            Arc::new(AnonymousScope),
        );
        let sink = Arc::new(FileLogSink::new(Arc::new(NullLogger), services));
        let subscriber = tracing_subscriber::registry().with(DblogLayer::new(sink));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "dblog_file::server", "Log file could not be read");
        });

        assert!(path.is_dir());
    }
}
