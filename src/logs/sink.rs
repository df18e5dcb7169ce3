use crate::error::Result;
use crate::logs::context::Context;
use crate::logs::file::LogFile;
use crate::logs::format::format_line;
use crate::logs::level::LogLevel;
use crate::logs::logger::{ChannelFactory, Logger};
use crate::logs::scope::RequestScope;
use crate::settings::SettingsStore;
use chrono::Local;
use std::sync::Arc;

/// Target of the sink's own diagnostics; never mirrored back into the file
pub(crate) const DIAGNOSTICS_TARGET: &str = "dblog_file::sink";

/// Collaborators shared by every sink writing the same file
#[derive(Clone)]
pub struct SinkServices {
    pub file: Arc<LogFile>,
    pub settings: Arc<dyn SettingsStore>,
    pub scope: Arc<dyn RequestScope>,
}

impl SinkServices {
    pub fn new(
        file: Arc<LogFile>,
        settings: Arc<dyn SettingsStore>,
        scope: Arc<dyn RequestScope>,
    ) -> Self {
        Self {
            file,
            settings,
            scope,
        }
    }
}

/// Logger decorator mirroring records into the bounded log file.
///
/// Every record goes to the wrapped logger first, unconditionally. The
/// record is then gated against the current settings, formatted and
/// appended. Failures on the file side are never reported to the caller.
///
/// Trimming happens only as part of an append. A record rejected by the
/// gate leaves the file untouched even when it is over the limit, unlike a
/// trim-then-gate order, which would shrink the file on filtered records.
pub struct FileLogSink {
    inner: Arc<dyn Logger>,
    services: SinkServices,
}

impl FileLogSink {
    pub fn new(inner: Arc<dyn Logger>, services: SinkServices) -> Self {
        Self { inner, services }
    }

    /// The backing file
    pub fn log_file(&self) -> &Arc<LogFile> {
        &self.services.file
    }

    /// Gate, format and append one record without delegating.
    ///
    /// Returns whether a line was written.
    pub fn append(&self, level: LogLevel, message: &str, context: &Context) -> bool {
        match self.try_append(level, message, context) {
            Ok(written) => written,
            Err(e) => {
                tracing::debug!(
                    target: DIAGNOSTICS_TARGET,
                    path = %self.services.file.path().display(),
                    error = %e,
                    "Skipped log file write"
                );
                false
            }
        }
    }

    fn try_append(&self, level: LogLevel, message: &str, context: &Context) -> Result<bool> {
        let settings = self.services.settings.load()?;
        if !settings.accepts(level) {
            return Ok(false);
        }

        let origin = self.services.scope.origin();
        let line = format_line(&Local::now(), level, &origin, message, context);
        let outcome = self
            .services
            .file
            .append_bounded(&line, settings.max_lines())?;

        if outcome.dropped > 0 {
            tracing::trace!(
                target: DIAGNOSTICS_TARGET,
                dropped = outcome.dropped,
                lines = outcome.lines,
                "Trimmed log file"
            );
        }

        Ok(true)
    }
}

impl FileLogSink {
    /// Delegate to the wrapped logger, then append; returns whether a line was written
    pub fn record(&self, level: LogLevel, message: &str, context: &Context) -> bool {
        self.inner.log(level, message, context);
        self.append(level, message, context)
    }
}

impl Logger for FileLogSink {
    fn log(&self, level: LogLevel, message: &str, context: &Context) {
        self.record(level, message, context);
    }
}

/// Channel factory wrapping every channel logger of `inner` with a `FileLogSink`
pub struct DblogChannels<F> {
    inner: F,
    services: SinkServices,
}

impl<F: ChannelFactory> DblogChannels<F> {
    pub fn new(inner: F, services: SinkServices) -> Self {
        Self { inner, services }
    }

    /// The sink for `channel`, wrapping the inner factory's logger
    pub fn sink(&self, channel: &str) -> FileLogSink {
        FileLogSink::new(self.inner.get(channel), self.services.clone())
    }
}

impl<F: ChannelFactory> ChannelFactory for DblogChannels<F> {
    fn get(&self, channel: &str) -> Arc<dyn Logger> {
        Arc::new(self.sink(channel))
    }
}
