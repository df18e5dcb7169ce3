use crate::logs::context::Context;
use crate::logs::level::LogLevel;
use std::sync::Arc;

/// Structured logger call surface: one method per level plus `log`
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &Context);

    fn emergency(&self, message: &str, context: &Context) {
        self.log(LogLevel::Emergency, message, context);
    }

    fn alert(&self, message: &str, context: &Context) {
        self.log(LogLevel::Alert, message, context);
    }

    fn critical(&self, message: &str, context: &Context) {
        self.log(LogLevel::Critical, message, context);
    }

    fn error(&self, message: &str, context: &Context) {
        self.log(LogLevel::Error, message, context);
    }

    fn warning(&self, message: &str, context: &Context) {
        self.log(LogLevel::Warning, message, context);
    }

    fn notice(&self, message: &str, context: &Context) {
        self.log(LogLevel::Notice, message, context);
    }

    fn info(&self, message: &str, context: &Context) {
        self.log(LogLevel::Info, message, context);
    }

    fn debug(&self, message: &str, context: &Context) {
        self.log(LogLevel::Debug, message, context);
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, level: LogLevel, message: &str, context: &Context) {
        (**self).log(level, message, context);
    }
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str, _context: &Context) {}
}

/// Target of every event emitted by `TracingLogger`
pub(crate) const CHANNEL_TARGET: &str = "dblog_file::logs::logger";

/// Forwards records to `tracing`, naming the channel in a field
#[derive(Debug, Clone)]
pub struct TracingLogger {
    channel: String,
}

impl TracingLogger {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &Context) {
        let channel = self.channel.as_str();
        let severity = level.as_str();
        let json = context.to_json();
        let context = json.as_str();

        match level {
            LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
                tracing::error!(target: CHANNEL_TARGET, channel, severity, context, "{}", message)
            }
            LogLevel::Warning => {
                tracing::warn!(target: CHANNEL_TARGET, channel, severity, context, "{}", message)
            }
            LogLevel::Notice | LogLevel::Info => {
                tracing::info!(target: CHANNEL_TARGET, channel, severity, context, "{}", message)
            }
            LogLevel::Debug => {
                tracing::debug!(target: CHANNEL_TARGET, channel, severity, context, "{}", message)
            }
        }
    }
}

/// Hands out one logger per named channel
pub trait ChannelFactory: Send + Sync {
    fn get(&self, channel: &str) -> Arc<dyn Logger>;
}

/// Channel factory backed by `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChannels;

impl ChannelFactory for TracingChannels {
    fn get(&self, channel: &str) -> Arc<dyn Logger> {
        Arc::new(TracingLogger::new(channel))
    }
}
