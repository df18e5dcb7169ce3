// Logs module - Bounded log file sink and the logger surfaces around it

mod context;
mod export;
mod file;
mod format;
mod layer;
mod level;
mod logger;
mod scope;
mod sink;

pub use context::{Context, ContextValue};
pub use export::{LogDownload, CONTENT_TYPE};
pub use file::{AppendOutcome, LogFile, LOG_FILE_NAME};
pub use format::{format_line, interpolate, placeholder_text, Origin, ANONYMOUS_LABEL, NONE_MARKER};
pub use layer::DblogLayer;
pub use level::LogLevel;
pub use logger::{ChannelFactory, Logger, NullLogger, TracingChannels, TracingLogger};
pub use scope::{AnonymousScope, RequestScope, SharedScope};
pub use sink::{DblogChannels, FileLogSink, SinkServices};
