// CLI module - Record entries, manage settings, download and serve the log file

pub mod output;

use crate::config::DblogConfig;
use crate::error::{DblogError, Result};
use crate::logs::{
    Context, ContextValue, DblogChannels, DblogLayer, FileLogSink, LogDownload,
    LogFile, LogLevel, NullLogger, Origin, SharedScope, SinkServices, TracingChannels,
};
use crate::server::{self, ServerState};
use crate::settings::{FileSettingsStore, SettingsStore};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// dblog-file - Mirror log records into a bounded text file
#[derive(Parser)]
#[command(name = "dblog-file")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (.toml or .json); defaults to $DBLOG_FILE_CONFIG
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one log entry
    Log {
        /// Severity (emergency, alert, critical, error, warning, notice, info, debug)
        level: LogLevel,

        /// Message, may contain {key} placeholders
        message: String,

        /// Context values (KEY=VALUE format, VALUE may be JSON)
        #[arg(short = 'C', long = "context")]
        context: Vec<String>,

        /// Logger channel
        #[arg(long, default_value = "cli")]
        channel: String,

        /// Display name of the acting user
        #[arg(long)]
        actor: Option<String>,

        /// Client network address
        #[arg(long)]
        ip: Option<IpAddr>,
    },

    /// Show or change the sink settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Write the log file to a file or stdout
    Download {
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the download endpoint over HTTP
    Serve {
        /// Listen address (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the current settings
    Show,
    /// Change one or more settings
    Set {
        /// Enable or disable saving logs into the file
        #[arg(long)]
        enabled: Option<bool>,

        /// Count of lines to keep (1-25000)
        #[arg(long)]
        count: Option<u32>,

        /// Types to log, comma separated
        #[arg(long, value_delimiter = ',')]
        types: Option<Vec<LogLevel>>,
    },
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> anyhow::Result<()> {
        let cli = Cli::parse();
        cli.execute()
    }

    /// Execute the parsed command
    fn execute(self) -> anyhow::Result<()> {
        let config = DblogConfig::discover(self.config.as_deref())
            .context("Failed to load configuration")?;

        match self.command {
            Commands::Log {
                level,
                message,
                context,
                channel,
                actor,
                ip,
            } => {
                init_tracing(None);
                let context = parse_context(&context)?;
                let origin = Origin {
                    actor,
                    client_ip: ip,
                };
                record(&config, level, &message, &context, &channel, origin)?;
                Ok(())
            }

            Commands::Settings { command } => {
                init_tracing(None);
                match command {
                    SettingsCommands::Show => show_settings(&config),
                    SettingsCommands::Set {
                        enabled,
                        count,
                        types,
                    } => set_settings(&config, enabled, count, types),
                }
            }

            Commands::Download { output } => {
                init_tracing(None);
                download(&config, output.as_deref())
            }

            Commands::Serve { bind } => {
                let mut config = config;
                if let Some(bind) = bind {
                    config.bind = bind;
                }
                serve(&config)
            }
        }
    }
}

/// Install the global subscriber; `RUST_LOG` picks the filter, default `info`
fn init_tracing(mirror: Option<DblogLayer>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(mirror)
        .try_init();
}

fn services(config: &DblogConfig, origin: Origin) -> SinkServices {
    SinkServices::new(
        Arc::new(LogFile::new(config.log_path())),
        Arc::new(FileSettingsStore::new(&config.settings_file)),
        Arc::new(SharedScope::new(origin)),
    )
}

fn record(
    config: &DblogConfig,
    level: LogLevel,
    message: &str,
    context: &Context,
    channel: &str,
    origin: Origin,
) -> anyhow::Result<bool> {
    let channels = DblogChannels::new(TracingChannels, services(config, origin));
    let written = channels.sink(channel).record(level, message, context);

    if written {
        output::print_success_msg(&format!(
            "Recorded {} entry in {}",
            level,
            config.log_path().display()
        ));
        return Ok(true);
    }

    let settings = FileSettingsStore::new(&config.settings_file)
        .load()
        .context("Failed to load settings")?;
    if settings.accepts(level) {
        output::print_error(&format!(
            "Could not write to {}; only the logger received the entry",
            config.log_path().display()
        ));
    } else {
        output::print_info(&format!(
            "File logging is disabled for {} entries; only the logger received it",
            level
        ));
    }
    Ok(false)
}

fn show_settings(config: &DblogConfig) -> anyhow::Result<()> {
    let settings = FileSettingsStore::new(&config.settings_file)
        .load()
        .context("Failed to load settings")?;

    let log_file = LogFile::new(config.log_path());
    let lines = if log_file.exists() {
        Some(log_file.line_count()?)
    } else {
        None
    };

    output::print_settings(&settings, log_file.path(), lines);
    Ok(())
}

fn set_settings(
    config: &DblogConfig,
    enabled: Option<bool>,
    count: Option<u32>,
    types: Option<Vec<LogLevel>>,
) -> anyhow::Result<()> {
    let store = FileSettingsStore::new(&config.settings_file);
    let mut settings = store.load().context("Failed to load settings")?;

    if let Some(enabled) = enabled {
        settings.enabled = enabled;
    }
    if let Some(count) = count {
        settings.count = count;
    }
    if let Some(types) = types {
        settings.set_types(types);
    }

    store.save(&settings)?;
    output::print_success_msg(&format!(
        "The configuration options have been saved to {}",
        store.path().display()
    ));
    Ok(())
}

fn download(config: &DblogConfig, destination: Option<&Path>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let download = runtime.block_on(LogDownload::load(&config.log_path()))?;

    match destination {
        Some(path) => {
            std::fs::write(&path, download.body())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::print_success_msg(&format!(
                "Saved {} to {}",
                output::format_size(download.content_length()),
                path.display()
            ));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(download.body())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn serve(config: &DblogConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;

    // The server's own events are mirrored into the file as well
    let sink = FileLogSink::new(Arc::new(NullLogger), services(config, Origin::default()));
    init_tracing(Some(DblogLayer::new(Arc::new(sink))));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(addr, ServerState::new(config.log_path())))?;
    Ok(())
}

/// Parse context values from KEY=VALUE format; values that parse as JSON keep their type
fn parse_context(entries: &[String]) -> Result<Context> {
    let mut context = Context::new();

    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(DblogError::InvalidContext(format!(
                "'{}'. Expected KEY=VALUE",
                entry
            )));
        };

        if key.is_empty() {
            return Err(DblogError::InvalidContext(format!(
                "'{}'. Key must not be empty",
                entry
            )));
        }

        let value = match serde_json::from_str::<serde_json::Value>(value) {
            Ok(json) => ContextValue::from(json),
            Err(_) => ContextValue::from(value),
        };
        context.insert(key, value);
    }

    Ok(context)
}
