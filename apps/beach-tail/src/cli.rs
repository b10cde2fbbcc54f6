use clap::{Args, Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tail_stream::{ErrorStatus, StreamConfig};
use thiserror::Error;
use url::Url;

use crate::telemetry::logging::{LogConfig, LogLevel, LogSink};

#[derive(Parser, Debug)]
#[command(
    name = "beach-tail",
    about = "Follow a server-sent event stream as a live log",
    version
)]
pub struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        env = "TAIL_CONFIG",
        help = "TOML file with eventSource/targetElement/onErrorDisconnect"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "event-source",
        value_name = "URL",
        env = "TAIL_EVENT_SOURCE",
        help = "Event stream endpoint, absolute or relative to --origin [default: /events]"
    )]
    pub event_source: Option<String>,

    #[arg(
        long = "target-element",
        value_name = "ID",
        env = "TAIL_TARGET_ELEMENT",
        help = "Pane to render into [default: event-stream]"
    )]
    pub target_element: Option<String>,

    #[arg(
        long = "on-error-disconnect",
        env = "TAIL_ON_ERROR_DISCONNECT",
        help = "Close the stream for good on the first transport error"
    )]
    pub on_error_disconnect: bool,

    #[arg(
        long,
        value_name = "URL",
        env = "TAIL_ORIGIN",
        default_value = "http://127.0.0.1:8080",
        help = "Base URL relative endpoints resolve against"
    )]
    pub origin: Url,

    #[arg(
        long = "retry-ms",
        value_name = "MS",
        env = "TAIL_RETRY_MS",
        default_value_t = 3000,
        help = "Delay before the transport reconnects"
    )]
    pub retry_ms: u64,

    #[arg(
        long = "follow-threshold",
        value_name = "ROWS",
        help = "Auto-follow while fewer than this many rows are below the view"
    )]
    pub follow_threshold: Option<f64>,

    #[arg(long = "error-status", value_enum, help = "How reconnecting errors are reported")]
    pub error_status: Option<ErrorStatusArg>,

    #[arg(long, help = "Print rows to stdout instead of a full-screen view")]
    pub plain: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ErrorStatusArg {
    State,
    Phrase,
}

impl From<ErrorStatusArg> for ErrorStatus {
    fn from(value: ErrorStatusArg) -> Self {
        match value {
            ErrorStatusArg::State => ErrorStatus::ConnectionState,
            ErrorStatusArg::Phrase => ErrorStatus::Phrase,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        env = "TAIL_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "TAIL_LOG_FILE",
        help = "Write logs to the specified file"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    /// Without a file, logs go to stderr only when nothing else draws there.
    pub fn to_config(&self, stderr_free: bool) -> LogConfig {
        let sink = match (&self.file, stderr_free) {
            (Some(path), _) => LogSink::File(path.clone()),
            (None, true) => LogSink::Stderr,
            (None, false) => LogSink::Disabled,
        };
        LogConfig {
            level: self.level,
            sink,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("follow threshold must be a finite number, got {0}")]
    Threshold(f64),
}

/// Rows are the native unit of the full-screen view; one row of slack keeps
/// a reader who scrolled up by a single line from being pulled back.
pub const TERMINAL_FOLLOW_THRESHOLD: f64 = 1.0;

impl Cli {
    /// Layers defaults, the config file, then flags.
    pub fn stream_config(&self) -> Result<StreamConfig, ConfigError> {
        let (mut config, file_sets_threshold) = match &self.config {
            Some(path) => {
                let file = load_file(path)?;
                (file.stream, file.sets_follow_threshold)
            }
            None => (StreamConfig::default(), false),
        };
        if !self.plain && !file_sets_threshold {
            config.follow_threshold = TERMINAL_FOLLOW_THRESHOLD;
        }
        if let Some(endpoint) = &self.event_source {
            config.endpoint_url = endpoint.clone();
        }
        if let Some(target) = &self.target_element {
            config.target_container_id = target.clone();
        }
        if self.on_error_disconnect {
            config.close_on_error = true;
        }
        if let Some(threshold) = self.follow_threshold {
            config.follow_threshold = threshold;
        }
        if let Some(status) = self.error_status {
            config.error_status = status.into();
        }
        if !config.follow_threshold.is_finite() {
            return Err(ConfigError::Threshold(config.follow_threshold));
        }
        Ok(config)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}

/// A parsed config file. Keys it omits keep their [`StreamConfig`] defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FileConfig {
    pub stream: StreamConfig,
    /// Whether the file names `followThreshold` itself, as opposed to
    /// inheriting the line-oriented default.
    pub sets_follow_threshold: bool,
}

pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let table: toml::Table = toml::from_str(&text).map_err(parse_error)?;
    let sets_follow_threshold = table.contains_key("followThreshold");
    let stream: StreamConfig = toml::Value::Table(table).try_into().map_err(parse_error)?;
    Ok(FileConfig {
        stream,
        sets_follow_threshold,
    })
}
