pub(crate) fn env_truthy(var: &str) -> Option<bool> {
    std::env::var(var).map(|v| v != "0" && !v.is_empty()).ok()
}

pub mod logging {
    use clap::ValueEnum;
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use tracing::level_filters::LevelFilter;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_subscriber::EnvFilter;

    #[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
    pub enum LogLevel {
        Error,
        #[default]
        Warn,
        Info,
        Debug,
        Trace,
    }

    impl LogLevel {
        pub fn to_filter(self) -> LevelFilter {
            match self {
                LogLevel::Error => LevelFilter::ERROR,
                LogLevel::Warn => LevelFilter::WARN,
                LogLevel::Info => LevelFilter::INFO,
                LogLevel::Debug => LevelFilter::DEBUG,
                LogLevel::Trace => LevelFilter::TRACE,
            }
        }
    }

    /// Where log records go.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub enum LogSink {
        /// No subscriber is installed; the screen owns stderr.
        #[default]
        Disabled,
        Stderr,
        File(PathBuf),
    }

    #[derive(Clone, Debug, Default)]
    pub struct LogConfig {
        pub level: LogLevel,
        pub sink: LogSink,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum InitError {
        #[error("failed to open log file {path:?}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error("failed to configure logger: {0}")]
        Configure(String),
    }

    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

    /// Installs the global subscriber once; later calls are no-ops.
    pub fn init(config: &LogConfig) -> Result<(), InitError> {
        if GUARD.get().is_some() {
            return Ok(());
        }

        let (writer, guard) = match &config.sink {
            LogSink::Disabled => return Ok(()),
            LogSink::Stderr => tracing_appender::non_blocking(std::io::stderr()),
            LogSink::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| InitError::Io {
                        path: path.clone(),
                        source,
                    })?;
                tracing_appender::non_blocking(file)
            }
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(build_env_filter(config.level.to_filter()))
            .with_level(true)
            .with_target(config.level >= LogLevel::Debug)
            .with_ansi(config.sink == LogSink::Stderr)
            .with_writer(writer)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| InitError::Configure(err.to_string()))?;

        let _ = GUARD.set(guard);
        Ok(())
    }

    fn build_env_filter(level: LevelFilter) -> EnvFilter {
        if let Ok(filter) = std::env::var("TAIL_LOG_FILTER") {
            return EnvFilter::new(filter);
        }
        EnvFilter::new(default_filter_for(level, allow_dependency_traces()))
    }

    const NOISY_DEPENDENCIES: &[&str] = &["hyper", "reqwest", "rustls", "h2", "mio"];

    fn default_filter_for(level: LevelFilter, with_deps: bool) -> String {
        let mut filter = match level {
            LevelFilter::TRACE => "info,tail=trace,tail_stream=trace,beach_tail=trace".to_owned(),
            LevelFilter::DEBUG => "info,tail=debug,tail_stream=debug,beach_tail=debug".to_owned(),
            other => other.to_string().to_lowercase(),
        };
        if level >= LevelFilter::DEBUG && !with_deps {
            for target in NOISY_DEPENDENCIES {
                filter.push(',');
                filter.push_str(target);
                filter.push_str("=info");
            }
        }
        filter
    }

    fn allow_dependency_traces() -> bool {
        super::env_truthy("TAIL_TRACE_DEPS").unwrap_or(false)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn quiet_levels_map_directly() {
            assert_eq!(default_filter_for(LevelFilter::WARN, false), "warn");
            assert_eq!(default_filter_for(LevelFilter::ERROR, false), "error");
        }

        #[test]
        fn debug_throttles_dependencies_unless_asked() {
            let throttled = default_filter_for(LevelFilter::DEBUG, false);
            assert!(throttled.starts_with("info,tail=debug"));
            assert!(throttled.contains("reqwest=info"));
            let full = default_filter_for(LevelFilter::DEBUG, true);
            assert!(!full.contains("reqwest=info"));
        }

        #[test]
        fn disabled_sink_installs_nothing() {
            let config = LogConfig::default();
            assert!(init(&config).is_ok());
            assert!(GUARD.get().is_none());
        }
    }
}
