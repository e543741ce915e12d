use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive, e.g.
/// `picobus_exchange=debug,warn`.
pub const LOG_ENV: &str = "PICOBUS_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn build_filter(level: LogLevel, env_directive: Option<&str>) -> EnvFilter {
    env_directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_directive()))
}

/// Bus and exchange events go to stderr; stdout carries only responses.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env_directive = std::env::var(LOG_ENV).ok();
    let filter = build_filter(level, env_directive.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_used_without_env_override() {
        let filter = build_filter(LogLevel::Warn, None);
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn env_directive_takes_precedence() {
        let filter = build_filter(LogLevel::Error, Some("picobus_exchange=debug"));
        assert_eq!(filter.to_string(), "picobus_exchange=debug");
    }

    #[test]
    fn invalid_env_directive_falls_back_to_level() {
        let filter = build_filter(LogLevel::Info, Some("picobus=notalevel"));
        assert_eq!(filter.to_string(), "info");
    }
}
