//! Logging config and setup
//!
//! Logs go to stderr unless a directory is configured, in which case a rolling
//! log file is written there instead.

use std::path::Path;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::Config;

const LOG_FILE_PREFIX: &str = "graphql_tool_server";

/// Log file rotation period
#[derive(Clone, Copy, Debug, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotationKind {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl From<LogRotationKind> for Rotation {
    fn from(value: LogRotationKind) -> Self {
        match value {
            LogRotationKind::Minutely => Rotation::MINUTELY,
            LogRotationKind::Hourly => Rotation::HOURLY,
            LogRotationKind::Daily => Rotation::DAILY,
            LogRotationKind::Never => Rotation::NEVER,
        }
    }
}

/// Logging related options
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Logging {
    /// The log level to use for tracing
    #[serde(default = "defaults::log_level", deserialize_with = "parsers::from_str")]
    #[schemars(schema_with = "parsers::level_schema")]
    pub level: Level,

    /// The directory to write log files to
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Log file rotation period to use when a log path is provided
    /// [default: hourly]
    #[serde(default = "defaults::rotation")]
    pub rotation: LogRotationKind,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            path: None,
            rotation: defaults::rotation(),
        }
    }
}

/// Sets up either file logging or stderr logging depending on provided configuration options
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, anyhow::Error> {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.logging.level.into());

    if config.logging.level == Level::INFO {
        env_filter = env_filter.add_directive("tower_http=warn".parse()?);
    }

    match &config.logging.path {
        Some(path) => setup_file_logging(path, config.logging.rotation, env_filter),
        None => setup_stderr_logging(env_filter),
    }
}

/// Sets up rolling file appender logging but falls back to stderr logging on failure
fn setup_file_logging(
    log_path: &Path,
    rotation: LogRotationKind,
    env_filter: EnvFilter,
) -> Result<Option<WorkerGuard>, anyhow::Error> {
    if let Err(error) = std::fs::create_dir_all(log_path) {
        eprintln!("Could not create log directory ({error}) - falling back to stderr");
        return setup_stderr_logging(env_filter);
    }

    let appender = match RollingFileAppender::builder()
        .rotation(rotation.into())
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_path)
    {
        Ok(appender) => appender,
        Err(error) => {
            eprintln!("Log file setup failed ({error}) - falling back to stderr");
            return setup_stderr_logging(env_filter);
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    Ok(Some(guard))
}

fn setup_stderr_logging(env_filter: EnvFilter) -> Result<Option<WorkerGuard>, anyhow::Error> {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false),
        )
        .init();

    Ok(None)
}

mod defaults {
    use super::LogRotationKind;
    use tracing::Level;

    pub(super) const fn log_level() -> Level {
        Level::INFO
    }

    pub(super) const fn rotation() -> LogRotationKind {
        LogRotationKind::Hourly
    }
}

mod parsers {
    use std::{fmt::Display, str::FromStr};

    use schemars::JsonSchema;
    use serde::{Deserialize, Deserializer};

    pub(super) fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        <T as FromStr>::Err: Display,
    {
        let raw = String::deserialize(deserializer)?;
        T::from_str(&raw).map_err(serde::de::Error::custom)
    }

    pub(super) fn level_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        /// Log level
        #[derive(JsonSchema)]
        #[schemars(rename_all = "lowercase")]
        // Only used to generate the schema
        #[allow(dead_code)]
        enum Level {
            Trace,
            Debug,
            Info,
            Warn,
            Error,
        }

        Level::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LogRotationKind::Minutely, Rotation::MINUTELY)]
    #[case(LogRotationKind::Hourly, Rotation::HOURLY)]
    #[case(LogRotationKind::Daily, Rotation::DAILY)]
    #[case(LogRotationKind::Never, Rotation::NEVER)]
    fn it_maps_to_rotation(#[case] kind: LogRotationKind, #[case] expected: Rotation) {
        assert_eq!(Rotation::from(kind), expected);
    }

    #[rstest]
    #[case(r#"{"level": "debug"}"#, Level::DEBUG)]
    #[case(r#"{"level": "WARN"}"#, Level::WARN)]
    #[case("{}", Level::INFO)]
    fn it_parses_the_log_level(#[case] raw: &str, #[case] expected: Level) {
        let logging: Logging = serde_json::from_str(raw).unwrap();

        assert_eq!(logging.level, expected);
        assert_eq!(logging.rotation, LogRotationKind::Hourly);
    }

    #[test]
    fn it_rejects_unknown_levels() {
        assert!(serde_json::from_str::<Logging>(r#"{"level": "loud"}"#).is_err());
    }
}
