//! Rolling file log for the attendance core.
//!
//! Logging is configured by two settings, read by the CLI from
//! `ATTENDANCE_LOG_DIR` and `ATTENDANCE_LOG_LEVEL` (or the matching flags):
//! - no directory: logging stays off;
//! - a directory: it must be absolute; the level defaults per build mode.
//!
//! # Invariants
//! - One logger per process. Re-initializing with the same config is a
//!   no-op; any other config is rejected.
//! - Lines carry ids, dates, counts and durations. Personnel names and
//!   panic payloads never reach the file.

use flexi_logger::{
    Cleanup, Criterion, DeferredNow, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode, TS_DASHES_BLANK_COLONS_DOT_BLANK,
};
use log::{error, info, Record};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "attendance";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    config: LogConfig,
    handle: LoggerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `debug` for debug builds, `info` for release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggingError::UnsupportedLevel(value.trim().to_string())),
        }
    }
}

/// Resolved log settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub level: LogLevel,
}

impl LogConfig {
    pub fn new(dir: impl Into<PathBuf>, level: LogLevel) -> Self {
        Self {
            dir: dir.into(),
            level,
        }
    }

    /// Resolves the raw directory and level settings.
    ///
    /// Returns `Ok(None)` when the directory is unset or blank. A blank
    /// level falls back to [`LogLevel::for_build`].
    pub fn from_settings(
        dir: Option<&str>,
        level: Option<&str>,
    ) -> Result<Option<Self>, LoggingError> {
        let Some(dir) = dir.map(str::trim).filter(|dir| !dir.is_empty()) else {
            return Ok(None);
        };
        let dir = Path::new(dir);
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDir(dir.to_path_buf()));
        }
        let level = match level.map(str::trim).filter(|level| !level.is_empty()) {
            Some(level) => level.parse()?,
            None => LogLevel::for_build(),
        };
        Ok(Some(Self::new(dir, level)))
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A logger with a different config is already running.
    AlreadyActive { active: LogConfig },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeDir(dir) => {
                write!(f, "log directory must be absolute, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "cannot start file logger: {err}"),
            Self::AlreadyActive { active } => write!(
                f,
                "logging already active at `{}` with level {}",
                active.dir.display(),
                active.level.as_str()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts the process-wide file logger.
///
/// Never panics. Calling again with an equal config returns `Ok(())`.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start_logger(config))?;
    if active.config != *config {
        return Err(LoggingError::AlreadyActive {
            active: active.config.clone(),
        });
    }
    Ok(())
}

/// Writes buffered lines to disk. The logger lives in a static and is
/// never dropped, so short-lived callers flush before exiting.
pub fn flush_logs() {
    if let Some(active) = ACTIVE.get() {
        active.handle.flush();
    }
}

fn start_logger(config: &LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.dir).map_err(|source| LoggingError::CreateDir {
        dir: config.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(config.level.as_str())
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(config.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(line_format)
        .start()
        .map_err(LoggingError::Backend)?;

    install_panic_hook_once();
    info!(
        "event=core_init module=core status=ok version={} level={} build_mode={}",
        env!("CARGO_PKG_VERSION"),
        config.level.as_str(),
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );

    Ok(ActiveLogger {
        config: config.clone(),
        handle,
    })
}

/// `2024-01-10 07:00:00.123456 INFO  attendance_core::service::marking event=...`
fn line_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> std::io::Result<()> {
    write!(
        w,
        "{} {:<5} {} {}",
        now.format(TS_DASHES_BLANK_COLONS_DOT_BLANK),
        record.level(),
        record.target(),
        record.args()
    )
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payloads can quote roster data; the file gets the location only.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!("event=panic_captured module=core status=error location={location}");
        flush_logs();
        previous_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::{LogConfig, LogLevel, LoggingError};
    use std::path::PathBuf;

    #[test]
    fn level_parsing_accepts_aliases_and_case() {
        assert_eq!(" INFO ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!(matches!(
            "verbose".parse::<LogLevel>(),
            Err(LoggingError::UnsupportedLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn missing_or_blank_dir_turns_logging_off() {
        assert_eq!(LogConfig::from_settings(None, Some("debug")).unwrap(), None);
        assert_eq!(LogConfig::from_settings(Some("  "), None).unwrap(), None);
    }

    #[test]
    fn relative_dir_is_rejected() {
        let err = LogConfig::from_settings(Some("logs/dev"), None).unwrap_err();
        assert!(matches!(
            err,
            LoggingError::RelativeDir(ref dir) if dir == &PathBuf::from("logs/dev")
        ));
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn blank_level_uses_build_default() {
        let dir = std::env::temp_dir();
        let config = LogConfig::from_settings(dir.to_str(), Some(""))
            .unwrap()
            .unwrap();
        assert_eq!(config, LogConfig::new(dir, LogLevel::for_build()));
    }

    #[test]
    fn bad_level_is_reported_even_with_valid_dir() {
        let dir = std::env::temp_dir();
        let err = LogConfig::from_settings(dir.to_str(), Some("loud")).unwrap_err();
        assert!(err.to_string().contains("`loud`"));
    }
}
