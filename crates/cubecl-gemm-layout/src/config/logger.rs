use super::GlobalConfig;
use super::gemm::GemmLogLevel;
use std::fmt::Display;
use std::sync::Arc;

#[cfg(std_io)]
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

/// Configuration for logging, parameterized by a log level type.
///
/// Note that you can use multiple loggers at the same time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    #[cfg(std_io)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or overwrite it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Optional crate-level logging configuration (e.g., info, debug, trace).
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// The log level for this logger, determining verbosity.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            #[cfg(std_io)]
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Log levels using the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in `LoggerConfig`.
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Fans gemm log messages out to every configured output.
#[derive(Debug)]
pub struct Logger {
    loggers: Vec<LoggerKind>,

    /// Global configuration for logging settings.
    pub config: Arc<GlobalConfig>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Creates a new `Logger` instance based on the global configuration.
    ///
    /// Note that creating a logger is quite expensive.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Creates a new `Logger` from the given configuration.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let mut loggers = Vec::new();
        let kind = &config.gemm.logger;

        if kind.level != GemmLogLevel::Disabled {
            #[cfg(std_io)]
            if let Some(file) = &kind.file {
                loggers.push(LoggerKind::File(FileLogger::new(file, kind.append)));
            }

            if kind.stdout {
                loggers.push(LoggerKind::Stdout);
            }

            if kind.stderr {
                loggers.push(LoggerKind::Stderr);
            }

            if let Some(level) = kind.log {
                loggers.push(LoggerKind::Log(level));
            }
        }

        Self { loggers, config }
    }

    /// Logs a message for gemm launches, directing it to all configured loggers.
    pub fn log_gemm<S: Display>(&mut self, msg: &S) {
        match self.loggers.as_mut_slice() {
            [] => {}
            [logger] => logger.log(msg),
            loggers => {
                let msg = msg.to_string();
                for logger in loggers {
                    logger.log(&msg);
                }
            }
        }
    }

    /// Returns the current gemm log level from the global configuration.
    pub fn log_level_gemm(&self) -> GemmLogLevel {
        if self.loggers.is_empty() {
            GemmLogLevel::Disabled
        } else {
            self.config.gemm.logger.level
        }
    }
}

/// Represents different types of loggers.
#[derive(Debug)]
enum LoggerKind {
    /// Logs to a file.
    #[cfg(std_io)]
    File(FileLogger),

    /// Logs to standard output.
    Stdout,

    /// Logs to standard error.
    Stderr,

    /// Logs using the `log` crate with a specified level.
    Log(LogCrateLevel),
}

impl LoggerKind {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            #[cfg(std_io)]
            LoggerKind::File(file_logger) => file_logger.log(msg),
            LoggerKind::Stdout => println!("{msg}"),
            LoggerKind::Stderr => eprintln!("{msg}"),
            LoggerKind::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

/// Logger that writes messages to a file.
#[derive(Debug)]
#[cfg(std_io)]
struct FileLogger {
    writer: Option<BufWriter<File>>,
}

#[cfg(std_io)]
impl FileLogger {
    // Creates a new file logger. A file that can't be opened disables the logger.
    fn new(path: &PathBuf, append: bool) -> Self {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path);

        let writer = match file {
            Ok(file) => Some(BufWriter::new(file)),
            Err(err) => {
                log::warn!("Unable to open log file {}: {err}", path.display());
                None
            }
        };

        Self { writer }
    }

    // Logs a message to the file, flushing the buffer to ensure immediate write.
    fn log<S: Display>(&mut self, msg: &S) {
        if let Some(writer) = &mut self.writer {
            let result = writeln!(writer, "{msg}").and_then(|_| writer.flush());
            if let Err(err) = result {
                log::warn!("Unable to write gemm log: {err}");
            }
        }
    }
}
