use std::{
    fmt::Display,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    str::FromStr,
    sync::Mutex,
};

use chrono::Local;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::config::LoggerConfig;

/// Ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn tag(&self) -> ColoredString {
        match self {
            LogLevel::Debug => "DBG".bright_cyan(),
            LogLevel::Info => "INF".bright_green(),
            LogLevel::Warn => "WAR".yellow(),
            LogLevel::Error => "ERR".bright_red(),
        }
    }

    pub fn tag_no_color(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WAR",
            LogLevel::Error => "ERR",
        }
    }

    /// Whether a message of level `self` passes a logger set to `threshold`.
    pub fn passes(&self, threshold: LogLevel) -> bool {
        *self >= threshold
    }

    /// The matching `tracing` level, for setting up a subscriber.
    pub fn to_tracing(&self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "info" | "inf" => Ok(LogLevel::Info),
            "warn" | "warning" | "war" => Ok(LogLevel::Warn),
            "error" | "err" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "Debug"),
            LogLevel::Info => write!(f, "Info"),
            LogLevel::Warn => write!(f, "Warn"),
            LogLevel::Error => write!(f, "Error"),
        }
    }
}

/// Prefixed, level filtered stderr logger. When a log file is attached, every
/// message is written to it regardless of level, without colors.
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
    name: String,
    file: Option<Mutex<BufWriter<File>>>,
}

impl Logger {
    pub fn new(level: LogLevel, name: String) -> Self {
        Logger {
            level,
            name,
            file: None,
        }
    }

    pub fn with_log_file<P: AsRef<Path>>(mut self, path: P) -> io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.file = Some(Mutex::new(BufWriter::new(file)));
        Ok(self)
    }

    /// Returns `None` when logging is disabled. With `log_file` set, messages
    /// are also appended to `./logs/mealy_moore_<timestamp>.txt`.
    pub fn from_config(config: &LoggerConfig, name: String) -> io::Result<Option<Self>> {
        if !*config.get_enabled() {
            return Ok(None);
        }

        let logger = Logger::new(*config.get_log_level(), name);
        if !*config.get_log_file() {
            return Ok(Some(logger));
        }

        let path = format!(
            "./logs/mealy_moore_{}.txt",
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        );
        logger.with_log_file(path).map(Some)
    }

    fn prefix(&self, level: LogLevel) -> String {
        format!("[{}] {}", level.tag(), format!("{}:", self.name).dimmed())
    }

    fn prefix_no_color(&self, level: LogLevel) -> String {
        format!("[{}] {}:", level.tag_no_color(), self.name)
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.writeln_to_file(&format!("{} {}", self.prefix_no_color(level), message));
        if level.passes(self.level) {
            eprintln!("{} {}", self.prefix(level), message);
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    // A failing log file must not abort a conversion, so write errors are
    // dropped here.
    fn writeln_to_file(&self, line: &str) {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = writeln!(f, "{}", line);
        }
    }

    pub fn object<'a>(&'a self, name: &'a str) -> ObjectBuilder<'a> {
        ObjectBuilder::new(name, self)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.flush();
        }
    }
}

/// Logs a named record as one multi-line message:
///
/// ```text
/// name {
///   field: value
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ObjectBuilder<'a> {
    logger: &'a Logger,
    name: &'a str,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObjectBuilder<'a> {
    fn new(name: &'a str, logger: &'a Logger) -> Self {
        ObjectBuilder {
            logger,
            name,
            fields: vec![],
        }
    }

    pub fn add_field(mut self, name: &'a str, value: impl Display) -> Self {
        self.fields.push((name, value.to_string()));
        self
    }

    fn build(&self) -> String {
        let mut result = format!("{} {{", self.name);
        for (name, value) in &self.fields {
            result.push_str(&format!("\n  {}: {}", name, value));
        }
        result.push_str("\n}");
        result
    }

    pub fn log(&self, level: LogLevel) {
        self.logger.log(level, &self.build());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_threshold() {
        assert!(LogLevel::Error.passes(LogLevel::Warn));
        assert!(LogLevel::Warn.passes(LogLevel::Warn));
        assert!(!LogLevel::Info.passes(LogLevel::Warn));
        assert!(LogLevel::Debug.passes(LogLevel::Debug));
    }

    #[test]
    fn level_from_str() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("dbg".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn disabled_config_has_no_logger() {
        let logger = Logger::from_config(&LoggerConfig::default(), "test".into()).unwrap();
        assert!(logger.is_none());
    }

    #[test]
    fn file_receives_every_level() {
        let path =
            std::env::temp_dir().join(format!("mealy_moore_logger_{}.txt", std::process::id()));
        {
            let logger = Logger::new(LogLevel::Error, "test".into())
                .with_log_file(&path)
                .unwrap();
            logger.debug("parsed");
            logger.info("converted");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(content, "[DBG] test: parsed\n[INF] test: converted\n");
    }

    #[test]
    fn object_format() {
        let logger = Logger::new(LogLevel::Error, "test".into());
        let object = logger
            .object("conversion")
            .add_field("states", 3)
            .add_field("start", "q0");
        assert_eq!(object.build(), "conversion {\n  states: 3\n  start: q0\n}");
    }
}
