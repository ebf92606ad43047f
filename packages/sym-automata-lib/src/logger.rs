use std::{
    fmt::Display,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
    sync::{Mutex, PoisonError},
};

use chrono::Local;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::config::LoggerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WAR",
            LogLevel::Error => "ERR",
        }
    }

    pub fn colored_label(&self) -> ColoredString {
        match self {
            LogLevel::Debug => self.label().bright_cyan(),
            LogLevel::Info => self.label().bright_green(),
            LogLevel::Warn => self.label().yellow(),
            LogLevel::Error => self.label().bright_red(),
        }
    }

    /// Whether a message of this level is printed by a logger set to
    /// `threshold`.
    pub fn show(&self, threshold: &LogLevel) -> bool {
        self.rank() >= threshold.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warn => 2,
            LogLevel::Error => 3,
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

/// Human facing log of a query run. Every message goes to the optional log
/// file, messages at or above the threshold also go to stderr.
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
    name: String,
    file: Option<Mutex<BufWriter<File>>>,
}

impl Logger {
    pub fn new(level: LogLevel, name: &str, log_file_path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match log_file_path {
            Some(path) => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                Some(Mutex::new(BufWriter::new(File::create(path)?)))
            }
            None => None,
        };

        Ok(Logger {
            level,
            name: name.to_string(),
            file,
        })
    }

    /// `None` when logging is disabled.
    pub fn from_config(config: &LoggerConfig, name: &str) -> anyhow::Result<Option<Self>> {
        if !*config.get_enabled() {
            return Ok(None);
        }

        let log_file_path = config.get_log_file().then(|| {
            format!(
                "./logs/{}_{}.txt",
                name.to_lowercase(),
                Local::now().format("%Y-%m-%d_%H-%M-%S")
            )
        });

        Logger::new(*config.get_log_level(), name, log_file_path.as_deref().map(Path::new)).map(Some)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.writeln_to_file(&format!("[{}] {}: {}", level.label(), self.name, message));
        if level.show(&self.level) {
            let name = format!("{}:", self.name).dimmed();
            eprintln!("[{}] {} {}", level.colored_label(), name, message);
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// A failing log file does not fail the query, the line is dropped.
    fn writeln_to_file(&self, line: &str) {
        if let Some(file) = &self.file {
            let mut f = file.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(f, "{}", line).and_then(|_| f.flush());
        }
    }

    pub fn object<'a>(&'a self, name: &'a str) -> ObjectBuilder<'a> {
        ObjectBuilder::new(name, self)
    }
}

/// Logs a named record with one field per line.
#[derive(Debug, Clone)]
pub struct ObjectBuilder<'a> {
    logger: &'a Logger,
    name: &'a str,
    fields: Vec<(String, String)>,
}

impl<'a> ObjectBuilder<'a> {
    fn new(name: &'a str, logger: &'a Logger) -> Self {
        ObjectBuilder {
            logger,
            name,
            fields: vec![],
        }
    }

    pub fn add_field(mut self, name: &str, value: impl Display) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
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
