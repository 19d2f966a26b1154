//! Diagnostic sink for the `log` facade.
//!
//! Every adapter call logs through `log::*!` macros; this backend decides
//! where those lines go: colored console for development, JSON lines (and
//! optionally an append-only file) for operators.

use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::StabilityConfig;

static DIAGNOSTIC_LOGGER: Lazy<DiagnosticLogger> = Lazy::new(DiagnosticLogger::new);

pub fn init_with_config(config: LoggerConfig) -> Result<(), SetLoggerError> {
    let max_level = config.min_level;
    DIAGNOSTIC_LOGGER.update_config(config);
    log::set_logger(&*DIAGNOSTIC_LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::Trace => "🔍",
        Level::Debug => "🐛",
        Level::Info => "💡",
        Level::Warn => "⚠️",
        Level::Error => "❌",
    }
}

/// One diagnostic line in its JSON shape.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: &'static str,
    pub message: String,
    pub target: String,
    pub location: Option<String>,
    #[serde(skip)]
    severity: Level,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().as_str(),
            message: record.args().to_string(),
            target: record.target().to_string(),
            location: record
                .file()
                .map(|file| format!("{}:{}", file, record.line().unwrap_or(0))),
            severity: record.level(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: true,
            show_emojis: true,
            show_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            show_location: true,
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_file_path: Some("rstability.log".to_string()),
            ..Default::default()
        }
    }

    /// Picks a profile from `RSTABILITY_LOG` (`production` or anything else
    /// for development) and applies `RSTABILITY_LOG_LEVEL`,
    /// `RSTABILITY_LOG_FILE` and `RSTABILITY_LOG_JSON` on top.
    pub fn from_env() -> Self {
        let mut config = match env::var("RSTABILITY_LOG").as_deref() {
            Ok("production") => Self::production(),
            _ => Self::development(),
        };
        if let Some(level) = env::var("RSTABILITY_LOG_LEVEL")
            .ok()
            .and_then(|l| l.parse::<LevelFilter>().ok())
        {
            config = config.with_level(level);
        }
        if let Ok(path) = env::var("RSTABILITY_LOG_FILE") {
            config = config.with_file_output(path);
        }
        if let Ok(json) = env::var("RSTABILITY_LOG_JSON") {
            config = config.with_json_output(json == "true" || json == "1");
        }
        config
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_file_output(mut self, path: impl Into<String>) -> Self {
        self.log_file_path = Some(path.into());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }
}

pub struct DiagnosticLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl DiagnosticLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        let file = new_config.log_file_path.as_ref().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eprintln!("rstability: cannot open log file {}: {}", path, e))
                .ok()
        });
        if let Ok(mut log_file) = self.log_file.lock() {
            *log_file = file;
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn console_line(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = if config.show_emojis {
            format!("{} {}", level_emoji(entry.severity), entry.level)
        } else {
            entry.level.to_string()
        };
        let location = match (&entry.location, config.show_location) {
            (Some(location), true) => format!(" ({})", location),
            _ => String::new(),
        };

        if config.show_colors {
            format!(
                "{} [{}] {}: {}{}",
                timestamp.bright_black(),
                level.color(level_color(entry.severity)).bold(),
                entry.target.bright_blue(),
                entry.message,
                location.bright_black()
            )
        } else {
            format!(
                "{} [{}] {}: {}{}",
                timestamp, level, entry.target, entry.message, location
            )
        }
    }

    fn render(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_default()
        } else {
            self.console_line(entry, config)
        }
    }

    fn write_to_file(&self, entry: &LogEntry, config: &LoggerConfig) {
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                // Files never get ANSI escapes.
                let plain = LoggerConfig {
                    show_colors: false,
                    ..config.clone()
                };
                let line = self.render(entry, &plain) + "\n";
                let _ = file.write_all(line.as_bytes());
            }
        }
    }
}

impl log::Log for DiagnosticLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level,
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);
        if let Ok(config) = self.config.lock() {
            println!("{}", self.render(&entry, &config));
            self.write_to_file(&entry, &config);
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a scope took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  {} started", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!(
            "⏱️  {} finished in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

/// Logs the effective client configuration. The API key is reported only as
/// present or absent.
pub fn log_config_info(config: &StabilityConfig) {
    log::info!("⚙️  Stability client configuration:");
    log::info!("   Base URL: {}", config.base_url);
    log::info!("   User agent: {}", config.user_agent);
    log::info!(
        "   Default API key: {}",
        if config.api_key.is_some() { "✅" } else { "❌" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: Level, message: &str) -> LogEntry {
        LogEntry {
            id: "id".to_string(),
            timestamp: Utc::now(),
            level: level.as_str(),
            message: message.to_string(),
            target: "rstability::stability".to_string(),
            location: Some("src/stability/image_client.rs:42".to_string()),
            severity: level,
        }
    }

    fn plain() -> LoggerConfig {
        LoggerConfig {
            show_colors: false,
            show_emojis: false,
            show_location: true,
            timestamp_format: "T".to_string(),
            ..LoggerConfig::default()
        }
    }

    #[test]
    fn test_level_decorations() {
        assert_eq!(level_emoji(Level::Error), "❌");
        assert_eq!(level_color(Level::Debug), Color::Blue);
    }

    #[test]
    fn test_profiles() {
        let dev = LoggerConfig::development();
        assert_eq!(dev.min_level, LevelFilter::Debug);
        assert!(dev.show_colors);
        assert!(dev.log_file_path.is_none());

        let prod = LoggerConfig::production();
        assert!(!prod.show_colors);
        assert!(prod.output_json);
        assert_eq!(prod.log_file_path.as_deref(), Some("rstability.log"));
    }

    #[test]
    fn test_env_profile_selection() {
        env::set_var("RSTABILITY_LOG", "production");
        env::set_var("RSTABILITY_LOG_LEVEL", "warn");
        env::set_var("RSTABILITY_LOG_FILE", "ops.log");
        env::set_var("RSTABILITY_LOG_JSON", "0");
        let config = LoggerConfig::from_env();
        for key in [
            "RSTABILITY_LOG",
            "RSTABILITY_LOG_LEVEL",
            "RSTABILITY_LOG_FILE",
            "RSTABILITY_LOG_JSON",
        ] {
            env::remove_var(key);
        }

        assert_eq!(config.min_level, LevelFilter::Warn);
        assert_eq!(config.log_file_path.as_deref(), Some("ops.log"));
        assert!(!config.output_json);
        assert!(!config.show_colors);

        let dev = LoggerConfig::from_env();
        assert_eq!(dev.min_level, LevelFilter::Debug);
        assert!(dev.log_file_path.is_none());
    }

    #[test]
    fn test_plain_console_line() {
        let logger = DiagnosticLogger::new();
        let line = logger.console_line(&entry(Level::Error, "boom"), &plain());
        assert_eq!(
            line,
            "T [ERROR] rstability::stability: boom (src/stability/image_client.rs:42)"
        );
    }

    #[test]
    fn test_json_render() {
        let logger = DiagnosticLogger::new();
        let config = plain().with_json_output(true);
        let line = logger.render(&entry(Level::Info, "done"), &config);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["message"], "done");
        assert!(value.get("severity").is_none());
    }

    #[test]
    fn test_file_sink_appends_plain_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.log");
        let logger = DiagnosticLogger::new();
        let config = LoggerConfig::default().with_file_output(path.to_str().unwrap());
        logger.update_config(config.clone());
        logger.write_to_file(&entry(Level::Warn, "slow provider"), &config);
        log::Log::flush(&logger);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("slow provider"));
        assert!(!written.contains('\u{1b}'));
    }

    #[test]
    fn test_logger_initialization() {
        let config = LoggerConfig::development().with_level(LevelFilter::Trace);
        assert!(init_with_config(config).is_ok());
    }
}
