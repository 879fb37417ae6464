use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(name = "memopad", about = "Terminal memo pad", version)]
pub struct AppConfig {
    /// SQLite database holding the memos (default: ~/.memopad/memos.db)
    #[arg(long = "db", env = "MEMOPAD_DB")]
    pub db: Option<PathBuf>,

    /// Log file (default: memopad.log in the system temp dir)
    #[arg(long = "log-file", env = "MEMOPAD_LOG")]
    pub log_file: Option<PathBuf>,

    /// Minimum level written to the log file
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Disable the log file entirely
    #[arg(long = "no-logs", default_value_t = false)]
    pub no_logs: bool,

    /// Show memo content as plain text instead of styled markdown
    #[arg(long = "plain", default_value_t = false)]
    pub plain: bool,
}

impl AppConfig {
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".memopad").join("memos.db")
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("memopad.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::parse_from(["memopad"]);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.no_logs);
        assert!(!config.plain);
        assert!(config.db_path().ends_with(".memopad/memos.db"));
    }

    #[test]
    fn explicit_paths_win() {
        let config = AppConfig::parse_from([
            "memopad",
            "--db",
            "/tmp/x.db",
            "--log-file",
            "/tmp/x.log",
            "--log-level",
            "debug",
        ]);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/x.log"));
        assert_eq!(tracing::Level::from(config.log_level), tracing::Level::DEBUG);
    }
}
