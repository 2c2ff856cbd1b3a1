//! Environment-based configuration module
//!
//! Configuration can be set via:
//! 1. Environment variables (highest priority)
//! 2. Default values

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Get environment from APP_ENV variable or default to Development
    pub fn from_env() -> Self {
        match env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()).as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app_name: String,
    pub version: String,
    pub database: DatabaseConfig,
    pub payroll: PayrollConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path (relative to app data dir)
    pub path: String,

    /// Maximum number of connections
    pub max_connections: u32,

    /// Minimum number of connections
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

/// Konstanta penggajian yang dipakai dashboard/laporan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollConfig {
    /// Asumsi hari kerja per bulan (dipakai estimasi jam lembur)
    pub assumed_work_days: i64,

    /// Jam kerja per hari
    pub work_hours_per_day: i64,

    /// Alasan default saat Manager HR menolak slip tanpa alasan
    pub default_rejection_reason: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log to stdout
    pub log_to_stdout: bool,

    /// Use JSON format (true for production)
    pub json_format: bool,

    /// Maximum log file size in MB
    pub max_file_size_mb: u64,

    /// Maximum number of log files to keep
    pub max_log_files: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env_mode = Environment::from_env();

        Self {
            environment: env_mode,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Payroll Sarana".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            database: DatabaseConfig {
                path: env::var("DB_PATH").unwrap_or_else(|_| "payroll.db".to_string()),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                connect_timeout_secs: 30,
                idle_timeout_secs: 600,
            },

            payroll: PayrollConfig {
                assumed_work_days: env::var("PAYROLL_WORK_DAYS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(22),
                work_hours_per_day: env::var("PAYROLL_WORK_HOURS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8),
                default_rejection_reason: env::var("PAYROLL_DEFAULT_REJECTION_REASON")
                    .unwrap_or_else(|_| "Rejected by Manager HR".to_string()),
            },

            logging: LoggingConfig {
                level: env::var("RUST_LOG").unwrap_or_else(|_| {
                    if env_mode.is_production() { "warn".to_string() } else { "debug".to_string() }
                }),
                log_to_file: true,
                log_to_stdout: env::var("LOG_TO_STDOUT")
                    .map(|s| s == "true")
                    .unwrap_or(true),
                json_format: env_mode.is_production(),
                max_file_size_mb: 10,
                max_log_files: 5,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Self {
        Self::default()
    }

    /// Get the log directory path
    pub fn get_log_dir(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join("logs")
    }

    /// Get the database path
    pub fn get_database_path(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join(&self.database.path)
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

/// Global configuration instance
static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global configuration
pub fn init_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::load)
}

/// Get the global configuration (initializes with defaults on first use)
pub fn get_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::load)
}
