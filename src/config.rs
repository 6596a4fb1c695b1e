// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Marketplace service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend name ("memory" or "postgres")
    pub backend: String,

    /// Postgres connection string (required for the postgres backend)
    pub database_url: Option<String>,

    /// Connection pool size
    pub max_connections: u32,

    /// Seed the in-memory store with demo catalog data
    pub seed_demo_data: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let storage_config = StorageConfig {
            backend: env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        };

        if storage_config.backend == "postgres" && storage_config.database_url.is_none() {
            return Err(AppError::Config(
                "Missing DATABASE_URL environment variable for postgres backend".to_string(),
            ));
        }

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env::var("LOG_TO_FILE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        Ok(Config {
            storage: storage_config,
            logging: logging_config,
        })
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| AppError::Config(format!("Failed to open config file: {}", e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| AppError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        // Configure output
        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path)
                    .map_err(|e| AppError::Config(format!("Failed to create log file: {}", e)))?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        // Initialize the logger
        builder.init();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                backend: "memory".to_string(),
                database_url: None,
                max_connections: 5,
                seed_demo_data: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
        }
    }
}
