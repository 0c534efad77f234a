// Configuration types module
// Defines all configuration-related data structures

use crate::http::cache::CacheStrategy;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub root: RootConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Root directory configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RootConfig {
    /// Directory to serve; canonicalized at startup
    pub directory: String,
}

/// Cache validation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Validator strategy: `etag` (content digest) or `last-modified`
    pub strategy: CacheStrategy,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Honor accept-encoding and compress file responses
    pub compression: bool,
    pub keep_alive_timeout: u64,
    /// Seconds a connection may idle waiting for a request's headers
    pub read_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
            },
            root: RootConfig {
                directory: ".".to_string(),
            },
            cache: CacheConfig {
                strategy: CacheStrategy::Etag,
            },
            http: HttpConfig {
                compression: true,
                keep_alive_timeout: 75,
                read_timeout: 30,
            },
            logging: LoggingConfig {
                access_log: true,
                access_log_file: None,
                error_log_file: None,
            },
        }
    }
}
