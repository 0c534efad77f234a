// Configuration module entry point
// Loads configuration from file, environment and command-line overrides

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{CacheConfig, Config, HttpConfig, LoggingConfig, RootConfig, ServerConfig};

/// Command-line overrides for the most common settings
///
/// Flags mirror the classic `http-server` style: `-p/--port` and
/// `-d/--directory`, defaulting to 8080 and the working directory.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub directory: Option<String>,
}

impl CliOverrides {
    /// Parse overrides from the argument list (without the program name)
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut overrides = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-p" | "--port" => {
                    let value = args
                        .next()
                        .ok_or_else(|| "missing value for --port".to_string())?;
                    overrides.port =
                        Some(value.parse().map_err(|_| format!("invalid port: {value}"))?);
                }
                "-d" | "--directory" => {
                    overrides.directory = Some(
                        args.next()
                            .ok_or_else(|| "missing value for --directory".to_string())?,
                    );
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(overrides)
    }
}

impl Config {
    /// Load configuration from `staticd.toml` (optional), `STATICD_*`
    /// environment variables and built-in defaults, then apply CLI overrides
    pub fn load(cli: &CliOverrides) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("staticd").required(false))
            .add_source(config::Environment::with_prefix("STATICD"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("root.directory", ".")?
            .set_default("cache.strategy", "etag")?
            .set_default("http.compression", true)?
            .set_default("http.keep_alive_timeout", 75)?
            .set_default("http.read_timeout", 30)?
            .set_default("logging.access_log", true)?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        if let Some(port) = cli.port {
            cfg.server.port = port;
        }
        if let Some(ref directory) = cli.directory {
            cfg.root.directory.clone_from(directory);
        }
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
