use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::processor::ProcessorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("papermill.db")
}

/// Uploaded document storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory where uploaded documents are kept on disk.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

/// Parsing engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Directory containing the parsing-engine model artifacts.
    /// Every regular file in this directory is loaded into the model handle
    /// at startup; a missing directory is fatal.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    /// Subprocess engine configuration.
    #[serde(default)]
    pub command: CommandConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            command: CommandConfig::default(),
        }
    }
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

/// Configuration for the subprocess-backed parsing engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandConfig {
    /// Engine executable. Receives the document on stdin and must write a
    /// JSON result document to stdout.
    #[serde(default = "default_engine_program")]
    pub program: String,
    /// Extra arguments passed to the engine executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Hard limit on a single engine invocation (seconds).
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            args: Vec::new(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

fn default_engine_program() -> String {
    "marker-engine".to_string()
}

fn default_engine_timeout() -> u64 {
    300
}

/// Shared worker pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Hard ceiling on concurrent model-backed document conversions.
    /// Both batch calls and background tasks draw from the same pool.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

fn default_max_workers() -> usize {
    5
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub engine: SanitizedEngineConfig,
    pub processor: ProcessorConfig,
    pub pool: PoolConfig,
}

/// Engine config view (argument list elided, it may embed tokens)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEngineConfig {
    pub model_dir: PathBuf,
    pub program: String,
    pub args_configured: usize,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            engine: SanitizedEngineConfig {
                model_dir: config.engine.model_dir.clone(),
                program: config.engine.command.program.clone(),
                args_configured: config.engine.command.args.len(),
                timeout_secs: config.engine.command.timeout_secs,
            },
            processor: config.processor.clone(),
            pool: config.pool.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "papermill.db");
        assert_eq!(config.storage.upload_dir.to_str().unwrap(), "uploads");
        assert_eq!(config.pool.max_workers, 5);
        assert_eq!(config.engine.command.timeout_secs, 300);
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/papermill.sqlite"

[engine.command]
program = "my-engine"
args = ["--fast"]
timeout_secs = 60

[pool]
max_workers = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/data/papermill.sqlite"
        );
        assert_eq!(config.engine.command.program, "my-engine");
        assert_eq!(config.engine.command.args, vec!["--fast".to_string()]);
        assert_eq!(config.engine.command.timeout_secs, 60);
        assert_eq!(config.pool.max_workers, 2);
    }

    #[test]
    fn test_sanitized_config_elides_args() {
        let mut config = Config::default();
        config.engine.command.args = vec!["--api-key".to_string(), "secret".to_string()];

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.engine.args_configured, 2);
        assert_eq!(sanitized.engine.program, "marker-engine");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
