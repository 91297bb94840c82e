use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ssl: SslConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    pub port: u16,
    #[serde(default = "default_threads")]
    pub threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SslConfig {
    pub certificate_file: PathBuf,
    pub private_key_file: PathBuf,
    /// Checked for existence only; the TLS stack owns key-exchange policy.
    pub dh_params_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub address: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub db_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Pool acquire timeout, seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret_key: String,
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry_minutes: i64,
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub access_log: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub console_output: bool,
    #[serde(default = "default_true")]
    pub log_access: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            access_log: None,
            error_log: None,
            console_output: true,
            log_access: true,
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_threads() -> usize {
    4
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_access_expiry() -> i64 {
    15
}

fn default_refresh_expiry() -> i64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warning", "error", "fatal"];

const MAX_THREADS: usize = 1024;

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 || self.server.port == u16::MAX {
            return Err(ConfigError::Invalid(format!(
                "server.port must be within [1, 65535), got {}",
                self.server.port
            )));
        }
        if self.server.threads == 0 || self.server.threads > MAX_THREADS {
            return Err(ConfigError::Invalid(format!(
                "server.threads must be within [1, {MAX_THREADS}], got {}",
                self.server.threads
            )));
        }

        require_file("ssl.certificate_file", &self.ssl.certificate_file)?;
        require_file("ssl.private_key_file", &self.ssl.private_key_file)?;
        if let Some(dh_params) = &self.ssl.dh_params_file {
            require_file("ssl.dh_params_file", dh_params)?;
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.jwt.secret_key.is_empty() {
            return Err(ConfigError::Invalid(
                "jwt.secret_key must not be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {LOG_LEVELS:?}, got {:?}",
                self.logging.level
            )));
        }

        Ok(())
    }
}

impl LoggingConfig {
    /// Map the configured level onto a tracing directive.
    pub fn tracing_level(&self) -> &'static str {
        match self.level.as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warning" => "warn",
            "error" | "fatal" => "error",
            _ => "info",
        }
    }
}

fn require_file(key: &str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{key} does not exist or is not a file: {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_json(dir: &tempfile::TempDir, port: u16, threads: usize) -> String {
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::File::create(&cert).unwrap().write_all(b"cert").unwrap();
        std::fs::File::create(&key).unwrap().write_all(b"key").unwrap();
        format!(
            r#"{{
                "server": {{ "address": "127.0.0.1", "port": {port}, "threads": {threads} }},
                "ssl": {{ "certificate_file": {cert:?}, "private_key_file": {key:?} }},
                "database": {{
                    "address": "localhost", "port": 5432,
                    "username": "chat", "password": "chat", "db_name": "chat"
                }},
                "jwt": {{ "secret_key": "0123456789abcdef0123456789abcdef" }}
            }}"#,
            cert = cert.display().to_string(),
            key = key.display().to_string(),
        )
    }

    fn load_from(dir: &tempfile::TempDir, body: &str) -> Result<AppConfig, ConfigError> {
        let path = dir.path().join("config.json");
        std::fs::write(&path, body).unwrap();
        AppConfig::load(&path)
    }

    #[test]
    fn valid_document_loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir, &config_json(&dir, 8443, 4)).unwrap();
        assert_eq!(config.server.address, "127.0.0.1");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.access_token_expiry_minutes, 15);
        assert_eq!(config.jwt.refresh_token_expiry_days, 7);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.console_output);
    }

    #[test]
    fn port_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir, &config_json(&dir, 1, 4)).is_ok());
        assert!(load_from(&dir, &config_json(&dir, 65534, 4)).is_ok());
        assert!(load_from(&dir, &config_json(&dir, 0, 4)).is_err());
        assert!(load_from(&dir, &config_json(&dir, 65535, 4)).is_err());
    }

    #[test]
    fn thread_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir, &config_json(&dir, 8443, 1)).is_ok());
        assert!(load_from(&dir, &config_json(&dir, 8443, 1024)).is_ok());
        assert!(load_from(&dir, &config_json(&dir, 8443, 0)).is_err());
        assert!(load_from(&dir, &config_json(&dir, 8443, 1025)).is_err());
    }

    #[test]
    fn missing_tls_material_fails() {
        let dir = tempfile::tempdir().unwrap();
        let body = config_json(&dir, 8443, 4).replace("cert.pem", "missing-cert.pem");
        assert!(load_from(&dir, &body).is_err());
    }

    #[test]
    fn missing_required_section_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir, r#"{ "server": { "port": 8443 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_log_level_fails() {
        let dir = tempfile::tempdir().unwrap();
        let body = config_json(&dir, 8443, 4).replace(
            r#""jwt": {"#,
            r#""logging": { "level": "verbose" }, "jwt": {"#,
        );
        assert!(load_from(&dir, &body).is_err());
    }

    #[test]
    fn level_maps_onto_tracing_directives() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.tracing_level(), "info");
        logging.level = "warning".into();
        assert_eq!(logging.tracing_level(), "warn");
        logging.level = "fatal".into();
        assert_eq!(logging.tracing_level(), "error");
    }
}
