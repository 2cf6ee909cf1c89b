//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "dealerline.toml",
    "./config/config.toml",
    "/etc/dealerline/config.toml",
];

const ENV_CONFIG_PATH: &str = "DEALERLINE_CONFIG";

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) but reads variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::EnvError(format!("{}={}: {}", key, raw, e))),
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = parse_var(lookup, "DEALERLINE_HTTP_PORT")? {
        config.http.port = port;
    }
    if let Some(val) = lookup("DEALERLINE_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("DEALERLINE_CORS_ORIGINS") {
        config.http.cors_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // MongoDB
    if let Some(val) = lookup("DEALERLINE_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("DEALERLINE_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Storage
    if let Some(backend) = parse_var(lookup, "DEALERLINE_STORAGE_BACKEND")? {
        config.storage.backend = backend;
    }

    // Auth
    if let Some(val) = lookup("DEALERLINE_JWT_SECRET") {
        config.auth.jwt_secret = val;
    }
    if let Some(val) = lookup("DEALERLINE_JWT_ISSUER") {
        config.auth.issuer = val;
    }
    if let Some(val) = lookup("DEALERLINE_JWT_AUDIENCE") {
        config.auth.audience = val;
    }
    if let Some(ttl) = parse_var(lookup, "DEALERLINE_ACCESS_TOKEN_TTL_SECS")? {
        config.auth.access_token_ttl_secs = ttl;
    }
    if let Some(ttl) = parse_var(lookup, "DEALERLINE_REFRESH_TOKEN_TTL_SECS")? {
        config.auth.refresh_token_ttl_secs = ttl;
    }
    if let Some(len) = parse_var(lookup, "DEALERLINE_PASSWORD_MIN_LENGTH")? {
        config.auth.password_min_length = len;
    }

    // Bootstrap
    if let Some(val) = lookup("DEALERLINE_ADMIN_EMAIL") {
        config.bootstrap.admin_email = Some(val);
    }
    if let Some(val) = lookup("DEALERLINE_ADMIN_PASSWORD") {
        config.bootstrap.admin_password = Some(val);
    }
    if let Some(seed) = parse_var(lookup, "DEALERLINE_SEED_DEMO_DATA")? {
        config.bootstrap.seed_demo_data = seed;
    }

    // General
    if let Some(dev) = parse_var(lookup, "DEALERLINE_DEV_MODE")? {
        config.dev_mode = dev;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageBackend;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9000\n\n[auth]\njwt_secret = \"from-file\"").unwrap();

        let loader = ConfigLoader::with_path(file.path());
        let config = loader
            .load_with(vars(&[
                ("DEALERLINE_HTTP_PORT", "9100"),
                ("DEALERLINE_STORAGE_BACKEND", "memory"),
                ("DEALERLINE_CORS_ORIGINS", "http://a.test, http://b.test,"),
            ]))
            .unwrap();

        assert_eq!(config.http.port, 9100);
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.http.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_config_path_from_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dev_mode = true\n\n[mongodb]\ndatabase = \"lot42\"").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = ConfigLoader::new()
            .load_with(vars(&[("DEALERLINE_CONFIG", path.as_str())]))
            .unwrap();

        assert!(config.dev_mode);
        assert_eq!(config.mongodb.database, "lot42");
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result = ConfigLoader::with_path("/nonexistent/dealerline.toml")
            .load_with(vars(&[("DEALERLINE_DEV_MODE", "true"), ("DEALERLINE_HTTP_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let result = ConfigLoader::with_path("/nonexistent/dealerline.toml").load_with(vars(&[]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
