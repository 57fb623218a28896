use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub mongo_uri: String,
    pub mongo_db: String,
    pub bind_address: String,
    pub rest_port: u16,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_db: "authbook".to_string(),
            bind_address: "127.0.0.1".to_string(),
            rest_port: 8085,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid by the JSON file named in `AUTHBOOK_CONFIG`, overlaid
    /// by individual environment variables.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("AUTHBOOK_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading config from: {:?}", path);
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: AppConfig =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("MONGO_URI") {
            self.mongo_uri = uri;
        }
        if let Some(db) = lookup("MONGO_DB") {
            self.mongo_db = db;
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Some(port) = lookup("REST_PORT") {
            self.rest_port = port.parse().context("REST_PORT must be a port number")?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.mongo_db, "authbook");
        assert_eq!(config.rest_port, 8085);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("MONGO_DB", "creds"), ("REST_PORT", "9000")].into();
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.mongo_db, "creds");
        assert_eq!(config.rest_port, 9000);
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| (key == "REST_PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"rest_port": 7000}"#).unwrap();
        assert_eq!(config.rest_port, 7000);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
