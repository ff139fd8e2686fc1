//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `INTERNAL_DOMAIN` | required |
//! | `DATABASE_URL` | `postgres://localhost/rapport` |
//! | `HOST` / `PORT` | `0.0.0.0` / `8080` |
//! | `UPLOADS_DIR` | `./uploads` |
//! | `ALLOWED_ORIGINS` | `http://localhost:5173,http://localhost:3000` |
//! | `MAX_UPLOAD_BYTES` | 50 MiB |
//! | `DB_MAX_CONNECTIONS` | 10 |

use rapport_core::{Error, InternalDomain, Result};

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/rapport";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOADS_DIR: &str = "./uploads";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub internal_domain: InternalDomain,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub uploads_dir: String,
    /// Raw comma-separated CORS whitelist.
    pub allowed_origins: String,
    pub max_upload_bytes: usize,
    pub db_max_connections: u32,
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, v))),
    }
}

fn string_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let internal_domain = lookup("INTERNAL_DOMAIN")
            .ok_or_else(|| Error::Config("INTERNAL_DOMAIN must be set".to_string()))
            .and_then(|raw| InternalDomain::new(&raw))?;

        Ok(Self {
            internal_domain,
            database_url: string_or(&lookup, "DATABASE_URL", DEFAULT_DATABASE_URL),
            host: string_or(&lookup, "HOST", DEFAULT_HOST),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            uploads_dir: string_or(&lookup, "UPLOADS_DIR", DEFAULT_UPLOADS_DIR),
            allowed_origins: string_or(&lookup, "ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            db_max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
        })
    }

    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("INTERNAL_DOMAIN", "Example.com")])).unwrap();
        assert_eq!(config.internal_domain.as_str(), "example.com");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.uploads_dir, DEFAULT_UPLOADS_DIR);
        assert_eq!(config.allowed_origins, DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    }

    #[test]
    fn test_internal_domain_required() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = AppConfig::from_lookup(lookup(&[("INTERNAL_DOMAIN", "   ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("INTERNAL_DOMAIN", "corp.io"),
            ("PORT", "9000"),
            ("HOST", "127.0.0.1"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("UPLOADS_DIR", "/var/lib/rapport"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.uploads_dir, "/var/lib/rapport");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("INTERNAL_DOMAIN", "corp.io"),
            ("PORT", " "),
            ("DATABASE_URL", ""),
        ]))
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("INTERNAL_DOMAIN", "corp.io"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("PORT")));
    }
}
