//! Configuration management for the invoice server

use serde::Deserialize;
use std::env;

use crate::pdf::ExtractionLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub extraction: ExtractionConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub path: String,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub max_pages: usize,
    pub max_chars: usize,
    /// Substitute canned invoice text when a PDF cannot be decoded at all
    pub sample_fallback: bool,
}

impl ExtractionConfig {
    pub fn limits(&self) -> ExtractionLimits {
        ExtractionLimits {
            max_pages: self.max_pages,
            max_chars: self.max_chars,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Missing required variable: {0}")]
    Missing(&'static str),

    #[error("EXTRACT_SAMPLE_FALLBACK cannot be enabled in production")]
    SampleFallbackInProduction,
}

pub const DEFAULT_MAX_PAGES: usize = 5;
pub const DEFAULT_MAX_CHARS: usize = 100_000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                cors_origins: Vec::new(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                path: "./data/pdfs".to_string(),
                s3: None,
            },
            database: DatabaseConfig {
                url: "sqlite:./invoices.db".to_string(),
                max_connections: 5,
            },
            extraction: ExtractionConfig {
                max_pages: DEFAULT_MAX_PAGES,
                max_chars: DEFAULT_MAX_CHARS,
                sample_fallback: false,
            },
            model: ModelConfig {
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                timeout_secs: 60,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var("APP_ENV").as_deref() {
            None | Some("development") | Some("dev") | Some("test") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "APP_ENV",
                    value: other.to_string(),
                })
            }
        };

        let backend = match var("STORAGE_BACKEND").as_deref() {
            None | Some("local") => StorageBackend::Local,
            Some("s3") => StorageBackend::S3,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let s3 = if backend == StorageBackend::S3 {
            Some(S3Config {
                endpoint: var("S3_ENDPOINT").ok_or(ConfigError::Missing("S3_ENDPOINT"))?,
                bucket: var("S3_BUCKET").ok_or(ConfigError::Missing("S3_BUCKET"))?,
                access_key: var("S3_ACCESS_KEY").ok_or(ConfigError::Missing("S3_ACCESS_KEY"))?,
                secret_key: var("S3_SECRET_KEY").ok_or(ConfigError::Missing("S3_SECRET_KEY"))?,
                region: var("S3_REGION"),
            })
        } else {
            None
        };

        let config = Config {
            environment,
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or("SERVER_PORT", var("SERVER_PORT"), 3001)?,
                cors_origins: var("CORS_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            storage: StorageConfig {
                backend,
                path: var("STORAGE_PATH").unwrap_or_else(|| "./data/pdfs".to_string()),
                s3,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").unwrap_or_else(|| "sqlite:./invoices.db".to_string()),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", var("DATABASE_MAX_CONNECTIONS"), 5)?,
            },
            extraction: ExtractionConfig {
                max_pages: parse_positive("EXTRACT_MAX_PAGES", var("EXTRACT_MAX_PAGES"), DEFAULT_MAX_PAGES)?,
                max_chars: parse_positive("EXTRACT_MAX_CHARS", var("EXTRACT_MAX_CHARS"), DEFAULT_MAX_CHARS)?,
                sample_fallback: parse_bool("EXTRACT_SAMPLE_FALLBACK", var("EXTRACT_SAMPLE_FALLBACK"))?,
            },
            model: ModelConfig {
                api_key: var("GEMINI_API_KEY"),
                model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                timeout_secs: parse_positive("MODEL_TIMEOUT_SECS", var("MODEL_TIMEOUT_SECS"), 60)?,
            },
        };

        if config.environment == Environment::Production && config.extraction.sample_fallback {
            return Err(ConfigError::SampleFallbackInProduction);
        }

        Ok(config)
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn parse_positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + ToString,
{
    let value = parse_or(name, raw, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(name: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some(_) => Err(ConfigError::InvalidValue {
            name,
            value: raw.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.extraction.max_pages, 5);
        assert_eq!(config.extraction.max_chars, 100_000);
        assert!(!config.extraction.sample_fallback);
        assert!(config.model.api_key.is_none());
        assert_eq!(config.storage.backend, StorageBackend::Local);
    }

    #[test]
    fn test_extraction_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("EXTRACT_MAX_PAGES", "2"),
            ("EXTRACT_MAX_CHARS", "500"),
            ("EXTRACT_SAMPLE_FALLBACK", "true"),
            ("GEMINI_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.extraction.max_pages, 2);
        assert_eq!(config.extraction.max_chars, 500);
        assert!(config.extraction.sample_fallback);
        assert_eq!(config.model.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_rejects_invalid_limits() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("EXTRACT_MAX_PAGES", "0")])),
            Err(ConfigError::InvalidValue { name: "EXTRACT_MAX_PAGES", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("EXTRACT_MAX_CHARS", "lots")])),
            Err(ConfigError::InvalidValue { name: "EXTRACT_MAX_CHARS", .. })
        ));
    }

    #[test]
    fn test_sample_fallback_refused_in_production() {
        let result = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("EXTRACT_SAMPLE_FALLBACK", "1"),
        ]));
        assert!(matches!(result, Err(ConfigError::SampleFallbackInProduction)));
    }

    #[test]
    fn test_s3_requires_bucket() {
        let result = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_ENDPOINT", "http://localhost:9000"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("S3_BUCKET"))));
    }

    #[test]
    fn test_cors_origins_split() {
        let config = Config::from_lookup(lookup(&[(
            "CORS_ORIGINS",
            "http://localhost:3000, https://invoices.example.com",
        )]))
        .unwrap();
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:3000", "https://invoices.example.com"]
        );
    }
}
