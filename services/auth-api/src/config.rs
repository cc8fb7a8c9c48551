//! Configuration for the Auth API service.

use keyward_auth_core::{AuthConfig, KeyError, RsaKeyPair};
use std::path::PathBuf;
use std::time::Duration;

/// Where one half of the signing keypair comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PemSource {
    /// PEM text held in an environment variable
    Inline(String),
    /// Path to a PEM file
    File(PathBuf),
}

impl PemSource {
    fn read(&self) -> Result<Vec<u8>, KeyError> {
        match self {
            // Single-line env values often carry escaped newlines
            Self::Inline(pem) => Ok(pem.replace("\\n", "\n").into_bytes()),
            Self::File(path) => std::fs::read(path).map_err(|source| KeyError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL; in-memory stores when absent
    pub database_url: Option<String>,

    /// Apply migrations at startup
    pub run_migrations: bool,

    /// Signing key private half
    pub private_key: PemSource,

    /// Signing key public half
    pub public_key: PemSource,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server port
        let http_port = parse_or(var("HTTP_PORT"), 8080, "HTTP_PORT")?;

        // Database
        let database_url = var("DATABASE_URL");
        let run_migrations = parse_or(var("RUN_MIGRATIONS"), true, "RUN_MIGRATIONS")?;

        // Signing keys, inline PEM wins over a path
        let private_key = pem_source(
            var("JWT_PRIVATE_KEY_PEM"),
            var("JWT_PRIVATE_KEY_PATH"),
            "JWT_PRIVATE_KEY_PEM or JWT_PRIVATE_KEY_PATH",
        )?;
        let public_key = pem_source(
            var("JWT_PUBLIC_KEY_PEM"),
            var("JWT_PUBLIC_KEY_PATH"),
            "JWT_PUBLIC_KEY_PEM or JWT_PUBLIC_KEY_PATH",
        )?;

        // Token lifetimes
        let issuer = var("TOKEN_ISSUER").unwrap_or_else(|| "keyward".to_string());
        let access_ttl: u64 = parse_or(var("ACCESS_TOKEN_TTL_SECS"), 900, "ACCESS_TOKEN_TTL_SECS")?;
        let refresh_ttl: u64 =
            parse_or(var("REFRESH_TOKEN_TTL_SECS"), 432_000, "REFRESH_TOKEN_TTL_SECS")?;
        let reset_ttl: u64 =
            parse_or(var("PASSWORD_RESET_TTL_SECS"), 3600, "PASSWORD_RESET_TTL_SECS")?;
        let handoff_ttl: u64 = parse_or(var("HANDOFF_TTL_SECS"), 300, "HANDOFF_TTL_SECS")?;

        for (name, ttl) in [
            ("ACCESS_TOKEN_TTL_SECS", access_ttl),
            ("REFRESH_TOKEN_TTL_SECS", refresh_ttl),
            ("PASSWORD_RESET_TTL_SECS", reset_ttl),
            ("HANDOFF_TTL_SECS", handoff_ttl),
        ] {
            if ttl == 0 {
                return Err(ConfigError::Invalid(name));
            }
        }

        let min_password_length: usize =
            parse_or(var("MIN_PASSWORD_LENGTH"), 8, "MIN_PASSWORD_LENGTH")?;

        let auth = AuthConfig::new(issuer)
            .with_access_token_ttl(Duration::from_secs(access_ttl))
            .with_refresh_token_ttl(Duration::from_secs(refresh_ttl))
            .with_password_reset_ttl(Duration::from_secs(reset_ttl))
            .with_min_password_length(min_password_length)
            .with_handoff_ttl(Duration::from_secs(handoff_ttl));

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        Ok(Self {
            http_port,
            database_url,
            run_migrations,
            private_key,
            public_key,
            auth,
            log_format,
        })
    }

    /// Read and verify the signing keypair
    pub fn load_keys(&self) -> Result<RsaKeyPair, KeyError> {
        RsaKeyPair::from_pem(self.private_key.read()?, self.public_key.read()?)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    default: T,
    name: &'static str,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

fn pem_source(
    inline: Option<String>,
    path: Option<String>,
    name: &'static str,
) -> Result<PemSource, ConfigError> {
    match (inline, path) {
        (Some(pem), _) => Ok(PemSource::Inline(pem)),
        (None, Some(path)) => Ok(PemSource::File(PathBuf::from(path))),
        (None, None) => Err(ConfigError::Missing(name)),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
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
        move |key| map.get(key).cloned()
    }

    const KEYS: [(&str, &str); 2] = [
        ("JWT_PRIVATE_KEY_PATH", "/keys/private.pem"),
        ("JWT_PUBLIC_KEY_PATH", "/keys/public.pem"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&KEYS)).unwrap();
        assert_eq!(config.http_port, 8080);
        assert!(config.database_url.is_none());
        assert!(config.run_migrations);
        assert_eq!(config.auth.issuer, "keyward");
        assert_eq!(config.auth.access_token_ttl.as_secs(), 900);
        assert_eq!(config.auth.refresh_token_ttl.as_secs(), 432_000);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.private_key,
            PemSource::File(PathBuf::from("/keys/private.pem"))
        );
    }

    #[test]
    fn test_missing_keys() {
        let result = Config::from_lookup(lookup(&[("JWT_PUBLIC_KEY_PEM", "pem")]));
        assert!(matches!(result, Err(ConfigError::Missing(name)) if name.starts_with("JWT_PRIVATE")));
    }

    #[test]
    fn test_inline_pem_preferred() {
        let mut vars = KEYS.to_vec();
        vars.push(("JWT_PRIVATE_KEY_PEM", "inline"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.private_key, PemSource::Inline("inline".to_string()));
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("HTTP_PORT", "not-a-port"),
            ("ACCESS_TOKEN_TTL_SECS", "0"),
            ("RUN_MIGRATIONS", "maybe"),
            ("LOG_FORMAT", "xml"),
            ("MIN_PASSWORD_LENGTH", "-1"),
            ("HANDOFF_TTL_SECS", "0"),
        ] {
            let mut vars = KEYS.to_vec();
            vars.push((key, value));
            let result = Config::from_lookup(lookup(&vars));
            assert!(matches!(result, Err(ConfigError::Invalid(name)) if name == key), "{key}");
        }
    }

    #[test]
    fn test_overrides() {
        let mut vars = KEYS.to_vec();
        vars.extend([
            ("HTTP_PORT", "9090"),
            ("DATABASE_URL", "postgres://localhost/keyward"),
            ("TOKEN_ISSUER", "auth.example.com"),
            ("REFRESH_TOKEN_TTL_SECS", "60"),
            ("LOG_FORMAT", "json"),
            ("MIN_PASSWORD_LENGTH", "12"),
            ("HANDOFF_TTL_SECS", "30"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/keyward"));
        assert_eq!(config.auth.issuer, "auth.example.com");
        assert_eq!(config.auth.refresh_token_ttl.as_secs(), 60);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.auth.min_password_length, 12);
        assert_eq!(config.auth.handoff_ttl.as_secs(), 30);
    }

    #[test]
    fn test_inline_pem_unescapes_newlines() {
        let source = PemSource::Inline("-----BEGIN-----\\nabc\\n-----END-----".to_string());
        assert_eq!(source.read().unwrap(), b"-----BEGIN-----\nabc\n-----END-----".to_vec());
    }
}
