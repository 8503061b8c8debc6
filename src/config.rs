use std::env;

/// Frozen configuration loaded once at startup from the process environment.
/// Validation differs by mode: dev fills in local defaults, production
/// rejects startup when any hardening requirement is unmet.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub port: u16,
    pub database_url: String,

    pub session_secret: String,
    pub csrf_secret: String,
    pub session_max_age_secs: u64,
    pub session_secure: bool,

    pub google: Option<GoogleOAuthConfig>,
    pub smtp: Option<SmtpConfig>,

    pub storage: StorageConfig,

    pub cors_origin: String,
    pub app_url: String,

    pub rate_limit_window_secs: u64,
    pub rate_limit_max: u32,
}

/// Outbound mail for the forgot-password flow. Not part of startup
/// validation — absent in dev, the reset link is logged instead of
/// mailed (`mailer::send_*`).
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local {
        root_path: std::path::PathBuf,
    },
    S3 {
        endpoint: Option<String>,
        bucket: String,
        region: String,
        access_key: String,
        secret_key: String,
        force_path_style: bool,
        public_url: String,
    },
}

impl Config {
    /// Reads every variable in the environment variable list exactly once
    /// and freezes the result. Collects every unmet production constraint
    /// into a single diagnostic rather than failing on the first one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match env::var("NODE_ENV").as_deref() {
            Ok("production") => Mode::Production,
            _ => Mode::Development,
        };

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_port);

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| default_database_url());

        let session_secret = env::var("SESSION_SECRET").unwrap_or_default();
        let csrf_secret = env::var("CSRF_SECRET").unwrap_or_default();
        let session_max_age_secs = env::var("SESSION_MAX_AGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_session_max_age_secs);
        let session_secure = env::var("SESSION_SECURE")
            .ok()
            .map(|v| v == "true" || v == "1")
            .unwrap_or(mode == Mode::Production);

        let google = match (
            env::var("GOOGLE_CLIENT_ID").ok(),
            env::var("GOOGLE_CLIENT_SECRET").ok(),
            env::var("GOOGLE_CALLBACK_URL").ok(),
        ) {
            (Some(client_id), Some(client_secret), Some(callback_url)) => {
                Some(GoogleOAuthConfig {
                    client_id,
                    client_secret,
                    callback_url,
                })
            }
            _ => None,
        };

        let smtp = match (
            env::var("SMTP_HOST").ok(),
            env::var("SMTP_USERNAME").ok(),
            env::var("SMTP_PASSWORD").ok(),
            env::var("SMTP_FROM").ok(),
        ) {
            (Some(host), Some(username), Some(password), Some(from_address)) => Some(SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                username,
                password,
                from_address,
            }),
            _ => None,
        };

        let s3_bucket = env::var("S3_BUCKET").ok();
        let s3_access_key = env::var("S3_ACCESS_KEY").ok();
        let s3_secret_key = env::var("S3_SECRET_KEY").ok();
        let s3_public_url = env::var("S3_PUBLIC_URL").ok();

        let storage = if let (Some(bucket), Some(access_key), Some(secret_key), Some(public_url)) = (
            s3_bucket.clone(),
            s3_access_key.clone(),
            s3_secret_key.clone(),
            s3_public_url.clone(),
        ) {
            StorageConfig::S3 {
                endpoint: env::var("S3_ENDPOINT").ok(),
                bucket,
                region: env::var("S3_REGION").unwrap_or_else(|_| default_s3_region()),
                access_key,
                secret_key,
                force_path_style: env::var("S3_FORCE_PATH_STYLE")
                    .ok()
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
                public_url,
            }
        } else {
            StorageConfig::Local {
                root_path: env::var("STORAGE_ROOT")
                    .map(std::path::PathBuf::from)
                    .unwrap_or_else(|_| default_storage_root()),
            }
        };

        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| default_cors_origin());
        let app_url = env::var("APP_URL").unwrap_or_else(|_| default_app_url());

        let rate_limit_window_secs = env::var("RATE_LIMIT_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_rate_limit_window_secs);
        let rate_limit_max = env::var("RATE_LIMIT_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_rate_limit_max);

        let config = Config {
            mode,
            port,
            database_url,
            session_secret,
            csrf_secret,
            session_max_age_secs,
            session_secure,
            google,
            smtp,
            storage,
            cors_origin,
            app_url,
            rate_limit_window_secs,
            rate_limit_max,
        };

        if config.mode == Mode::Production {
            config.validate_production()?;
        }

        Ok(config)
    }

    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        if self.session_secret.len() < 32 {
            violations.push("SESSION_SECRET must be set and at least 32 characters".to_string());
        }
        if self.csrf_secret.len() < 32 {
            violations.push("CSRF_SECRET must be set and at least 32 characters".to_string());
        }
        if self.cors_origin == default_cors_origin() || self.cors_origin == "*" {
            violations.push(
                "CORS_ORIGIN must be set to a concrete origin (wildcard forbidden)".to_string(),
            );
        }
        match &self.storage {
            StorageConfig::S3 { public_url, .. } if !public_url.is_empty() => {}
            StorageConfig::S3 { .. } => {
                violations.push("S3_PUBLIC_URL must be set".to_string());
            }
            StorageConfig::Local { .. } => {
                violations.push(
                    "S3 credentials (S3_BUCKET, S3_ACCESS_KEY, S3_SECRET_KEY, S3_PUBLIC_URL) must be set"
                        .to_string(),
                );
            }
        }
        if self.app_url == default_app_url() {
            violations.push("APP_URL must be set".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(violations))
        }
    }

    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid production configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://leaflet.db".to_string()
}

fn default_session_max_age_secs() -> u64 {
    60 * 60 * 24 * 7
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_storage_root() -> std::path::PathBuf {
    std::path::PathBuf::from("./data/objects")
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_app_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_rate_limit_max() -> u32 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for key in [
            "NODE_ENV",
            "PORT",
            "DATABASE_URL",
            "SESSION_SECRET",
            "CSRF_SECRET",
            "SESSION_MAX_AGE",
            "SESSION_SECURE",
            "GOOGLE_CLIENT_ID",
            "GOOGLE_CLIENT_SECRET",
            "GOOGLE_CALLBACK_URL",
            "S3_ENDPOINT",
            "S3_BUCKET",
            "S3_REGION",
            "S3_ACCESS_KEY",
            "S3_SECRET_KEY",
            "S3_FORCE_PATH_STYLE",
            "S3_PUBLIC_URL",
            "CORS_ORIGIN",
            "APP_URL",
            "RATE_LIMIT_WINDOW",
            "RATE_LIMIT_MAX",
            "STORAGE_ROOT",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn dev_mode_fills_in_local_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.port, 8080);
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
    }

    #[test]
    fn production_mode_collects_every_violation() {
        clear_env();
        unsafe { env::set_var("NODE_ENV", "production") };
        let err = Config::from_env().unwrap_err();
        let ConfigError::Invalid(violations) = err;
        assert!(violations.len() >= 4);
        assert!(violations.iter().any(|v| v.contains("SESSION_SECRET")));
        assert!(violations.iter().any(|v| v.contains("CSRF_SECRET")));
        clear_env();
    }

    #[test]
    fn production_mode_passes_with_everything_set() {
        clear_env();
        unsafe {
            env::set_var("NODE_ENV", "production");
            env::set_var("SESSION_SECRET", "a".repeat(32));
            env::set_var("CSRF_SECRET", "b".repeat(32));
            env::set_var("CORS_ORIGIN", "https://example.com");
            env::set_var("APP_URL", "https://example.com");
            env::set_var("S3_BUCKET", "bucket");
            env::set_var("S3_ACCESS_KEY", "key");
            env::set_var("S3_SECRET_KEY", "secret");
            env::set_var("S3_PUBLIC_URL", "https://cdn.example.com");
        }
        let config = Config::from_env().unwrap();
        assert!(config.is_production());
        clear_env();
    }
}
