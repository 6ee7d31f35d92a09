use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use leasewell_application::DEFAULT_PERMISSION_CACHE_TTL_SECONDS;
use leasewell_core::AppError;
use tracing_subscriber::EnvFilter;

const SECRET_MIN_BYTES: usize = 32;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24;

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCacheBackend {
    InMemory,
    Redis,
}

impl PermissionCacheBackend {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "PERMISSION_CACHE_BACKEND must be either 'in_memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub redis_url: Option<String>,
    pub permission_cache_backend: PermissionCacheBackend,
    pub permission_cache_ttl_seconds: u64,
    pub identity_provider_url: String,
    pub identity_provider_api_key: String,
    pub invitation_secret: String,
    pub session_signing_secret: String,
    pub session_ttl_seconds: i64,
    pub email_provider: EmailProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let redis_url = env::var("REDIS_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let permission_cache_backend = PermissionCacheBackend::parse(
            env::var("PERMISSION_CACHE_BACKEND")
                .unwrap_or_else(|_| "in_memory".to_owned())
                .as_str(),
        )?;
        if permission_cache_backend == PermissionCacheBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
            ));
        }

        let permission_cache_ttl_seconds = optional_number_env(
            "PERMISSION_CACHE_TTL_SECONDS",
            DEFAULT_PERMISSION_CACHE_TTL_SECONDS,
        )?;
        let session_ttl_seconds =
            optional_number_env("SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS)?;

        let identity_provider_url = required_non_empty_env("IDENTITY_PROVIDER_URL")?;
        let identity_provider_api_key = required_non_empty_env("IDENTITY_PROVIDER_API_KEY")?;
        let invitation_secret = required_secret_env("INVITATION_SECRET")?;
        let session_signing_secret = required_secret_env("SESSION_SIGNING_SECRET")?;

        let email_provider = match env::var("EMAIL_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = required_non_empty_env("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty_env("SMTP_HOST")?,
                    port,
                    username: required_non_empty_env("SMTP_USERNAME")?,
                    password: required_non_empty_env("SMTP_PASSWORD")?,
                    from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            redis_url,
            permission_cache_backend,
            permission_cache_ttl_seconds,
            identity_provider_url,
            identity_provider_api_key,
            invitation_secret,
            session_signing_secret,
            session_ttl_seconds,
            email_provider,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn required_secret_env(name: &str) -> Result<String, AppError> {
    let value = required_non_empty_env(name)?;
    check_secret_length(name, value)
}

fn check_secret_length(name: &str, value: String) -> Result<String, AppError> {
    if value.len() < SECRET_MIN_BYTES {
        return Err(AppError::Validation(format!(
            "{name} must be at least {SECRET_MIN_BYTES} characters"
        )));
    }

    Ok(value)
}

fn optional_number_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_positive(name, value.trim()),
        _ => Ok(default),
    }
}

fn parse_positive<T>(name: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let parsed = value
        .parse::<T>()
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?;
    if parsed <= T::default() {
        return Err(AppError::Validation(format!("{name} must be positive")));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use leasewell_core::AppError;

    use super::{PermissionCacheBackend, check_secret_length, parse_positive};

    #[test]
    fn cache_backend_accepts_known_values() {
        assert_eq!(
            PermissionCacheBackend::parse("in_memory"),
            Ok(PermissionCacheBackend::InMemory)
        );
        assert_eq!(
            PermissionCacheBackend::parse(" Redis "),
            Ok(PermissionCacheBackend::Redis)
        );
        assert!(matches!(
            PermissionCacheBackend::parse("memcached"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn short_secrets_are_rejected() {
        assert!(check_secret_length("INVITATION_SECRET", "short".to_owned()).is_err());
        assert!(check_secret_length("INVITATION_SECRET", "k".repeat(32)).is_ok());
    }

    #[test]
    fn ttl_values_must_be_positive_numbers() {
        assert_eq!(parse_positive::<u64>("TTL", "60"), Ok(60));
        assert!(parse_positive::<u64>("TTL", "0").is_err());
        assert!(parse_positive::<i64>("TTL", "-5").is_err());
        assert!(parse_positive::<u64>("TTL", "soon").is_err());
    }
}
