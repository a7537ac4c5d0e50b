use axum::http::StatusCode;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SentimentConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub upstream: UpstreamConfig,
    pub cors: CorsConfig,
    pub failure_status: FailureStatus,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base of the OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub temperature: f64,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorsConfig {
    pub allowed_origins: AllowedOrigins,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allow_credentials: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl FromStr for AllowedOrigins {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "*" {
            return Ok(AllowedOrigins::Any);
        }

        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CORS_ALLOWED_ORIGINS must be \"*\" or a comma-separated list of origins"
            )));
        }

        Ok(AllowedOrigins::List(origins))
    }
}

/// HTTP status used for degraded responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureStatus {
    /// Always answer 200 and signal failure through the `error` field.
    #[default]
    Ok,
    /// Answer 502 so callers can detect failures from the status line.
    BadGateway,
}

impl FailureStatus {
    pub fn status_code(self) -> StatusCode {
        match self {
            FailureStatus::Ok => StatusCode::OK,
            FailureStatus::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }
}

impl FromStr for FailureStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" | "200" => Ok(FailureStatus::Ok),
            "bad_gateway" | "502" => Ok(FailureStatus::BadGateway),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown FAILURE_STATUS '{}', expected 'ok' or 'bad_gateway'",
                other
            ))),
        }
    }
}

impl SentimentConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        // A missing key is tolerated outside prod; the upstream rejects the
        // first call with 401 instead.
        let api_key = get_env("GROQ_API_KEY", Some(""), is_prod)?;

        let temperature = get_env(
            "SENTIMENT_TEMPERATURE",
            Some(&DEFAULT_TEMPERATURE.to_string()),
            is_prod,
        )?
        .parse()
        .unwrap_or(DEFAULT_TEMPERATURE);

        let timeout_secs = get_env(
            "UPSTREAM_TIMEOUT_SECS",
            Some(&DEFAULT_TIMEOUT_SECS.to_string()),
            is_prod,
        )?
        .parse()
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let allow_credentials = get_env("CORS_ALLOW_CREDENTIALS", Some("true"), is_prod)?
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS_ALLOW_CREDENTIALS: {}", e))
            })?;

        Ok(SentimentConfig {
            common: common_config,
            service_name: "sentiment-service".to_string(),
            upstream: UpstreamConfig {
                base_url: get_env("GROQ_API_BASE_URL", Some(DEFAULT_API_BASE_URL), is_prod)?,
                api_key: Secret::new(api_key),
                model: get_env("SENTIMENT_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                temperature,
                timeout: Duration::from_secs(timeout_secs),
            },
            cors: CorsConfig {
                allowed_origins: get_env("CORS_ALLOWED_ORIGINS", Some("*"), is_prod)?.parse()?,
                allow_credentials,
            },
            failure_status: get_env("FAILURE_STATUS", Some("ok"), is_prod)?.parse()?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod && default.is_none_or(str::is_empty) {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_origin_parses_to_any() {
        assert_eq!("*".parse::<AllowedOrigins>().unwrap(), AllowedOrigins::Any);
    }

    #[test]
    fn origin_list_is_trimmed() {
        let origins: AllowedOrigins = "http://localhost:3000, https://app.example.com,"
            .parse()
            .unwrap();
        assert_eq!(
            origins,
            AllowedOrigins::List(vec![
                "http://localhost:3000".to_string(),
                "https://app.example.com".to_string(),
            ])
        );
    }

    #[test]
    fn empty_origin_list_is_rejected() {
        assert!(" , ".parse::<AllowedOrigins>().is_err());
    }

    #[test]
    fn failure_status_parsing() {
        assert_eq!("ok".parse::<FailureStatus>().unwrap(), FailureStatus::Ok);
        assert_eq!(
            "BAD_GATEWAY".parse::<FailureStatus>().unwrap(),
            FailureStatus::BadGateway
        );
        assert_eq!(
            FailureStatus::BadGateway.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert!("teapot".parse::<FailureStatus>().is_err());
    }

    #[test]
    fn default_cors_is_permissive_with_credentials() {
        let cors = CorsConfig::default();
        assert_eq!(cors.allowed_origins, AllowedOrigins::Any);
        assert!(cors.allow_credentials);
    }
}
