use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GENERATE_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Cap on streamed generation text (1 MiB).
const DEFAULT_MAX_RESPONSE_BYTES: usize = 1_048_576;
const DEFAULT_MAX_CONCURRENT: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct StudentConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub generation: GenerationSettings,
    pub observability: ObservabilitySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    /// Full URL of the `/api/generate` endpoint.
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_response_bytes: usize,
    /// Outbound generation calls allowed in flight at once.
    pub max_concurrent: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GENERATE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilitySettings {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl StudentConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = GenerationSettings::default();

        Ok(StudentConfig {
            common: common_config,
            generation: GenerationSettings {
                url: get_env("GENERATION_URL", Some(&defaults.url), is_prod)?,
                model: get_env("GENERATION_MODEL", Some(&defaults.model), is_prod)?,
                timeout_secs: parse_env(
                    "GENERATION_TIMEOUT_SECS",
                    defaults.timeout_secs,
                    is_prod,
                )?,
                max_response_bytes: parse_env(
                    "GENERATION_MAX_RESPONSE_BYTES",
                    defaults.max_response_bytes,
                    is_prod,
                )?,
                max_concurrent: parse_env(
                    "GENERATION_MAX_CONCURRENT",
                    defaults.max_concurrent,
                    is_prod,
                )?,
            },
            observability: ObservabilitySettings {
                log_level: get_env("LOG_LEVEL", Some("info,student_service=debug"), is_prod)?,
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
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

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(&default.to_string()), is_prod)?
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}
