use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEV_JWT_SECRET: &str = "dev-only-flashcards-secret-change-me-please";

/// 20MB, the largest inline payload the Gemini API accepts.
const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct FlashcardConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub genai: GenaiConfig,
    pub extraction: ExtractionConfig,
    pub upload: UploadConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Test,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenaiConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    pub text_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub command_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub auth_attempts: u32,
    pub auth_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl FlashcardConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let provider: ProviderKind = get_env("GENAI_PROVIDER", Some("gemini"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The key is only needed when talking to the real API.
        let api_key = match provider {
            ProviderKind::Gemini => get_env("GOOGLE_API_KEY", None, is_prod)?,
            ProviderKind::Mock => env::var("GOOGLE_API_KEY").unwrap_or_default(),
        };

        let config = FlashcardConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("flashcard-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("flashcards_db"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod)?,
                expiry_days: parse_env("JWT_EXPIRY_DAYS", "7", is_prod)?,
            },
            genai: GenaiConfig {
                provider,
                api_key,
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-1.5-flash"), is_prod)?,
            },
            extraction: ExtractionConfig {
                command_timeout_seconds: parse_env(
                    "EXTRACTION_COMMAND_TIMEOUT_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
            upload: UploadConfig {
                max_bytes: parse_env(
                    "UPLOAD_MAX_BYTES",
                    &DEFAULT_UPLOAD_MAX_BYTES.to_string(),
                    is_prod,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            rate_limit: RateLimitConfig {
                auth_attempts: parse_env("RATE_LIMIT_AUTH_ATTEMPTS", "10", is_prod)?,
                auth_window_seconds: parse_env("RATE_LIMIT_AUTH_WINDOW_SECONDS", "900", is_prod)?,
                global_ip_limit: parse_env("RATE_LIMIT_GLOBAL_IP_LIMIT", "200", is_prod)?,
                global_ip_window_seconds: parse_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_prod(&self) -> bool {
        self.environment == Environment::Prod
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.jwt.expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_DAYS must be positive"
            )));
        }

        if self.upload.max_bytes == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "UPLOAD_MAX_BYTES must be positive"
            )));
        }

        if self.is_prod() {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.jwt.secret.len() < 32 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least 32 bytes in production"
                )));
            }

            if self.genai.provider == ProviderKind::Mock {
                tracing::warn!("Mock AI provider configured in production");
            }
        }

        Ok(())
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

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(format!("Invalid GenAI provider: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_environment_names() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn parses_provider_kind() {
        assert_eq!("mock".parse::<ProviderKind>().unwrap(), ProviderKind::Mock);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("openai".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn get_env_requires_value_in_prod() {
        let key = "FLASHCARD_CONFIG_TEST_UNSET_KEY";
        assert!(get_env(key, Some("x"), true).is_err());
        assert_eq!(get_env(key, Some("x"), false).unwrap(), "x");
        assert!(get_env(key, None, false).is_err());
    }

    #[test]
    fn parse_env_reports_key_on_bad_number() {
        let err = parse_env::<u32>("FLASHCARD_CONFIG_TEST_UNSET_KEY", "abc", false).unwrap_err();
        assert!(err.to_string().contains("FLASHCARD_CONFIG_TEST_UNSET_KEY"));
    }
}
