use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the trainer service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringSource,
    pub completion: CompletionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));
        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let log_level = var_or("APP_LOG_LEVEL", "info");

        let lexicon_path = non_empty_var("TRAINER_LEXICON_PATH").map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringSource { lexicon_path },
            completion: CompletionConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the scorer's lexicons come from; `None` means the built-in tuning.
#[derive(Debug, Clone, Default)]
pub struct ScoringSource {
    pub lexicon_path: Option<PathBuf>,
}

/// Chat-completion endpoint that voices the simulated customer.
#[derive(Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl CompletionConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.deepseek.com/v1";
    pub const DEFAULT_MODEL: &'static str = "deepseek-chat";

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let temperature = match non_empty_var("LLM_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .ok_or(ConfigError::InvalidTemperature)?,
            None => defaults.temperature,
        };
        let max_tokens = match non_empty_var("LLM_MAX_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidMaxTokens)?,
            None => defaults.max_tokens,
        };

        Ok(Self {
            base_url: non_empty_var("LLM_BASE_URL").unwrap_or(defaults.base_url),
            model: non_empty_var("LLM_MODEL").unwrap_or(defaults.model),
            api_key: non_empty_var("DEEPSEEK_API_KEY"),
            temperature,
            max_tokens,
            timeout_secs: defaults.timeout_secs,
        })
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: 0.8,
            max_tokens: 500,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTemperature,
    InvalidMaxTokens,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTemperature => {
                write!(f, "LLM_TEMPERATURE must be a non-negative number")
            }
            ConfigError::InvalidMaxTokens => write!(f, "LLM_MAX_TOKENS must be a valid u32"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTemperature
            | ConfigError::InvalidMaxTokens => None,
        }
    }
}
