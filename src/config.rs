/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, CORS 許可、API key header 名など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    /// Header carrying the machine-to-machine API key (lowercase).
    pub api_key_header: String,

    /// Expected API key for the internal endpoints. `None` disables them.
    pub internal_api_key: Option<String>,

    /// Domain used for the synthetic internal identity (`internal@{domain}`).
    pub internal_domain: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        // HeaderMap lookup は小文字前提なので、ここで正規化しておく
        let api_key_header = std::env::var("API_KEY_HEADER")
            .unwrap_or_else(|_| "x-api-key".to_string())
            .to_ascii_lowercase();
        if api_key_header.trim().is_empty() {
            return Err(ConfigError::Invalid("API_KEY_HEADER"));
        }

        let internal_api_key = std::env::var("INTERNAL_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let internal_domain =
            std::env::var("INTERNAL_DOMAIN").unwrap_or_else(|_| "example.com".to_string());

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            api_key_header,
            internal_api_key,
            internal_domain,
        })
    }
}
