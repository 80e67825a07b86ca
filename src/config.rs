use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Process configuration. Built once at startup and handed to the clients
/// that need it; nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub generator: GeneratorConfig,
    pub server_addr: SocketAddr,
    pub enforce_source_contract: bool,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_results: usize,
    /// Serper `tbs` value, e.g. `qdr:d` for the past day. `None` disables it.
    pub recency: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        let timeout = Duration::from_secs(parse_env_or("HTTP_TIMEOUT_SECS", 60u64)?);
        let recency = get_env_or_default("SEARCH_RECENCY", "qdr:d");

        Ok(Config {
            search: SearchConfig {
                api_key: get_env("SERPER_API_KEY"),
                base_url: get_env_or_default("SERPER_BASE_URL", "https://google.serper.dev"),
                max_results: parse_env_or("SEARCH_MAX_RESULTS", 4usize)?,
                recency: (!recency.trim().is_empty()).then_some(recency),
                timeout,
            },
            generator: GeneratorConfig {
                api_key: get_env("GOOGLE_API_KEY"),
                base_url: get_env_or_default(
                    "GEMINI_BASE_URL",
                    "https://generativelanguage.googleapis.com",
                ),
                model: get_env_or_default("GEMINI_MODEL", "gemini-2.5-flash"),
                temperature: parse_env_or("GEMINI_TEMPERATURE", 0.5f32)?,
                timeout,
            },
            server_addr: parse_env_or("SERVER_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            enforce_source_contract: parse_env_or("ENFORCE_SOURCE_CONTRACT", true)?,
        })
    }

    /// Fails early when a command needs both hosted services.
    pub fn require_credentials(&self) -> Result<()> {
        if self.search.api_key.is_none() {
            return Err(anyhow!("Missing required environment variable: SERPER_API_KEY"));
        }
        if self.generator.api_key.is_none() {
            return Err(anyhow!("Missing required environment variable: GOOGLE_API_KEY"));
        }
        Ok(())
    }
}

fn get_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {key}: {raw:?}"))
}

#[test]
fn test_parse_value() {
    assert_eq!(parse_value::<usize>("SEARCH_MAX_RESULTS", " 7 ").unwrap(), 7);
    assert!(parse_value::<bool>("ENFORCE_SOURCE_CONTRACT", "true").unwrap());
    assert!(parse_value::<usize>("SEARCH_MAX_RESULTS", "lots").is_err());

    let addr: SocketAddr = parse_value("SERVER_ADDR", "0.0.0.0:8080").unwrap();
    assert_eq!(addr.port(), 8080);
}

#[test]
fn test_require_credentials() {
    let mut config = Config {
        search: SearchConfig {
            api_key: Some("serper".to_string()),
            base_url: "http://localhost".to_string(),
            max_results: 4,
            recency: None,
            timeout: Duration::from_secs(1),
        },
        generator: GeneratorConfig {
            api_key: None,
            base_url: "http://localhost".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.5,
            timeout: Duration::from_secs(1),
        },
        server_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        enforce_source_contract: true,
    };
    let err = config.require_credentials().unwrap_err();
    assert!(err.to_string().contains("GOOGLE_API_KEY"));

    config.generator.api_key = Some("google".to_string());
    assert!(config.require_credentials().is_ok());
}
