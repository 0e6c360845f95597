use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// When absent the API runs against the in-memory job store.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm: LlmConfig,
    pub skills: SkillBounds,
    pub skill_worker_concurrency: usize,
    pub poll: PollConfig,
}

/// Text-provider settings. `api_key = None` disables every provider call.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub site_url: Option<String>,
    pub site_title: Option<String>,
}

/// Size bounds of an extracted skill list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillBounds {
    pub min: usize,
    pub max: usize,
}

impl SkillBounds {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if max == 0 {
            bail!("SKILL_MAX must be at least 1");
        }
        if min > max {
            bail!("SKILL_MIN ({min}) must not exceed SKILL_MAX ({max})");
        }
        Ok(Self { min, max })
    }
}

impl Default for SkillBounds {
    fn default() -> Self {
        Self { min: 6, max: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    pub fn from_millis(interval_ms: u64, timeout_ms: u64) -> Result<Self> {
        if interval_ms == 0 {
            bail!("POLL_INTERVAL_MS must be greater than zero");
        }
        Ok(Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_millis(
            parse_env("POLL_INTERVAL_MS", 2000)?,
            parse_env("POLL_TIMEOUT_MS", 30000)?,
        )
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            timeout: Duration::from_millis(30000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            llm: LlmConfig::default(),
            skills: SkillBounds::default(),
            skill_worker_concurrency: 4,
            poll: PollConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            max_retries: 3,
            site_url: None,
            site_title: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let skills = SkillBounds::new(parse_env("SKILL_MIN", 6)?, parse_env("SKILL_MAX", 10)?)?;

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm: LlmConfig::from_env()?,
            skills,
            skill_worker_concurrency: parse_env("SKILL_WORKER_CONCURRENCY", 4)?,
            poll: PollConfig::from_env()?,
        })
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        Ok(LlmConfig {
            api_key: optional_env("LLM_API_KEY"),
            base_url: optional_env("LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            site_url: optional_env("SITE_URL"),
            site_title: optional_env("SITE_TITLE"),
        })
    }
}

/// Returns the variable's value, treating an empty string as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
