use anyhow::{Context, Result};

use crate::interview::categories::CategoryCycle;
use crate::llm_client::{LlmSettings, DEFAULT_API_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// When unset, interviews are kept in memory for the life of the process.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_api_url: String,
    pub category_cycle: CategoryCycle,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let category_cycle = match std::env::var("INTERVIEW_CATEGORY_CYCLE") {
            Ok(raw) => raw
                .parse::<CategoryCycle>()
                .map_err(anyhow::Error::msg)
                .context("INTERVIEW_CATEGORY_CYCLE must be 'alternating' or 'with_industry'")?,
            Err(_) => CategoryCycle::default(),
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_api_url: optional_env("LLM_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            category_cycle,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.anthropic_api_key.clone(),
            model: self.llm_model.clone(),
            api_url: self.llm_api_url.clone(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
