use std::path::PathBuf;

use anyhow::{Context, Result};
use occucode_core::completion::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID};
use occucode_core::embedding::DEFAULT_EMBEDDING_MODEL;
use occucode_core::DEFAULT_MAX_REQUESTS_PER_SESSION;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Serving-side decode table (`transformed_completion` → `completion`).
    pub decoder_path: PathBuf,
    /// Table whose distinct codes feed the suggestion tool. Defaults to the decoder.
    pub codes_path: PathBuf,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model_id: String,
    /// Suggestions are disabled when unset.
    pub embedding_base_url: Option<String>,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub max_requests_per_session: u32,
    pub contact_info: String,
    /// Idle time after which a session may be evicted.
    pub session_ttl: chrono::Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let decoder_path = PathBuf::from(require_env("DECODER_PATH")?);
        let codes_path = optional_env("CODES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| decoder_path.clone());

        Ok(Config {
            decoder_path,
            codes_path,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_id: optional_env("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            embedding_base_url: optional_env("EMBEDDING_BASE_URL"),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            max_requests_per_session: parse_env(
                "MAX_REQUESTS_PER_SESSION",
                DEFAULT_MAX_REQUESTS_PER_SESSION,
            )?,
            contact_info: optional_env("CONTACT_INFO")
                .unwrap_or_else(|| "the maintainers".to_string()),
            session_ttl: session_ttl(parse_env("SESSION_TTL_MINUTES", 60)?)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn session_ttl(minutes: i64) -> Result<chrono::Duration> {
    if minutes <= 0 {
        anyhow::bail!("SESSION_TTL_MINUTES must be positive, got {minutes}");
    }
    chrono::Duration::try_minutes(minutes)
        .with_context(|| format!("SESSION_TTL_MINUTES is out of range: {minutes}"))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{v}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ttl_accepts_positive_minutes() {
        assert_eq!(session_ttl(60).unwrap(), chrono::Duration::minutes(60));
    }

    #[test]
    fn test_session_ttl_rejects_zero_and_negative() {
        assert!(session_ttl(0).is_err());
        assert!(session_ttl(-5).is_err());
    }

    #[test]
    fn test_session_ttl_rejects_out_of_range() {
        let err = session_ttl(i64::MAX).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
