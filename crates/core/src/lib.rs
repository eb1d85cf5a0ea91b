pub mod advisor;
pub mod domain;
pub mod error;
pub mod llm;
pub mod market;
pub mod research;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use crate::error::AppError;
    use anyhow::Context;
    use serde::Serialize;

    const DEFAULT_ENV: &str = "development";
    const DEFAULT_PORT: u16 = 8000;
    const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
    const DEFAULT_RATE_LIMIT: u32 = 100;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub openai_api_key: Option<String>,
        pub debug: bool,
        pub env: String,
        pub port: u16,
        pub cors_origins: Vec<String>,
        // Requests per hour; reported by /health, not enforced.
        pub rate_limit: u32,
        pub sentry_dsn: Option<String>,
    }

    /// Non-secret view of the settings, safe to expose over HTTP.
    #[derive(Debug, Clone, Serialize)]
    pub struct SettingsSummary {
        pub debug: bool,
        pub env: String,
        pub port: u16,
        pub cors_origins: Vec<String>,
        pub rate_limit: u32,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let port = match non_empty("PORT") {
                Some(v) => v
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {v})"))?,
                None => DEFAULT_PORT,
            };

            let rate_limit = match non_empty("RATE_LIMIT") {
                Some(v) => v
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("RATE_LIMIT must be an integer (got {v})"))?,
                None => DEFAULT_RATE_LIMIT,
            };

            let cors_origins = non_empty("CORS_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            Ok(Self {
                openai_api_key: non_empty("OPENAI_API_KEY"),
                debug: non_empty("DEBUG").is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
                env: non_empty("ENV").unwrap_or_else(|| DEFAULT_ENV.to_string()),
                port,
                cors_origins,
                rate_limit,
                sentry_dsn: non_empty("SENTRY_DSN"),
            })
        }

        /// Fails when configuration needed to serve requests is missing.
        pub fn validate(&self) -> Result<(), AppError> {
            self.require_openai_api_key().map(|_| ())
        }

        pub fn require_openai_api_key(&self) -> Result<&str, AppError> {
            self.openai_api_key.as_deref().ok_or_else(|| {
                AppError::Configuration("OPENAI_API_KEY environment variable is required".into())
            })
        }

        pub fn summary(&self) -> SettingsSummary {
            SettingsSummary {
                debug: self.debug,
                env: self.env.clone(),
                port: self.port,
                cors_origins: self.cors_origins.clone(),
                rate_limit: self.rate_limit,
            }
        }

        pub fn default_log_directive(&self) -> &'static str {
            if self.debug {
                "debug"
            } else {
                "info"
            }
        }
    }

}
