use thiserror::Error;

/// Application error taxonomy shared by every layer of the service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("web search error: {0}")]
    WebSearch(String),

    #[error("AI agent error: {0}")]
    AiAgent(String),

    #[error("stock data error: {0}")]
    StockData(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn web_search(err: impl std::fmt::Display) -> Self {
        Self::WebSearch(err.to_string())
    }

    pub fn ai_agent(err: impl std::fmt::Display) -> Self {
        Self::AiAgent(err.to_string())
    }

    pub fn stock_data(err: impl std::fmt::Display) -> Self {
        Self::StockData(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Replaces a failed upstream fetch with substitute data.
///
/// Every data-gathering call site funnels through here so that masked failures
/// are logged in one place and stay visible in tests.
pub fn with_fallback<T>(result: AppResult<T>, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "upstream fetch failed; substituting fallback data");
            fallback()
        }
    }
}
