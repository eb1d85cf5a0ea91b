use crate::llm::Provider;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;

/// Non-2xx reply from the model provider, with the body kept for diagnosis.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub status: StatusCode,
    pub message: Option<String>,
    pub raw_body: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl LlmDiagnosticsError {
    pub fn from_response(
        provider: Provider,
        stage: &'static str,
        status: StatusCode,
        body: String,
    ) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .map(|e| e.error.message);
        Self {
            provider,
            stage,
            status,
            message,
            raw_body: body,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS || self.status.is_server_error()
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} call failed with status {}",
            self.provider, self.stage, self.status
        )?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmDiagnosticsError {}
