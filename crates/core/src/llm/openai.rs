use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{ChatRequest, LlmClient, Provider, WebSearchRequest};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

const WEB_SEARCH_TOOL: &str = "web_search_preview";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    search_model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let search_model = std::env::var("OPENAI_SEARCH_MODEL").unwrap_or_else(|_| model.clone());

        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            search_model,
        })
    }

    async fn post_json<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        stage: &'static str,
        req: &Req,
    ) -> anyhow::Result<Res> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            let err = LlmDiagnosticsError::from_response(self.provider(), stage, status, text);
            tracing::warn!(stage, %status, retryable = err.is_retryable(), "OpenAI returned an error");
            return Err(err.into());
        }

        serde_json::from_str::<Res>(&text)
            .with_context(|| format!("failed to decode OpenAI {stage} response: {text}"))
    }

    fn completion_text(res: ChatCompletionResponse) -> anyhow::Result<String> {
        let choice = res
            .choices
            .into_iter()
            .next()
            .context("OpenAI completion returned no choices")?;
        if matches!(choice.finish_reason.as_deref(), Some("length")) {
            tracing::warn!("OpenAI completion stopped at the token limit; reply may be truncated");
        }
        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .context("OpenAI completion returned empty content")
    }

    fn response_output_text(res: &ResponsesResponse) -> anyhow::Result<String> {
        let mut out = String::new();
        for item in &res.output {
            let OutputItem::Message { content } = item else {
                continue;
            };
            for part in content {
                if let OutputContent::OutputText { text } = part {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
            }
        }
        anyhow::ensure!(!out.trim().is_empty(), "OpenAI agent run produced no output text");
        Ok(out)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, req: ChatRequest) -> anyhow::Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &req.system,
                },
                ChatMessage {
                    role: "user",
                    content: &req.prompt,
                },
            ],
            temperature: req.temperature,
            response_format: req.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let res: ChatCompletionResponse = self
            .post_json("/chat/completions", "chat_completion", &body)
            .await?;
        Self::completion_text(res)
    }

    async fn web_search(&self, req: WebSearchRequest) -> anyhow::Result<String> {
        let body = ResponsesRequest {
            model: &self.search_model,
            instructions: &req.instructions,
            input: &req.prompt,
            tools: vec![ResponsesTool {
                kind: WEB_SEARCH_TOOL,
            }],
        };

        let res: ResponsesResponse = self.post_json("/responses", "web_search", &body).await?;
        Self::response_output_text(&res)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    tools: Vec<ResponsesTool>,
}

#[derive(Debug, Serialize)]
struct ResponsesTool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum OutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },

    // web_search_call, reasoning, ...
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum OutputContent {
    #[serde(rename = "output_text")]
    OutputText { text: String },

    #[serde(other)]
    Unknown,
}
