pub mod error;
pub mod json;
pub mod openai;

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    /// Ask the provider to constrain the reply to a single JSON object.
    pub json_response: bool,
}

#[derive(Debug, Clone)]
pub struct WebSearchRequest {
    pub instructions: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
}

/// Seam over the hosted model: plain chat completion and a web-search agent run.
/// Both return the model's final text; parsing stays with the caller.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, req: ChatRequest) -> anyhow::Result<String>;

    async fn web_search(&self, req: WebSearchRequest) -> anyhow::Result<String>;
}
