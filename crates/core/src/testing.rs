//! In-crate fakes for the upstream seams.

use crate::llm::{ChatRequest, LlmClient, Provider, WebSearchRequest};
use crate::market::types::{ChartSnapshot, QuoteSummarySnapshot};
use crate::market::MarketDataProvider;
use std::sync::Mutex;

pub struct FakeMarket {
    chart: Result<ChartSnapshot, String>,
    summary: Result<QuoteSummarySnapshot, String>,
}

impl FakeMarket {
    pub fn failing(msg: &str) -> Self {
        Self {
            chart: Err(msg.to_string()),
            summary: Err(msg.to_string()),
        }
    }

    pub fn with_chart(chart: ChartSnapshot) -> Self {
        Self {
            chart: Ok(chart),
            summary: Ok(QuoteSummarySnapshot::default()),
        }
    }

    pub fn summary(mut self, summary: QuoteSummarySnapshot) -> Self {
        self.summary = Ok(summary);
        self
    }

    pub fn summary_error(mut self, msg: &str) -> Self {
        self.summary = Err(msg.to_string());
        self
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for FakeMarket {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_chart(&self, _symbol: &str) -> anyhow::Result<ChartSnapshot> {
        self.chart.clone().map_err(|e| anyhow::anyhow!(e))
    }

    async fn fetch_quote_summary(&self, _symbol: &str) -> anyhow::Result<QuoteSummarySnapshot> {
        self.summary.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

/// Canned model replies. Sentiment searches are told apart from news searches
/// by the `sentiment_score` key their prompt asks for.
pub struct FakeLlm {
    pub completion: Result<String, String>,
    pub news: Result<String, String>,
    pub sentiment: Result<String, String>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub search_requests: Mutex<Vec<WebSearchRequest>>,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self {
            completion: Err("no completion configured".into()),
            news: Err("no news configured".into()),
            sentiment: Err("no sentiment configured".into()),
            chat_requests: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn completion(mut self, reply: &str) -> Self {
        self.completion = Ok(reply.to_string());
        self
    }

    pub fn news(mut self, reply: &str) -> Self {
        self.news = Ok(reply.to_string());
        self
    }

    pub fn sentiment(mut self, reply: &str) -> Self {
        self.sentiment = Ok(reply.to_string());
        self
    }

    pub fn last_chat_prompt(&self) -> Option<String> {
        self.chat_requests
            .lock()
            .ok()
            .and_then(|r| r.last().map(|req| req.prompt.clone()))
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, req: ChatRequest) -> anyhow::Result<String> {
        if let Ok(mut reqs) = self.chat_requests.lock() {
            reqs.push(req);
        }
        self.completion.clone().map_err(|e| anyhow::anyhow!(e))
    }

    async fn web_search(&self, req: WebSearchRequest) -> anyhow::Result<String> {
        let reply = if req.prompt.contains("sentiment_score") {
            self.sentiment.clone()
        } else {
            self.news.clone()
        };
        if let Ok(mut reqs) = self.search_requests.lock() {
            reqs.push(req);
        }
        reply.map_err(|e| anyhow::anyhow!(e))
    }
}
