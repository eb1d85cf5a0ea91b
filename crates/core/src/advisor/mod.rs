//! Turns one ticker into a `Recommendation`: four concurrent fetches, one
//! synthesis call, one merge.

pub mod prompt;

use crate::config::Settings;
use crate::domain::contract::{LlmSynthesisReply, SynthesisVerdict};
use crate::domain::recommendation::Recommendation;
use crate::error::{AppError, AppResult};
use crate::llm::openai::OpenAiClient;
use crate::llm::{ChatRequest, LlmClient};
use crate::market::StockService;
use crate::research::{ResearchService, DEFAULT_MAX_RESULTS};
use chrono::Utc;
use prompt::ResearchBundle;
use std::sync::Arc;

const SYNTHESIS_TEMPERATURE: f32 = 0.1;

pub struct InvestmentAdvisor {
    llm: Arc<dyn LlmClient>,
    stocks: StockService,
    research: ResearchService,
}

impl InvestmentAdvisor {
    pub fn new(llm: Arc<dyn LlmClient>, stocks: StockService) -> Self {
        Self {
            research: ResearchService::new(Arc::clone(&llm)),
            llm,
            stocks,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let llm = Arc::new(OpenAiClient::from_settings(settings)?);
        Ok(Self::new(llm, StockService::from_env()?))
    }

    pub async fn gather(&self, symbol: &str) -> ResearchBundle {
        let (performance, analyst_targets, news, sentiment) = tokio::join!(
            self.stocks.fetch_price(symbol),
            self.stocks.fetch_analyst_targets(symbol),
            self.research.search_company_news(symbol, DEFAULT_MAX_RESULTS),
            self.research.search_stock_sentiment(symbol),
        );
        ResearchBundle {
            performance,
            analyst_targets,
            news,
            sentiment,
        }
    }

    pub async fn build_recommendation(&self, symbol: &str) -> AppResult<Recommendation> {
        tracing::info!(
            %symbol,
            provider = ?self.llm.provider(),
            "generating investment recommendation"
        );

        let bundle = self.gather(symbol).await;
        let verdict = self.synthesize(symbol, &bundle).await.map_err(|e| {
            tracing::error!(%symbol, error = %e, "recommendation synthesis failed");
            AppError::ai_agent(format!(
                "Failed to generate investment recommendation: {e:#}"
            ))
        })?;

        tracing::info!(
            %symbol,
            recommendation = ?verdict.recommendation,
            confidence = verdict.confidence_score,
            "recommendation ready"
        );

        Ok(Recommendation {
            symbol: symbol.to_string(),
            company_name: verdict.company_name,
            current_price: bundle.performance.current_price,
            recommendation: verdict.recommendation,
            confidence_score: verdict.confidence_score,
            rationale: verdict.rationale,
            news: bundle.news,
            performance: bundle.performance,
            sentiment: Some(bundle.sentiment),
            timestamp: Utc::now(),
        })
    }

    async fn synthesize(
        &self,
        symbol: &str,
        bundle: &ResearchBundle,
    ) -> anyhow::Result<SynthesisVerdict> {
        let req = ChatRequest {
            system: prompt::SYSTEM_PROMPT.to_string(),
            prompt: prompt::analysis_prompt(symbol, bundle)?,
            temperature: SYNTHESIS_TEMPERATURE,
            json_response: true,
        };

        let reply = self.llm.complete(req).await?;
        parse_synthesis_reply(&reply)
    }
}

/// Strict: the reply must be one JSON object with every required key.
pub fn parse_synthesis_reply(reply: &str) -> anyhow::Result<SynthesisVerdict> {
    let parsed: LlmSynthesisReply = serde_json::from_str(reply.trim())
        .map_err(|e| anyhow::anyhow!("synthesis reply is not valid JSON for the expected schema: {e}"))?;
    parsed.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::RecommendationAction;
    use crate::domain::stock::{Performance, SentimentCategory};
    use crate::market::types::{ChartSnapshot, QuoteSummarySnapshot};
    use crate::testing::{FakeLlm, FakeMarket};
    use std::time::Duration;

    const APPLE_REPLY: &str = r#"{"company_name":"Apple Inc.","recommendation":"buy","confidence_score":0.8,"rationale":"strong earnings"}"#;

    const NEWS_REPLY: &str = r#"[
        {"title": "Apple beats estimates", "source": "Reuters", "date": "2026-02-27T10:00:00Z",
         "summary": "Revenue growth tops forecasts", "sentiment": "positive"}
    ]"#;

    const SENTIMENT_REPLY: &str = r#"{"symbol": "AAPL", "sentiment_score": 0.6, "sentiment_category": "positive",
        "analyzed_articles": 20, "key_factors": ["earnings"], "summary": "Bullish"}"#;

    fn healthy_market() -> FakeMarket {
        FakeMarket::with_chart(ChartSnapshot {
            last_price: Some(187.5),
            previous_close: Some(185.0),
            volume: Some(50_000_000),
            closes: vec![185.0, 187.5],
        })
        .summary(QuoteSummarySnapshot {
            market_cap: Some(2.9e12),
            target_mean: Some(210.0),
            analyst_count: Some(40),
            recommendation_key: Some("buy".into()),
            ..Default::default()
        })
    }

    fn advisor(llm: Arc<FakeLlm>, market: FakeMarket) -> InvestmentAdvisor {
        InvestmentAdvisor::new(llm, StockService::new(Arc::new(market), Duration::ZERO))
    }

    #[tokio::test]
    async fn builds_recommendation_end_to_end() {
        let llm = Arc::new(
            FakeLlm::new()
                .completion(APPLE_REPLY)
                .news(NEWS_REPLY)
                .sentiment(SENTIMENT_REPLY),
        );
        let rec = advisor(Arc::clone(&llm), healthy_market())
            .build_recommendation("AAPL")
            .await
            .unwrap();

        assert_eq!(rec.symbol, "AAPL");
        assert_eq!(rec.company_name, "Apple Inc.");
        assert_eq!(rec.recommendation, RecommendationAction::Buy);
        assert_eq!(rec.confidence_score, 0.8);
        assert_eq!(rec.rationale, "strong earnings");
        assert_eq!(rec.current_price, 187.5);
        assert_eq!(rec.current_price, rec.performance.current_price);
        assert_eq!(rec.news.len(), 1);
        assert_eq!(rec.news[0].title, "Apple beats estimates");
        let sentiment = rec.sentiment.unwrap();
        assert_eq!(sentiment.sentiment_category, SentimentCategory::Positive);
        assert_eq!(sentiment.sentiment_score, 0.6);

        let prompt = llm.last_chat_prompt().unwrap();
        for section in [
            "STOCK DATA:",
            "RECENT NEWS:",
            "MARKET SENTIMENT:",
            "ANALYST RECOMMENDATIONS:",
        ] {
            assert!(prompt.contains(section), "missing section {section}");
        }
        assert!(prompt.contains("Apple beats estimates"));
        assert!(prompt.contains("\"num_analysts\":40"));

        let chat = llm.chat_requests.lock().unwrap();
        assert!(chat[0].json_response);
        assert!((chat[0].temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn llm_supplied_price_is_ignored() {
        let reply = r#"{"company_name":"Apple Inc.","recommendation":"hold","confidence_score":0.5,
                        "rationale":"fair value","current_price":999.0}"#;
        let llm = Arc::new(FakeLlm::new().completion(reply));
        let rec = advisor(llm, healthy_market())
            .build_recommendation("AAPL")
            .await
            .unwrap();
        assert_eq!(rec.current_price, 187.5);
        assert_eq!(rec.recommendation, RecommendationAction::Hold);
    }

    #[tokio::test]
    async fn upstream_failures_still_produce_recommendation_from_fallbacks() {
        let llm = Arc::new(FakeLlm::new().completion(APPLE_REPLY));
        let rec = advisor(llm, FakeMarket::failing("down"))
            .build_recommendation("AAPL")
            .await
            .unwrap();
        assert_eq!(rec.performance, Performance::fallback("AAPL"));
        assert_eq!(rec.current_price, 150.25);
        assert_eq!(rec.news.len(), 3);
        assert!(rec.sentiment.is_some());
    }

    #[tokio::test]
    async fn malformed_synthesis_reply_is_ai_agent_error() {
        let llm = Arc::new(
            FakeLlm::new()
                .completion("I recommend buying Apple.")
                .news(NEWS_REPLY)
                .sentiment(SENTIMENT_REPLY),
        );
        let err = advisor(llm, healthy_market())
            .build_recommendation("AAPL")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AiAgent(_)));
        assert!(err
            .to_string()
            .starts_with("AI agent error: Failed to generate investment recommendation"));
    }

    #[tokio::test]
    async fn missing_synthesis_key_is_ai_agent_error() {
        let llm = Arc::new(
            FakeLlm::new().completion(r#"{"company_name":"Apple Inc.","recommendation":"buy"}"#),
        );
        let err = advisor(llm, healthy_market())
            .build_recommendation("AAPL")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AiAgent(_)));
    }

    #[tokio::test]
    async fn synthesis_transport_error_is_ai_agent_error() {
        let llm = Arc::new(FakeLlm::new());
        let err = advisor(llm, healthy_market())
            .build_recommendation("AAPL")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AiAgent(_)));
    }

    #[test]
    fn parse_synthesis_reply_tolerates_whitespace() {
        let verdict = parse_synthesis_reply(&format!("\n  {APPLE_REPLY}\n")).unwrap();
        assert_eq!(verdict.company_name, "Apple Inc.");
    }
}
