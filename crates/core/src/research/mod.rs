//! News and sentiment gathered through the web-search agent.

pub mod dates;

use crate::domain::contract::{LlmNewsItem, LlmSentiment};
use crate::domain::stock::{NewsItem, Sentiment, SentimentCategory};
use crate::error::{with_fallback, AppError, AppResult};
use crate::llm::json::{parse_lenient, JsonAnchor};
use crate::llm::{LlmClient, WebSearchRequest};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;

pub const DEFAULT_MAX_RESULTS: usize = 5;

const POSITIVE_KEYWORDS: &[&str] = &[
    "surge", "jump", "rise", "gain", "positive", "boost", "up", "growth", "profit",
];
const NEGATIVE_KEYWORDS: &[&str] = &[
    "fall", "drop", "decline", "negative", "down", "loss", "crisis", "concern",
];

pub struct ResearchService {
    llm: Arc<dyn LlmClient>,
}

impl ResearchService {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Recent articles about `company`; templated mock articles on failure.
    pub async fn search_company_news(&self, company: &str, max_results: usize) -> Vec<NewsItem> {
        with_fallback(
            self.try_search_company_news(company, max_results).await,
            || {
                tracing::error!(%company, "web search failed, falling back to mock news");
                mock_news(company, max_results, Utc::now())
            },
        )
    }

    /// Market sentiment for `symbol`; a random mock reading on failure.
    pub async fn search_stock_sentiment(&self, symbol: &str) -> Sentiment {
        with_fallback(self.try_search_stock_sentiment(symbol).await, || {
            tracing::error!(%symbol, "sentiment analysis failed, falling back to mock data");
            mock_sentiment(symbol, &mut rand::thread_rng(), Utc::now())
        })
    }

    pub async fn try_search_company_news(
        &self,
        company: &str,
        max_results: usize,
    ) -> AppResult<Vec<NewsItem>> {
        tracing::info!(%company, max_results, "searching for news");
        let reply = self
            .llm
            .web_search(news_request(company))
            .await
            .map_err(|e| AppError::web_search(format!("{e:#}")))?;
        parse_news_reply(&reply, max_results, Utc::now())
    }

    pub async fn try_search_stock_sentiment(&self, symbol: &str) -> AppResult<Sentiment> {
        tracing::info!(%symbol, "analyzing sentiment");
        let reply = self
            .llm
            .web_search(sentiment_request(symbol))
            .await
            .map_err(|e| AppError::web_search(format!("{e:#}")))?;
        parse_sentiment_reply(&reply, symbol, Utc::now())
    }
}

fn news_request(company: &str) -> WebSearchRequest {
    WebSearchRequest {
        instructions: format!(
            "You are an expert financial analyst. Search for recent news about {company}. \
             Focus on articles that would impact stock price."
        ),
        prompt: format!(
            "Find the latest news articles about {company} that could impact its stock price.\n\
             Search for financial news, earnings reports, product announcements, or other major company developments.\n\
             Return exactly 5 recent, important news articles with their titles, sources, dates, and a brief summary.\n\
             Format your response as valid JSON with this structure:\n\
             [\n  {{\n    \"title\": \"Article title\",\n    \"source\": \"News source name\",\n    \
             \"date\": \"Publication date\",\n    \"summary\": \"Brief summary of the article\",\n    \
             \"sentiment\": \"positive/negative/neutral based on potential stock impact\"\n  }}\n]"
        ),
    }
}

fn sentiment_request(symbol: &str) -> WebSearchRequest {
    WebSearchRequest {
        instructions: format!(
            "You are an expert financial analyst. Search for recent news and market sentiment about {symbol} stock."
        ),
        prompt: format!(
            "Search for the latest market sentiment about {symbol} stock.\n\
             Analyze recent news, analyst opinions, and social media buzz.\n\
             Calculate an overall sentiment score between -1.0 (extremely negative) and 1.0 (extremely positive).\n\
             Return your analysis as valid JSON with this structure:\n\
             {{\n  \"symbol\": \"{symbol}\",\n  \"sentiment_score\": 0.5,\n  \
             \"sentiment_category\": \"positive/negative/neutral\",\n  \"analyzed_articles\": 15,\n  \
             \"key_factors\": [\"factor1\", \"factor2\"],\n  \"summary\": \"Brief summary of overall sentiment\"\n}}"
        ),
    }
}

pub fn parse_news_reply(
    reply: &str,
    max_results: usize,
    now: DateTime<Utc>,
) -> AppResult<Vec<NewsItem>> {
    let value = parse_lenient(reply, JsonAnchor::TitledArray)
        .into_result()
        .map_err(AppError::web_search)?;
    let items: Vec<LlmNewsItem> = serde_json::from_value(value)
        .map_err(|e| AppError::web_search(format!("news reply has unexpected shape: {e}")))?;

    items
        .into_iter()
        .take(max_results)
        .map(|item| {
            let date = item
                .date
                .as_deref()
                .and_then(dates::normalize_date)
                .unwrap_or(now);
            let sentiment = item
                .sentiment
                .as_deref()
                .and_then(SentimentCategory::parse_label)
                .unwrap_or_else(|| classify_by_keywords(&item.summary));
            item.validate(date, sentiment).map_err(AppError::web_search)
        })
        .collect()
}

pub fn parse_sentiment_reply(
    reply: &str,
    symbol: &str,
    now: DateTime<Utc>,
) -> AppResult<Sentiment> {
    let value = parse_lenient(reply, JsonAnchor::SymbolObject)
        .into_result()
        .map_err(AppError::web_search)?;

    for field in ["sentiment_score", "sentiment_category"] {
        if value.get(field).is_none() {
            return Err(AppError::web_search(format!(
                "missing required field '{field}' in sentiment data"
            )));
        }
    }

    let raw: LlmSentiment = serde_json::from_value(value)
        .map_err(|e| AppError::web_search(format!("sentiment reply has unexpected shape: {e}")))?;

    if !(-1.0..=1.0).contains(&raw.sentiment_score) {
        return Err(AppError::web_search(format!(
            "sentiment_score out of range: {}",
            raw.sentiment_score
        )));
    }
    let category = SentimentCategory::parse_label(&raw.sentiment_category).ok_or_else(|| {
        AppError::web_search(format!(
            "unknown sentiment_category: {}",
            raw.sentiment_category
        ))
    })?;

    Ok(Sentiment {
        symbol: symbol.to_string(),
        sentiment_score: raw.sentiment_score,
        sentiment_category: category,
        analyzed_articles: raw.analyzed_articles,
        key_factors: raw.key_factors,
        summary: raw
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("Overall market sentiment for {symbol}")),
        timestamp: now,
    })
}

/// Keyword vote on a summary; positive keywords win ties. Words match when they
/// start with a keyword, so "surges" counts for "surge".
pub fn classify_by_keywords(text: &str) -> SentimentCategory {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let hit = |keywords: &[&str]| {
        words
            .iter()
            .any(|w| keywords.iter().any(|k| w.starts_with(k)))
    };

    if hit(POSITIVE_KEYWORDS) {
        SentimentCategory::Positive
    } else if hit(NEGATIVE_KEYWORDS) {
        SentimentCategory::Negative
    } else {
        SentimentCategory::Neutral
    }
}

pub fn mock_news(company: &str, max_results: usize, now: DateTime<Utc>) -> Vec<NewsItem> {
    let slug = company.to_lowercase();
    let templates = [
        (
            format!("{company} Exceeds Quarterly Expectations"),
            "MarketWatch",
            format!("{company} reported better than expected earnings for the latest quarter."),
            SentimentCategory::Positive,
            "earnings",
        ),
        (
            format!("{company} Announces Strategic Partnership"),
            "Reuters",
            format!("{company} has entered into a strategic partnership to expand market presence."),
            SentimentCategory::Positive,
            "partnership",
        ),
        (
            format!("What's Next for {company} Stock?"),
            "Seeking Alpha",
            format!("Analysis of {company}'s stock performance and future outlook."),
            SentimentCategory::Neutral,
            "outlook",
        ),
    ];

    templates
        .into_iter()
        .take(max_results)
        .map(|(title, source, summary, sentiment, topic)| NewsItem {
            title,
            source: source.to_string(),
            date: now,
            summary,
            sentiment,
            url: Some(format!("https://example.com/news/{slug}-{topic}")),
        })
        .collect()
}

pub fn mock_sentiment<R: Rng + ?Sized>(symbol: &str, rng: &mut R, now: DateTime<Utc>) -> Sentiment {
    let score: f64 = rng.gen_range(-1.0..=1.0);
    let category = SentimentCategory::from_score(score);
    Sentiment {
        symbol: symbol.to_string(),
        sentiment_score: score,
        sentiment_category: category,
        analyzed_articles: Some(rng.gen_range(10..=50)),
        key_factors: Some(vec![
            "Market volatility".to_string(),
            "Industry trends".to_string(),
            "Company news".to_string(),
        ]),
        summary: format!(
            "Overall {} sentiment for {symbol} based on recent market activity",
            category.as_str()
        ),
        timestamp: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLlm;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_embedded_news_array_from_prose() {
        let reply = "Sure! Here is what I found:\n\
            [{\"title\": \"Apple unveils chip\", \"source\": \"Reuters\", \"date\": \"2026-02-27T10:00:00Z\", \
              \"summary\": \"Shares jump after launch\", \"sentiment\": \"positive\"},\n\
             {\"title\": \"Supplier warning\", \"source\": \"Bloomberg\", \"date\": \"02/25/2026\", \
              \"summary\": \"Margins decline on costs\"}]\n\
            These are the most relevant stories.";
        let items = parse_news_reply(reply, 5, now()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Apple unveils chip");
        assert_eq!(items[0].sentiment, SentimentCategory::Positive);
        assert_eq!(items[0].date, Utc.with_ymd_and_hms(2026, 2, 27, 10, 0, 0).unwrap());
        assert_eq!(items[1].sentiment, SentimentCategory::Negative);
        assert_eq!(items[1].date, Utc.with_ymd_and_hms(2026, 2, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn news_reply_without_json_is_web_search_error() {
        let err = parse_news_reply("No relevant news found today.", 5, now()).unwrap_err();
        assert!(matches!(err, AppError::WebSearch(_)));
    }

    #[test]
    fn unparseable_dates_default_to_now_and_results_are_truncated() {
        let reply = serde_json::json!([
            {"title": "a", "source": "s", "date": "last Tuesday", "summary": "flat day"},
            {"title": "b", "source": "s", "summary": "flat day"},
            {"title": "c", "source": "s", "summary": "flat day"}
        ])
        .to_string();
        let items = parse_news_reply(&reply, 2, now()).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.date == now()));
        assert!(items.iter().all(|i| i.sentiment == SentimentCategory::Neutral));
    }

    #[test]
    fn keyword_backfill() {
        assert_eq!(classify_by_keywords("Revenue surges 20%"), SentimentCategory::Positive);
        assert_eq!(classify_by_keywords("Profit drops amid crisis"), SentimentCategory::Positive);
        assert_eq!(classify_by_keywords("Shares drop on weak guidance"), SentimentCategory::Negative);
        assert_eq!(classify_by_keywords("Supply chain concerns persist"), SentimentCategory::Negative);
        assert_eq!(classify_by_keywords("CEO speaks at conference"), SentimentCategory::Neutral);
    }

    #[test]
    fn parses_sentiment_object() {
        let reply = "Analysis: {\"symbol\": \"AAPL\", \"sentiment_score\": 0.45, \"sentiment_category\": \"Positive\", \
                     \"analyzed_articles\": 12, \"key_factors\": [\"iPhone demand\"], \"summary\": \"Upbeat\"}";
        let s = parse_sentiment_reply(reply, "AAPL", now()).unwrap();
        assert_eq!(s.sentiment_category, SentimentCategory::Positive);
        assert_eq!(s.sentiment_score, 0.45);
        assert_eq!(s.analyzed_articles, Some(12));
        assert_eq!(s.timestamp, now());
    }

    #[test]
    fn loosely_typed_optional_fields_keep_model_score() {
        let reply = r#"{"symbol": "AAPL", "sentiment_score": 0.35, "sentiment_category": "positive",
                        "analyzed_articles": 15.0, "key_factors": "Earnings beat"}"#;
        let s = parse_sentiment_reply(reply, "AAPL", now()).unwrap();
        assert_eq!(s.sentiment_score, 0.35);
        assert_eq!(s.analyzed_articles, Some(15));
        assert_eq!(s.key_factors, Some(vec!["Earnings beat".to_string()]));
    }

    #[test]
    fn sentiment_missing_required_field_is_rejected() {
        let reply = r#"{"symbol": "AAPL", "sentiment_score": 0.2, "summary": "ok"}"#;
        let err = parse_sentiment_reply(reply, "AAPL", now()).unwrap_err();
        assert!(err.to_string().contains("sentiment_category"));

        let reply = r#"{"symbol": "AAPL", "sentiment_category": "neutral"}"#;
        assert!(parse_sentiment_reply(reply, "AAPL", now()).is_err());
    }

    #[test]
    fn sentiment_score_out_of_range_is_rejected() {
        let reply = r#"{"symbol": "AAPL", "sentiment_score": 3.0, "sentiment_category": "positive"}"#;
        assert!(parse_sentiment_reply(reply, "AAPL", now()).is_err());
    }

    #[test]
    fn mock_news_is_truncated() {
        assert_eq!(mock_news("Apple", 5, now()).len(), 3);
        let one = mock_news("Apple", 1, now());
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].source, "MarketWatch");
        assert_eq!(one[0].url.as_deref(), Some("https://example.com/news/apple-earnings"));
        assert!(mock_news("Apple", 0, now()).is_empty());
    }

    #[test]
    fn mock_sentiment_category_follows_score() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = mock_sentiment("AAPL", &mut rng, now());
            assert!((-1.0..=1.0).contains(&s.sentiment_score));
            assert_eq!(
                s.sentiment_category,
                SentimentCategory::from_score(s.sentiment_score)
            );
            let n = s.analyzed_articles.unwrap();
            assert!((10..=50).contains(&n));
        }
    }

    #[tokio::test]
    async fn search_failures_fall_back_to_mock_data() {
        let svc = ResearchService::new(Arc::new(FakeLlm::new()));
        let news = svc.search_company_news("TSLA", DEFAULT_MAX_RESULTS).await;
        assert_eq!(news.len(), 3);
        assert_eq!(news[0].title, "TSLA Exceeds Quarterly Expectations");

        let sentiment = svc.search_stock_sentiment("TSLA").await;
        assert_eq!(sentiment.symbol, "TSLA");
        assert_eq!(
            sentiment.sentiment_category,
            SentimentCategory::from_score(sentiment.sentiment_score)
        );
    }

    #[tokio::test]
    async fn searches_send_company_scoped_prompts() {
        let llm = Arc::new(FakeLlm::new());
        let svc = ResearchService::new(Arc::clone(&llm) as Arc<dyn LlmClient>);
        svc.search_company_news("NVDA", DEFAULT_MAX_RESULTS).await;
        svc.search_stock_sentiment("NVDA").await;

        let reqs = llm.search_requests.lock().unwrap();
        assert_eq!(reqs.len(), 2);
        assert!(reqs[0].instructions.contains("recent news about NVDA"));
        assert!(reqs[0].prompt.contains("Return exactly 5"));
        assert!(!reqs[0].prompt.contains("sentiment_score"));
        assert!(reqs[1].prompt.contains("\"symbol\": \"NVDA\""));
        assert!(reqs[1].prompt.contains("sentiment_score"));
    }

    #[tokio::test]
    async fn malformed_sentiment_reply_falls_back() {
        let llm = FakeLlm::new().sentiment("I am not sure about the sentiment.");
        let svc = ResearchService::new(Arc::new(llm));
        assert!(svc.try_search_stock_sentiment("AAPL").await.is_err());
        let s = svc.search_stock_sentiment("AAPL").await;
        assert_eq!(s.key_factors.as_ref().map(Vec::len), Some(3));
    }
}
