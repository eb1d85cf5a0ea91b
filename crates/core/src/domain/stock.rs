use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

impl SentimentCategory {
    /// Scores strictly above 0.3 are positive, strictly below -0.3 negative.
    pub fn from_score(score: f64) -> Self {
        if score > 0.3 {
            Self::Positive
        } else if score < -0.3 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Case-insensitive label parse; `None` for anything unrecognized.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub date: DateTime<Utc>,
    pub summary: String,
    pub sentiment: SentimentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub symbol: String,
    pub current_price: f64,
    pub change_percentage: f64,
    pub volume: u64,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl Performance {
    /// Substitute record used when live market data cannot be fetched.
    pub fn fallback(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            current_price: 150.25,
            change_percentage: 1.5,
            volume: 1_200_000,
            market_cap: Some(2_000_000_000.0),
            pe_ratio: Some(25.4),
            dividend_yield: Some(1.2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub symbol: String,
    pub sentiment_score: f64,
    pub sentiment_category: SentimentCategory,
    pub analyzed_articles: Option<u32>,
    pub key_factors: Option<Vec<String>>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystTargets {
    pub average_target: Option<f64>,
    pub low_target: Option<f64>,
    pub high_target: Option<f64>,
    pub num_analysts: u32,
    pub recommendation: String,
}

impl AnalystTargets {
    /// Empty record used when analyst data is unavailable.
    pub fn unavailable() -> Self {
        Self {
            average_target: None,
            low_target: None,
            high_target: None,
            num_analysts: 0,
            recommendation: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingStock {
    pub symbol: String,
    pub company_name: String,
    pub trend_score: f64,
}

pub fn trending_stocks() -> Vec<TrendingStock> {
    [
        ("AAPL", "Apple Inc.", 0.92),
        ("MSFT", "Microsoft Corporation", 0.89),
        ("GOOGL", "Alphabet Inc.", 0.87),
        ("AMZN", "Amazon.com, Inc.", 0.85),
        ("TSLA", "Tesla, Inc.", 0.82),
    ]
    .into_iter()
    .map(|(symbol, company_name, trend_score)| TrendingStock {
        symbol: symbol.to_string(),
        company_name: company_name.to_string(),
        trend_score,
    })
    .collect()
}
