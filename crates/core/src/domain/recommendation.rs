use crate::domain::stock::{NewsItem, Performance, Sentiment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub recommendation: RecommendationAction,
    pub confidence_score: f64,
    pub rationale: String,
    pub news: Vec<NewsItem>,
    pub performance: Performance,
    pub sentiment: Option<Sentiment>,
    pub timestamp: DateTime<Utc>,
}
