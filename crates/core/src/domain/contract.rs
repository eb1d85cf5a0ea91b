//! Shapes the LLM is asked to produce, validated before they reach the domain.

use crate::domain::recommendation::RecommendationAction;
use crate::domain::stock::{NewsItem, SentimentCategory};
use anyhow::{bail, ensure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Final synthesis reply.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSynthesisReply {
    pub company_name: String,
    pub recommendation: String,
    pub confidence_score: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisVerdict {
    pub company_name: String,
    pub recommendation: RecommendationAction,
    pub confidence_score: f64,
    pub rationale: String,
}

impl LlmSynthesisReply {
    pub fn validate(self) -> anyhow::Result<SynthesisVerdict> {
        let company_name = self.company_name.trim().to_string();
        ensure!(!company_name.is_empty(), "company_name must be non-empty");

        let recommendation = match self.recommendation.trim().to_ascii_lowercase().as_str() {
            "buy" => RecommendationAction::Buy,
            "sell" => RecommendationAction::Sell,
            "hold" => RecommendationAction::Hold,
            other => bail!("recommendation must be buy, sell or hold (got {other:?})"),
        };

        ensure!(
            (0.0..=1.0).contains(&self.confidence_score),
            "confidence_score must be between 0 and 1 (got {})",
            self.confidence_score
        );

        let rationale = self.rationale.trim().to_string();
        ensure!(!rationale.is_empty(), "rationale must be non-empty");

        Ok(SynthesisVerdict {
            company_name,
            recommendation,
            confidence_score: self.confidence_score,
            rationale,
        })
    }
}

/// One article as returned by the news search agent.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmNewsItem {
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub date: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LlmNewsItem {
    /// `date` and `sentiment` are resolved by the caller, which owns the
    /// normalization rules.
    pub fn validate(
        self,
        date: DateTime<Utc>,
        sentiment: SentimentCategory,
    ) -> anyhow::Result<NewsItem> {
        let title = self.title.trim().to_string();
        ensure!(!title.is_empty(), "news title must be non-empty");

        Ok(NewsItem {
            title,
            source: self.source.trim().to_string(),
            date,
            summary: self.summary.trim().to_string(),
            sentiment,
            url: self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
        })
    }
}

/// Sentiment analysis as returned by the sentiment search agent.
///
/// Only the score and category are binding. Optional fields of the wrong
/// shape are read as absent rather than failing the whole reply.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSentiment {
    #[serde(default, deserialize_with = "lenient_text")]
    pub symbol: Option<String>,
    pub sentiment_score: f64,
    pub sentiment_category: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub analyzed_articles: Option<u32>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub key_factors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

// 15, 15.0 and "15" all count; negatives and fractions do not.
fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(f))
                    .map(|f| f as u32)
            }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// A bare string becomes a one-element list; non-string entries are dropped.
fn lenient_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    let factors: Vec<String> = match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        _ => return Ok(None),
    };
    let factors: Vec<String> = factors
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Ok((!factors.is_empty()).then_some(factors))
}
