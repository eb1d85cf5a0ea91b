//! Yahoo Finance payloads and the validated snapshots built from them.

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YahooError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub indicators: Option<ChartIndicators>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub chart_previous_close: Option<f64>,
    #[serde(default)]
    pub regular_market_volume: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Latest trading data for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<u64>,
    /// Non-null daily closes, oldest first.
    pub closes: Vec<f64>,
}

impl ChartResponse {
    pub fn into_snapshot(self) -> anyhow::Result<ChartSnapshot> {
        if let Some(err) = self.chart.error {
            anyhow::bail!(
                "chart error {}: {}",
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            );
        }

        let result = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .context("chart response has no result")?;

        let closes = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .map(|q| q.close.into_iter().flatten().collect())
            .unwrap_or_default();

        Ok(ChartSnapshot {
            last_price: result.meta.regular_market_price,
            previous_close: result
                .meta
                .previous_close
                .or(result.meta.chart_previous_close),
            volume: result.meta.regular_market_volume,
            closes,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryEnvelope {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    #[serde(default)]
    pub summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    pub financial_data: Option<FinancialData>,
}

/// Yahoo wraps numbers as `{"raw": 1.2, "fmt": "1.20"}`, or `{}` when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YahooNumber {
    #[serde(default)]
    pub raw: Option<f64>,
}

fn raw(n: Option<YahooNumber>) -> Option<f64> {
    n.and_then(|n| n.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetail {
    #[serde(default)]
    pub previous_close: Option<YahooNumber>,
    #[serde(default)]
    pub market_cap: Option<YahooNumber>,
    #[serde(default, rename = "trailingPE")]
    pub trailing_pe: Option<YahooNumber>,
    #[serde(default)]
    pub dividend_yield: Option<YahooNumber>,
    #[serde(default)]
    pub volume: Option<YahooNumber>,
    #[serde(default)]
    pub average_volume: Option<YahooNumber>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    #[serde(default)]
    pub target_mean_price: Option<YahooNumber>,
    #[serde(default)]
    pub target_low_price: Option<YahooNumber>,
    #[serde(default)]
    pub target_high_price: Option<YahooNumber>,
    #[serde(default)]
    pub number_of_analyst_opinions: Option<YahooNumber>,
    #[serde(default)]
    pub recommendation_key: Option<String>,
}

/// Fundamentals and analyst consensus for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuoteSummarySnapshot {
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    /// Fraction, e.g. 0.0044 for 0.44%.
    pub dividend_yield: Option<f64>,
    pub volume: Option<u64>,
    pub average_volume: Option<u64>,
    pub target_mean: Option<f64>,
    pub target_low: Option<f64>,
    pub target_high: Option<f64>,
    pub analyst_count: Option<u32>,
    pub recommendation_key: Option<String>,
}

impl QuoteSummaryResponse {
    pub fn into_snapshot(self) -> anyhow::Result<QuoteSummarySnapshot> {
        if let Some(err) = self.quote_summary.error {
            anyhow::bail!(
                "quoteSummary error {}: {}",
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            );
        }

        let result = self
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .context("quoteSummary response has no result")?;

        let mut out = QuoteSummarySnapshot::default();
        if let Some(d) = result.summary_detail {
            out.previous_close = raw(d.previous_close);
            out.market_cap = raw(d.market_cap);
            out.trailing_pe = raw(d.trailing_pe);
            out.dividend_yield = raw(d.dividend_yield);
            out.volume = raw(d.volume).map(|v| v.max(0.0) as u64);
            out.average_volume = raw(d.average_volume).map(|v| v.max(0.0) as u64);
        }
        if let Some(f) = result.financial_data {
            out.target_mean = raw(f.target_mean_price);
            out.target_low = raw(f.target_low_price);
            out.target_high = raw(f.target_high_price);
            out.analyst_count = raw(f.number_of_analyst_opinions).map(|v| v.max(0.0) as u32);
            out.recommendation_key = f
                .recommendation_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty());
        }
        Ok(out)
    }
}
