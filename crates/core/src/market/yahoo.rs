use crate::market::types::{ChartResponse, ChartSnapshot, QuoteSummaryResponse, QuoteSummarySnapshot};
use crate::market::MarketDataProvider;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const CHART_RANGE: &str = "5d";
const SUMMARY_MODULES: &str = "summaryDetail,financialData";

#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("YAHOO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid YAHOO_BASE_URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("YAHOO_BASE_URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        let res = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("market data request failed: {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("market data response has unexpected shape: {text}"))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_chart(&self, symbol: &str) -> Result<ChartSnapshot> {
        let url = self.url(&["v8", "finance", "chart", symbol])?;
        let res: ChartResponse = self
            .get_json(url, &[("range", CHART_RANGE), ("interval", "1d")])
            .await?;
        res.into_snapshot()
    }

    async fn fetch_quote_summary(&self, symbol: &str) -> Result<QuoteSummarySnapshot> {
        let url = self.url(&["v10", "finance", "quoteSummary", symbol])?;
        let res: QuoteSummaryResponse = self.get_json(url, &[("modules", SUMMARY_MODULES)]).await?;
        res.into_snapshot()
    }
}
