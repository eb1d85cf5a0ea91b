use crate::domain::stock::{AnalystTargets, Performance};
use crate::error::{with_fallback, AppError, AppResult};
use crate::market::pacing::RequestPacer;
use crate::market::types::QuoteSummarySnapshot;
use crate::market::yahoo::YahooFinanceClient;
use crate::market::MarketDataProvider;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MIN_INTERVAL_MS: u64 = 2_000;

/// Market data client: paced upstream calls with fallback substitution.
pub struct StockService {
    provider: Arc<dyn MarketDataProvider>,
    pacer: RequestPacer,
}

impl StockService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, min_interval: Duration) -> Self {
        Self {
            provider,
            pacer: RequestPacer::new(min_interval),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let min_interval_ms = std::env::var("MARKET_DATA_MIN_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MIN_INTERVAL_MS);

        Ok(Self::new(
            Arc::new(YahooFinanceClient::from_env()?),
            Duration::from_millis(min_interval_ms),
        ))
    }

    /// Latest price and valuation figures; the fixed fallback record on failure.
    pub async fn fetch_price(&self, symbol: &str) -> Performance {
        with_fallback(self.try_fetch_price(symbol).await, || {
            tracing::warn!(%symbol, "using fallback market data");
            Performance::fallback(symbol)
        })
    }

    /// Analyst price targets; an empty record on failure.
    pub async fn fetch_analyst_targets(&self, symbol: &str) -> AnalystTargets {
        with_fallback(
            self.try_fetch_analyst_targets(symbol).await,
            AnalystTargets::unavailable,
        )
    }

    pub async fn try_fetch_price(&self, symbol: &str) -> AppResult<Performance> {
        tracing::info!(%symbol, provider = self.provider.provider_name(), "fetching stock data");

        self.pacer.wait_turn().await;
        let chart = self
            .provider
            .fetch_chart(symbol)
            .await
            .map_err(|e| AppError::stock_data(format!("{symbol}: {e:#}")))?;

        let current_price = chart
            .last_price
            .filter(|p| *p > 0.0)
            .or_else(|| chart.closes.last().copied())
            .filter(|p| *p > 0.0)
            .ok_or_else(|| AppError::stock_data(format!("{symbol}: no price in chart data")))?;

        self.pacer.wait_turn().await;
        let summary = match self.provider.fetch_quote_summary(symbol).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "could not fetch detailed info");
                QuoteSummarySnapshot::default()
            }
        };

        let previous_close = chart.previous_close.or(summary.previous_close);

        Ok(Performance {
            symbol: symbol.to_string(),
            current_price,
            change_percentage: change_percentage(
                Some(current_price),
                previous_close.or(Some(current_price)),
            ),
            volume: chart
                .volume
                .or(summary.volume)
                .or(summary.average_volume)
                .unwrap_or(0),
            market_cap: summary.market_cap,
            pe_ratio: summary.trailing_pe,
            dividend_yield: summary
                .dividend_yield
                .filter(|y| *y != 0.0)
                .map(|y| y * 100.0),
        })
    }

    pub async fn try_fetch_analyst_targets(&self, symbol: &str) -> AppResult<AnalystTargets> {
        tracing::info!(%symbol, "fetching analyst recommendations");

        self.pacer.wait_turn().await;
        let summary = self
            .provider
            .fetch_quote_summary(symbol)
            .await
            .map_err(|e| AppError::stock_data(format!("{symbol}: {e:#}")))?;

        Ok(AnalystTargets {
            average_target: summary.target_mean,
            low_target: summary.target_low,
            high_target: summary.target_high,
            num_analysts: summary.analyst_count.unwrap_or(0),
            recommendation: summary
                .recommendation_key
                .unwrap_or_else(|| "N/A".to_string()),
        })
    }
}

/// Percent change from `previous` to `current`; 0 when either side is unusable.
pub fn change_percentage(current: Option<f64>, previous: Option<f64>) -> f64 {
    match (current, previous) {
        (Some(current), Some(previous)) if previous > 0.0 && current != 0.0 => {
            (current - previous) / previous * 100.0
        }
        _ => 0.0,
    }
}
