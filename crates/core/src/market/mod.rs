pub mod pacing;
pub mod service;
pub mod types;
pub mod yahoo;

use crate::market::types::{ChartSnapshot, QuoteSummarySnapshot};

pub use service::StockService;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_chart(&self, symbol: &str) -> anyhow::Result<ChartSnapshot>;

    async fn fetch_quote_summary(&self, symbol: &str) -> anyhow::Result<QuoteSummarySnapshot>;
}
