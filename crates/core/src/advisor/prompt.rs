use crate::domain::stock::{AnalystTargets, NewsItem, Performance, Sentiment};
use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "You are a financial expert AI assistant that provides stock \
investment recommendations based on data analysis.";

/// Everything gathered for one symbol before synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchBundle {
    pub performance: Performance,
    pub analyst_targets: AnalystTargets,
    pub news: Vec<NewsItem>,
    pub sentiment: Sentiment,
}

pub fn analysis_prompt(symbol: &str, bundle: &ResearchBundle) -> anyhow::Result<String> {
    let stock_data = serde_json::to_string(&bundle.performance)?;
    let news = serde_json::to_string(&bundle.news)?;
    let sentiment = serde_json::to_string(&bundle.sentiment)?;
    let analyst = serde_json::to_string(&bundle.analyst_targets)?;

    Ok([
        format!(
            "You are an expert financial advisor. Based on the following data about {symbol}, \
             provide an investment recommendation (buy, sell, or hold)."
        ),
        String::new(),
        "STOCK DATA:".to_string(),
        stock_data,
        String::new(),
        "RECENT NEWS:".to_string(),
        news,
        String::new(),
        "MARKET SENTIMENT:".to_string(),
        sentiment,
        String::new(),
        "ANALYST RECOMMENDATIONS:".to_string(),
        analyst,
        String::new(),
        "Analyze this information and provide your recommendation in JSON format with these fields:"
            .to_string(),
        "- company_name: The full company name".to_string(),
        "- recommendation: \"buy\", \"sell\", or \"hold\"".to_string(),
        "- confidence_score: A value from 0 to 1 indicating confidence level".to_string(),
        "- rationale: A clear explanation of your recommendation".to_string(),
        String::new(),
        "Your response should be valid JSON only.".to_string(),
    ]
    .join("\n"))
}
