/// Wire types exchanged with the analysis service
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub amazon_url: String,
}

impl AnalyzeRequest {
    pub fn new(url: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            amazon_url: url.trim().to_string(),
        }
    }
}

/// Body of a non-2xx response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Scraped product facts. The service emits these as display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub title: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub review_count: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub quality: String,
    pub score: i64,
    pub analysis: String,
    pub current_price: f64,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub percentile: f64,
    pub savings_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationAnalysis {
    pub inflation_detected: bool,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String,
    pub price: f64,
}

/// A cheaper or better-rated product suggested instead of the analyzed one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
    pub savings: f64,
    pub savings_percent: f64,
    pub why_better: String,
    pub asin: String,
    pub amazon_url: String,
    pub affiliate_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Success body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub url: String,
    pub asin: String,
    pub affiliate_link: String,
    pub product_data: ProductSummary,
    pub verdict: String,
    pub impulse_score: i64,
    pub confidence_score: i64,
    #[serde(default)]
    pub impulse_factors: BTreeMap<String, i64>,
    #[serde(default)]
    pub deal_analysis: Option<DealAnalysis>,
    #[serde(default)]
    pub inflation_analysis: Option<InflationAnalysis>,
    #[serde(default)]
    pub price_history: Option<Vec<PricePoint>>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub recommendation: String,
}

/// Stored analysis as listed by `GET /api/recent-analyses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: String,
    pub url: String,
    pub product_data: ProductSummary,
    pub verdict: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub impulse_score: i64,
    pub recommendation: String,
    pub timestamp: String,
}

/// Body of `GET /api/`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub message: String,
}

// Scrapers are inconsistent about "4.5" vs 4.5
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}
