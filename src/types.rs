use serde::{Deserialize, Serialize};

/// One OHLCV bar as supplied by the market-data layer. Indicator math only
/// reads `close`; the rest of the record is carried for chart collaborators.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StockData {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// One MACD sample. `date` is left empty by the calculator; callers attach
/// real dates positionally against their price series.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MacdPoint {
    pub date: String,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiAnalysisResult {
    pub analysis: String,
    pub prediction: AiPrediction,
    pub risk_assessment: AiRiskAssessment,
    pub recommendations: Vec<String>,
    pub technical_summary: AiTechnicalSummary,
    pub price_targets: Vec<AiPriceTarget>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiPrediction {
    pub price: f64,
    pub confidence: f64,
    pub trend: String,
    pub reasoning: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiRiskAssessment {
    pub level: String,
    pub factors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiTechnicalSummary {
    pub indicators: Vec<AiIndicator>,
    pub overall_signal: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiIndicator {
    pub name: String,
    pub value: f64,
    pub signal: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiPriceTarget {
    pub period: String,
    pub target: f64,
    pub probability: f64,
}
