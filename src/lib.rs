//! Analysis core for the SmartStock AI dashboard: salvage of truncated
//! model-generated JSON, RSI/MACD series calculation, and the daily
//! cache-staleness policy the refresh orchestrator runs on.

pub mod ai_json;
pub mod analysis;
pub mod cache;
pub mod indicators;
pub mod staleness;
pub mod types;

pub use ai_json::{extract_json, repair_truncated_json};
pub use analysis::{parse_analysis_response, patch_incomplete_analysis};
pub use cache::DashboardCache;
pub use indicators::{calculate_ema, calculate_macd, calculate_rsi};
pub use staleness::{is_data_stale, is_stale_at};
pub use types::{
    AiAnalysisResult, AiIndicator, AiPrediction, AiPriceTarget, AiRiskAssessment,
    AiTechnicalSummary, MacdPoint, StockData,
};
