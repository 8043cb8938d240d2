use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::ai_json::extract_json;
use crate::indicators::{calculate_macd, calculate_rsi};
use crate::types::{
    AiAnalysisResult, AiIndicator, AiPrediction, AiPriceTarget, AiRiskAssessment,
    AiTechnicalSummary,
};

const RSI_PERIOD: usize = 14;

/// Turn raw model output into a typed analysis result.
///
/// Direct deserialize after extraction; if the payload is valid JSON but
/// missing sections (a truncated emission the repairer could still close),
/// the gaps are patched from locally computed indicators over `closes`.
/// Returns an error only when no JSON can be recovered at all.
pub fn parse_analysis_response(content: &str, closes: &[f64]) -> Result<AiAnalysisResult> {
    let candidate = extract_json(content);
    debug!("analysis candidate: {} chars", candidate.len());

    match serde_json::from_str::<AiAnalysisResult>(&candidate) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            debug!("direct deserialize failed: {err}");
            let partial: Value = serde_json::from_str(&candidate)
                .with_context(|| format!("model output is not recoverable JSON: {err}"))?;
            Ok(patch_incomplete_analysis(&partial, closes))
        }
    }
}

/// Fill missing sections of a partial analysis object with values derived
/// from the price series itself.
pub fn patch_incomplete_analysis(partial: &Value, closes: &[f64]) -> AiAnalysisResult {
    let last_price = closes.last().copied().unwrap_or(0.0);
    let price_change = if closes.len() >= 2 && closes[closes.len() - 2] != 0.0 {
        (last_price - closes[closes.len() - 2]) / closes[closes.len() - 2] * 100.0
    } else {
        0.0
    };

    let rsi = calculate_rsi(closes, RSI_PERIOD);
    let last_rsi = rsi.last().copied().unwrap_or(50.0);
    let last_macd = calculate_macd(closes).last().map(|p| p.macd).unwrap_or(0.0);

    let analysis = partial
        .get("analysis")
        .and_then(Value::as_str)
        .unwrap_or("Analysis derived from local technical indicators")
        .to_string();

    let prediction = match partial.get("prediction") {
        Some(pred) => AiPrediction {
            price: pred.get("price").and_then(Value::as_f64).unwrap_or(last_price),
            confidence: pred.get("confidence").and_then(Value::as_f64).unwrap_or(65.0),
            trend: pred
                .get("trend")
                .and_then(Value::as_str)
                .unwrap_or("neutral")
                .to_string(),
            reasoning: pred
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or("Derived from technical indicators")
                .to_string(),
        },
        None => {
            let trend = if last_rsi > 50.0 && last_macd > 0.0 {
                "bullish"
            } else if last_rsi < 50.0 && last_macd < 0.0 {
                "bearish"
            } else {
                "neutral"
            };
            AiPrediction {
                price: last_price * (1.0 + price_change / 100.0 * 0.1),
                confidence: 60.0,
                trend: trend.to_string(),
                reasoning: format!("Computed locally: RSI={last_rsi:.1}, MACD={last_macd:.2}"),
            }
        }
    };

    let risk_assessment = match partial.get("risk_assessment") {
        Some(risk) => AiRiskAssessment {
            level: risk
                .get("level")
                .and_then(Value::as_str)
                .unwrap_or("medium")
                .to_string(),
            factors: string_array(risk.get("factors"))
                .unwrap_or_else(|| vec!["Incomplete model output".to_string()]),
        },
        None => AiRiskAssessment {
            level: if last_rsi > 70.0 || last_rsi < 30.0 {
                "high"
            } else {
                "medium"
            }
            .to_string(),
            factors: vec!["Technical indicator assessment".to_string()],
        },
    };

    let recommendations = string_array(partial.get("recommendations")).unwrap_or_else(|| {
        vec![
            "Exercise caution".to_string(),
            "Monitor market conditions".to_string(),
        ]
    });

    let technical_summary = match partial.get("technical_summary") {
        Some(tech) => AiTechnicalSummary {
            indicators: tech
                .get("indicators")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| {
                            Some(AiIndicator {
                                name: v.get("name")?.as_str()?.to_string(),
                                value: v.get("value")?.as_f64()?,
                                signal: v.get("signal")?.as_str()?.to_string(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default(),
            overall_signal: tech
                .get("overall_signal")
                .and_then(Value::as_str)
                .unwrap_or("hold")
                .to_string(),
        },
        None => AiTechnicalSummary {
            indicators: vec![AiIndicator {
                name: "RSI".to_string(),
                value: last_rsi,
                signal: if last_rsi > 70.0 {
                    "sell"
                } else if last_rsi < 30.0 {
                    "buy"
                } else {
                    "hold"
                }
                .to_string(),
            }],
            overall_signal: "hold".to_string(),
        },
    };

    let price_targets = partial
        .get("price_targets")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| {
                    Some(AiPriceTarget {
                        period: v.get("period")?.as_str()?.to_string(),
                        target: v.get("target")?.as_f64()?,
                        probability: v.get("probability")?.as_f64()?,
                    })
                })
                .collect()
        })
        .unwrap_or_else(|| {
            vec![AiPriceTarget {
                period: "1w".to_string(),
                target: last_price * 1.05,
                probability: 60.0,
            }]
        });

    AiAnalysisResult {
        analysis,
        prediction,
        risk_assessment,
        recommendations,
        technical_summary,
        price_targets,
    }
}

fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_payload() -> Value {
        json!({
            "analysis": "Steady accumulation with rising volume.",
            "prediction": {
                "price": 182.5,
                "confidence": 72.0,
                "trend": "bullish",
                "reasoning": "Momentum confirmed by MACD crossover."
            },
            "risk_assessment": {
                "level": "medium",
                "factors": ["Sector rotation", "Earnings next week"]
            },
            "recommendations": ["Scale in gradually"],
            "technical_summary": {
                "indicators": [
                    {"name": "RSI", "value": 61.2, "signal": "hold"}
                ],
                "overall_signal": "buy"
            },
            "price_targets": [
                {"period": "1w", "target": 185.0, "probability": 55.0}
            ]
        })
    }

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    #[test]
    fn well_formed_payload_round_trips() {
        let content = format!("```json\n{}\n```", complete_payload());
        let result = parse_analysis_response(&content, &closes(40)).unwrap();
        assert_eq!(result.prediction.trend, "bullish");
        assert_eq!(result.technical_summary.overall_signal, "buy");
        assert_eq!(result.price_targets.len(), 1);
    }

    #[test]
    fn truncated_payload_is_repaired_and_patched() {
        // Cut off inside the prediction object: repairable JSON, but the
        // typed deserialize fails and the gaps get patched.
        init_tracing();
        let content = r#"{"analysis": "Momentum is fading", "prediction": {"price": 97.5"#;
        let result = parse_analysis_response(content, &closes(40)).unwrap();
        assert_eq!(result.analysis, "Momentum is fading");
        assert_eq!(result.prediction.price, 97.5);
        assert_eq!(result.prediction.trend, "neutral");
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn missing_sections_patched_from_indicators() {
        let result =
            parse_analysis_response(r#"{"analysis": "partial"}"#, &closes(40)).unwrap();
        // Strictly rising closes: high RSI, positive MACD.
        assert_eq!(result.prediction.trend, "bullish");
        assert_eq!(result.risk_assessment.level, "high");
        assert_eq!(result.technical_summary.indicators[0].name, "RSI");
        assert_eq!(result.technical_summary.indicators[0].signal, "sell");
    }

    #[test]
    fn garbage_input_is_an_error() {
        init_tracing();
        assert!(parse_analysis_response("the model refused to answer", &closes(10)).is_err());
    }

    #[test]
    fn patch_tolerates_empty_price_series() {
        let result = patch_incomplete_analysis(&json!({}), &[]);
        assert_eq!(result.prediction.price, 0.0);
        assert_eq!(result.prediction.trend, "neutral");
    }
}
