use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::types::{AnalysisError, AnalysisItem, Analyzer, Report};
use crate::llm::{CompletionRequest, Message, ProviderAdapter};

const SYSTEM_PROMPT: &str = "You are a PC diagnostic assistant. You receive a user's problem \
description and the raw output of a system information collection script. Reply with a single \
JSON object with the keys: summary (string), analysis (array of objects with component, status, \
details, recommendation), potentialCauses (array of strings), suggestedSolutions (array of \
strings), confidenceScore (number between 0 and 1).";

/// Analyzer backed by a generative model.
pub struct LiveAnalyzer {
    provider: Arc<dyn ProviderAdapter>,
    model: Option<String>,
    temperature: Option<f64>,
}

impl LiveAnalyzer {
    pub fn new(provider: Arc<dyn ProviderAdapter>, model: Option<String>, temperature: Option<f64>) -> Self {
        Self {
            provider,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl Analyzer for LiveAnalyzer {
    async fn analyze(&self, raw_system_info: &str, problem_text: &str) -> Result<Report, AnalysisError> {
        let request = CompletionRequest {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(&build_prompt(raw_system_info, problem_text)),
            ],
            temperature: self.temperature,
            model: self.model.clone(),
            json_output: true,
        };
        info!(model = ?self.model, raw_len = raw_system_info.len(), "requesting live analysis");
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|err| AnalysisError::Backend(err.to_string()))?;
        debug!(content_len = response.content.len(), "live analysis returned");
        parse_report(&response.content)
    }
}

fn build_prompt(raw: &str, problem: &str) -> String {
    let problem = if problem.trim().is_empty() {
        "(no description provided)"
    } else {
        problem
    };
    let raw = if raw.trim().is_empty() {
        "(no system information provided)"
    } else {
        raw
    };
    format!(
        "Problem description:\n{}\n\nRaw system information:\n{}\n",
        problem, raw
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReport {
    summary: String,
    #[serde(default)]
    analysis: Vec<AnalysisItem>,
    #[serde(default)]
    potential_causes: Vec<String>,
    #[serde(default)]
    suggested_solutions: Vec<String>,
    #[serde(default)]
    confidence_score: f64,
}

fn parse_report(content: &str) -> Result<Report, AnalysisError> {
    let body = strip_code_fence(content);
    let parsed: ModelReport =
        serde_json::from_str(body).map_err(|err| AnalysisError::InvalidResponse(err.to_string()))?;
    Ok(Report {
        summary: parsed.summary,
        analysis: parsed.analysis,
        potential_causes: parsed.potential_causes,
        suggested_solutions: parsed.suggested_solutions,
        confidence_score: parsed.confidence_score.clamp(0.0, 1.0),
        generated_at: Utc::now(),
        error: None,
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMResponse, ProviderError};

    struct CannedProvider(Result<String, ProviderError>);

    #[async_trait]
    impl ProviderAdapter for CannedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
            assert!(request.json_output);
            assert_eq!(request.messages.len(), 2);
            self.0.clone().map(|content| LLMResponse { content, raw: None })
        }
    }

    #[test]
    fn strips_fenced_json() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn prompt_marks_missing_inputs() {
        let prompt = build_prompt("", "screen flickers");
        assert!(prompt.contains("screen flickers"));
        assert!(prompt.contains("(no system information provided)"));
    }

    #[tokio::test]
    async fn parses_model_output_and_clamps_confidence() {
        let content = r#"```json
{"summary":"Disk nearly full","analysis":[{"component":"Disk","status":"Warning","details":"97% used","recommendation":"Free space"}],"potentialCauses":["Temp files"],"suggestedSolutions":["Run cleanup"],"confidenceScore":1.7}
```"#;
        let analyzer = LiveAnalyzer::new(Arc::new(CannedProvider(Ok(content.to_string()))), None, None);
        let report = analyzer.analyze("C: 97%", "slow boot").await.unwrap();

        assert_eq!(report.summary, "Disk nearly full");
        assert_eq!(report.analysis[0].component, "Disk");
        assert_eq!(report.potential_causes, vec!["Temp files".to_string()]);
        assert_eq!(report.confidence_score, 1.0);
    }

    #[tokio::test]
    async fn provider_failure_becomes_backend_error() {
        let provider = CannedProvider(Err(ProviderError::new("rate_limit", "quota exceeded", true)));
        let analyzer = LiveAnalyzer::new(Arc::new(provider), None, None);
        let err = analyzer.analyze("", "crash").await.unwrap_err();

        assert!(matches!(err, AnalysisError::Backend(_)));
        assert_eq!(err.to_string(), "rate_limit: quota exceeded");
    }

    #[tokio::test]
    async fn garbage_output_is_invalid_response() {
        let analyzer = LiveAnalyzer::new(Arc::new(CannedProvider(Ok("not json".to_string()))), None, None);
        let err = analyzer.analyze("", "crash").await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));
    }
}
