use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::types::{AnalysisError, AnalysisItem, Analyzer, Report};

const DRIVER_SECTION_MARKER: &str = "[SECTION_DEBUT: Pilotes Systemes]";
const NETWORK_MARKER: &str = "Windows IP Configuration";

#[derive(Clone, Debug)]
pub enum StubBehavior {
    /// Canned heuristic report built from the inputs.
    Simulated,
    Fixed(Report),
    Fail(String),
}

/// Deterministic analyzer used by default and in tests.
pub struct StubAnalyzer {
    latency: Duration,
    behavior: StubBehavior,
}

impl StubAnalyzer {
    pub fn simulated(latency: Duration) -> Self {
        Self {
            latency,
            behavior: StubBehavior::Simulated,
        }
    }

    pub fn fixed(report: Report, latency: Duration) -> Self {
        Self {
            latency,
            behavior: StubBehavior::Fixed(report),
        }
    }

    pub fn failing(message: &str, latency: Duration) -> Self {
        Self {
            latency,
            behavior: StubBehavior::Fail(message.to_string()),
        }
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, raw_system_info: &str, problem_text: &str) -> Result<Report, AnalysisError> {
        debug!(
            problem_len = problem_text.len(),
            raw_len = raw_system_info.len(),
            latency_ms = self.latency.as_millis() as u64,
            "stub analysis started"
        );
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.behavior {
            StubBehavior::Simulated => Ok(simulated_report(raw_system_info, problem_text)),
            StubBehavior::Fixed(report) => Ok(report.clone()),
            StubBehavior::Fail(message) => Err(AnalysisError::Backend(message.clone())),
        }
    }
}

fn simulated_report(raw: &str, problem: &str) -> Report {
    let raw = raw.trim();
    let problem = problem.trim();

    let (system_status, system_details, system_recommendation) = if raw.is_empty() {
        (
            "Not provided",
            "No raw system information was provided.".to_string(),
            "Provide system information from the collection script for a more precise diagnosis.",
        )
    } else {
        let details = if raw.contains(DRIVER_SECTION_MARKER) {
            format!(
                "Raw system data received ({} characters). Contains a system drivers section. Needs detailed AI analysis.",
                raw.len()
            )
        } else if raw.contains(NETWORK_MARKER) {
            format!(
                "Raw system data received ({} characters). Appears to contain network information. Needs detailed AI analysis.",
                raw.len()
            )
        } else {
            format!(
                "Raw system data received ({} characters). Format not specifically recognised; needs detailed AI analysis.",
                raw.len()
            )
        };
        (
            "Received (raw text)",
            details,
            "The AI must interpret this text to identify potential problems.",
        )
    };

    let problem_item = if problem.is_empty() {
        AnalysisItem {
            component: "Problem description".to_string(),
            status: "Not provided".to_string(),
            details: "No problem description was provided.".to_string(),
            recommendation: "Describe the problem to help the diagnosis.".to_string(),
        }
    } else {
        AnalysisItem {
            component: "Problem description".to_string(),
            status: "Provided".to_string(),
            details: format!("Described problem: \"{}\"", problem),
            recommendation: "Analyse together with the system information.".to_string(),
        }
    };

    let complete = !raw.is_empty() && !problem.is_empty();
    let summary = if problem.is_empty() {
        "Analysis based on system information only. System information was supplied as raw text.".to_string()
    } else {
        format!(
            "Analysis based on the description \"{}\". System information was supplied as raw text.",
            problem
        )
    };

    Report {
        summary,
        analysis: vec![
            AnalysisItem {
                component: "System information (raw text)".to_string(),
                status: system_status.to_string(),
                details: system_details,
                recommendation: system_recommendation.to_string(),
            },
            problem_item,
        ],
        potential_causes: if complete {
            vec!["AI analysis of the raw text in progress...".to_string()]
        } else {
            vec!["Not enough information to determine potential causes.".to_string()]
        },
        suggested_solutions: if complete {
            vec!["Solutions pending AI analysis of the raw text...".to_string()]
        } else {
            vec!["Provide both the problem description and the system information for suggestions.".to_string()]
        },
        confidence_score: if complete { 0.55 } else { 0.15 },
        generated_at: Utc::now(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_report_with_both_inputs() {
        let analyzer = StubAnalyzer::simulated(Duration::ZERO);
        let report = analyzer
            .analyze("Windows IP Configuration\n  Host Name: pc-01", "no network")
            .await
            .unwrap();

        assert_eq!(report.confidence_score, 0.55);
        assert_eq!(report.analysis.len(), 2);
        assert!(report.analysis[0].details.contains("network information"));
        assert_eq!(report.analysis[1].status, "Provided");
        assert!(report.summary.contains("no network"));
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn simulated_report_problem_only() {
        let analyzer = StubAnalyzer::simulated(Duration::ZERO);
        let report = analyzer.analyze("", "slow boot").await.unwrap();

        assert_eq!(report.confidence_score, 0.15);
        assert_eq!(report.analysis[0].status, "Not provided");
    }

    #[tokio::test]
    async fn simulated_report_detects_driver_section() {
        let analyzer = StubAnalyzer::simulated(Duration::ZERO);
        let raw = format!("header\n{}\nnvlddmkm", DRIVER_SECTION_MARKER);
        let report = analyzer.analyze(&raw, "").await.unwrap();

        assert!(report.analysis[0].details.contains("drivers section"));
        assert!(report.summary.contains("system information only"));
    }

    #[tokio::test]
    async fn failing_stub_returns_its_message() {
        let analyzer = StubAnalyzer::failing("model overloaded", Duration::ZERO);
        let err = analyzer.analyze("", "crash").await.unwrap_err();
        assert_eq!(err.to_string(), "model overloaded");
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_stub_waits_for_latency() {
        let expected = Report::failure("placeholder", Utc::now());
        let analyzer = StubAnalyzer::fixed(expected.clone(), Duration::from_secs(3));

        let started = tokio::time::Instant::now();
        let report = analyzer.analyze("", "x").await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(report, expected);
    }
}
