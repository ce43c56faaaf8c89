use std::env;
use std::sync::Arc;

use tracing::info;

use crate::analyzer::{Analyzer, LiveAnalyzer, StubAnalyzer};
use crate::config::{AnalyzerKind, ServiceConfig};
use crate::error::DiagnosticError;
use crate::llm::{GeminiAdapter, GeminiConfig};

/// Collects `PRIMARY` (comma separated) plus `PREFIX_2` .. `PREFIX_10`.
fn load_keys_from_env(primary: &str, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Ok(raw) = env::var(primary) {
        keys.extend(split_keys(&raw));
    }
    for idx in 2..=10 {
        if let Ok(value) = env::var(format!("{}_{}", prefix, idx)) {
            keys.extend(split_keys(&value));
        }
    }
    keys
}

fn split_keys(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

pub fn load_gemini_keys() -> Vec<String> {
    load_keys_from_env("GEMINI_API_KEY", "GEMINI_API_KEY")
}

pub fn build_analyzer(cfg: &ServiceConfig) -> Result<Arc<dyn Analyzer>, DiagnosticError> {
    match cfg.analyzer {
        AnalyzerKind::Stub => {
            info!(latency_ms = cfg.stub_latency.as_millis() as u64, "using simulated analyzer");
            Ok(Arc::new(StubAnalyzer::simulated(cfg.stub_latency)))
        }
        AnalyzerKind::Live => {
            let api_keys = load_gemini_keys();
            if api_keys.is_empty() {
                return Err(DiagnosticError::Config(
                    "live analyzer selected but no GEMINI_API_KEY found".to_string(),
                ));
            }
            info!(model = %cfg.model, keys = api_keys.len(), "using live analyzer");
            let adapter = GeminiAdapter::new(GeminiConfig {
                api_keys,
                base_url: cfg.gemini_base_url.clone(),
                model: cfg.model.clone(),
                temperature: cfg.temperature,
            })
            .map_err(|err| DiagnosticError::Config(err.to_string()))?;
            Ok(Arc::new(LiveAnalyzer::new(
                Arc::new(adapter),
                Some(cfg.model.clone()),
                Some(cfg.temperature),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keys_skips_blanks() {
        let keys: Vec<String> = split_keys(" a, ,b ,,c").collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn stub_analyzer_needs_no_keys() {
        assert!(build_analyzer(&ServiceConfig::default()).is_ok());
    }
}
