use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DiagnosticError;
use crate::llm::gemini_adapter::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerKind {
    Stub,
    Live,
}

impl FromStr for AnalyzerKind {
    type Err = DiagnosticError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "stub" | "simulated" | "" => Ok(AnalyzerKind::Stub),
            "live" | "gemini" => Ok(AnalyzerKind::Live),
            other => Err(DiagnosticError::Config(format!("unknown analyzer: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub port: u16,
    /// Wait between accepting a task and starting its analysis.
    pub analysis_delay: Duration,
    pub analysis_timeout: Option<Duration>,
    /// Terminal tasks older than this are swept. `None` keeps them forever.
    pub task_retention: Option<Duration>,
    pub retention_sweep_interval: Duration,
    pub analyzer: AnalyzerKind,
    pub stub_latency: Duration,
    pub model: String,
    pub gemini_base_url: String,
    pub temperature: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            analysis_delay: Duration::from_millis(5000),
            analysis_timeout: None,
            task_retention: None,
            retention_sweep_interval: Duration::from_secs(60),
            analyzer: AnalyzerKind::Stub,
            stub_latency: Duration::from_millis(3000),
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.3,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, DiagnosticError> {
        let defaults = Self::default();
        let analyzer = match env_opt("ANALYZER") {
            Some(raw) => raw.parse()?,
            None => defaults.analyzer,
        };
        Ok(Self {
            port: env_parse("PORT", defaults.port),
            analysis_delay: Duration::from_millis(env_parse(
                "ANALYSIS_DELAY_MS",
                defaults.analysis_delay.as_millis() as u64,
            )),
            analysis_timeout: positive_secs(env_opt_parse("ANALYSIS_TIMEOUT_SECS")),
            task_retention: env_opt_parse::<u64>("TASK_RETENTION_SECS").map(Duration::from_secs),
            retention_sweep_interval: Duration::from_secs(env_parse(
                "RETENTION_SWEEP_SECS",
                defaults.retention_sweep_interval.as_secs(),
            ))
            .max(Duration::from_secs(1)),
            analyzer,
            stub_latency: Duration::from_millis(env_parse(
                "STUB_LATENCY_MS",
                defaults.stub_latency.as_millis() as u64,
            )),
            model: env_opt("GEMINI_MODEL").unwrap_or(defaults.model),
            gemini_base_url: env_opt("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            temperature: env_parse("GEMINI_TEMPERATURE", defaults.temperature),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn env_opt_parse<T: FromStr>(key: &str) -> Option<T> {
    env_opt(key).and_then(|raw| raw.parse().ok())
}

fn env_parse<T: FromStr>(key: &str, fallback: T) -> T {
    env_opt_parse(key).unwrap_or(fallback)
}

// zero means "no limit", same as leaving the variable unset
fn positive_secs(raw: Option<u64>) -> Option<Duration> {
    raw.filter(|secs| *secs > 0).map(Duration::from_secs)
}
