pub mod live;
pub mod stub;
pub mod types;

pub use live::LiveAnalyzer;
pub use stub::{StubAnalyzer, StubBehavior};
pub use types::{AnalysisError, AnalysisItem, Analyzer, Report};
