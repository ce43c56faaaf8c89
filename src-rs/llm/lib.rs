pub mod gemini_adapter;
pub mod types;

pub use gemini_adapter::{GeminiAdapter, GeminiConfig};
pub use types::{CompletionRequest, LLMResponse, Message, ProviderAdapter, ProviderError};
