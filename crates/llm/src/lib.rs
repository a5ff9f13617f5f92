mod gemini;
mod prompt;

use thiserror::Error;

pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::build_copilot_prompt;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no language model configured")]
    Unavailable,
    #[error("language model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("language model returned status {0}")]
    Status(u16),
    #[error("language model returned an empty completion")]
    EmptyCompletion,
}

impl LlmError {
    /// Worth a retry: transport faults and server-side status codes.
    /// A 4xx means the request itself is wrong and will not get better.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Unavailable | Self::EmptyCompletion => false,
        }
    }
}

/// The language-model collaborator. The pipeline only ever sends a prompt
/// and reads back raw text; provider details stay behind this trait.
pub trait LanguageModel: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}

/// Stand-in used when no provider is configured; every call fails fast and
/// the pipeline degrades to rule-based handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullModel;

impl LanguageModel for NullModel {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Unavailable)
    }
}
