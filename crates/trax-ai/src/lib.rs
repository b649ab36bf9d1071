//! Analysis layer: turns report text into a model completion containing a
//! JSON record followed by a diagnostic narrative.

mod openai;
mod prompt;

pub use openai::{OpenAiAnalyzer, OpenAiConfig};
pub use prompt::{build_prompt, truncate_chars};

use async_trait::async_trait;
use thiserror::Error;
use trax_core::DocumentDate;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model returned no completion text")]
    EmptyCompletion,

    #[error("no API key configured")]
    MissingCredentials,
}

/// The analysis collaborator.
///
/// Credentials and model choice live in the implementation, not in process
/// state, so the pipeline can be driven by a stub.
#[async_trait]
pub trait ReportAnalyzer: Send + Sync {
    /// Analyze one report and return the raw completion.
    async fn analyze(
        &self,
        text: &str,
        document_date: DocumentDate,
        filename: &str,
    ) -> Result<String, AnalysisError>;
}
