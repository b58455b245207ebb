use thiserror::Error;

/// Failure contract of an analysis request. Callers branch on the kind: a
/// missing credential degrades, shape and transport problems surface as
/// user-visible messages.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("AI analysis is not configured. Set the GEMINI_API_KEY environment variable.")]
    ServiceUnavailable,

    #[error("The AI reply was missing the expected insights/suggestions fields.")]
    InvalidResponseShape,

    #[error("Failed to get analysis from AI: {0}")]
    RequestFailed(String),
}
