//! Client for the Gemini generateContent endpoint. The request carries a
//! response schema so the model is held to a JSON object with `insights` and
//! `suggestions` string arrays; validating that the reply actually honors it
//! happens in [crate::analysis].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::error::AnalysisError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Seam between the requester and the remote service, so tests can hand the
/// pipeline canned replies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Sends the prompt and returns the generated reply text verbatim.
    async fn generate(&self, prompt: &str) -> Result<String, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, AnalysisError> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| AnalysisError::ServiceUnavailable)?;
        Ok(Self::new(api_key, DEFAULT_API_BASE))
    }

    fn request_body(prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "insights": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["insights", "suggestions"]
                }
            }
        })
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        debug!("Requesting analysis from {url}");

        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| AnalysisError::RequestFailed(format!("request failed: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<ApiError>(&text).ok();
            return Err(format_api_error(status, parsed));
        }

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::RequestFailed(format!("unreadable response body: {e}")))?;

        let text = body
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AnalysisError::RequestFailed(
                "the model returned an empty reply".into(),
            ));
        }

        Ok(text)
    }
}

fn format_api_error(status: StatusCode, parsed: Option<ApiError>) -> AnalysisError {
    match parsed {
        Some(api_error) => AnalysisError::RequestFailed(format!(
            "gemini api error ({status}): {}",
            api_error.error.message
        )),
        None => AnalysisError::RequestFailed(format!("gemini api error ({status})")),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}
