//! Analysis request pipeline: aggregate the log into a per-category summary,
//! wrap it in the coaching prompt, send it to the text-generation service and
//! validate the shape of what comes back.

pub mod error;
pub mod gemini;

use tracing::{info, warn};

use crate::tracker::{
    aggregate::prompt_summary,
    entities::{AiAnalysis, TimeCategory, TimeEntry},
};

use self::{
    error::AnalysisError,
    gemini::{AnalysisService, GeminiClient},
};

const PROMPT_TEMPLATE: &str = "\
You are a world-class productivity coach named TimeWise AI. Analyze the following time log data for a business professional.
Your goal is to identify patterns, highlight areas of inefficiency or imbalance, and provide actionable suggestions for better time management and work-life balance.

Time Log Summary (total hours per category):
{summary}

Based on this data, provide your analysis. Be concise, insightful, and encouraging.";

/// Owns the optional service client. A missing credential is an expected
/// state, not an error: requests then answer with a degraded analysis that
/// explains the situation, so the surface always has something to render.
pub struct AnalysisRequester {
    service: Option<Box<dyn AnalysisService>>,
}

impl AnalysisRequester {
    pub fn new(service: Option<Box<dyn AnalysisService>>) -> Self {
        Self { service }
    }

    /// Builds a requester from the environment credential, degrading to the
    /// unconfigured state when it is absent.
    pub fn from_env() -> Self {
        let service = match GeminiClient::from_env() {
            Ok(client) => Some(Box::new(client) as Box<dyn AnalysisService>),
            Err(e) => {
                warn!("AI analysis disabled: {e}");
                None
            }
        };
        Self::new(service)
    }

    pub async fn request_analysis(
        &self,
        entries: &[TimeEntry],
        categories: &[TimeCategory],
    ) -> Result<AiAnalysis, AnalysisError> {
        let Some(service) = &self.service else {
            return Ok(unconfigured_analysis());
        };

        let summary = prompt_summary(entries, categories);
        let prompt = PROMPT_TEMPLATE.replace("{summary}", &summary);

        let reply = service.generate(&prompt).await?;
        let analysis = validate_reply(&reply)?;
        info!(
            "Received analysis with {} insights and {} suggestions",
            analysis.insights.len(),
            analysis.suggestions.len()
        );
        Ok(analysis)
    }
}

fn unconfigured_analysis() -> AiAnalysis {
    AiAnalysis {
        insights: vec![
            "API key not configured. Set the GEMINI_API_KEY environment variable.".into(),
        ],
        suggestions: vec!["AI analysis is currently unavailable.".into()],
    }
}

/// Reply text that isn't JSON at all counts as a failed request; JSON that
/// parses but lacks either required field is a shape violation.
fn validate_reply(reply: &str) -> Result<AiAnalysis, AnalysisError> {
    let value: serde_json::Value = serde_json::from_str(reply)
        .map_err(|e| AnalysisError::RequestFailed(format!("reply was not valid JSON: {e}")))?;

    serde_json::from_value(value).map_err(|_| AnalysisError::InvalidResponseShape)
}
