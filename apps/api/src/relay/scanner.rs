//! Resume-analysis relay — forwards the document inline to the AI endpoint
//! and strict-parses the reply into a `ResumeAnalysis`.
//!
//! The outcome of interpreting the model's text is explicit: either the
//! first `{…}` block parses, or the caller gets the deterministic fallback
//! analysis — still HTTP 200. Only an upstream failure (missing key,
//! non-2xx, unreachable) surfaces as 500, and with a different envelope
//! (`{error, details}`) than success (`{analysis}`); callers branch on
//! status, not payload shape.

use std::sync::OnceLock;

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::llm_client::{GenerationParams, Part};
use crate::relay::prompts::RESUME_ANALYSIS_PROMPT;
use crate::state::AppState;

// Low temperature favors deterministic structured output.
const SCANNER_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.1,
    top_k: 32,
    top_p: 1.0,
    max_output_tokens: 4096,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Base64 document bytes, forwarded to the model unparsed.
    pub file_content: String,
    pub file_name: String,
    pub mime_type: String,
}

/// Produced fresh per scan request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(rename = "atsSuggestions")]
    pub ats_suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub analysis: ResumeAnalysis,
}

#[derive(Debug, Serialize)]
pub struct ScanErrorResponse {
    pub error: String,
    pub details: String,
}

/// POST /functions/v1/resume-scanner
pub async fn handle_resume_scan(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Response {
    info!("Analyzing resume {} ({})", req.file_name, req.mime_type);

    let parts = vec![
        Part::text(RESUME_ANALYSIS_PROMPT),
        Part::inline_data(req.mime_type, req.file_content),
    ];

    match state.llm.generate(parts, SCANNER_PARAMS).await {
        Ok(text) => {
            let analysis = match extract_analysis(&text) {
                Some(analysis) => analysis,
                None => {
                    warn!("Model reply did not contain a parseable analysis; using fallback");
                    fallback_analysis()
                }
            };
            (StatusCode::OK, Json(ScanResponse { analysis })).into_response()
        }
        Err(e) => {
            error!("Error in resume-scanner relay: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ScanErrorResponse {
                    error: "Failed to analyze resume".to_string(),
                    details: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Pulls the first `{…}` block (greedy, spanning newlines) out of the
/// model's text and strict-parses it. `None` on no block or on any shape
/// mismatch.
fn extract_analysis(text: &str) -> Option<ResumeAnalysis> {
    static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();
    let re = JSON_BLOCK.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid literal regex"));

    let block = re.find(text)?.as_str();
    serde_json::from_str(block).ok()
}

/// Deterministic analysis returned when the model's reply cannot be parsed.
/// Trades accuracy for always-available output.
fn fallback_analysis() -> ResumeAnalysis {
    ResumeAnalysis {
        score: 70,
        strengths: vec![
            "Resume received and processed".to_string(),
            "Basic structure is present".to_string(),
            "Content is readable".to_string(),
        ],
        weaknesses: vec![
            "Analysis parsing encountered issues".to_string(),
            "Detailed feedback unavailable".to_string(),
            "Please try uploading again".to_string(),
        ],
        suggestions: vec![
            "Ensure resume is in PDF format".to_string(),
            "Check file size is under 10MB".to_string(),
            "Try uploading again for detailed analysis".to_string(),
        ],
        keywords: vec![
            "resume".to_string(),
            "analysis".to_string(),
            "feedback".to_string(),
        ],
        ats_suggestions: vec![
            "Use standard resume formats".to_string(),
            "Include relevant keywords".to_string(),
            "Keep formatting simple".to_string(),
        ],
    }
}
