//! Request and response data model
//!
//! All entities here live only for the duration of one `recommend` call;
//! nothing is persisted or shared across calls.

use crate::config::MAX_TOP_K;
use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};

/// Minimum accepted section summary length, in characters
pub const MIN_SUMMARY_LENGTH: usize = 10;

/// Summary of a previously processed lecture section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousSummary {
    /// Section number, 1-based
    pub section_index: u32,
    pub summary: String,
}

/// Ranked supporting text snippet (e.g. from lecture notes retrieval)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    pub text: String,
    /// Retrieval relevance score, non-negative
    pub score: f64,
}

/// One recommendation request for a single lecture section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Lecture session identifier, echoed back for tracking
    pub tracking_id: String,

    /// Current section number, 1-based
    pub section_index: u32,

    /// Summary of the current section (min 10 chars)
    pub section_summary: String,

    /// Language for reasons in the response ("ko"/"en")
    #[serde(default = "default_language")]
    pub language: String,

    /// Number of recommendations to return (1..=10). Unset falls back to
    /// the pipeline default.
    #[serde(default)]
    pub top_k: Option<usize>,

    /// true: LLM verification, false: heuristic scoring
    #[serde(default)]
    pub verify: bool,

    /// Previous section summaries, most recent first
    #[serde(default)]
    pub previous_summaries: Vec<PreviousSummary>,

    /// Supporting context chunks, ranked by retrieval score
    #[serde(default)]
    pub context_chunks: Vec<ContextChunk>,

    /// Language passed to the search provider ("ko"/"en")
    #[serde(default = "default_search_language")]
    pub search_language: String,

    /// Identities to suppress: URLs, titles, or provider ids
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Minimum score a result must reach to be returned (0..=10). Unset
    /// falls back to the pipeline default.
    #[serde(default)]
    pub min_score: Option<f64>,
}

fn default_language() -> String {
    "ko".to_string()
}

fn default_search_language() -> String {
    "en".to_string()
}

impl RecommendRequest {
    /// Create a minimal request with defaults for the optional fields
    pub fn new(
        tracking_id: impl Into<String>,
        section_index: u32,
        section_summary: impl Into<String>,
    ) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            section_index,
            section_summary: section_summary.into(),
            language: default_language(),
            top_k: None,
            verify: false,
            previous_summaries: Vec::new(),
            context_chunks: Vec::new(),
            search_language: default_search_language(),
            exclude: Vec::new(),
            min_score: None,
        }
    }

    /// Boundary validation; runs before the pipeline touches the request
    pub fn validate(&self) -> Result<()> {
        if self.tracking_id.trim().is_empty() {
            return Err(LecternError::InvalidRequest(
                "tracking_id must not be empty".to_string(),
            ));
        }
        if self.section_index < 1 {
            return Err(LecternError::InvalidRequest(
                "section_index must be >= 1".to_string(),
            ));
        }
        // Character count, not byte length: CJK summaries are much
        // shorter in characters than in UTF-8 bytes
        if self.section_summary.trim().chars().count() < MIN_SUMMARY_LENGTH {
            return Err(LecternError::InvalidRequest(format!(
                "section_summary must be at least {} characters",
                MIN_SUMMARY_LENGTH
            )));
        }
        if let Some(top_k) = self.top_k {
            if !(1..=MAX_TOP_K).contains(&top_k) {
                return Err(LecternError::InvalidRequest(format!(
                    "top_k must be within 1..={}",
                    MAX_TOP_K
                )));
            }
        }
        Ok(())
    }

    /// Requested minimum score, or `default` when unset, clamped to the
    /// closed interval [0, 10]
    pub fn min_score_or(&self, default: f64) -> f64 {
        self.min_score.unwrap_or(default).clamp(0.0, 10.0)
    }

    /// Requested result count, or `default` when unset, capped at
    /// [`MAX_TOP_K`]
    pub fn top_k_or(&self, default: usize) -> usize {
        self.top_k.unwrap_or(default).clamp(1, MAX_TOP_K)
    }
}

/// Normalized result details included in every recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultInfo {
    pub url: String,
    pub title: String,
    /// Snippet, abstract, or extract, capped per provider
    pub snippet: String,
    /// Display domain, channel, or venue
    pub source: String,
    /// Language of the result content
    pub lang: String,
}

/// One scored recommendation; immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub tracking_id: String,
    pub section_index: u32,
    pub result: ResultInfo,
    /// One or two sentence justification, newline-normalized
    pub reason: String,
    /// Relevance score. Nominal range 0-10; heuristic scores are clamped,
    /// LLM scores are passed through and may exceed 10.
    pub score: f64,
}

impl ScoredResult {
    pub fn new(
        request: &RecommendRequest,
        result: ResultInfo,
        reason: &str,
        score: f64,
    ) -> Self {
        Self {
            tracking_id: request.tracking_id.clone(),
            section_index: request.section_index,
            result,
            reason: normalize_newlines(reason),
            score,
        }
    }
}

/// Replace newline characters with spaces so reasons stay single-line
pub fn normalize_newlines(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}
