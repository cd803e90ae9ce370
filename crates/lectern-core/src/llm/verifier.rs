//! LLM-based relevance verification

use super::{prompts, ChatMessage, LlmClient};
use crate::providers::Candidate;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};

const MAX_TOKENS_VERDICT: u32 = 200;

/// Neutral score substituted when verification cannot produce a verdict
pub const FALLBACK_SCORE: f64 = 5.0;

/// Relevance judgement for one candidate
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Verdict {
    pub score: f64,
    pub reason: String,
}

impl Verdict {
    /// Neutral verdict used whenever the LLM call or parse fails
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            score: FALLBACK_SCORE,
            reason: reason.into(),
        }
    }
}

/// Scores candidates against a section summary via the LLM.
///
/// A single malformed or failed response never propagates: every path
/// degrades to `Verdict::fallback`.
pub struct LlmVerifier {
    client: Arc<dyn LlmClient>,
    /// Snippet length cap applied before prompting
    snippet_max: usize,
}

impl LlmVerifier {
    pub fn new(client: Arc<dyn LlmClient>, snippet_max: usize) -> Self {
        Self {
            client,
            snippet_max,
        }
    }

    /// Score one candidate. Infallible by design.
    pub async fn verify(&self, candidate: &Candidate, summary: &str, language: &str) -> Verdict {
        // Strip characters that commonly break the JSON the model echoes back
        let title = sanitize(&candidate.title);
        let snippet: String = sanitize(&candidate.snippet)
            .chars()
            .take(self.snippet_max)
            .collect();

        let prompt = prompts::verdict_prompt(summary, &title, &snippet, language);
        let messages = vec![ChatMessage::user(prompt)];

        match self
            .client
            .chat_completion(messages, MAX_TOKENS_VERDICT, true)
            .await
        {
            Ok(content) => parse_verdict(&content),
            Err(e) => {
                tracing::warn!("verification call failed for '{}': {}", candidate.title, e);
                Verdict::fallback("verification unavailable (service error)")
            }
        }
    }
}

fn sanitize(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace('"', "'")
}

/// Parse a `{score, reason}` verdict with two fallback tiers:
/// typed JSON parse, then permissive regex extraction, then neutral default.
pub fn parse_verdict(response: &str) -> Verdict {
    // Extract JSON span (handles markdown code fences)
    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => response,
    };

    if let Ok(verdict) = serde_json::from_str::<Verdict>(json_str) {
        return verdict;
    }

    tracing::warn!(
        "verdict JSON parse failed, raw content: {}",
        &response.chars().take(200).collect::<String>()
    );

    extract_verdict_loosely(response)
        .unwrap_or_else(|| Verdict::fallback("verification unavailable (malformed response)"))
}

fn extract_verdict_loosely(response: &str) -> Option<Verdict> {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    static REASON_RE: OnceLock<Regex> = OnceLock::new();
    let score_re = SCORE_RE
        .get_or_init(|| Regex::new(r#""score"\s*:\s*([0-9]+(?:\.[0-9]+)?)"#).expect("score regex"));
    let reason_re = REASON_RE
        .get_or_init(|| Regex::new(r#""reason"\s*:\s*"([^"]*)""#).expect("reason regex"));

    let score: f64 = score_re.captures(response)?.get(1)?.as_str().parse().ok()?;
    let reason = reason_re
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;

    Some(Verdict { score, reason })
}
