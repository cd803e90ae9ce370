//! Search keyword generation from section summaries

use super::{prompts, ChatMessage, LlmClient};
use crate::model::{ContextChunk, PreviousSummary};
use std::sync::Arc;

/// Previous summaries folded into the prompt, most recent first
const MAX_PREVIOUS_SUMMARIES: usize = 3;

/// Supporting chunks folded into the prompt
const MAX_CONTEXT_CHUNKS: usize = 3;

/// Character budget per supporting chunk
const CHUNK_CHAR_BUDGET: usize = 200;

/// Words taken from the summary when the LLM yields nothing usable
const FALLBACK_WORD_COUNT: usize = 6;

const MAX_TOKENS_KEYWORDS: u32 = 150;

/// Generates short search queries from a section summary plus optional
/// context. Never fails: on any LLM or parse problem it falls back to a
/// single query derived from the summary itself.
pub struct KeywordGenerator {
    client: Arc<dyn LlmClient>,
    keyword_min: usize,
    keyword_max: usize,
}

impl KeywordGenerator {
    pub fn new(client: Arc<dyn LlmClient>, keyword_min: usize, keyword_max: usize) -> Self {
        Self {
            client,
            keyword_min: keyword_min.max(1),
            keyword_max: keyword_max.max(keyword_min).max(1),
        }
    }

    /// Generate an ordered, deduplicated list of 1..=keyword_max queries
    pub async fn generate(
        &self,
        summary: &str,
        language: &str,
        previous: &[PreviousSummary],
        chunks: &[ContextChunk],
    ) -> Vec<String> {
        let context = build_context(previous, chunks);
        let prompt =
            prompts::keyword_generation_prompt(summary, language, self.keyword_min, &context);

        let messages = vec![ChatMessage::user(prompt)];

        let keywords = match self
            .client
            .chat_completion(messages, MAX_TOKENS_KEYWORDS, false)
            .await
        {
            Ok(content) => parse_keyword_lines(&content),
            Err(e) => {
                tracing::warn!("keyword generation failed: {}, using fallback", e);
                Vec::new()
            }
        };

        let keywords = dedupe_preserving_order(keywords);

        if keywords.is_empty() {
            let fallback = fallback_query(summary);
            tracing::warn!("no keywords parsed, falling back to: {:?}", fallback);
            return fallback;
        }

        keywords.into_iter().take(self.keyword_max).collect()
    }
}

fn build_context(previous: &[PreviousSummary], chunks: &[ContextChunk]) -> String {
    if previous.is_empty() && chunks.is_empty() {
        return String::new();
    }

    let prev_text = if previous.is_empty() {
        "None".to_string()
    } else {
        previous
            .iter()
            .take(MAX_PREVIOUS_SUMMARIES)
            .map(|p| format!("Section {}: {}", p.section_index, p.summary))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let chunk_text = if chunks.is_empty() {
        "None".to_string()
    } else {
        chunks
            .iter()
            .take(MAX_CONTEXT_CHUNKS)
            .map(|c| truncate_chars(&c.text, CHUNK_CHAR_BUDGET))
            .collect::<Vec<_>>()
            .join("\n")
    };

    prompts::keyword_context_block(&prev_text, &chunk_text)
}

/// Parse one query per line, skipping blanks and comment-style lines
fn parse_keyword_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_matches(['"', '-', '*', ' ']).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// First-occurrence-wins dedupe, case-insensitive
pub fn dedupe_preserving_order(keywords: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .filter(|kw| seen.insert(kw.to_lowercase()))
        .collect()
}

/// Single query from the first few words of the summary
fn fallback_query(summary: &str) -> Vec<String> {
    let query: Vec<&str> = summary.split_whitespace().take(FALLBACK_WORD_COUNT).collect();
    if query.is_empty() {
        return Vec::new();
    }
    vec![query.join(" ")]
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
