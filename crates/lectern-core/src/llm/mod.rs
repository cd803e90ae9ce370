//! LLM integration
//!
//! Provides:
//! - Chat completion via OpenAI-compatible services
//! - Search keyword generation with naive fallback
//! - Per-candidate relevance verification with parse fallbacks

mod client;
mod keywords;
pub mod prompts;
mod verifier;

pub use client::{ChatMessage, LlmClient, OpenAiClient};
pub use keywords::{dedupe_preserving_order, KeywordGenerator};
pub use verifier::{parse_verdict, LlmVerifier, Verdict, FALLBACK_SCORE};
