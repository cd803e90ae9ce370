//! Lectern Core Library
//!
//! Multi-provider recommendation pipeline for lecture sections.
//!
//! # Features
//! - LLM-generated search keywords with naive fallback
//! - Parallel provider fan-out (web pages, academic papers, videos)
//! - Identity-based deduplication and exclusion filtering
//! - Lexical rerank ahead of verification
//! - LLM or heuristic verification with bounded concurrency
//! - Score-threshold filtering and top-k truncation

pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod providers;

pub use config::{
    Config, LlmServiceConfig, PaperSearchConfig, PipelineConfig, ProviderTuning,
    VideoSearchConfig, WebSearchConfig, MAX_TOP_K,
};
pub use error::{Error, LecternError, Result};
pub use llm::{
    ChatMessage, KeywordGenerator, LlmClient, LlmVerifier, OpenAiClient, Verdict, FALLBACK_SCORE,
};
pub use model::{
    ContextChunk, PreviousSummary, RecommendRequest, ResultInfo, ScoredResult, MIN_SUMMARY_LENGTH,
};
pub use pipeline::{Recommender, BYPASS_REASON, BYPASS_SCORE};
pub use providers::{
    Candidate, PaperProvider, PaperSort, SearchProvider, Signals, VideoProvider, WebProvider,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "lectern";
