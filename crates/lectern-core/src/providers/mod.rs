//! Search provider abstraction
//!
//! Provides a unified interface over external content indexes:
//! - Web search (Custom Search shaped API)
//! - Academic papers (OpenAlex shaped API)
//! - Videos (YouTube Data shaped API)
//!
//! Each provider normalizes its raw payload into the shared [`Candidate`]
//! shape before anything enters the common pipeline, and supplies its own
//! heuristic scorer for the no-LLM verification path.

use crate::config::ProviderTuning;
use crate::error::Result;

pub mod papers;
pub mod videos;
pub mod web;

pub use papers::{PaperProvider, PaperSort};
pub use videos::VideoProvider;
pub use web::WebProvider;

/// Search provider trait - all content sources must implement this
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider type identifier (e.g., "web", "papers", "videos")
    fn provider_type(&self) -> &'static str;

    /// Fan-out, page size, and verification limits for this provider
    fn tuning(&self) -> &ProviderTuning;

    /// Run one search call. Upstream failures degrade to `Ok(vec![])`;
    /// this boundary never surfaces transport errors to the pipeline.
    async fn search(&self, query: &str, lang: &str) -> Result<Vec<Candidate>>;

    /// Heuristic relevance score and reason for one candidate, no I/O
    fn heuristic_score(
        &self,
        candidate: &Candidate,
        keywords: &[String],
        language: &str,
    ) -> (f64, String);
}

/// Auxiliary ranking signals attached by providers where available
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals {
    /// Citation count (papers)
    pub citations: Option<u64>,
    /// View count (videos)
    pub views: Option<u64>,
    /// Publish timestamp, RFC 3339 (videos) or year only (papers)
    pub published: Option<String>,
    /// Relevance score reported by the provider itself
    pub provider_relevance: Option<f64>,
}

/// One raw search hit, normalized to the shared shape.
/// Lives only within a single orchestrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    /// Snippet, abstract, or description
    pub snippet: String,
    /// Canonical URL; may be empty for results keyed by title only
    pub url: String,
    /// Display domain, channel title, or venue
    pub source: String,
    pub signals: Signals,
}

impl Candidate {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
            source: source.into(),
            signals: Signals::default(),
        }
    }

    pub fn with_signals(mut self, signals: Signals) -> Self {
        self.signals = signals;
        self
    }
}
