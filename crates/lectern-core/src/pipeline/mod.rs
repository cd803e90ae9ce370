//! Recommendation pipeline
//!
//! Provides:
//! - Identity-based deduplication and exclusion filtering
//! - Lexical reranking ahead of verification
//! - Heuristic scoring building blocks
//! - The generic per-provider orchestrator

pub mod dedupe;
pub mod heuristic;
pub mod rerank;

pub use dedupe::{dedupe, filter_excluded, identity, normalize_title, normalize_url};
pub use rerank::{lexical_score, rerank};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::llm::{KeywordGenerator, LlmClient, LlmVerifier, Verdict};
use crate::model::{RecommendRequest, ResultInfo, ScoredResult};
use crate::providers::{Candidate, SearchProvider};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Sentinel score stamped on every result in bypass mode
pub const BYPASS_SCORE: f64 = 10.0;

/// Fixed reason stamped on every result in bypass mode
pub const BYPASS_REASON: &str = "search";

/// Per-provider pipeline driver.
///
/// Owns the end-to-end flow: keyword generation, parallel search fan-out,
/// merge, dedup, exclusion, lexical rerank, bounded candidate cut,
/// verification (LLM, heuristic, or bypassed), threshold filter, and the
/// final score-descending truncation.
///
/// The caller always receives a list (possibly empty); ordinary upstream
/// flakiness never surfaces as an error. Only invalid requests fail.
pub struct Recommender<P: SearchProvider> {
    provider: Arc<P>,
    keyword_generator: KeywordGenerator,
    verifier: LlmVerifier,
    config: PipelineConfig,
}

impl<P: SearchProvider> Recommender<P> {
    pub fn new(provider: Arc<P>, llm: Arc<dyn LlmClient>, config: PipelineConfig) -> Self {
        let tuning = *provider.tuning();
        Self {
            provider,
            keyword_generator: KeywordGenerator::new(
                llm.clone(),
                tuning.keyword_min,
                tuning.keyword_max,
            ),
            verifier: LlmVerifier::new(llm, tuning.snippet_max),
            config,
        }
    }

    /// Recommend up to `top_k` results for one lecture section. Unset
    /// request limits fall back to the [`PipelineConfig`] defaults.
    pub async fn recommend(&self, request: &RecommendRequest) -> Result<Vec<ScoredResult>> {
        request.validate()?;
        let tuning = *self.provider.tuning();

        // Request values win; unset fields fall back to the pipeline config
        let top_k = request.top_k_or(self.config.default_top_k);
        let min_score = request.min_score_or(self.config.default_min_score);

        tracing::info!(
            "recommendation start ({}, tracking_id={}, section={}, verify={})",
            self.provider.provider_type(),
            request.tracking_id,
            request.section_index,
            request.verify
        );

        // 1. Keyword generation (LLM with naive fallback)
        let keywords = self
            .keyword_generator
            .generate(
                &request.section_summary,
                &request.search_language,
                &request.previous_summaries,
                &request.context_chunks,
            )
            .await;

        if keywords.is_empty() {
            tracing::warn!("no keywords generated, returning empty result");
            return Ok(Vec::new());
        }
        tracing::info!("keywords: {:?}", keywords);

        // 2. Parallel search fan-out; per-query failures already degrade
        // to empty lists inside the provider
        let searches = keywords
            .iter()
            .take(tuning.fanout)
            .map(|keyword| self.provider.search(keyword, &request.search_language));
        let per_query = futures::future::join_all(searches).await;

        let mut merged: Vec<Candidate> = Vec::new();
        for results in per_query {
            merged.extend(results.unwrap_or_default());
        }
        tracing::info!("merged search results: {}", merged.len());

        if merged.is_empty() {
            tracing::warn!("no search results, returning empty result");
            return Ok(Vec::new());
        }

        // 3-5. Dedup, exclusion, lexical rerank
        let unique = dedupe(merged);
        let kept = filter_excluded(unique, &request.exclude);
        if kept.is_empty() {
            tracing::warn!("no candidates left after filtering");
            return Ok(Vec::new());
        }
        let ranked = rerank(kept, &keywords);

        // 6. Bounded candidate cut ahead of the expensive stage
        let mut shortlist = ranked;
        shortlist.truncate(tuning.card_limit);
        tracing::info!("verification shortlist: {}", shortlist.len());

        // 7. Bypass mode: pure pass-through with sentinel scores
        if self.config.skip_verification {
            tracing::info!("verification bypassed");
            return Ok(shortlist
                .into_iter()
                .take(top_k)
                .map(|candidate| {
                    self.build_result(request, &candidate, BYPASS_REASON, BYPASS_SCORE, &tuning)
                })
                .collect());
        }

        // 8. Verification: LLM (bounded concurrency) or heuristic
        let scored = if request.verify {
            self.verify_with_llm(&shortlist, request, tuning.verify_concurrency)
                .await
        } else {
            shortlist
                .iter()
                .map(|candidate| {
                    let (score, reason) =
                        self.provider
                            .heuristic_score(candidate, &keywords, &request.language);
                    self.build_result(request, candidate, &reason, score, &tuning)
                })
                .collect()
        };

        // 9. Threshold filter
        let before = scored.len();
        let mut filtered: Vec<ScoredResult> = scored
            .into_iter()
            .filter(|result| result.score >= min_score)
            .collect();
        if filtered.len() < before {
            tracing::info!(
                "score threshold {}: {} -> {}",
                min_score,
                before,
                filtered.len()
            );
        }

        // 10. Final rank and cut: stable sort, score descending
        filtered.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        filtered.truncate(top_k);

        tracing::info!(
            "recommendation done ({}): {} results",
            self.provider.provider_type(),
            filtered.len()
        );
        Ok(filtered)
    }

    /// Concurrent LLM verification, bounded by the provider's limit.
    ///
    /// Completion order is irrelevant: verdicts are re-attached by index
    /// so the shortlist order is preserved for the threshold stage, and
    /// the final ordering comes from the score sort afterwards. A failed
    /// verification never drops a candidate; the verifier substitutes the
    /// neutral fallback verdict.
    async fn verify_with_llm(
        &self,
        candidates: &[Candidate],
        request: &RecommendRequest,
        concurrency: usize,
    ) -> Vec<ScoredResult> {
        let tuning = *self.provider.tuning();

        let mut verdicts: Vec<(usize, Verdict)> = stream::iter(candidates.iter().enumerate())
            .map(|(idx, candidate)| {
                let verifier = &self.verifier;
                async move {
                    let verdict = verifier
                        .verify(candidate, &request.section_summary, &request.language)
                        .await;
                    (idx, verdict)
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        verdicts.sort_by_key(|(idx, _)| *idx);

        verdicts
            .into_iter()
            .map(|(idx, verdict)| {
                self.build_result(
                    request,
                    &candidates[idx],
                    &verdict.reason,
                    verdict.score,
                    &tuning,
                )
            })
            .collect()
    }

    fn build_result(
        &self,
        request: &RecommendRequest,
        candidate: &Candidate,
        reason: &str,
        score: f64,
        tuning: &crate::config::ProviderTuning,
    ) -> ScoredResult {
        let snippet: String = candidate.snippet.chars().take(tuning.snippet_max).collect();
        let info = ResultInfo {
            url: candidate.url.clone(),
            title: candidate.title.clone(),
            snippet,
            source: candidate.source.clone(),
            lang: request.search_language.clone(),
        };
        ScoredResult::new(request, info, reason, score)
    }
}
