//! End-to-end pipeline tests with a mock provider and a scripted LLM

use async_trait::async_trait;
use lectern_core::{
    Candidate, ChatMessage, LecternError, LlmClient, PipelineConfig, ProviderTuning,
    RecommendRequest, Recommender, Result, SearchProvider, BYPASS_REASON, BYPASS_SCORE,
    FALLBACK_SCORE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Score assigned by the mock heuristic when a keyword matches the title
const MOCK_MATCH_SCORE: f64 = 6.0;
const MOCK_MISS_SCORE: f64 = 2.0;

struct MockProvider {
    candidates: Vec<Candidate>,
    tuning: ProviderTuning,
    queries: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            tuning: ProviderTuning {
                fanout: 2,
                page_size: 10,
                card_limit: 10,
                verify_concurrency: 4,
                snippet_max: 300,
                keyword_min: 1,
                keyword_max: 4,
                timeout_secs: 5,
            },
            queries: Mutex::new(Vec::new()),
        }
    }

    fn seen_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn provider_type(&self) -> &'static str {
        "mock"
    }

    fn tuning(&self) -> &ProviderTuning {
        &self.tuning
    }

    async fn search(&self, query: &str, _lang: &str) -> Result<Vec<Candidate>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.candidates.clone())
    }

    fn heuristic_score(
        &self,
        candidate: &Candidate,
        keywords: &[String],
        _language: &str,
    ) -> (f64, String) {
        let title = candidate.title.to_lowercase();
        let matched = keywords.iter().any(|kw| title.contains(&kw.to_lowercase()));
        if matched {
            (MOCK_MATCH_SCORE, "Heuristic".to_string())
        } else {
            (MOCK_MISS_SCORE, "Heuristic".to_string())
        }
    }
}

/// Scripted LLM: keyword generation returns a fixed line list, verification
/// returns a verdict matched by a needle found in the prompt. Counts calls
/// per kind so tests can assert the bypass contract.
struct MockLlm {
    keyword_response: Option<String>,
    verdicts: Vec<(String, f64, String)>,
    fail_all: bool,
    keyword_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MockLlm {
    fn with_keywords(keywords: &str) -> Self {
        Self {
            keyword_response: Some(keywords.to_string()),
            verdicts: Vec::new(),
            fail_all: false,
            keyword_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            keyword_response: None,
            verdicts: Vec::new(),
            fail_all: true,
            keyword_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    fn verdict(mut self, needle: &str, score: f64, reason: &str) -> Self {
        self.verdicts
            .push((needle.to_string(), score, reason.to_string()));
        self
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        _max_tokens: u32,
        json_mode: bool,
    ) -> Result<String> {
        // The pipeline requests JSON only for verification verdicts
        if json_mode {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(LecternError::Llm("scripted failure".to_string()));
            }
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            for (needle, score, reason) in &self.verdicts {
                if prompt.contains(needle) {
                    return Ok(format!(
                        r#"{{"score": {}, "reason": "{}"}}"#,
                        score, reason
                    ));
                }
            }
            Ok(r#"{"score": 5.0, "reason": "no opinion"}"#.to_string())
        } else {
            self.keyword_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(LecternError::Llm("scripted failure".to_string()));
            }
            self.keyword_response
                .clone()
                .ok_or_else(|| LecternError::Llm("no keywords scripted".to_string()))
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn candidate(title: &str, snippet: &str, url: &str) -> Candidate {
    Candidate::new(title, snippet, url, "example.com")
}

fn request() -> RecommendRequest {
    RecommendRequest::new("lec-42", 3, "Stack data structure basics")
}

fn recommender(
    provider: Arc<MockProvider>,
    llm: Arc<MockLlm>,
    config: PipelineConfig,
) -> Recommender<MockProvider> {
    Recommender::new(provider, llm, config)
}

#[tokio::test]
async fn returns_at_most_top_k_results_in_score_order() {
    let provider = Arc::new(MockProvider::new(vec![
        candidate("stack basics", "intro", "https://a.example/1"),
        candidate("stack deep dive", "advanced", "https://a.example/2"),
        candidate("stack in practice", "applied", "https://a.example/3"),
        candidate("unrelated baking", "bread", "https://a.example/4"),
    ]));
    let llm = Arc::new(
        MockLlm::with_keywords("stack tutorial")
            .verdict("stack basics", 6.5, "good intro")
            .verdict("stack deep dive", 9.0, "thorough")
            .verdict("stack in practice", 7.5, "practical")
            .verdict("unrelated baking", 1.0, "off topic"),
    );
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut req = request();
    req.verify = true;
    req.top_k = Some(2);
    req.min_score = Some(0.0);

    let results = pipeline.recommend(&req).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].result.title, "stack deep dive");
    assert_eq!(results[1].result.title, "stack in practice");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn bypass_mode_stamps_sentinels_and_never_verifies() {
    let provider = Arc::new(MockProvider::new(vec![
        candidate("stack basics", "intro", "https://a.example/1"),
        candidate("stack deep dive", "advanced", "https://a.example/2"),
    ]));
    let llm = Arc::new(MockLlm::with_keywords("stack tutorial"));
    let config = PipelineConfig {
        skip_verification: true,
        ..PipelineConfig::default()
    };
    let pipeline = recommender(provider, llm.clone(), config);

    let mut req = request();
    req.verify = true; // bypass must win over the request's verify mode
    req.top_k = Some(2);

    let results = pipeline.recommend(&req).await.unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.score, BYPASS_SCORE);
        assert_eq!(result.reason, BYPASS_REASON);
    }
    assert_eq!(llm.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_identities_collapse_to_first_occurrence() {
    // Same page, differing only by a tracking suffix in the query string
    let provider = Arc::new(MockProvider::new(vec![
        candidate(
            "Stack basics",
            "LIFO explained",
            "https://example.com/stacks?utm_source=feed",
        ),
        candidate(
            "Stack basics",
            "LIFO explained",
            "https://www.example.com/stacks?utm_source=mail",
        ),
    ]));
    let llm = Arc::new(MockLlm::with_keywords("stack"));
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut req = request();
    req.verify = false;
    req.top_k = Some(1);
    req.min_score = Some(5.0);

    let results = pipeline.recommend(&req).await.unwrap();

    // Exactly one survives dedup, and the heuristic keyword match clears
    // the 5.0 threshold
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, MOCK_MATCH_SCORE);
    assert_eq!(results[0].result.url, "https://example.com/stacks?utm_source=feed");
}

#[tokio::test]
async fn threshold_above_heuristic_score_empties_response() {
    let provider = Arc::new(MockProvider::new(vec![candidate(
        "Stack basics",
        "LIFO explained",
        "https://example.com/stacks",
    )]));
    let llm = Arc::new(MockLlm::with_keywords("stack"));
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut req = request();
    req.verify = false;
    req.top_k = Some(1);
    req.min_score = Some(9.9);

    let results = pipeline.recommend(&req).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn config_defaults_apply_when_request_omits_limits() {
    let provider = Arc::new(MockProvider::new(vec![
        candidate("stack one", "s", "https://a.example/1"),
        candidate("stack two", "s", "https://a.example/2"),
        candidate("stack three", "s", "https://a.example/3"),
    ]));
    let llm = Arc::new(MockLlm::with_keywords("stack"));

    // Strict config: no heuristic 6.0 candidate may clear 9.9
    let strict = PipelineConfig {
        default_min_score: 9.9,
        ..PipelineConfig::default()
    };
    let pipeline = recommender(provider.clone(), llm.clone(), strict);
    let mut req = request();
    req.verify = false;
    assert!(req.min_score.is_none() && req.top_k.is_none());
    let results = pipeline.recommend(&req).await.unwrap();
    assert!(results.is_empty());

    // Lenient threshold, but the configured result count caps the batch
    let capped = PipelineConfig {
        default_min_score: 0.0,
        default_top_k: 2,
        ..PipelineConfig::default()
    };
    let pipeline = recommender(provider, llm, capped);
    let results = pipeline.recommend(&req).await.unwrap();
    assert_eq!(results.len(), 2);

    // An explicit request value still wins over the config default
    req.top_k = Some(1);
    let results = pipeline.recommend(&req).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn raising_threshold_never_grows_result_set() {
    let provider = Arc::new(MockProvider::new(vec![
        candidate("stack one", "s", "https://a.example/1"),
        candidate("stack two", "s", "https://a.example/2"),
        candidate("other", "s", "https://a.example/3"),
    ]));
    let llm = Arc::new(MockLlm::with_keywords("stack"));
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut low = request();
    low.verify = false;
    low.top_k = Some(10);
    low.min_score = Some(2.0);

    let mut high = low.clone();
    high.min_score = Some(6.5);

    let low_results = pipeline.recommend(&low).await.unwrap();
    let high_results = pipeline.recommend(&high).await.unwrap();

    assert!(high_results.len() <= low_results.len());
}

#[tokio::test]
async fn excluded_identity_never_appears() {
    let provider = Arc::new(MockProvider::new(vec![
        candidate("stack basics", "s", "https://example.com/keep"),
        candidate("stack advanced", "s", "https://example.com/seen-before"),
    ]));
    let llm = Arc::new(MockLlm::with_keywords("stack"));
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut req = request();
    req.verify = false;
    req.top_k = Some(10);
    req.min_score = Some(0.0);
    req.exclude = vec!["https://www.example.com/seen-before".to_string()];

    let results = pipeline.recommend(&req).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results
        .iter()
        .all(|r| !r.result.url.contains("seen-before")));
}

#[tokio::test]
async fn llm_failures_degrade_to_fallback_without_crashing() {
    let provider = Arc::new(MockProvider::new(vec![
        candidate("Stack data structure basics explained", "s", "https://a.example/1"),
        candidate("another page", "s", "https://a.example/2"),
    ]));
    // Every LLM call fails: keyword generation and verification
    let llm = Arc::new(MockLlm::failing());
    let pipeline = recommender(provider.clone(), llm, PipelineConfig::default());

    let mut req = request();
    req.verify = true;
    req.top_k = Some(10);
    req.min_score = Some(0.0);

    let results = pipeline.recommend(&req).await.unwrap();

    // Keyword generation fell back to the summary-derived query
    let queries = provider.seen_queries();
    assert_eq!(queries, vec!["Stack data structure basics".to_string()]);

    // Failed verifications substitute the neutral fallback, never drop
    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.score, FALLBACK_SCORE);
        assert!(result.reason.contains("unavailable"));
    }
}

#[tokio::test]
async fn empty_search_results_yield_empty_response() {
    let provider = Arc::new(MockProvider::new(Vec::new()));
    let llm = Arc::new(MockLlm::with_keywords("stack"));
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut req = request();
    req.verify = false;

    let results = pipeline.recommend(&req).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn invalid_request_is_rejected_before_the_pipeline_runs() {
    let provider = Arc::new(MockProvider::new(Vec::new()));
    let llm = Arc::new(MockLlm::with_keywords("stack"));
    let pipeline = recommender(provider.clone(), llm, PipelineConfig::default());

    let mut req = request();
    req.top_k = Some(0);

    let result = pipeline.recommend(&req).await;
    assert!(matches!(result, Err(LecternError::InvalidRequest(_))));
    assert!(provider.seen_queries().is_empty());
}

#[tokio::test]
async fn fan_out_is_capped_and_queries_deduplicated() {
    let provider = Arc::new(MockProvider::new(vec![candidate(
        "stack basics",
        "s",
        "https://a.example/1",
    )]));
    // Five keywords scripted, one duplicated; fanout is 2
    let llm = Arc::new(MockLlm::with_keywords(
        "stack tutorial\nstack tutorial\nqueue tutorial\nheap tutorial\ntree tutorial",
    ));
    let pipeline = recommender(provider.clone(), llm, PipelineConfig::default());

    let mut req = request();
    req.verify = false;
    req.min_score = Some(0.0);

    pipeline.recommend(&req).await.unwrap();

    let queries = provider.seen_queries();
    assert_eq!(queries, vec!["stack tutorial", "queue tutorial"]);
}

#[tokio::test]
async fn scores_above_ten_from_the_llm_are_preserved() {
    let provider = Arc::new(MockProvider::new(vec![candidate(
        "seminal stack paper",
        "s",
        "https://a.example/1",
    )]));
    let llm = Arc::new(
        MockLlm::with_keywords("stack").verdict("seminal stack paper", 11.0, "beyond the scale"),
    );
    let pipeline = recommender(provider, llm, PipelineConfig::default());

    let mut req = request();
    req.verify = true;
    req.top_k = Some(1);
    req.min_score = Some(0.0);

    let results = pipeline.recommend(&req).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 11.0);
}
