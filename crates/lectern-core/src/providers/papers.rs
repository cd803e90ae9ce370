//! Academic paper provider (OpenAlex API shape)

use super::{Candidate, SearchProvider, Signals};
use crate::config::{PaperSearchConfig, ProviderTuning};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const BASE_URL: &str = "https://api.openalex.org";

/// Abstracts shorter than this are treated as missing
const MIN_ABSTRACT_LENGTH: usize = 50;

/// Citation floor that rescues abstract-less papers from the filter
const NO_ABSTRACT_CITATION_FLOOR: u64 = 100;

/// Result ordering requested from the paper index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperSort {
    /// Provider relevance order
    #[default]
    Relevance,
    /// Citation count, descending
    Citations,
    /// Fetch by relevance, keep papers near the top relevance, then order
    /// those by citations
    Hybrid,
}

/// Paper recommendations via an OpenAlex shaped API
pub struct PaperProvider {
    http_client: reqwest::Client,
    year_from: i32,
    sort: PaperSort,
    tuning: ProviderTuning,
}

impl PaperProvider {
    pub fn new(config: PaperSearchConfig) -> Result<Self> {
        Self::with_sort(config, PaperSort::default())
    }

    pub fn with_sort(config: PaperSearchConfig, sort: PaperSort) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.tuning.timeout_secs))
            .build()
            .map_err(LecternError::Http)?;

        Ok(Self {
            http_client,
            year_from: config.year_from,
            sort,
            tuning: config.tuning,
        })
    }
}

#[derive(Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<Work>,
}

#[derive(Deserialize)]
struct Work {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    cited_by_count: u64,
    #[serde(default)]
    publication_year: Option<i32>,
    #[serde(default)]
    relevance_score: Option<f64>,
    #[serde(default)]
    abstract_inverted_index: Option<BTreeMap<String, Vec<usize>>>,
    #[serde(default)]
    primary_location: Option<PrimaryLocation>,
}

#[derive(Deserialize)]
struct PrimaryLocation {
    #[serde(default)]
    source: Option<LocationSource>,
}

#[derive(Deserialize)]
struct LocationSource {
    #[serde(default)]
    display_name: Option<String>,
}

#[async_trait]
impl SearchProvider for PaperProvider {
    fn provider_type(&self) -> &'static str {
        "papers"
    }

    fn tuning(&self) -> &ProviderTuning {
        &self.tuning
    }

    async fn search(&self, query: &str, lang: &str) -> Result<Vec<Candidate>> {
        let filters = format!(
            "from_publication_date:{}-01-01,language:{},is_paratext:false,type:article",
            self.year_from, lang
        );

        // Hybrid fetches a wider page, then narrows by citations
        let per_page = match self.sort {
            PaperSort::Hybrid => self.tuning.page_size * 2,
            _ => self.tuning.page_size,
        };
        let sort_param = match self.sort {
            PaperSort::Citations => "cited_by_count:desc",
            _ => "relevance_score:desc",
        };

        let per_page_str = per_page.to_string();
        let params = [
            ("search", query),
            ("filter", filters.as_str()),
            ("sort", sort_param),
            ("per_page", per_page_str.as_str()),
        ];

        let url = format!("{}/works", BASE_URL);
        let response = match self.http_client.get(&url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("paper search call failed: {}", e);
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            tracing::error!("paper search error (HTTP {})", response.status());
            return Ok(Vec::new());
        }

        let parsed: WorksResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("paper search payload parse failed: {}", e);
                return Ok(Vec::new());
            }
        };

        tracing::info!("paper search '{}': {} works", query, parsed.results.len());

        let mut candidates: Vec<Candidate> = parsed
            .results
            .into_iter()
            .filter_map(|work| self.parse_work(work))
            .collect();

        if self.sort == PaperSort::Hybrid {
            candidates = hybrid_reorder(candidates, self.tuning.page_size);
        }

        Ok(candidates)
    }

    /// Base 5.0 plus small bonuses per matched keyword, plus a compressed
    /// provider-relevance bonus. Clamped to 10.
    fn heuristic_score(
        &self,
        candidate: &Candidate,
        keywords: &[String],
        _language: &str,
    ) -> (f64, String) {
        let title = candidate.title.to_lowercase();
        let abstract_text = candidate.snippet.to_lowercase();

        let mut score = 5.0;
        for keyword in keywords {
            let keyword = keyword.to_lowercase();
            if title.contains(&keyword) {
                score += 0.5;
            }
            if abstract_text.contains(&keyword) {
                score += 0.2;
            }
        }

        let relevance = candidate.signals.provider_relevance.unwrap_or(0.0);
        score += (relevance / 10.0).min(2.0);

        (score.min(10.0), "Heuristic".to_string())
    }
}

impl PaperProvider {
    fn parse_work(&self, work: Work) -> Option<Candidate> {
        let title = work.title.unwrap_or_default();
        if title.is_empty() {
            return None;
        }

        let abstract_text =
            reconstruct_abstract(work.abstract_inverted_index.as_ref(), self.tuning.snippet_max);

        // Low-signal filter: no usable abstract and few citations
        if abstract_text.trim().len() < MIN_ABSTRACT_LENGTH
            && work.cited_by_count < NO_ABSTRACT_CITATION_FLOOR
        {
            tracing::debug!("skipping low-signal paper: {}", title);
            return None;
        }

        let url = match work.doi {
            Some(doi) if !doi.is_empty() => doi,
            _ => work.id,
        };

        let venue = work
            .primary_location
            .and_then(|loc| loc.source)
            .and_then(|source| source.display_name)
            .unwrap_or_default();

        let signals = Signals {
            citations: Some(work.cited_by_count),
            views: None,
            published: work.publication_year.map(|y| y.to_string()),
            provider_relevance: work.relevance_score,
        };

        Some(Candidate::new(title, abstract_text, url, venue).with_signals(signals))
    }
}

/// Rebuild plain text from an inverted index `{word: [positions]}`,
/// capped at `max_len` chars.
pub fn reconstruct_abstract(
    inverted_index: Option<&BTreeMap<String, Vec<usize>>>,
    max_len: usize,
) -> String {
    let Some(index) = inverted_index else {
        return String::new();
    };

    let mut word_positions: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&pos| (pos, word.as_str())))
        .collect();
    word_positions.sort();

    let abstract_text = word_positions
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ");

    abstract_text.chars().take(max_len).collect()
}

/// Keep papers within 60% of the top provider relevance, order those by
/// citations, and cut back to one page.
fn hybrid_reorder(candidates: Vec<Candidate>, page_size: usize) -> Vec<Candidate> {
    let max_relevance = candidates
        .iter()
        .filter_map(|c| c.signals.provider_relevance)
        .fold(0.0_f64, f64::max);
    let threshold = max_relevance * 0.6;

    let mut relevant: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.signals.provider_relevance.unwrap_or(0.0) >= threshold)
        .collect();

    relevant.sort_by(|a, b| {
        b.signals
            .citations
            .unwrap_or(0)
            .cmp(&a.signals.citations.unwrap_or(0))
    });
    relevant.truncate(page_size);

    tracing::debug!(
        "hybrid reorder: relevance threshold {:.2}, kept {}",
        threshold,
        relevant.len()
    );
    relevant
}
