//! Web search provider (Google Custom Search API shape)

use super::{Candidate, SearchProvider};
use crate::config::{ProviderTuning, WebSearchConfig};
use crate::error::{LecternError, Result};
use crate::pipeline::heuristic::{keyword_match_ratio, matched_keywords};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Heuristic component weights; sum to 1.0
const WEIGHT_TITLE_MATCH: f64 = 0.4;
const WEIGHT_SNIPPET_MATCH: f64 = 0.3;
const WEIGHT_DOMAIN_TRUST: f64 = 0.3;

/// Domains given full trust in the heuristic path
const TRUSTED_DOMAINS: &[&str] = &[
    ".edu",
    ".gov",
    "arxiv.org",
    "scholar.google.com",
    "stackoverflow.com",
    "github.com",
    "microsoft.com",
    "mozilla.org",
];

/// Web page recommendations via a Custom Search shaped API
pub struct WebProvider {
    http_client: reqwest::Client,
    api_key: String,
    engine_id: String,
    tuning: ProviderTuning,
}

impl WebProvider {
    pub fn new(config: WebSearchConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.tuning.timeout_secs))
            .build()
            .map_err(LecternError::Http)?;

        Ok(Self {
            http_client,
            api_key: config.api_key.unwrap_or_default(),
            engine_id: config.engine_id.unwrap_or_default(),
            tuning: config.tuning,
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    display_link: String,
}

#[async_trait]
impl SearchProvider for WebProvider {
    fn provider_type(&self) -> &'static str {
        "web"
    }

    fn tuning(&self) -> &ProviderTuning {
        &self.tuning
    }

    async fn search(&self, query: &str, lang: &str) -> Result<Vec<Candidate>> {
        let num = self.tuning.page_size.min(10).to_string();
        let language_restrict = format!("lang_{}", lang);
        let params = [
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", query),
            ("lr", language_restrict.as_str()),
            ("num", num.as_str()),
        ];

        let response = match self.http_client.get(BASE_URL).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("web search call failed: {}", e);
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("web search error (HTTP {}): {}", status, body);
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("web search payload parse failed: {}", e);
                return Ok(Vec::new());
            }
        };

        tracing::info!("web search '{}': {} results", query, parsed.items.len());

        Ok(parsed
            .items
            .into_iter()
            .map(|item| Candidate::new(item.title, item.snippet, item.link, item.display_link))
            .collect())
    }

    fn heuristic_score(
        &self,
        candidate: &Candidate,
        keywords: &[String],
        language: &str,
    ) -> (f64, String) {
        let title_score = keyword_match_ratio(&candidate.title, keywords);
        let snippet_score = keyword_match_ratio(&candidate.snippet, keywords);
        let domain_score = domain_trust_score(&candidate.source);

        let score = title_score * WEIGHT_TITLE_MATCH
            + snippet_score * WEIGHT_SNIPPET_MATCH
            + domain_score * WEIGHT_DOMAIN_TRUST;
        let score = (score * 100.0).round() / 100.0;

        let reason = heuristic_reason(candidate, keywords, score, language);
        (score, reason)
    }
}

/// 10 for known trusted domains, neutral 5 otherwise
fn domain_trust_score(display_link: &str) -> f64 {
    let display_link = display_link.to_lowercase();
    if TRUSTED_DOMAINS
        .iter()
        .any(|domain| display_link.contains(domain))
    {
        10.0
    } else {
        5.0
    }
}

/// One-line templated reason, language-dependent
fn heuristic_reason(
    candidate: &Candidate,
    keywords: &[String],
    score: f64,
    language: &str,
) -> String {
    let matched = matched_keywords(&candidate.title, &candidate.snippet, keywords);
    let top_matches = matched
        .iter()
        .take(2)
        .map(|kw| kw.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if language == "ko" {
        if score >= 7.0 {
            format!("키워드 '{}'와 높은 관련성을 보이는 자료입니다.", top_matches)
        } else if score >= 5.0 {
            format!("키워드 '{}'와 관련된 유용한 정보를 제공합니다.", top_matches)
        } else {
            "검색 결과와 부분적으로 관련이 있습니다.".to_string()
        }
    } else if score >= 7.0 {
        format!("Highly relevant to keywords '{}'.", top_matches)
    } else if score >= 5.0 {
        format!("Provides useful information related to '{}'.", top_matches)
    } else {
        "Partially relevant to the search query.".to_string()
    }
}
