//! Video provider (YouTube Data API shape)

use super::{Candidate, SearchProvider, Signals};
use crate::config::{ProviderTuning, VideoSearchConfig};
use crate::error::{LecternError, Result};
use crate::pipeline::heuristic::{recency_score, token_set_similarity, views_score};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Heuristic component weights; sum to 1.0
const WEIGHT_TITLE_SIMILARITY: f64 = 0.5;
const WEIGHT_VIEWS: f64 = 0.3;
const WEIGHT_RECENCY: f64 = 0.2;

/// Video recommendations via a YouTube Data shaped API.
///
/// `search` also fetches per-video statistics so view counts and publish
/// times are available to the heuristic scorer.
pub struct VideoProvider {
    http_client: reqwest::Client,
    api_key: String,
    tuning: ProviderTuning,
}

impl VideoProvider {
    pub fn new(config: VideoSearchConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.tuning.timeout_secs))
            .build()
            .map_err(LecternError::Http)?;

        Ok(Self {
            http_client,
            api_key: config.api_key.unwrap_or_default(),
            tuning: config.tuning,
        })
    }

    async fn fetch_statistics(&self, ids: &[String]) -> Vec<VideoDetail> {
        if ids.is_empty() {
            return Vec::new();
        }

        let joined = ids.join(",");
        let params = [
            ("key", self.api_key.as_str()),
            ("part", "statistics,snippet"),
            ("id", joined.as_str()),
        ];

        let response = match self.http_client.get(VIDEOS_URL).query(&params).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!("video details error (HTTP {})", response.status());
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("video details call failed: {}", e);
                return Vec::new();
            }
        };

        match response.json::<DetailsResponse>().await {
            Ok(parsed) => parsed.items,
            Err(e) => {
                tracing::warn!("video details parse failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    // A single malformed item must not sink the whole page; items
    // without an id are dropped after deserialization
    #[serde(default)]
    id: VideoId,
    #[serde(default)]
    snippet: VideoSnippet,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoId {
    #[serde(default)]
    video_id: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    items: Vec<VideoDetail>,
}

#[derive(Deserialize)]
struct VideoDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    statistics: Option<VideoStatistics>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    // The API reports counts as strings
    #[serde(default)]
    view_count: Option<String>,
}

#[async_trait]
impl SearchProvider for VideoProvider {
    fn provider_type(&self) -> &'static str {
        "videos"
    }

    fn tuning(&self) -> &ProviderTuning {
        &self.tuning
    }

    async fn search(&self, query: &str, lang: &str) -> Result<Vec<Candidate>> {
        let max_results = self.tuning.page_size.to_string();
        let params = [
            ("key", self.api_key.as_str()),
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("relevanceLanguage", lang),
            ("maxResults", max_results.as_str()),
        ];

        let response = match self.http_client.get(SEARCH_URL).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("video search call failed: {}", e);
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("video search error (HTTP {}): {}", status, body);
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("video search payload parse failed: {}", e);
                return Ok(Vec::new());
            }
        };

        let items: Vec<SearchItem> = parsed
            .items
            .into_iter()
            .filter(|item| !item.id.video_id.is_empty())
            .collect();

        tracing::info!("video search '{}': {} results", query, items.len());

        // One batched statistics lookup per search call
        let ids: Vec<String> = items.iter().map(|item| item.id.video_id.clone()).collect();
        let details = self.fetch_statistics(&ids).await;
        let views_by_id: std::collections::HashMap<&str, u64> = details
            .iter()
            .filter_map(|d| {
                let views = d
                    .statistics
                    .as_ref()
                    .and_then(|s| s.view_count.as_deref())
                    .and_then(|v| v.parse().ok())?;
                Some((d.id.as_str(), views))
            })
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let views = views_by_id.get(item.id.video_id.as_str()).copied();
                let url = format!("https://www.youtube.com/watch?v={}", item.id.video_id);
                let signals = Signals {
                    citations: None,
                    views,
                    published: Some(item.snippet.published_at),
                    provider_relevance: None,
                };
                Candidate::new(
                    item.snippet.title,
                    item.snippet.description,
                    url,
                    item.snippet.channel_title,
                )
                .with_signals(signals)
            })
            .collect())
    }

    /// Best title similarity over all queries, blended with popularity
    /// and recency, scaled to 0-10.
    fn heuristic_score(
        &self,
        candidate: &Candidate,
        keywords: &[String],
        _language: &str,
    ) -> (f64, String) {
        let similarity = keywords
            .iter()
            .map(|query| token_set_similarity(&candidate.title, query))
            .fold(0.0_f64, f64::max);

        let views = views_score(candidate.signals.views.unwrap_or(0));
        let recency = candidate
            .signals
            .published
            .as_deref()
            .map(recency_score)
            .unwrap_or(0.5);

        let raw = WEIGHT_TITLE_SIMILARITY * similarity
            + WEIGHT_VIEWS * views
            + WEIGHT_RECENCY * recency;
        let score = (raw * 10.0).clamp(0.0, 10.0);
        let score = (score * 100.0).round() / 100.0;

        (score, "Heuristic".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> VideoProvider {
        VideoProvider::new(VideoSearchConfig {
            api_key: Some("key".to_string()),
            ..VideoSearchConfig::default()
        })
        .unwrap()
    }

    fn video(title: &str, views: u64, published: &str) -> Candidate {
        Candidate::new(title, "description", "https://www.youtube.com/watch?v=abc", "Channel")
            .with_signals(Signals {
                citations: None,
                views: Some(views),
                published: Some(published.to_string()),
                provider_relevance: None,
            })
    }

    #[test]
    fn construction_fails_without_api_key() {
        let result = VideoProvider::new(VideoSearchConfig {
            api_key: None,
            ..VideoSearchConfig::default()
        });
        assert!(matches!(result, Err(LecternError::Config(_))));
    }

    #[test]
    fn matching_title_beats_unrelated_title() {
        let provider = provider();
        let kws = vec!["stack data structure".to_string()];

        let close = video("Stack Data Structure Explained", 1_000, "2023-01-01T00:00:00Z");
        let far = video("Sourdough Baking Basics", 1_000, "2023-01-01T00:00:00Z");

        let (close_score, _) = provider.heuristic_score(&close, &kws, "en");
        let (far_score, _) = provider.heuristic_score(&far, &kws, "en");
        assert!(close_score > far_score);
    }

    #[test]
    fn popularity_and_recency_break_title_ties() {
        let provider = provider();
        let kws = vec!["rust tutorial".to_string()];

        let popular = video("Rust Tutorial", 2_000_000, "2024-05-01T00:00:00Z");
        let obscure = video("Rust Tutorial", 50, "2016-05-01T00:00:00Z");

        let (popular_score, _) = provider.heuristic_score(&popular, &kws, "en");
        let (obscure_score, _) = provider.heuristic_score(&obscure, &kws, "en");
        assert!(popular_score > obscure_score);
    }

    #[test]
    fn search_page_tolerates_items_missing_id_or_snippet() {
        let raw = r#"{"items": [
            {"snippet": {"title": "no id at all"}},
            {"id": {"videoId": "abc123"}},
            {"id": {"videoId": "def456"}, "snippet": {"title": "ok", "channelTitle": "ch"}}
        ]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.items.len(), 3);

        // Only items carrying a video id are usable downstream
        let usable = parsed
            .items
            .iter()
            .filter(|item| !item.id.video_id.is_empty())
            .count();
        assert_eq!(usable, 2);
    }

    #[test]
    fn heuristic_score_is_bounded() {
        let provider = provider();
        let kws = vec!["exact title".to_string()];
        let candidate = video("exact title", u64::MAX, "2030-01-01T00:00:00Z");
        let (score, reason) = provider.heuristic_score(&candidate, &kws, "en");
        assert!((0.0..=10.0).contains(&score));
        assert_eq!(reason, "Heuristic");
    }
}
