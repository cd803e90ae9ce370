//! Identity-based deduplication and exclusion filtering

use crate::providers::Candidate;
use std::collections::HashSet;
use url::Url;

/// Normalize a URL to its dedup identity: host without a leading `www.`
/// plus path. Scheme, query string, and fragment are dropped so tracking
/// suffixes do not defeat deduplication.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("");
            let host = host.strip_prefix("www.").unwrap_or(host);
            format!("{}{}", host.to_lowercase(), parsed.path())
        }
        // Not parseable as an absolute URL; compare the raw text
        Err(_) => raw.trim().trim_end_matches('/').to_lowercase(),
    }
}

/// Normalize a title to its dedup identity: lowercase, punctuation
/// stripped, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Dedup identity for a candidate: URL-based when the candidate carries a
/// usable URL, title-based otherwise.
pub fn identity(candidate: &Candidate) -> String {
    if candidate.url.starts_with("http") {
        normalize_url(&candidate.url)
    } else {
        normalize_title(&candidate.title)
    }
}

/// First-occurrence-wins deduplication, O(n)
pub fn dedupe(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let before = candidates.len();
    let mut seen = HashSet::new();
    let unique: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let key = identity(c);
            !key.is_empty() && seen.insert(key)
        })
        .collect();

    tracing::debug!("dedupe: {} -> {} candidates", before, unique.len());
    unique
}

/// Drop candidates whose identity matches a normalized exclude entry.
///
/// Entries may be URLs, titles, or provider ids; each candidate is checked
/// against both its URL identity and its title identity so one filter
/// serves every provider.
pub fn filter_excluded(candidates: Vec<Candidate>, exclude: &[String]) -> Vec<Candidate> {
    if exclude.is_empty() {
        return candidates;
    }

    let excluded: HashSet<String> = exclude
        .iter()
        .map(|entry| {
            if entry.starts_with("http") {
                normalize_url(entry)
            } else {
                normalize_title(entry)
            }
        })
        .filter(|key| !key.is_empty())
        .collect();

    let before = candidates.len();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            !excluded.contains(&normalize_url(&c.url)) && !excluded.contains(&normalize_title(&c.title))
        })
        .collect();

    tracing::debug!("exclusion filter: {} -> {} candidates", before, kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(title: &str, url: &str) -> Candidate {
        Candidate::new(title, "snippet", url, "example.com")
    }

    #[test]
    fn url_normalization_strips_scheme_www_and_query() {
        assert_eq!(
            normalize_url("https://www.example.com/a/b?utm_source=x#frag"),
            "example.com/a/b"
        );
        assert_eq!(
            normalize_url("http://example.com/a/b"),
            "example.com/a/b"
        );
    }

    #[test]
    fn title_normalization_drops_punctuation_and_case() {
        assert_eq!(
            normalize_title("  Stacks & Queues: An Introduction!  "),
            "stacks queues an introduction"
        );
    }

    #[test]
    fn duplicate_urls_keep_first_occurrence() {
        let candidates = vec![
            candidate("first", "https://example.com/page?ref=a"),
            candidate("second", "https://www.example.com/page?ref=b"),
            candidate("third", "https://example.com/other"),
        ];
        let unique = dedupe(candidates);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title, "first");
        assert_eq!(unique[1].title, "third");
    }

    #[test]
    fn urlless_candidates_dedupe_by_title() {
        let candidates = vec![
            candidate("Attention Is All You Need", ""),
            candidate("attention is all you need!", ""),
        ];
        let unique = dedupe(candidates);
        assert_eq!(unique.len(), 1);
    }

    #[test]
    fn excluded_url_never_survives() {
        let candidates = vec![
            candidate("keep", "https://example.com/keep"),
            candidate("drop", "https://www.example.com/drop?utm=1"),
        ];
        let kept = filter_excluded(candidates, &["https://example.com/drop".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "keep");
    }

    #[test]
    fn excluded_title_matches_urlless_candidate() {
        let candidates = vec![candidate("Old Lecture Video", "")];
        let kept = filter_excluded(candidates, &["old lecture video".to_string()]);
        assert!(kept.is_empty());
    }

    proptest! {
        #[test]
        fn dedupe_is_idempotent(titles in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
            let candidates: Vec<Candidate> = titles
                .iter()
                .map(|t| candidate(t, &format!("https://example.com/{}", t)))
                .collect();
            let once = dedupe(candidates);
            let twice = dedupe(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn dedupe_never_grows_input(titles in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
            let candidates: Vec<Candidate> =
                titles.iter().map(|t| candidate(t, "")).collect();
            let len = candidates.len();
            prop_assert!(dedupe(candidates).len() <= len);
        }
    }
}
