//! Cheap lexical rerank applied before the expensive verification stage

use crate::providers::Candidate;

/// Title matches weigh more than snippet matches
const TITLE_WEIGHT: f64 = 2.0;
const SNIPPET_WEIGHT: f64 = 1.0;

/// Keyword-containment score for one candidate, summed over all keywords.
/// Case-insensitive substring test.
pub fn lexical_score(candidate: &Candidate, keywords: &[String]) -> f64 {
    let title = candidate.title.to_lowercase();
    let snippet = candidate.snippet.to_lowercase();

    let mut score = 0.0;
    for keyword in keywords {
        let keyword = keyword.to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        if title.contains(&keyword) {
            score += TITLE_WEIGHT;
        }
        if snippet.contains(&keyword) {
            score += SNIPPET_WEIGHT;
        }
    }
    score
}

/// Reorder candidates by lexical score, descending. The sort is stable,
/// so equal-score candidates keep their merge order — required for
/// reproducible fixtures. Deterministic given identical inputs.
pub fn rerank(mut candidates: Vec<Candidate>, keywords: &[String]) -> Vec<Candidate> {
    let mut scored: Vec<(f64, Candidate)> = candidates
        .drain(..)
        .map(|c| (lexical_score(&c, keywords), c))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored.into_iter().map(|(_, c)| c).collect()
}
