//! Shared building blocks for the heuristic (no-LLM) verification path

/// Keyword-match ratio on a 0-10 scale: each matched keyword contributes
/// `10 / keyword_count`, capped at 10 so many matches cannot run away.
pub fn keyword_match_ratio(text: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();
    let per_keyword = 10.0 / keywords.len() as f64;

    let mut score = 0.0;
    for keyword in keywords {
        if text.contains(&keyword.to_lowercase()) {
            score += per_keyword;
        }
    }
    score.min(10.0)
}

/// Keywords that appear in either text, in input order. Used for
/// templated reasons.
pub fn matched_keywords<'a>(
    title: &str,
    snippet: &str,
    keywords: &'a [String],
) -> Vec<&'a String> {
    let title = title.to_lowercase();
    let snippet = snippet.to_lowercase();
    keywords
        .iter()
        .filter(|kw| {
            let kw = kw.to_lowercase();
            title.contains(&kw) || snippet.contains(&kw)
        })
        .collect()
}

/// Compress a view count into [0, 1] on a log scale; one million views
/// saturates the component.
pub fn views_score(views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    ((views as f64 + 1.0).log10() / 6.0).min(1.0)
}

/// Linear recency in [0, 1] from the publish year: 2015 maps to 0,
/// 2025 and later to 1. Unparseable timestamps score neutral 0.5.
pub fn recency_score(published: &str) -> f64 {
    match published.get(..4).and_then(|y| y.parse::<i32>().ok()) {
        Some(year) => (((year - 2015) as f64) / 10.0).clamp(0.0, 1.0),
        None => 0.5,
    }
}

/// Token-set similarity in [0, 1]: both strings are reduced to their
/// sorted unique lowercase tokens before a normalized edit-distance
/// comparison, so word order and repetition do not matter.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let normalize = |s: &str| -> String {
        let mut tokens: Vec<String> = s
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        tokens.sort();
        tokens.dedup();
        tokens.join(" ")
    };

    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}
