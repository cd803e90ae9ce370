//! Prompt templates for keyword generation and result verification

/// Build the keyword generation prompt. `context` is the already-rendered
/// previous-summary / supporting-material block, or empty.
pub fn keyword_generation_prompt(
    summary: &str,
    language: &str,
    keyword_min: usize,
    context: &str,
) -> String {
    format!(
        r#"You are an expert search query generator for academic content.

Generate {keyword_min} specific search queries in {language} for the given lecture topic.

**Guidelines:**
- Use detailed technical phrases (3-7 words)
- Include specific concepts, technologies, or methodologies
- Create queries optimized to find high-quality learning material
- Return ONLY the queries, one per line

**Lecture Summary:**
{summary}

{context}**Search Queries:**"#
    )
}

/// Render previous summaries and supporting chunks into the context block
pub fn keyword_context_block(previous: &str, supporting: &str) -> String {
    format!(
        r#"**Previous Context:**
{previous}

**Related Materials:**
{supporting}

"#
    )
}

/// Build the relevance verdict prompt for one candidate
pub fn verdict_prompt(summary: &str, title: &str, snippet: &str, language: &str) -> String {
    format!(
        r#"You are evaluating the relevance of a search result to a lecture topic.

**Lecture Summary:**
{summary}

**Search Result:**
Title: {title}
Snippet: {snippet}

**Task:**
Rate the relevance on a scale of 0-10 and provide a brief reason in {language}.

**Scoring Guidelines:**
- 10: Original authoritative source (official documentation, seminal papers, standard specifications)
- 9: Highly relevant with comprehensive technical depth and accurate explanations
- 7-8: Very relevant, covers key concepts with good technical details
- 5-6: Moderately relevant, provides useful background or related information
- 3-4: Somewhat relevant, mentions the topic but lacks depth
- 0-2: Not relevant, off-topic or too general

**Response Format (JSON only):**
{{"score": <float>, "reason": "<1-2 sentences in {language}>"}}

**JSON Response:**"#
    )
}
