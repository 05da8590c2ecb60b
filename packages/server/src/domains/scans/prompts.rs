//! LLM prompts and response parsing for audit reports.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

lazy_static! {
    /// Widest `{ ... }` span: first opening brace to last closing brace.
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").expect("valid regex");
}

/// Page content beyond this many characters is not sent to the model.
pub const MAX_PAGE_CONTENT_CHARS: usize = 12_000;

/// Pull the JSON object out of a model response.
///
/// Models often wrap JSON in prose or code fences. When no object can be
/// parsed the raw text is kept under `raw_analysis`.
pub fn parse_model_json(text: &str) -> Value {
    JSON_OBJECT
        .find(text)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({ "raw_analysis": text }))
}

/// Market research search queries for a domain.
pub fn research_queries(domain: &str, year: i32) -> Vec<String> {
    vec![
        format!("competitors of {}", domain),
        format!("{} industry trends {}", domain, year),
        format!("best practices {} industry", domain),
        format!("customer pain points {} niche", domain),
    ]
}

pub fn market_research_prompt(site_url: &str, research_data: &Value) -> String {
    let research = serde_json::to_string_pretty(research_data).unwrap_or_default();
    format!(
        r#"Based on the following market research data, provide insights for the website {site_url}:

Research Data: {research}

Please analyze and provide insights in the following JSON format:
{{
  "competitors": [
    {{"name": "Competitor 1", "strengths": ["strength 1"], "website": "url"}}
  ],
  "trending_topics": ["topic 1", "topic 2"],
  "market_gaps": ["gap 1", "gap 2"],
  "content_opportunities": ["opportunity 1", "opportunity 2"],
  "seo_keywords": ["keyword 1", "keyword 2"],
  "industry_insights": ["insight 1", "insight 2"]
}}

Focus on actionable insights that can help improve the website's competitive position."#
    )
}

pub fn page_analysis_prompt(page_url: &str, title: Option<&str>, content: &str) -> String {
    let content = truncate_chars(content, MAX_PAGE_CONTENT_CHARS);
    let title = title.unwrap_or("(no title)");
    format!(
        r#"You are auditing a single web page for SEO, content quality, technical health and user experience.

URL: {page_url}
Title: {title}

Page content (markdown):
{content}

Respond with JSON in exactly this format:
{{
  "overall_score": 0,
  "seo": ["suggestion"],
  "content": ["suggestion"],
  "technical": ["suggestion"],
  "user_experience": ["suggestion"]
}}

"overall_score" is an integer from 0 to 100. Each list holds short, specific, actionable suggestions for this page."#
    )
}

/// Clamp `overall_score` into 0..=100 when the model returns one.
pub fn normalize_suggestions(mut value: Value) -> Value {
    if let Some(score) = value.get("overall_score").and_then(Value::as_f64) {
        let clamped = score.round().clamp(0.0, 100.0) as i64;
        value["overall_score"] = json!(clamped);
    }
    value
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_response() {
        let text = "Here you go:\n```json\n{\"trending_topics\": [\"ai\"], \"nested\": {\"a\": 1}}\n```\nThanks!";
        let value = parse_model_json(text);
        assert_eq!(value["trending_topics"][0], "ai");
        assert_eq!(value["nested"]["a"], 1);
    }

    #[test]
    fn falls_back_to_raw_analysis() {
        let value = parse_model_json("no json here");
        assert_eq!(value, json!({"raw_analysis": "no json here"}));

        let broken = "{\"a\": 1,}";
        assert_eq!(parse_model_json(broken), json!({"raw_analysis": broken}));
    }

    #[test]
    fn last_brace_wins() {
        // Two objects in one response do not form valid JSON together
        let text = "{\"a\": 1} and {\"b\": 2}";
        assert_eq!(parse_model_json(text), json!({"raw_analysis": text}));
    }

    #[test]
    fn queries_embed_domain_and_year() {
        let queries = research_queries("example.com", 2026);
        assert_eq!(
            queries,
            vec![
                "competitors of example.com",
                "example.com industry trends 2026",
                "best practices example.com industry",
                "customer pain points example.com niche",
            ]
        );
    }

    #[test]
    fn market_prompt_contains_research_and_format() {
        let prompt = market_research_prompt(
            "https://example.com",
            &json!({"competitors of example.com": [{"title": "Rival"}]}),
        );
        assert!(prompt.contains("insights for the website https://example.com"));
        assert!(prompt.contains("\"Rival\""));
        assert!(prompt.contains("\"seo_keywords\""));
    }

    #[test]
    fn page_prompt_truncates_content() {
        let content = "é".repeat(MAX_PAGE_CONTENT_CHARS + 50);
        let prompt = page_analysis_prompt("https://example.com", None, &content);
        assert!(prompt.contains("(no title)"));
        assert_eq!(prompt.matches('é').count(), MAX_PAGE_CONTENT_CHARS);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(normalize_suggestions(json!({"overall_score": 130}))["overall_score"], 100);
        assert_eq!(normalize_suggestions(json!({"overall_score": -4.6}))["overall_score"], 0);
        assert_eq!(normalize_suggestions(json!({"overall_score": 72.4}))["overall_score"], 72);
        assert_eq!(normalize_suggestions(json!({"seo": []})), json!({"seo": []}));
    }
}
