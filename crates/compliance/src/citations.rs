//! Citation extraction from generated answers.
//!
//! Any http(s) URL in an answer counts as a claimed source reference. The
//! extractor is a pure function of its input text.

use crate::url::normalize_url;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Scheme plus everything up to whitespace or a character that cannot appear
/// unescaped in a URL. Unanchored: a URL glued to a word or to CJK text
/// still counts.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"'`{}|\\^]+"#).unwrap());

/// A URL-shaped substring found in an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Text as it appeared, minus trailing punctuation and markup
    pub raw_text: String,

    /// `scheme://host/path` form, or `None` if the URL could not be parsed
    pub normalized_origin: Option<String>,
}

impl Citation {
    pub fn from_raw(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let normalized_origin = normalize_url(&raw_text).map(|url| url.to_string());
        Self {
            raw_text,
            normalized_origin,
        }
    }

    /// Origin if known, otherwise the raw text. Used when reporting.
    pub fn display_origin(&self) -> &str {
        self.normalized_origin.as_deref().unwrap_or(&self.raw_text)
    }
}

/// Extract citations in order of first occurrence.
///
/// Citations with the same normalized origin collapse into the first one seen.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut citations = Vec::new();

    for found in URL_PATTERN.find_iter(text) {
        let trimmed = trim_trailing_artifacts(found.as_str());
        let citation = Citation::from_raw(trimmed);

        let key = match &citation.normalized_origin {
            Some(origin) => format!("origin:{}", origin),
            None => format!("raw:{}", citation.raw_text),
        };

        if seen.insert(key) {
            citations.push(citation);
        }
    }

    tracing::debug!("Extracted {} citations", citations.len());
    citations
}

/// Strip sentence punctuation, emphasis markers and unbalanced closing
/// brackets left over from prose or markdown around a URL.
fn trim_trailing_artifacts(candidate: &str) -> &str {
    let mut end = candidate.len();

    while let Some(last) = candidate[..end].chars().next_back() {
        let current = &candidate[..end];
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '*' | '_' => true,
            ')' => current.matches('(').count() < current.matches(')').count(),
            ']' => current.matches('[').count() < current.matches(']').count(),
            _ => false,
        };

        if !strip {
            break;
        }
        end -= last.len_utf8();
    }

    &candidate[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins(text: &str) -> Vec<Option<String>> {
        extract_citations(text)
            .into_iter()
            .map(|c| c.normalized_origin)
            .collect()
    }

    #[test]
    fn test_plain_urls_in_order() {
        let text = "Use https://www.osha.gov/confined-spaces and also http://www.epa.gov/npdes/.";
        assert_eq!(
            origins(text),
            vec![
                Some("https://www.osha.gov/confined-spaces".to_string()),
                Some("http://www.epa.gov/npdes".to_string()),
            ]
        );
    }

    #[test]
    fn test_markup_artifacts_stripped() {
        let text = "[Source: https://www.osha.gov/respiratory-protection]\n\
                    See [OSHA](https://www.osha.gov/hazcom). \
                    (Reference: https://www.ecfr.gov/current/title-29), \
                    **https://www.cdc.gov/niosh/**";

        let raw: Vec<String> = extract_citations(text).into_iter().map(|c| c.raw_text).collect();
        assert_eq!(
            raw,
            vec![
                "https://www.osha.gov/respiratory-protection",
                "https://www.osha.gov/hazcom",
                "https://www.ecfr.gov/current/title-29",
                "https://www.cdc.gov/niosh/",
            ]
        );
    }

    #[test]
    fn test_balanced_parentheses_kept() {
        let text = "See https://en.wikipedia.org/wiki/Confined_space_(OSHA) for background.";
        let citations = extract_citations(text);
        assert_eq!(citations[0].raw_text, "https://en.wikipedia.org/wiki/Confined_space_(OSHA)");
    }

    #[test]
    fn test_duplicates_collapse_to_first_raw_text() {
        let text = "First https://WWW.EPA.gov/lead, then https://www.epa.gov/lead/ and https://www.epa.gov/lead?x=1.";
        let citations = extract_citations(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].raw_text, "https://WWW.EPA.gov/lead");
        assert_eq!(
            citations[0].normalized_origin.as_deref(),
            Some("https://www.epa.gov/lead")
        );
    }

    #[test]
    fn test_unparseable_match_kept_without_origin() {
        let citations = extract_citations("Broken link: https://-invalid-/page and https://localhost/x");
        assert_eq!(citations.len(), 2);
        assert!(citations.iter().all(|c| c.normalized_origin.is_none()));
        assert_eq!(citations[0].display_origin(), "https://-invalid-/page");
    }

    #[test]
    fn test_word_adjacent_urls() {
        let citations = extract_citations(
            "Per _https://random-blog.example.com/ppe_ wear gloves. 参考https://www.osha.gov/ppe",
        );
        let raw: Vec<&str> = citations.iter().map(|c| c.raw_text.as_str()).collect();
        assert_eq!(
            raw,
            vec!["https://random-blog.example.com/ppe", "https://www.osha.gov/ppe"]
        );
    }

    #[test]
    fn test_no_urls() {
        assert!(extract_citations("Wear a Class B respirator. See 29 CFR 1910.146.").is_empty());
        assert!(extract_citations("").is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "A https://www.osha.gov/a B https://evil.example.com/b) C https://www.osha.gov/a";
        assert_eq!(extract_citations(text), extract_citations(text));
    }
}
