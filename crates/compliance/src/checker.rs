//! Whitelist compliance classification for extracted citations.
//!
//! Compliance findings are data. "Cited nothing" and "cited something
//! unapproved" are separate outcomes with different notice text so that
//! audits can tell them apart.

use crate::citations::Citation;
use crate::whitelist::WhitelistRegistry;
use serde::{Deserialize, Serialize};

/// Header of the notice for answers citing unapproved sources.
pub const UNAPPROVED_NOTICE_HEADER: &str = "[COMPLIANCE NOTICE]";

/// Header of the notice for answers citing no sources at all.
pub const NO_CITATION_NOTICE_HEADER: &str = "[UNVERIFIED ANSWER]";

/// Outcome of checking an answer's citations against the whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// Every citation is on the whitelist
    Verified,
    /// The answer contains no source references
    NoCitations,
    /// At least one citation is not on the whitelist
    Unapproved,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NoCitations => "no_citations",
            Self::Unapproved => "unapproved",
        }
    }
}

/// Classification result with the caller-visible notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub status: ComplianceStatus,

    /// Origins (or raw text for unparseable URLs) that failed the whitelist
    pub rejected: Vec<String>,

    pub notice: Option<String>,
}

impl ComplianceCheck {
    pub fn all_whitelisted(&self) -> bool {
        self.status == ComplianceStatus::Verified
    }
}

/// Classify citations against the registry.
pub fn check_compliance(citations: &[Citation], registry: &WhitelistRegistry) -> ComplianceCheck {
    if citations.is_empty() {
        return ComplianceCheck {
            status: ComplianceStatus::NoCitations,
            rejected: Vec::new(),
            notice: Some(no_citation_notice()),
        };
    }

    let rejected: Vec<String> = citations
        .iter()
        .filter(|citation| {
            !citation
                .normalized_origin
                .as_deref()
                .is_some_and(|origin| registry.is_whitelisted(origin))
        })
        .map(|citation| citation.display_origin().to_string())
        .collect();

    if rejected.is_empty() {
        return ComplianceCheck {
            status: ComplianceStatus::Verified,
            rejected,
            notice: None,
        };
    }

    tracing::debug!("{} of {} citations rejected", rejected.len(), citations.len());

    let notice = unapproved_notice(&rejected);
    ComplianceCheck {
        status: ComplianceStatus::Unapproved,
        rejected,
        notice: Some(notice),
    }
}

fn no_citation_notice() -> String {
    format!(
        "{}\nThis answer contained no verifiable source references. \
         Treat it as unverified until it is confirmed against approved sources.",
        NO_CITATION_NOTICE_HEADER
    )
}

fn unapproved_notice(rejected: &[String]) -> String {
    let listed = rejected
        .iter()
        .map(|origin| format!("- {}", origin))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\nThe following sources are not in the approved whitelist and must not be cited:\n{}\n\n\
         Please revise citations to use only approved sources.",
        UNAPPROVED_NOTICE_HEADER, listed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citations::extract_citations;
    use crate::whitelist::WhitelistEntry;

    fn registry() -> WhitelistRegistry {
        WhitelistRegistry::from_entries(
            vec![
                WhitelistEntry::new("https://www.osha.gov", true),
                WhitelistEntry::new("https://www.epa.gov/npdes", true),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_all_whitelisted() {
        let citations = extract_citations(
            "See https://www.osha.gov/confined-spaces and https://www.epa.gov/npdes/permits.",
        );
        let check = check_compliance(&citations, &registry());

        assert!(check.all_whitelisted());
        assert_eq!(check.status, ComplianceStatus::Verified);
        assert!(check.notice.is_none());
        assert!(check.rejected.is_empty());
    }

    #[test]
    fn test_single_bad_citation_named() {
        let citations = extract_citations(
            "OSHA says so (https://www.osha.gov/hazcom), as does https://random-blog.example.com/ppe-tips.",
        );
        let check = check_compliance(&citations, &registry());

        assert!(!check.all_whitelisted());
        assert_eq!(check.status, ComplianceStatus::Unapproved);
        assert_eq!(check.rejected, vec!["https://random-blog.example.com/ppe-tips"]);

        let notice = check.notice.unwrap();
        assert!(notice.starts_with(UNAPPROVED_NOTICE_HEADER));
        assert!(notice.contains("- https://random-blog.example.com/ppe-tips"));
        assert!(!notice.contains("osha.gov"));
    }

    #[test]
    fn test_emphasized_bad_citation_is_unapproved() {
        let citations = extract_citations("Per _https://random-blog.example.com/ppe_ wear gloves.");
        let check = check_compliance(&citations, &registry());

        assert_eq!(check.status, ComplianceStatus::Unapproved);
        assert_eq!(check.rejected, vec!["https://random-blog.example.com/ppe"]);
    }

    #[test]
    fn test_unparseable_citation_is_rejected() {
        let citations = extract_citations("Source: https://-broken-/page");
        let check = check_compliance(&citations, &registry());

        assert_eq!(check.status, ComplianceStatus::Unapproved);
        assert_eq!(check.rejected, vec!["https://-broken-/page"]);
    }

    #[test]
    fn test_no_citations_distinct_from_bad_citation() {
        let none = check_compliance(&[], &registry());
        let bad = check_compliance(
            &extract_citations("https://random-blog.example.com/x"),
            &registry(),
        );

        assert!(!none.all_whitelisted());
        assert_eq!(none.status, ComplianceStatus::NoCitations);
        assert!(none.rejected.is_empty());

        let none_notice = none.notice.unwrap();
        let bad_notice = bad.notice.unwrap();
        assert!(none_notice.starts_with(NO_CITATION_NOTICE_HEADER));
        assert!(none_notice.contains("no verifiable source references"));
        assert_ne!(none_notice, bad_notice);
    }

    #[test]
    fn test_subpath_outside_prefix_rejected() {
        let citations = extract_citations("https://www.epa.gov/lead");
        let check = check_compliance(&citations, &registry());
        assert_eq!(check.rejected, vec!["https://www.epa.gov/lead"]);
    }
}
