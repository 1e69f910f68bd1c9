//! Request and result types for the answer pipeline.

use chrono::{DateTime, Utc};
use pipewrench_compliance::{Citation, ComplianceStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One question to answer, with already-extracted document text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question_text: String,

    /// Plain text of the session's documents (possibly empty)
    #[serde(default)]
    pub document_context: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
}

impl QueryRequest {
    pub fn new(question_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            ..Default::default()
        }
    }

    pub fn with_document_context(mut self, document_context: impl Into<String>) -> Self {
        self.document_context = document_context.into();
        self
    }

    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn with_role(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }
}

/// How the answer text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Generated by the configured model provider
    Live,
    /// Placeholder text; no provider is configured
    Demo,
}

/// Answer plus its citation audit.
///
/// `notice` is set exactly when `all_whitelisted` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub request_id: Uuid,

    /// Model output, unmodified
    pub answer_text: String,

    pub citations: Vec<Citation>,
    pub all_whitelisted: bool,
    pub status: ComplianceStatus,

    /// Origins that failed the whitelist
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,

    /// Department actually used, after fallback
    pub department_id: String,

    /// Role actually used; `None` if absent or unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,

    pub mode: AnswerMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub context_truncated: bool,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceResult {
    /// Answer text with the compliance notice appended, for display.
    pub fn render(&self) -> String {
        match &self.notice {
            Some(notice) => format!("{}\n\n---\n{}", self.answer_text.trim_end(), notice),
            None => self.answer_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(notice: Option<&str>) -> ComplianceResult {
        ComplianceResult {
            request_id: Uuid::new_v4(),
            answer_text: "Use a Class B respirator.\n".to_string(),
            citations: Vec::new(),
            all_whitelisted: notice.is_none(),
            status: if notice.is_none() {
                ComplianceStatus::Verified
            } else {
                ComplianceStatus::NoCitations
            },
            rejected: Vec::new(),
            notice: notice.map(str::to_string),
            department_id: "water_wastewater".to_string(),
            role_id: None,
            mode: AnswerMode::Live,
            model: Some("test-model".to_string()),
            context_truncated: false,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_appends_notice() {
        let rendered = result(Some("[UNVERIFIED ANSWER]\nNo sources.")).render();
        assert!(rendered.starts_with("Use a Class B respirator."));
        assert!(rendered.ends_with("[UNVERIFIED ANSWER]\nNo sources."));
    }

    #[test]
    fn test_render_without_notice_is_answer() {
        let r = result(None);
        assert_eq!(r.render(), r.answer_text);
    }

    #[test]
    fn test_query_request_builder() {
        let request = QueryRequest::new("What PPE?")
            .with_document_context("Section 4")
            .with_department("stormwater")
            .with_role("operator");

        assert_eq!(request.question_text, "What PPE?");
        assert_eq!(request.document_context, "Section 4");
        assert_eq!(request.department_id.as_deref(), Some("stormwater"));
        assert_eq!(request.role_id.as_deref(), Some("operator"));
    }

    #[test]
    fn test_result_json_shape() {
        let value = serde_json::to_value(result(None)).unwrap();
        assert_eq!(value["mode"], "live");
        assert_eq!(value["status"], "verified");
        assert_eq!(value["all_whitelisted"], true);
        assert!(value.get("notice").is_none());
        assert!(value.get("role_id").is_none());
    }
}
