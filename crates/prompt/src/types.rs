//! Profile and prompt types.

use serde::{Deserialize, Serialize};

/// Department-specific prompt fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentProfile {
    /// Unique department identifier (e.g. "water_wastewater")
    pub id: String,

    /// Human-readable name
    #[serde(rename = "name")]
    pub display_name: String,

    /// Text injected into the department section of the prompt
    #[serde(rename = "prompt")]
    pub prompt_fragment: String,
}

/// Job-role context fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    /// Unique role identifier (e.g. "operator")
    pub id: String,

    /// Human-readable name
    #[serde(rename = "name")]
    pub display_name: String,

    /// Text injected into the role section of the prompt
    #[serde(rename = "context")]
    pub context_fragment: String,

    /// Topics listed under the role fragment
    #[serde(rename = "focusAreas", default, skip_serializing_if = "Vec::is_empty")]
    pub focus_areas: Vec<String>,
}

/// One profile document, as found in the embedded defaults or a workspace file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default)]
    pub departments: Vec<DepartmentProfile>,

    #[serde(default)]
    pub roles: Vec<RoleProfile>,
}

/// Named sections of a composed prompt, in rendering order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSections {
    pub directive: String,
    pub department: String,

    /// Absent when no role was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    pub context: String,
    pub whitelist: String,
    pub question: String,
}

/// A fully composed prompt ready for the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedPrompt {
    /// Rendered prompt text
    pub text: String,

    pub sections: PromptSections,

    pub metadata: ComposedPromptMetadata,
}

/// Metadata about a composed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPromptMetadata {
    #[serde(rename = "departmentId")]
    pub department_id: String,

    #[serde(rename = "roleId", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,

    /// Length of the document context before truncation, in chars
    #[serde(rename = "contextChars")]
    pub context_chars: usize,

    #[serde(rename = "contextTruncated")]
    pub context_truncated: bool,
}
