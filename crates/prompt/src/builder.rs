//! Prompt composer: renders the fixed compliance prompt template.

use crate::types::{
    ComposedPrompt, ComposedPromptMetadata, DepartmentProfile, PromptSections, RoleProfile,
};
use handlebars::Handlebars;
use pipewrench_compliance::WhitelistSummary;
use pipewrench_core::{AppError, AppResult};

const TEMPLATE_NAME: &str = "answer";

/// Section order is fixed: directive, department, role, context, whitelist, question.
const PROMPT_TEMPLATE: &str = "{{directive}}

## Department
{{department}}
{{#if role}}

## Role
{{role}}
{{/if}}

## Document Context
{{context}}

## Approved Sources
{{whitelist}}

## Question
{{question}}
";

const COMPLIANCE_DIRECTIVE: &str = "You are an assistant for municipal Department of Public Works (DPW) operations.

COMPLIANCE DIRECTIVE (NON-NEGOTIABLE):
1. Cite ONLY sources from the approved whitelist summarized below, or the provided document context.
2. Give the specific URL for every citation, formatted as [Source: URL].
3. When information cannot be verified from approved sources, state: \"This information cannot be verified from approved sources.\"
4. Never present general knowledge, guesses or unlisted websites as verified facts.
5. Do not provide legal advice; recommend consulting legal counsel where relevant.";

const NO_CONTEXT_INSTRUCTION: &str = "No document was provided. Answer from knowledge of the approved sources only, \
cite the specific approved URL for each claim, and explicitly flag any claim that cannot be verified \
from approved sources.";

/// Composes department/role-aware prompts around the compliance directive.
pub struct PromptComposer {
    handlebars: Handlebars<'static>,
    max_context_chars: usize,
}

impl PromptComposer {
    pub fn new(max_context_chars: usize) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();

        // Plain text prompt, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(TEMPLATE_NAME, PROMPT_TEMPLATE)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            handlebars,
            max_context_chars,
        })
    }

    pub fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }

    /// Build the prompt for one question.
    ///
    /// # Example
    /// ```
    /// use pipewrench_compliance::WhitelistRegistry;
    /// use pipewrench_prompt::{ProfileCatalog, PromptComposer};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let catalog = ProfileCatalog::builtin()?;
    /// let registry = WhitelistRegistry::builtin()?;
    /// let composer = PromptComposer::new(100_000)?;
    ///
    /// let prompt = composer.compose(
    ///     "When is a confined space permit required?",
    ///     "",
    ///     catalog.resolve_department(Some("water_wastewater")),
    ///     catalog.resolve_role(Some("operator")),
    ///     &registry.summary(),
    /// )?;
    /// assert!(prompt.text.ends_with("When is a confined space permit required?\n"));
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    pub fn compose(
        &self,
        question: &str,
        document_context: &str,
        department: &DepartmentProfile,
        role: Option<&RoleProfile>,
        whitelist: &WhitelistSummary,
    ) -> AppResult<ComposedPrompt> {
        tracing::debug!(
            "Composing prompt for department '{}', role {:?}",
            department.id,
            role.map(|r| r.id.as_str())
        );

        let context_chars = document_context.chars().count();
        let (context, context_truncated) = render_context(document_context, self.max_context_chars);

        if context_truncated {
            tracing::info!(
                "Document context truncated from {} to {} characters",
                context_chars,
                self.max_context_chars
            );
        }

        let sections = PromptSections {
            directive: COMPLIANCE_DIRECTIVE.to_string(),
            department: render_department(department),
            role: role.map(render_role),
            context,
            whitelist: whitelist.to_string(),
            question: question.to_string(),
        };

        let text = self
            .handlebars
            .render(TEMPLATE_NAME, &sections)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        Ok(ComposedPrompt {
            text,
            sections,
            metadata: ComposedPromptMetadata {
                department_id: department.id.clone(),
                role_id: role.map(|r| r.id.clone()),
                context_chars,
                context_truncated,
            },
        })
    }
}

/// Cut `text` to at most `max_chars` characters, never inside a char.
///
/// Returns the kept prefix and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

fn render_context(document_context: &str, max_chars: usize) -> (String, bool) {
    if document_context.trim().is_empty() {
        return (NO_CONTEXT_INSTRUCTION.to_string(), false);
    }

    let (kept, truncated) = truncate_chars(document_context, max_chars);
    if !truncated {
        return (kept.to_string(), false);
    }

    let total = document_context.chars().count();
    let marker = format!(
        "\n\n[Document context truncated: showing the first {} of {} characters]",
        max_chars, total
    );
    (format!("{}{}", kept, marker), true)
}

fn render_department(department: &DepartmentProfile) -> String {
    format!(
        "{}\n{}",
        department.display_name,
        department.prompt_fragment.trim_end()
    )
}

fn render_role(role: &RoleProfile) -> String {
    let mut rendered = format!("{}\n{}", role.display_name, role.context_fragment.trim_end());

    if !role.focus_areas.is_empty() {
        rendered.push_str("\nFocus areas:");
        for area in &role.focus_areas {
            rendered.push_str(&format!("\n- {}", area));
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewrench_compliance::{WhitelistEntry, WhitelistRegistry};

    fn department() -> DepartmentProfile {
        DepartmentProfile {
            id: "water_wastewater".to_string(),
            display_name: "Water & Wastewater".to_string(),
            prompt_fragment: "You are assisting utility operators.\n".to_string(),
        }
    }

    fn role() -> RoleProfile {
        RoleProfile {
            id: "operator".to_string(),
            display_name: "Operator".to_string(),
            context_fragment: "The user runs the plant.".to_string(),
            focus_areas: vec!["Process control".to_string(), "Sampling".to_string()],
        }
    }

    fn summary() -> WhitelistSummary {
        WhitelistRegistry::from_entries(
            vec![WhitelistEntry::new("https://www.osha.gov", true)],
            Vec::new(),
        )
        .summary()
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle)
            .unwrap_or_else(|| panic!("missing {:?} in prompt", needle))
    }

    #[test]
    fn test_section_order() {
        let composer = PromptComposer::new(1000).unwrap();
        let prompt = composer
            .compose(
                "What PPE is required?",
                "Section 4: respirators.",
                &department(),
                Some(&role()),
                &summary(),
            )
            .unwrap();

        let text = &prompt.text;
        let order = [
            position(text, "COMPLIANCE DIRECTIVE"),
            position(text, "## Department"),
            position(text, "## Role"),
            position(text, "## Document Context"),
            position(text, "## Approved Sources"),
            position(text, "## Question"),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{:?}", order);

        assert!(text.contains("You are assisting utility operators."));
        assert!(text.contains("- Process control"));
        assert!(text.contains("Section 4: respirators."));
        assert!(text.contains("Approved domains: 1"));
        assert!(text.trim_end().ends_with("What PPE is required?"));
    }

    #[test]
    fn test_role_section_omitted_without_role() {
        let composer = PromptComposer::new(1000).unwrap();
        let prompt = composer
            .compose("Q?", "ctx", &department(), None, &summary())
            .unwrap();

        assert!(!prompt.text.contains("## Role"));
        assert!(prompt.sections.role.is_none());
        assert_eq!(prompt.metadata.role_id, None);
        assert_eq!(prompt.metadata.department_id, "water_wastewater");
    }

    #[test]
    fn test_directive_requires_unverifiable_statement() {
        let composer = PromptComposer::new(1000).unwrap();
        let prompt = composer
            .compose("Q?", "", &department(), None, &summary())
            .unwrap();

        assert!(prompt.sections.directive.contains("approved whitelist"));
        assert!(prompt
            .sections
            .directive
            .contains("cannot be verified from approved sources"));
        assert!(!prompt.sections.directive.contains("://"));
    }

    #[test]
    fn test_empty_context_instruction() {
        let composer = PromptComposer::new(1000).unwrap();
        let prompt = composer
            .compose("Q?", "   \n", &department(), None, &summary())
            .unwrap();

        assert_eq!(prompt.sections.context, NO_CONTEXT_INSTRUCTION);
        assert!(prompt.text.contains("No document was provided"));
        assert!(!prompt.metadata.context_truncated);
    }

    #[test]
    fn test_context_exactly_at_cap_not_truncated() {
        let composer = PromptComposer::new(10).unwrap();
        let context = "abcdefghij";
        let prompt = composer
            .compose("Q?", context, &department(), None, &summary())
            .unwrap();

        assert!(!prompt.metadata.context_truncated);
        assert_eq!(prompt.metadata.context_chars, 10);
        assert_eq!(prompt.sections.context, context);
    }

    #[test]
    fn test_context_over_cap_truncated_and_flagged() {
        let composer = PromptComposer::new(10).unwrap();
        let prompt = composer
            .compose("Q?", "abcdefghijk", &department(), None, &summary())
            .unwrap();

        assert!(prompt.metadata.context_truncated);
        assert_eq!(prompt.metadata.context_chars, 11);
        assert!(prompt.sections.context.starts_with("abcdefghij\n"));
        assert!(!prompt.sections.context.contains("abcdefghijk"));
        assert!(prompt
            .sections
            .context
            .contains("showing the first 10 of 11 characters"));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("日本語", 3), ("日本語", false));
        assert_eq!(truncate_chars("", 0), ("", false));
        assert_eq!(truncate_chars("a", 0), ("", true));
    }

    #[test]
    fn test_context_not_html_escaped() {
        let composer = PromptComposer::new(1000).unwrap();
        let prompt = composer
            .compose("Is <b> & \"x\" ok?", "a < b && c", &department(), None, &summary())
            .unwrap();

        assert!(prompt.text.contains("a < b && c"));
        assert!(prompt.text.contains("Is <b> & \"x\" ok?"));
    }
}
