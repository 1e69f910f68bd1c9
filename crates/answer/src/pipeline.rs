//! Answer pipeline: compose, call the model once, then audit citations.

use crate::types::{AnswerMode, ComplianceResult, QueryRequest};
use chrono::Utc;
use pipewrench_compliance::{check_compliance, extract_citations, WhitelistRegistry};
use pipewrench_core::config::{DEFAULT_CLAUDE_MODEL, DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MAX_TOKENS};
use pipewrench_core::{AppError, AppResult};
use pipewrench_llm::{LlmClient, LlmRequest};
use pipewrench_prompt::{ProfileCatalog, PromptComposer};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Tunables for prompt size and generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Document context cap, in characters
    pub max_context_chars: usize,

    pub max_tokens: u32,

    pub temperature: Option<f32>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }
}

/// Orchestrates one answer per request.
///
/// The registry and profiles are shared read-only; `answer` takes `&self`
/// and holds no locks, so a pipeline can serve concurrent requests.
pub struct AnswerPipeline {
    registry: Arc<WhitelistRegistry>,
    profiles: Arc<ProfileCatalog>,
    client: Option<Arc<dyn LlmClient>>,
    model: String,
    options: PipelineOptions,
    composer: PromptComposer,
}

impl AnswerPipeline {
    pub fn builder() -> AnswerPipelineBuilder {
        AnswerPipelineBuilder::default()
    }

    /// Replace the whitelist, e.g. with the result of `WhitelistRegistry::reload`.
    pub fn with_registry(mut self, registry: Arc<WhitelistRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &WhitelistRegistry {
        &self.registry
    }

    pub fn profiles(&self) -> &ProfileCatalog {
        &self.profiles
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn mode(&self) -> AnswerMode {
        if self.client.is_some() {
            AnswerMode::Live
        } else {
            AnswerMode::Demo
        }
    }

    /// Answer one question.
    ///
    /// Compliance problems are reported inside the result. Only a failed
    /// model call (or a blank question) is returned as an error.
    pub async fn answer(&self, request: &QueryRequest) -> AppResult<ComplianceResult> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "answer",
            request_id = %request_id,
            department = request.department_id.as_deref().unwrap_or("-"),
            role = request.role_id.as_deref().unwrap_or("-"),
        );

        self.answer_inner(request_id, request).instrument(span).await
    }

    async fn answer_inner(
        &self,
        request_id: Uuid,
        request: &QueryRequest,
    ) -> AppResult<ComplianceResult> {
        if request.question_text.trim().is_empty() {
            return Err(AppError::Validation("Question cannot be empty".to_string()));
        }

        let department = self
            .profiles
            .resolve_department(request.department_id.as_deref());
        let role = self.profiles.resolve_role(request.role_id.as_deref());

        let prompt = self.composer.compose(
            &request.question_text,
            &request.document_context,
            department,
            role,
            &self.registry.summary(),
        )?;

        let (answer_text, mode, model) = match &self.client {
            Some(client) => {
                // Directive goes out both as the prompt head and the system section
                let mut llm_request = LlmRequest::new(prompt.text, &self.model)
                    .with_system(prompt.sections.directive)
                    .with_max_tokens(self.options.max_tokens);
                if let Some(temperature) = self.options.temperature {
                    llm_request = llm_request.with_temperature(temperature);
                }

                tracing::debug!("Calling provider '{}'", client.provider_name());

                let response = client.complete(&llm_request).await.map_err(|e| {
                    tracing::error!("Model call failed: {}", e);
                    e
                })?;

                if !response.done {
                    tracing::warn!("Model response was cut off before completion");
                }

                (response.content, AnswerMode::Live, Some(response.model))
            }
            None => {
                tracing::warn!("No model provider configured, answering in demo mode");
                (demo_answer(self.registry.len()), AnswerMode::Demo, None)
            }
        };

        let citations = extract_citations(&answer_text);
        let check = check_compliance(&citations, &self.registry);

        if check.all_whitelisted() {
            tracing::info!("Answer verified with {} citations", citations.len());
        } else {
            tracing::warn!(
                "Answer not compliant: {} ({} rejected)",
                check.status.as_str(),
                check.rejected.len()
            );
        }

        Ok(ComplianceResult {
            request_id,
            answer_text,
            all_whitelisted: check.all_whitelisted(),
            status: check.status,
            rejected: check.rejected,
            notice: check.notice,
            citations,
            department_id: prompt.metadata.department_id,
            role_id: prompt.metadata.role_id,
            mode,
            model,
            context_truncated: prompt.metadata.context_truncated,
            generated_at: Utc::now(),
        })
    }
}

/// Builder for [`AnswerPipeline`].
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    registry: Option<Arc<WhitelistRegistry>>,
    profiles: Option<Arc<ProfileCatalog>>,
    client: Option<Arc<dyn LlmClient>>,
    model: Option<String>,
    options: PipelineOptions,
}

impl AnswerPipelineBuilder {
    pub fn registry(mut self, registry: Arc<WhitelistRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn profiles(mut self, profiles: Arc<ProfileCatalog>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Model provider. Without one the pipeline runs in demo mode.
    pub fn client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn maybe_client(mut self, client: Option<Arc<dyn LlmClient>>) -> Self {
        self.client = client;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> AppResult<AnswerPipeline> {
        let registry = self
            .registry
            .ok_or_else(|| AppError::Config("Answer pipeline requires a whitelist".to_string()))?;
        let profiles = self
            .profiles
            .ok_or_else(|| AppError::Config("Answer pipeline requires profiles".to_string()))?;

        if self.options.max_context_chars == 0 {
            return Err(AppError::Config(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }

        let composer = PromptComposer::new(self.options.max_context_chars)?;

        Ok(AnswerPipeline {
            registry,
            profiles,
            client: self.client,
            model: self
                .model
                .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
            options: self.options,
            composer,
        })
    }
}

/// Placeholder answer for demo mode. Contains no URLs, so it is always
/// reported as uncited.
fn demo_answer(approved_sources: usize) -> String {
    format!(
        "[DEMO MODE] No model provider is configured, so this question was not sent to a model.\n\n\
         Set ANTHROPIC_API_KEY (or PIPEWRENCH_API_KEY) to receive answers restricted to the \
         {} approved sources.",
        approved_sources
    )
}
